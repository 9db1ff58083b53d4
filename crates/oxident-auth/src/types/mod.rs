//! Domain records: clients, authorization requests, refresh tokens,
//! and signing keys.

pub mod client;
pub mod refresh_token;
pub mod request;
pub mod signing_key;

pub use client::{
    ApplicationType, Client, GrantType, ResponseType, TokenEndpointAuthMethod,
};
pub use refresh_token::RefreshToken;
pub use request::AuthorizationRequest;
pub use signing_key::{
    EncryptedPem, MASTER_KEY_SIZE, SigningKey, generate_master_key, parse_master_key,
};
