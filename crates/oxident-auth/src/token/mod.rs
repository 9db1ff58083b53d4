//! Token issuance and signing-key management.
//!
//! This module provides:
//!
//! - JWT encoding and decoding for access and identity tokens
//! - Signing-key generation, rotation, and JWKS publication
//! - The token issuer driving grant exchange, refresh rotation, and
//!   revocation

pub mod jwt;
pub mod keys;
pub mod service;

pub use jwt::{
    AccessTokenClaims, AccessTokenClaimsBuilder, IdTokenClaims, Jwk, Jwks, JwtError,
    SigningAlgorithm, SigningKeyPair,
};
pub use keys::SigningKeyManager;
pub use service::{TokenIssuer, TokenSet};
