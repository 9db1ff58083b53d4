//! # oxident-auth
//!
//! Authorization and token-issuance core for an OpenID Connect
//! provider.
//!
//! This crate provides:
//! - OAuth 2.0 authorization code flow with mandatory-PKCE policies
//! - Refresh token rotation where deletion is revocation
//! - Signing-key rotation with a verification overlap window
//! - JWKS publication and OIDC discovery
//! - Per-tenant isolation of users, grants, and sessions
//!
//! ## Modules
//!
//! - [`config`] - Issuer, lifetime, and store configuration
//! - [`oauth`] - Authorization request lifecycle, clients, PKCE
//! - [`token`] - JWT minting, key rotation, grant exchange
//! - [`storage`] - Traits every backing store must implement
//! - [`http`] - Axum handlers for the OAuth/OIDC endpoints
//! - [`maintenance`] - Background expiry sweeps
//!
//! All durable state lives behind the [`storage`] traits; the services
//! here are stateless and safe to share across tasks.

pub mod client_secret;
pub mod config;
pub mod error;
pub mod http;
pub mod maintenance;
pub mod oauth;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError, OAuthConfig, SigningConfig, StoreConfig};
pub use error::{AuthError, ErrorCategory, ValidationErrors};
pub use http::{
    AuthorizeState, DiscoveryState, JwksState, RevocationState, TokenState, authorize_handler,
    jwks_handler, openid_configuration_handler, revoke_handler, token_handler,
};
pub use maintenance::{ExpirySweeper, SweepReport};
pub use oauth::{AuthorizationService, ClientRegistry, CreateAuthorizationRequest};
pub use storage::{
    AuthorizationRequestStorage, ClientStorage, RefreshTokenStorage, SigningKeyStorage,
};
pub use token::{SigningKeyManager, TokenIssuer, TokenSet};
pub use types::{AuthorizationRequest, Client, GrantType, RefreshToken, SigningKey};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
