//! HTTP handlers for the OAuth 2.0 / OpenID Connect endpoints.
//!
//! # Available Handlers
//!
//! - [`authorize_handler`] - Authorization endpoint (RFC 6749 §4.1.1)
//! - [`token_handler`] - Token endpoint (RFC 6749 §4.1.3, §6)
//! - [`revoke_handler`] - Token revocation endpoint (RFC 7009)
//! - [`openid_configuration_handler`] - OIDC discovery document
//! - [`jwks_handler`] - JWKS endpoint (RFC 7517)

pub mod authorize;
pub mod discovery;
pub mod jwks;
pub mod revoke;
pub mod token;

pub use authorize::{AuthorizeState, authorize_handler};
pub use discovery::{DiscoveryState, openid_configuration_handler};
pub use jwks::{JwksState, jwks_handler};
pub use revoke::{RevocationState, revoke_handler};
pub use token::{TokenState, token_handler};
