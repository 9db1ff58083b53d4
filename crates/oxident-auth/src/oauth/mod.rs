//! OAuth 2.0 authorization flow.
//!
//! The authorization code flow is implemented across several
//! submodules:
//!
//! - [`authorize`] - Request/response wire types for the authorization
//!   endpoint
//! - [`token`] - Request/response wire types for the token endpoint
//! - [`service`] - Authorization request lifecycle with validation
//! - [`registry`] - Client registration and authentication
//! - [`pkce`] - PKCE challenge verification

pub mod authorize;
pub mod pkce;
pub mod registry;
pub mod service;
pub mod token;

pub use authorize::{AuthorizeError, AuthorizeErrorCode, AuthorizeParams, AuthorizeResponse};
pub use pkce::{CodeChallengeMethod, PkceChallenge, PkceError, PkceVerifier, validate_exchange};
pub use registry::ClientRegistry;
pub use service::{AuthorizationService, CreateAuthorizationRequest};
pub use token::{TokenError, TokenErrorCode, TokenRequest, TokenResponse};
