//! Token endpoint wire types.
//!
//! Request parsing, response generation, and RFC 6749 error mapping for
//! the token endpoint. The grant logic itself lives in
//! [`crate::token::service::TokenIssuer`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::token::service::TokenSet;

/// Token request parameters.
///
/// Different fields are required depending on the `grant_type`:
///
/// - `authorization_code`: code, redirect_uri, code_verifier (PKCE
///   clients), client_id
/// - `refresh_token`: refresh_token, (optional) scope
///
/// # Client Authentication
///
/// Clients authenticate using one of:
/// - HTTP Basic Auth header (not in this struct)
/// - `client_id` + `client_secret` in body
/// - `client_id` only (public clients)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type.
    /// One of: "authorization_code", "refresh_token"
    pub grant_type: String,

    /// Opaque authorization request identifier issued at the
    /// authorization endpoint (for authorization_code grant).
    #[serde(default)]
    pub code: Option<String>,

    /// PKCE code verifier (for authorization_code grant).
    #[serde(default)]
    pub code_verifier: Option<String>,

    /// Redirect URI sent at the authorization endpoint; must be
    /// repeated verbatim (for authorization_code grant).
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Client ID (for public clients or client_secret_post).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (for client_secret_post authentication).
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Refresh token secret (for refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Requested scope (for refresh_token grant, subset of the original
    /// grant when narrowing is enabled).
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenRequest {
    /// Splits the optional space-separated scope string.
    #[must_use]
    pub fn scope_list(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
    }
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "scope": "openid profile",
///   "refresh_token": "rt_abc123...",
///   "id_token": "eyJhbG..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// The access token (JWT).
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Refresh token secret (if the client holds the refresh grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// OpenID Connect identity token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl From<TokenSet> for TokenResponse {
    fn from(set: TokenSet) -> Self {
        Self {
            access_token: set.access_token,
            token_type: set.token_type,
            expires_in: set.expires_in,
            scope: set.scope,
            refresh_token: set.refresh_token,
            id_token: Some(set.identity_token),
        }
    }
}

/// Token error response.
///
/// # Example Response
///
/// ```json
/// {
///   "error": "invalid_grant",
///   "error_description": "authorization request not found"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TokenError {
    /// OAuth 2.0 error code.
    pub error: TokenErrorCode,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenError {
    /// Creates a new token error.
    #[must_use]
    pub fn new(error: TokenErrorCode) -> Self {
        Self {
            error,
            error_description: None,
        }
    }

    /// Creates a new token error with description.
    #[must_use]
    pub fn with_description(error: TokenErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }

    /// Maps an internal error to its wire representation.
    #[must_use]
    pub fn from_auth_error(err: &AuthError) -> Self {
        Self::with_description(TokenErrorCode::from_auth_error(err), err.to_string())
    }
}

/// OAuth 2.0 token error codes (RFC 6749 Section 5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorCode {
    /// The request is missing a required parameter or is otherwise
    /// malformed.
    InvalidRequest,

    /// Client authentication failed.
    InvalidClient,

    /// The provided authorization grant or refresh token is invalid,
    /// expired, revoked, or was issued to another client.
    InvalidGrant,

    /// The authenticated client is not authorized to use this grant
    /// type.
    UnauthorizedClient,

    /// The grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The requested scope is invalid, unknown, malformed, or exceeds
    /// the original grant.
    InvalidScope,

    /// The authorization server encountered an unexpected condition.
    ServerError,

    /// The authorization server is temporarily unable to handle the
    /// request.
    TemporarilyUnavailable,
}

impl TokenErrorCode {
    /// Maps an internal error category onto the RFC 6749 error code.
    ///
    /// Validation errors are inspected by field so scope and credential
    /// problems surface as `invalid_scope` and `invalid_client` rather
    /// than a generic `invalid_request`.
    #[must_use]
    pub fn from_auth_error(err: &AuthError) -> Self {
        match err {
            AuthError::Validation { errors } => {
                if errors.field("scope").is_some() {
                    Self::InvalidScope
                } else if errors.field("client_secret").is_some()
                    || errors.field("client_id").is_some()
                {
                    Self::InvalidClient
                } else if errors.field("grant_type").is_some() {
                    Self::UnauthorizedClient
                } else {
                    Self::InvalidRequest
                }
            }
            AuthError::NotFound { .. }
            | AuthError::Expired { .. }
            | AuthError::InvalidState { .. }
            | AuthError::PkceValidationFailed => Self::InvalidGrant,
            AuthError::CryptoFailure { .. } => Self::ServerError,
            AuthError::StoreUnavailable { .. } => Self::TemporarilyUnavailable,
        }
    }

    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient => 401,
            Self::ServerError => 500,
            Self::TemporarilyUnavailable => 503,
            _ => 400,
        }
    }
}

impl fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
