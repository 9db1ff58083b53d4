//! Authorization endpoint wire types.
//!
//! Request parsing, success redirects, and error redirects for the
//! authorization endpoint per RFC 6749. Validation of the parameters
//! themselves happens in [`crate::oauth::service::AuthorizationService`];
//! these types only carry them across the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authorization request query parameters.
///
/// # Example
///
/// ```ignore
/// GET /oauth/authorize?
///   response_type=code
///   &client_id=web-app
///   &redirect_uri=https://app.example.com/cb
///   &scope=openid profile
///   &state=abc123xyz
///   &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM
///   &code_challenge_method=S256
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeParams {
    /// Must be "code" for the authorization code flow.
    pub response_type: String,

    /// Client identifier issued during registration.
    pub client_id: String,

    /// Redirect URI where the response will be sent.
    /// Must exactly match one of the registered redirect URIs.
    pub redirect_uri: String,

    /// Requested scopes (space-separated).
    pub scope: String,

    /// CSRF protection state parameter, echoed back on redirect.
    #[serde(default)]
    pub state: Option<String>,

    /// OpenID Connect nonce, echoed into the identity token.
    #[serde(default)]
    pub nonce: Option<String>,

    /// PKCE code challenge.
    #[serde(default)]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method ("plain" or "S256").
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

impl AuthorizeParams {
    /// Splits the space-separated scope string into a scope list.
    #[must_use]
    pub fn scope_list(&self) -> Vec<String> {
        self.scope
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Successful authorization response, delivered by redirect.
///
/// # Example
///
/// ```ignore
/// HTTP/1.1 302 Found
/// Location: https://app.example.com/cb?
///   code=SplxlOBeZQQYbYS6WxSbIA
///   &state=abc123xyz
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeResponse {
    /// Opaque authorization request identifier, exchanged for tokens.
    /// Single-use and short-lived.
    pub code: String,

    /// Echoed state parameter for CSRF validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizeResponse {
    /// Creates a new authorization response.
    #[must_use]
    pub fn new(code: String, state: Option<String>) -> Self {
        Self { code, state }
    }

    /// Builds the redirect URL with response parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URI is not a valid URL.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        let mut url = url::Url::parse(redirect_uri)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("code", &self.code);
            if let Some(ref state) = self.state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.to_string())
    }
}

/// Authorization error response.
///
/// Communicated via redirect to the client's redirect URI when that URI
/// is valid; rendered directly otherwise (never redirect to an
/// unvalidated URI).
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeError {
    /// OAuth 2.0 error code.
    pub error: AuthorizeErrorCode,

    /// Human-readable error description (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// Echoed state parameter for CSRF validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizeError {
    /// Creates a new authorization error.
    #[must_use]
    pub fn new(error: AuthorizeErrorCode, state: Option<String>) -> Self {
        Self {
            error,
            error_description: None,
            state,
        }
    }

    /// Creates a new authorization error with description.
    #[must_use]
    pub fn with_description(
        error: AuthorizeErrorCode,
        description: impl Into<String>,
        state: Option<String>,
    ) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
            state,
        }
    }

    /// Builds the redirect URL with error parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URI is not a valid URL.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        let mut url = url::Url::parse(redirect_uri)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("error", self.error.as_str());
            if let Some(ref desc) = self.error_description {
                pairs.append_pair("error_description", desc);
            }
            if let Some(ref state) = self.state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.to_string())
    }
}

/// OAuth 2.0 authorization error codes (RFC 6749 Section 4.1.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizeErrorCode {
    /// The request is missing a required parameter, includes an invalid
    /// parameter value, or is otherwise malformed.
    InvalidRequest,

    /// The client is not authorized to request an authorization code
    /// using this method.
    UnauthorizedClient,

    /// The resource owner or authorization server denied the request.
    AccessDenied,

    /// The authorization server does not support obtaining an
    /// authorization code using this method.
    UnsupportedResponseType,

    /// The requested scope is invalid, unknown, or malformed.
    InvalidScope,

    /// The authorization server encountered an unexpected condition.
    ServerError,

    /// The authorization server is temporarily unable to handle the
    /// request.
    TemporarilyUnavailable,
}

impl AuthorizeErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }
}

impl fmt::Display for AuthorizeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_deserialize_and_scope_list() {
        let json = r#"{
            "response_type": "code",
            "client_id": "web-app",
            "redirect_uri": "https://app.example.com/cb",
            "scope": "openid profile",
            "state": "abc123xyz",
            "code_challenge": "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
            "code_challenge_method": "S256"
        }"#;

        let params: AuthorizeParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.response_type, "code");
        assert_eq!(params.scope_list(), vec!["openid", "profile"]);
        assert!(params.nonce.is_none());
    }

    #[test]
    fn test_response_redirect_url() {
        let response =
            AuthorizeResponse::new("code123".to_string(), Some("state456".to_string()));
        let url = response
            .to_redirect_url("https://app.example.com/cb")
            .unwrap();

        assert!(url.starts_with("https://app.example.com/cb?"));
        assert!(url.contains("code=code123"));
        assert!(url.contains("state=state456"));
    }

    #[test]
    fn test_response_redirect_url_without_state() {
        let response = AuthorizeResponse::new("code123".to_string(), None);
        let url = response
            .to_redirect_url("https://app.example.com/cb")
            .unwrap();
        assert!(!url.contains("state="));
    }

    #[test]
    fn test_error_redirect_url() {
        let error = AuthorizeError::with_description(
            AuthorizeErrorCode::InvalidScope,
            "Unknown scope",
            Some("state123".to_string()),
        );
        let url = error.to_redirect_url("https://app.example.com/cb").unwrap();

        assert!(url.contains("error=invalid_scope"));
        assert!(url.contains("error_description=Unknown+scope"));
        assert!(url.contains("state=state123"));
    }

    #[test]
    fn test_error_code_strings() {
        assert_eq!(AuthorizeErrorCode::InvalidRequest.as_str(), "invalid_request");
        assert_eq!(AuthorizeErrorCode::AccessDenied.as_str(), "access_denied");
        assert_eq!(
            AuthorizeErrorCode::TemporarilyUnavailable.to_string(),
            "temporarily_unavailable"
        );
    }
}
