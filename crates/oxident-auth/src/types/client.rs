//! Registered relying-party client.
//!
//! A client is registered once, keeps a stable public identifier, and is
//! soft-deactivated rather than deleted while live tokens still reference
//! it. Validation enforces the structural invariants at registration time,
//! most importantly that public clients must require PKCE.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

use crate::error::{AuthError, ValidationErrors};

/// A registered relying-party client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Stable public client identifier.
    pub client_id: String,

    /// Argon2 hash of the client secret. `None` for public clients;
    /// the plaintext secret is never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret_hash: Option<String>,

    /// Human-readable display name.
    pub name: String,

    /// Whether the client can keep a secret.
    pub application_type: ApplicationType,

    /// Allow-listed redirect URIs. Order-irrelevant, matched exactly.
    pub redirect_uris: Vec<String>,

    /// Allowed OAuth 2.0 grant types.
    pub grant_types: Vec<GrantType>,

    /// Allowed response types.
    pub response_types: Vec<ResponseType>,

    /// Scopes the client may request.
    pub scopes: Vec<String>,

    /// How the client authenticates at the token endpoint.
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// Access token lifetime override in seconds. `None` uses the
    /// server default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_lifetime_secs: Option<u64>,

    /// Identity token lifetime override in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_token_lifetime_secs: Option<u64>,

    /// Refresh token lifetime override in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_lifetime_secs: Option<u64>,

    /// Whether PKCE is required at authorization time. Public clients
    /// require PKCE unconditionally; see [`Client::requires_pkce`].
    pub pkce_required: bool,

    /// Whether the client is active. Deactivated clients resolve as
    /// not found.
    pub active: bool,

    /// When the client was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Client application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    /// Cannot keep a secret (SPA, native app). Must use PKCE.
    Public,
    /// Can keep a secret (server-side app).
    Confidential,
}

/// OAuth 2.0 grant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code grant (RFC 6749 §4.1).
    AuthorizationCode,
    /// Refresh token grant (RFC 6749 §6).
    RefreshToken,
}

impl GrantType {
    /// Returns the wire representation of the grant type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OAuth 2.0 response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code flow.
    Code,
}

impl ResponseType {
    /// Returns the wire representation of the response type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
        }
    }
}

/// Token endpoint client authentication methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// Secret in the Authorization header.
    ClientSecretBasic,
    /// Secret in the request body.
    ClientSecretPost,
    /// No authentication (public clients).
    None,
}

impl Client {
    /// Validates the client record.
    ///
    /// Checks run in order and accumulate into a field-keyed error set,
    /// so a registration request surfaces every problem at once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when any check fails:
    /// - empty client identifier or display name
    /// - no grant types or no redirect URIs
    /// - a redirect URI that is relative or carries a fragment
    /// - a public client holding a secret or not requiring PKCE
    /// - a confidential client without a secret
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut errors = ValidationErrors::new();

        if self.client_id.is_empty() {
            errors.add("client_id", "cannot be empty");
        }

        if self.name.is_empty() {
            errors.add("name", "cannot be empty");
        }

        if self.grant_types.is_empty() {
            errors.add("grant_types", "at least one grant type is required");
        }

        if self.redirect_uris.is_empty() {
            errors.add("redirect_uris", "at least one redirect URI is required");
        }

        for uri in &self.redirect_uris {
            match Url::parse(uri) {
                Ok(parsed) => {
                    if parsed.fragment().is_some() {
                        errors.add(
                            "redirect_uris",
                            format!("'{uri}' must not contain a fragment"),
                        );
                    }
                }
                Err(_) => {
                    errors.add("redirect_uris", format!("'{uri}' must be an absolute URI"));
                }
            }
        }

        match self.application_type {
            ApplicationType::Public => {
                if self.client_secret_hash.is_some() {
                    errors.add("client_secret", "public clients cannot hold a secret");
                }
                if !self.pkce_required {
                    errors.add("pkce_required", "public clients must require PKCE");
                }
                if self.token_endpoint_auth_method != TokenEndpointAuthMethod::None {
                    errors.add(
                        "token_endpoint_auth_method",
                        "public clients must use 'none'",
                    );
                }
            }
            ApplicationType::Confidential => {
                if self.client_secret_hash.is_none() {
                    errors.add("client_secret", "confidential clients require a secret");
                }
            }
        }

        errors.into_result()
    }

    /// Returns `true` if the redirect URI is on the allow-list.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Returns `true` if the grant type is allowed for this client.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// Returns `true` if the response type is allowed for this client.
    #[must_use]
    pub fn is_response_type_allowed(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }

    /// Returns `true` if the scope is allowed for this client.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.scopes.iter().any(|allowed| allowed == scope)
    }

    /// Returns `true` if PKCE must be presented at authorization time.
    /// Always `true` for public clients regardless of the flag.
    #[must_use]
    pub fn requires_pkce(&self) -> bool {
        self.application_type == ApplicationType::Public || self.pkce_required
    }

    /// Access token lifetime, falling back to the server default.
    #[must_use]
    pub fn access_token_lifetime(&self, default: Duration) -> Duration {
        self.access_token_lifetime_secs
            .map_or(default, Duration::from_secs)
    }

    /// Identity token lifetime, falling back to the server default.
    #[must_use]
    pub fn identity_token_lifetime(&self, default: Duration) -> Duration {
        self.identity_token_lifetime_secs
            .map_or(default, Duration::from_secs)
    }

    /// Refresh token lifetime, falling back to the server default.
    #[must_use]
    pub fn refresh_token_lifetime(&self, default: Duration) -> Duration {
        self.refresh_token_lifetime_secs
            .map_or(default, Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_public_client() -> Client {
        Client {
            client_id: "spa-app".to_string(),
            client_secret_hash: None,
            name: "Single Page App".to_string(),
            application_type: ApplicationType::Public,
            redirect_uris: vec!["https://app.example.com/callback".to_string()],
            grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            response_types: vec![ResponseType::Code],
            scopes: vec!["openid".to_string(), "profile".to_string()],
            token_endpoint_auth_method: TokenEndpointAuthMethod::None,
            access_token_lifetime_secs: None,
            identity_token_lifetime_secs: None,
            refresh_token_lifetime_secs: None,
            pkce_required: true,
            active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn make_confidential_client() -> Client {
        Client {
            client_id: "backend-app".to_string(),
            client_secret_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string()),
            name: "Backend App".to_string(),
            application_type: ApplicationType::Confidential,
            redirect_uris: vec!["https://backend.example.com/cb".to_string()],
            grant_types: vec![GrantType::AuthorizationCode],
            response_types: vec![ResponseType::Code],
            scopes: vec!["openid".to_string()],
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretBasic,
            access_token_lifetime_secs: Some(600),
            identity_token_lifetime_secs: None,
            refresh_token_lifetime_secs: None,
            pkce_required: false,
            active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_valid_clients_pass_validation() {
        assert!(make_public_client().validate().is_ok());
        assert!(make_confidential_client().validate().is_ok());
    }

    #[test]
    fn test_empty_client_id_fails() {
        let mut client = make_public_client();
        client.client_id = String::new();
        let err = client.validate().unwrap_err();
        let AuthError::Validation { errors } = err else {
            panic!("expected validation error");
        };
        assert!(errors.field("client_id").is_some());
    }

    #[test]
    fn test_public_client_without_pkce_fails() {
        let mut client = make_public_client();
        client.pkce_required = false;
        let err = client.validate().unwrap_err();
        let AuthError::Validation { errors } = err else {
            panic!("expected validation error");
        };
        assert!(errors.field("pkce_required").is_some());
    }

    #[test]
    fn test_public_client_with_secret_fails() {
        let mut client = make_public_client();
        client.client_secret_hash = Some("hash".to_string());
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_confidential_client_without_secret_fails() {
        let mut client = make_confidential_client();
        client.client_secret_hash = None;
        let err = client.validate().unwrap_err();
        let AuthError::Validation { errors } = err else {
            panic!("expected validation error");
        };
        assert!(errors.field("client_secret").is_some());
    }

    #[test]
    fn test_relative_redirect_uri_fails() {
        let mut client = make_public_client();
        client.redirect_uris = vec!["/callback".to_string()];
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_fragment_redirect_uri_fails() {
        let mut client = make_public_client();
        client.redirect_uris = vec!["https://app.example.com/cb#frag".to_string()];
        assert!(client.validate().is_err());
    }

    #[test]
    fn test_validation_accumulates_all_failures() {
        let mut client = make_public_client();
        client.client_id = String::new();
        client.pkce_required = false;
        client.redirect_uris = vec!["not-a-uri".to_string()];
        let AuthError::Validation { errors } = client.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.field("client_id").is_some());
        assert!(errors.field("pkce_required").is_some());
        assert!(errors.field("redirect_uris").is_some());
    }

    #[test]
    fn test_redirect_uri_matching_is_exact() {
        let client = make_public_client();
        assert!(client.is_redirect_uri_allowed("https://app.example.com/callback"));
        assert!(!client.is_redirect_uri_allowed("https://app.example.com/callback/"));
        assert!(!client.is_redirect_uri_allowed("https://evil.example.com/callback"));
    }

    #[test]
    fn test_public_client_always_requires_pkce() {
        let mut client = make_public_client();
        // The flag cannot disable PKCE for a public client.
        client.pkce_required = false;
        assert!(client.requires_pkce());

        let mut confidential = make_confidential_client();
        assert!(!confidential.requires_pkce());
        confidential.pkce_required = true;
        assert!(confidential.requires_pkce());
    }

    #[test]
    fn test_lifetime_fallbacks() {
        let default = Duration::from_secs(3600);
        let public = make_public_client();
        assert_eq!(public.access_token_lifetime(default), default);

        let confidential = make_confidential_client();
        assert_eq!(
            confidential.access_token_lifetime(default),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_grant_type_display() {
        assert_eq!(GrantType::AuthorizationCode.to_string(), "authorization_code");
        assert_eq!(GrantType::RefreshToken.to_string(), "refresh_token");
    }
}
