//! OpenID Connect discovery endpoint handler.
//!
//! Serves `GET /.well-known/openid-configuration` with the metadata
//! document described by OpenID Connect Discovery 1.0. All endpoint
//! URLs are derived from the configured issuer.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::config::AuthConfig;

/// State required for the discovery endpoint.
#[derive(Clone)]
pub struct DiscoveryState {
    /// Authorization core configuration.
    pub config: AuthConfig,
}

impl DiscoveryState {
    /// Creates a new discovery state.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }
}

/// OpenID Connect discovery endpoint handler.
///
/// Always returns 200 OK. The document is static for a given
/// configuration, so it carries a short public cache header.
pub async fn openid_configuration_handler(State(state): State<DiscoveryState>) -> impl IntoResponse {
    let issuer = state.config.issuer.trim_end_matches('/');

    let document = serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/oauth/authorize"),
        "token_endpoint": format!("{issuer}/oauth/token"),
        "jwks_uri": format!("{issuer}/.well-known/jwks.json"),
        "revocation_endpoint": format!("{issuer}/oauth/revoke"),
        "scopes_supported": state.config.oauth.supported_scopes,
        "response_types_supported": ["code"],
        "grant_types_supported": state.config.oauth.grant_types,
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": [state.config.signing.algorithm],
        "token_endpoint_auth_methods_supported": ["client_secret_basic", "client_secret_post"],
        "code_challenge_methods_supported": ["S256", "plain"],
    });

    (
        StatusCode::OK,
        [("Cache-Control", "public, max-age=3600")],
        Json(document),
    )
}
