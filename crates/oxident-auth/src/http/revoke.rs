//! Token revocation endpoint handler (RFC 7009).
//!
//! Handles `POST /oauth/revoke`. The caller authenticates like at the
//! token endpoint and submits the refresh token secret it wants revoked.
//!
//! # Request Format
//!
//! ```text
//! POST /oauth/revoke
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <client_credentials>
//!
//! token=<refresh_token>&token_type_hint=refresh_token
//! ```
//!
//! Per RFC 7009 the endpoint returns 200 OK even when the token is
//! unknown or already revoked, so callers cannot probe for token
//! existence. Only client authentication failures surface as errors.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::oauth::registry::ClientRegistry;
use crate::token::service::TokenIssuer;

use super::token::authenticate_client;

/// State required for the revocation endpoint.
#[derive(Clone)]
pub struct RevocationState {
    /// Issuer performing the revocation.
    pub issuer: Arc<TokenIssuer>,
    /// Registry for authenticating the calling client.
    pub registry: Arc<ClientRegistry>,
}

impl RevocationState {
    /// Creates a new revocation state.
    #[must_use]
    pub fn new(issuer: Arc<TokenIssuer>, registry: Arc<ClientRegistry>) -> Self {
        Self { issuer, registry }
    }
}

/// Form parameters for the revocation endpoint (RFC 7009).
#[derive(Debug, Deserialize)]
pub struct RevocationForm {
    /// The token to revoke.
    pub token: String,

    /// Optional hint about the token type. Only refresh tokens are
    /// revocable here, so the hint is accepted and ignored.
    #[serde(default)]
    pub token_type_hint: Option<String>,

    /// Client ID (for public clients or client_secret_post).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (for client_secret_post authentication).
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Token revocation endpoint handler.
///
/// - 200 OK: token revoked, or was already unknown
/// - 400 Bad Request: missing token parameter
/// - 401 Unauthorized: invalid client credentials
pub async fn revoke_handler(
    State(state): State<RevocationState>,
    headers: HeaderMap,
    Form(form): Form<RevocationForm>,
) -> Response {
    if form.token.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_request",
                "error_description": "missing required 'token' parameter",
            })),
        )
            .into_response();
    }

    let client = match authenticate_client(
        &state.registry,
        &headers,
        form.client_id.as_deref(),
        form.client_secret.as_deref(),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "Revocation: client authentication failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "invalid_client",
                    "error_description": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    match state.issuer.revoke(&form.token, &client.client_id).await {
        Ok(()) => {
            info!(client_id = %client.client_id, "Token revoked");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            // RFC 7009: do not reveal token state to the caller.
            warn!(
                client_id = %client.client_id,
                error = %e,
                "Revocation error suppressed, returning 200 OK"
            );
            StatusCode::OK.into_response()
        }
    }
}
