//! JWKS endpoint handler.
//!
//! Serves `GET /.well-known/jwks.json` with the public halves of every
//! key currently usable for verification, active and demoted alike.
//! Resource servers poll this document to validate token signatures
//! across rotations.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::{IntoResponse, Response}};
use tracing::warn;

use crate::error::AuthError;
use crate::token::keys::SigningKeyManager;

/// State required for the JWKS endpoint.
#[derive(Clone)]
pub struct JwksState {
    /// Key manager holding the verification key set.
    pub keys: Arc<SigningKeyManager>,
}

impl JwksState {
    /// Creates a new JWKS state.
    #[must_use]
    pub fn new(keys: Arc<SigningKeyManager>) -> Self {
        Self { keys }
    }
}

/// JWKS endpoint handler.
///
/// The set only changes on rotation, so responses carry a public
/// cache header to keep resource-server polling cheap.
pub async fn jwks_handler(State(state): State<JwksState>) -> Response {
    match state.keys.jwks().await {
        Ok(jwks) => (
            StatusCode::OK,
            [("Cache-Control", "public, max-age=3600")],
            Json(jwks),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to build JWKS document");
            let status = match e {
                AuthError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(serde_json::json!({
                    "error": "server_error",
                    "error_description": "key set is temporarily unavailable",
                })),
            )
                .into_response()
        }
    }
}
