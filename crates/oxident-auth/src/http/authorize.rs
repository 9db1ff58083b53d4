//! Authorization endpoint HTTP handler.
//!
//! Opens a pending authorization request for a client. The embedding
//! application owns user authentication: it receives the opaque request
//! identifier from this endpoint, authenticates the end user however it
//! chooses, calls
//! [`AuthorizationService::complete_authentication`](crate::oauth::service::AuthorizationService::complete_authentication),
//! and finally redirects the user agent back to the client with
//! [`AuthorizeResponse::to_redirect_url`](crate::oauth::authorize::AuthorizeResponse::to_redirect_url).
//!
//! Errors are redirected to the client's redirect URI only after that
//! URI has been validated against the client's allow-list; an unknown
//! client or unregistered URI is answered directly, never redirected.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::oauth::authorize::{AuthorizeError, AuthorizeErrorCode, AuthorizeParams};
use crate::oauth::registry::ClientRegistry;
use crate::oauth::service::{AuthorizationService, CreateAuthorizationRequest};
use crate::types::ResponseType;

/// State for the authorize handler.
#[derive(Clone)]
pub struct AuthorizeState {
    /// Authorization service for opening requests.
    pub authorization_service: Arc<AuthorizationService>,
    /// Client registry for pre-validating the redirect URI.
    pub registry: Arc<ClientRegistry>,
}

impl AuthorizeState {
    /// Creates a new authorize state.
    #[must_use]
    pub fn new(
        authorization_service: Arc<AuthorizationService>,
        registry: Arc<ClientRegistry>,
    ) -> Self {
        Self {
            authorization_service,
            registry,
        }
    }
}

/// Handler for `GET /oauth/authorize`.
///
/// On success returns `200 OK` with the opaque request identifier and
/// echoed state; the embedding application completes authentication and
/// performs the final redirect. On failure redirects to the validated
/// redirect URI with an RFC 6749 error, or answers `400`/`404` directly
/// when the redirect URI itself cannot be trusted.
pub async fn authorize_handler(
    State(state): State<AuthorizeState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    debug!(
        client_id = %params.client_id,
        response_type = %params.response_type,
        "Processing authorization request"
    );

    // The redirect URI must be proven registered before any error is
    // sent through it.
    let client = match state.registry.resolve(&params.client_id).await {
        Ok(client) => client,
        Err(e) => {
            warn!(client_id = %params.client_id, error = %e, "Unknown client");
            return direct_error_response(&e);
        }
    };
    if !client.is_redirect_uri_allowed(&params.redirect_uri) {
        warn!(
            client_id = %params.client_id,
            redirect_uri = %params.redirect_uri,
            "Unregistered redirect URI"
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(AuthorizeError::with_description(
                AuthorizeErrorCode::InvalidRequest,
                "redirect URI is not registered for this client",
                params.state.clone(),
            )),
        )
            .into_response();
    }

    if params.response_type != "code" {
        return redirect_error(
            &params,
            AuthorizeError::with_description(
                AuthorizeErrorCode::UnsupportedResponseType,
                format!("response type '{}' is not supported", params.response_type),
                params.state.clone(),
            ),
        );
    }

    let request = CreateAuthorizationRequest {
        client_id: params.client_id.clone(),
        redirect_uri: params.redirect_uri.clone(),
        scopes: params.scope_list(),
        response_type: ResponseType::Code,
        state: params.state.clone(),
        nonce: params.nonce.clone(),
        code_challenge: params.code_challenge.clone(),
        code_challenge_method: params.code_challenge_method.clone(),
    };

    match state.authorization_service.create(request).await {
        Ok(opened) => {
            debug!(request_id = %opened.id, "Authorization request opened");
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "request_id": opened.id,
                    "state": opened.state,
                    "expires_at": opened.expires_at,
                })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(client_id = %params.client_id, error = %e, "Authorization request rejected");
            redirect_error(&params, map_error(&e, params.state.clone()))
        }
    }
}

/// Maps an internal error onto the RFC 6749 authorization error set.
fn map_error(err: &AuthError, state: Option<String>) -> AuthorizeError {
    let code = match err {
        AuthError::Validation { errors } => {
            if errors.field("scope").is_some() {
                AuthorizeErrorCode::InvalidScope
            } else if errors.field("response_type").is_some() {
                AuthorizeErrorCode::UnsupportedResponseType
            } else {
                AuthorizeErrorCode::InvalidRequest
            }
        }
        AuthError::StoreUnavailable { .. } => AuthorizeErrorCode::TemporarilyUnavailable,
        AuthError::CryptoFailure { .. } => AuthorizeErrorCode::ServerError,
        _ => AuthorizeErrorCode::InvalidRequest,
    };
    AuthorizeError::with_description(code, err.to_string(), state)
}

/// Redirects the error through the already-validated redirect URI.
fn redirect_error(params: &AuthorizeParams, error: AuthorizeError) -> Response {
    match error.to_redirect_url(&params.redirect_uri) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    }
}

/// Answers an error directly when no trusted redirect URI exists.
fn direct_error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
        AuthError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(serde_json::json!({
            "error": "invalid_request",
            "error_description": err.to_string(),
        })),
    )
        .into_response()
}
