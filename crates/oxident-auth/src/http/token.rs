//! Token endpoint HTTP handler.
//!
//! Handles `POST /oauth/token` with `application/x-www-form-urlencoded`
//! bodies for two grant types:
//!
//! - `authorization_code` - exchange a consumed authorization grant
//! - `refresh_token` - rotate a refresh token
//!
//! # Example
//!
//! ```ignore
//! POST /oauth/token
//! Content-Type: application/x-www-form-urlencoded
//!
//! grant_type=authorization_code
//! &code=qfF1bZVMSmBvE1kCJ0KState
//! &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb
//! &code_verifier=dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk
//! &client_id=web-app
//! ```

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use base64::Engine;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::oauth::registry::ClientRegistry;
use crate::oauth::token::{TokenError, TokenErrorCode, TokenRequest, TokenResponse};
use crate::token::service::TokenIssuer;
use crate::types::Client;

/// State required for the token endpoint.
#[derive(Clone)]
pub struct TokenState {
    /// Issuer performing the grant work.
    pub issuer: Arc<TokenIssuer>,
    /// Registry for authenticating the calling client.
    pub registry: Arc<ClientRegistry>,
}

impl TokenState {
    /// Creates a new token state.
    #[must_use]
    pub fn new(issuer: Arc<TokenIssuer>, registry: Arc<ClientRegistry>) -> Self {
        Self { issuer, registry }
    }
}

/// OAuth 2.0 token endpoint handler.
///
/// # Client Authentication
///
/// Clients authenticate using:
/// - HTTP Basic Auth header: `Authorization: Basic <base64(client_id:client_secret)>`
/// - Request body: `client_id` and `client_secret` parameters
/// - Public client: just `client_id` (with PKCE)
pub async fn token_handler(
    State(state): State<TokenState>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Response {
    debug!(
        grant_type = %request.grant_type,
        client_id = ?request.client_id,
        "Processing token request"
    );

    let client = match authenticate_client(
        &state.registry,
        &headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Client authentication failed");
            return error_response(&e);
        }
    };

    let result = match request.grant_type.as_str() {
        "authorization_code" => exchange_grant(&state, &request, &client).await,
        "refresh_token" => refresh_grant(&state, &request, &client).await,
        other => {
            warn!(grant_type = other, "Unsupported grant type");
            return wire_error_response(TokenError::with_description(
                TokenErrorCode::UnsupportedGrantType,
                format!("grant type '{other}' is not supported"),
            ));
        }
    };

    match result {
        Ok(response) => {
            info!(
                client_id = %client.client_id,
                grant_type = %request.grant_type,
                "Token issued"
            );
            success_response(response)
        }
        Err(e) => {
            warn!(
                client_id = %client.client_id,
                grant_type = %request.grant_type,
                error = %e,
                "Token request failed"
            );
            error_response(&e)
        }
    }
}

async fn exchange_grant(
    state: &TokenState,
    request: &TokenRequest,
    client: &Client,
) -> Result<TokenResponse, AuthError> {
    let code = request
        .code
        .as_deref()
        .ok_or_else(|| AuthError::validation("code", "code is required"))?;

    let set = state
        .issuer
        .exchange(
            client,
            code,
            request.code_verifier.as_deref(),
            request.redirect_uri.as_deref(),
        )
        .await?;
    Ok(set.into())
}

async fn refresh_grant(
    state: &TokenState,
    request: &TokenRequest,
    client: &Client,
) -> Result<TokenResponse, AuthError> {
    let secret = request
        .refresh_token
        .as_deref()
        .ok_or_else(|| AuthError::validation("refresh_token", "refresh_token is required"))?;

    let set = state
        .issuer
        .refresh(client, secret, request.scope_list().as_deref())
        .await?;
    Ok(set.into())
}

/// Extracts client credentials from the Basic auth header or body
/// parameters and authenticates against the registry.
pub(crate) async fn authenticate_client(
    registry: &Arc<ClientRegistry>,
    headers: &HeaderMap,
    body_client_id: Option<&str>,
    body_client_secret: Option<&str>,
) -> Result<Client, AuthError> {
    if let Some((client_id, client_secret)) = basic_credentials(headers) {
        return registry
            .authenticate(&client_id, Some(&client_secret))
            .await;
    }

    let client_id = body_client_id
        .ok_or_else(|| AuthError::validation("client_id", "no client credentials provided"))?;

    registry.authenticate(client_id, body_client_secret).await
}

/// Parses `Authorization: Basic <base64(client_id:client_secret)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    let encoded = auth.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let creds = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = creds.split_once(':')?;
    Some((client_id.to_string(), client_secret.to_string()))
}

fn success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}

pub(crate) fn error_response(error: &AuthError) -> Response {
    wire_error_response(TokenError::from_auth_error(error))
}

fn wire_error_response(error: TokenError) -> Response {
    let status =
        StatusCode::from_u16(error.error.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    (
        status,
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
        ],
        Json(error),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_basic_credentials_parsing() {
        let mut headers = HeaderMap::new();
        let encoded = base64::engine::general_purpose::STANDARD.encode("web-app:cs_secret");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );

        let (client_id, secret) = basic_credentials(&headers).unwrap();
        assert_eq!(client_id, "web-app");
        assert_eq!(secret, "cs_secret");
    }

    #[test]
    fn test_basic_credentials_rejects_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert!(basic_credentials(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Basic ???"));
        assert!(basic_credentials(&headers).is_none());
    }
}
