//! Authorization request lifecycle: create, authenticate, consume.
//!
//! A request moves `Pending -> Authenticated -> Consumed`, with expiry
//! checked before every transition. The transitions themselves are
//! conditional store operations so two concurrent callers can never
//! both succeed on the same request; this service validates inputs and
//! leaves the compare-and-swap to the store.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::{AuthError, ValidationErrors};
use crate::oauth::pkce::CodeChallengeMethod;
use crate::oauth::registry::ClientRegistry;
use crate::storage::{AuthorizationRequestStorage, with_timeout};
use crate::types::{AuthorizationRequest, ResponseType};

/// Parameters for opening a new authorization request.
#[derive(Debug, Clone)]
pub struct CreateAuthorizationRequest {
    /// Public identifier of the requesting client.
    pub client_id: String,
    /// Redirect URI; must be on the client's allow-list.
    pub redirect_uri: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Requested response type.
    pub response_type: ResponseType,
    /// Opaque client state echoed back on redirect.
    pub state: Option<String>,
    /// Nonce echoed into the identity token.
    pub nonce: Option<String>,
    /// PKCE code challenge.
    pub code_challenge: Option<String>,
    /// PKCE challenge method ("plain" or "S256").
    pub code_challenge_method: Option<String>,
}

/// Drives authorization requests through their lifecycle.
///
/// Thread-safe; share via `Arc`.
pub struct AuthorizationService {
    registry: Arc<ClientRegistry>,
    store: Arc<dyn AuthorizationRequestStorage>,
    request_lifetime: std::time::Duration,
    store_timeout: std::time::Duration,
}

impl AuthorizationService {
    /// Creates a new service over the given registry and store. Every
    /// store call is bounded by the configured operation timeout.
    #[must_use]
    pub fn new(
        registry: Arc<ClientRegistry>,
        store: Arc<dyn AuthorizationRequestStorage>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            registry,
            store,
            request_lifetime: config.oauth.authorization_request_lifetime,
            store_timeout: config.store.operation_timeout,
        }
    }

    /// Validates and persists a new pending authorization request.
    ///
    /// The expiry horizon is fixed here and never extended.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client and `Validation` with a
    /// field-keyed error set for a bad redirect URI, response type,
    /// scope, or PKCE parameter.
    pub async fn create(
        &self,
        params: CreateAuthorizationRequest,
    ) -> AuthResult<AuthorizationRequest> {
        let client = self.registry.resolve(&params.client_id).await?;

        let mut errors = ValidationErrors::new();

        if !client.is_redirect_uri_allowed(&params.redirect_uri) {
            errors.add(
                "redirect_uri",
                "redirect URI is not registered for this client",
            );
        }

        if !client.is_response_type_allowed(params.response_type) {
            errors.add("response_type", "response type not allowed for this client");
        }

        if params.scopes.is_empty() {
            errors.add("scope", "at least one scope is required");
        }
        for scope in &params.scopes {
            if !client.is_scope_allowed(scope) {
                errors.add("scope", format!("scope '{scope}' not allowed"));
            }
        }

        let challenge_method = match params.code_challenge_method.as_deref() {
            Some(raw) => match CodeChallengeMethod::parse(raw) {
                Ok(method) => Some(method),
                Err(_) => {
                    errors.add(
                        "code_challenge_method",
                        format!("unsupported challenge method '{raw}'"),
                    );
                    None
                }
            },
            None => None,
        };

        if client.requires_pkce() && params.code_challenge.is_none() {
            errors.add("code_challenge", "PKCE is required for this client");
        }
        if params.code_challenge.is_none() && challenge_method.is_some() {
            errors.add(
                "code_challenge",
                "challenge method given without a challenge",
            );
        }

        errors.into_result()?;

        let now = OffsetDateTime::now_utc();
        let request = AuthorizationRequest {
            id: AuthorizationRequest::generate_id(),
            client_id: client.client_id.clone(),
            redirect_uri: params.redirect_uri,
            scopes: params.scopes,
            response_type: params.response_type,
            state: params.state,
            nonce: params.nonce,
            code_challenge: params.code_challenge,
            code_challenge_method: challenge_method,
            user_id: None,
            tenant_id: None,
            auth_time: None,
            created_at: now,
            expires_at: now + self.request_lifetime,
            consumed_at: None,
        };

        let stored = with_timeout(self.store_timeout, self.store.create(request)).await?;
        debug!(
            request_id = %stored.id,
            client_id = %stored.client_id,
            "Opened authorization request"
        );
        Ok(stored)
    }

    /// Loads a request by its opaque identifier.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub async fn load(&self, request_id: &str) -> AuthResult<AuthorizationRequest> {
        with_timeout(self.store_timeout, self.store.find_by_id(request_id))
            .await?
            .ok_or_else(|| AuthError::not_found("authorization request not found"))
    }

    /// Records that the end user authenticated for this request.
    ///
    /// User, tenant, and authentication time are set exactly once; the
    /// store rejects the transition for anything but a live `Pending`
    /// request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Expired` if past the horizon
    /// (checked before any mutation), and `InvalidState` if already
    /// authenticated or consumed.
    pub async fn complete_authentication(
        &self,
        request_id: &str,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> AuthResult<AuthorizationRequest> {
        let request = with_timeout(
            self.store_timeout,
            self.store
                .complete_authentication(request_id, user_id, tenant_id, OffsetDateTime::now_utc()),
        )
        .await?;
        info!(
            request_id = %request.id,
            client_id = %request.client_id,
            "Authorization request authenticated"
        );
        Ok(request)
    }

    /// Atomically consumes an authenticated request, returning its
    /// final snapshot. A consumed request can never be consumed again.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Expired` if past the horizon, and
    /// `InvalidState` if still pending or already consumed.
    pub async fn consume(&self, request_id: &str) -> AuthResult<AuthorizationRequest> {
        let request = with_timeout(self.store_timeout, self.store.consume(request_id)).await?;
        debug!(request_id = %request.id, "Authorization request consumed");
        Ok(request)
    }
}
