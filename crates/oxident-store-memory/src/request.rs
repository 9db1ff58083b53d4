//! In-memory authorization request store.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use oxident_auth::AuthResult;
use oxident_auth::error::AuthError;
use oxident_auth::storage::AuthorizationRequestStorage;
use oxident_auth::types::AuthorizationRequest;

/// Authorization requests keyed by their opaque identifier.
///
/// Both state transitions run under a single write guard, which is
/// what makes them atomic here: of two concurrent `consume` calls on
/// the same identifier, the second observes `consumed_at` already set.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<String, AuthorizationRequest>>,
}

impl InMemoryRequestStore {
    /// Creates an empty request store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorizationRequestStorage for InMemoryRequestStore {
    async fn create(&self, request: AuthorizationRequest) -> AuthResult<AuthorizationRequest> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<AuthorizationRequest>> {
        Ok(self.requests.read().await.get(id).cloned())
    }

    async fn complete_authentication(
        &self,
        id: &str,
        user_id: Uuid,
        tenant_id: Uuid,
        auth_time: OffsetDateTime,
    ) -> AuthResult<AuthorizationRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(id)
            .ok_or_else(|| AuthError::not_found("authorization request does not exist"))?;

        // Expiry is checked before any mutation; user and tenant stay
        // unset on an expired request.
        if request.is_expired() {
            return Err(AuthError::expired("authorization request has expired"));
        }
        if request.is_consumed() {
            return Err(AuthError::invalid_state(
                "authorization request is already consumed",
            ));
        }
        if request.is_authenticated() {
            return Err(AuthError::invalid_state(
                "authorization request is already authenticated",
            ));
        }

        request.user_id = Some(user_id);
        request.tenant_id = Some(tenant_id);
        request.auth_time = Some(auth_time);
        Ok(request.clone())
    }

    async fn consume(&self, id: &str) -> AuthResult<AuthorizationRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(id)
            .ok_or_else(|| AuthError::not_found("authorization request does not exist"))?;

        if request.is_expired() {
            return Err(AuthError::expired("authorization request has expired"));
        }
        if request.is_consumed() {
            return Err(AuthError::invalid_state(
                "authorization request is already consumed",
            ));
        }
        if !request.is_authenticated() {
            return Err(AuthError::invalid_state(
                "authorization request is still pending authentication",
            ));
        }

        request.consumed_at = Some(OffsetDateTime::now_utc());
        Ok(request.clone())
    }

    async fn delete_expired(&self) -> AuthResult<u64> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|_, request| !request.is_expired());
        Ok((before - requests.len()) as u64)
    }
}
