//! In-memory refresh token store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use oxident_auth::AuthResult;
use oxident_auth::error::AuthError;
use oxident_auth::storage::RefreshTokenStorage;
use oxident_auth::types::RefreshToken;

/// Refresh tokens keyed by identifier, with a hash index for lookup.
///
/// `rotate` removes the old token and inserts its replacement under
/// one write guard. A concurrent rotation on the same lineage finds
/// the old identifier already gone and loses with `NotFound`, so at
/// most one successor is ever created.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    inner: RwLock<Maps>,
}

#[derive(Default)]
struct Maps {
    by_id: HashMap<Uuid, RefreshToken>,
    id_by_hash: HashMap<String, Uuid>,
}

impl Maps {
    fn insert(&mut self, token: RefreshToken) {
        self.id_by_hash.insert(token.token_hash.clone(), token.id);
        self.by_id.insert(token.id, token);
    }

    fn remove(&mut self, id: Uuid) -> Option<RefreshToken> {
        let token = self.by_id.remove(&id)?;
        self.id_by_hash.remove(&token.token_hash);
        Some(token)
    }
}

impl InMemoryRefreshTokenStore {
    /// Creates an empty refresh token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStorage for InMemoryRefreshTokenStore {
    async fn create(&self, token: RefreshToken) -> AuthResult<RefreshToken> {
        let mut inner = self.inner.write().await;
        inner.insert(token.clone());
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        let inner = self.inner.read().await;
        Ok(inner
            .id_by_hash
            .get(token_hash)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn rotate(&self, old_id: Uuid, replacement: RefreshToken) -> AuthResult<RefreshToken> {
        let mut inner = self.inner.write().await;
        if inner.remove(old_id).is_none() {
            return Err(AuthError::not_found("refresh token does not exist"));
        }
        inner.insert(replacement.clone());
        Ok(replacement)
    }

    async fn delete(&self, id: Uuid) -> AuthResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.remove(id).is_some())
    }

    async fn delete_by_user_and_client(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        client_id: &str,
    ) -> AuthResult<u64> {
        let mut inner = self.inner.write().await;
        let doomed: Vec<Uuid> = inner
            .by_id
            .values()
            .filter(|token| {
                token.tenant_id == tenant_id
                    && token.user_id == user_id
                    && token.client_id == client_id
            })
            .map(|token| token.id)
            .collect();
        for id in &doomed {
            inner.remove(*id);
        }
        Ok(doomed.len() as u64)
    }

    async fn delete_expired(&self) -> AuthResult<u64> {
        let mut inner = self.inner.write().await;
        let doomed: Vec<Uuid> = inner
            .by_id
            .values()
            .filter(|token| token.is_expired())
            .map(|token| token.id)
            .collect();
        for id in &doomed {
            inner.remove(*id);
        }
        Ok(doomed.len() as u64)
    }
}
