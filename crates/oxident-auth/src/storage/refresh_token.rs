//! Refresh token storage trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::RefreshToken;

/// Storage backend for refresh tokens.
///
/// Tokens are stored by hash; deletion is the revocation signal.
/// Rotation replaces the old record and inserts its successor in one
/// atomic operation, so a crash mid-rotation can never leave two live
/// tokens for the same lineage.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Persists a new refresh token.
    async fn create(&self, token: RefreshToken) -> AuthResult<RefreshToken>;

    /// Looks up a token by the SHA-256 hex hash of its secret.
    async fn find_by_hash(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    /// Atomically deletes the old token and inserts its replacement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the old token is already gone, which is
    /// how a concurrent rotation on the same lineage loses the race.
    async fn rotate(&self, old_id: Uuid, replacement: RefreshToken) -> AuthResult<RefreshToken>;

    /// Deletes a single token. Returns `true` if a token was removed.
    async fn delete(&self, id: Uuid) -> AuthResult<bool>;

    /// Deletes every token for a user and client pair within a tenant
    /// ("log out everywhere for this app"). Returns the number removed.
    async fn delete_by_user_and_client(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        client_id: &str,
    ) -> AuthResult<u64>;

    /// Deletes all tokens past their expiry. Idempotent; expiry is
    /// monotonic so the sweep cannot race with creation of new tokens.
    /// Returns the number removed.
    async fn delete_expired(&self) -> AuthResult<u64>;
}
