//! Authorization request storage trait.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::AuthorizationRequest;

/// Storage backend for authorization requests.
///
/// The store owns the request lifecycle. Both state transitions are
/// conditional updates evaluated inside a single atomic operation; a
/// load-then-store implementation would reopen the replay window the
/// spec of `consume` exists to close.
///
/// Before authentication a request has no tenant and is reachable only
/// by its opaque identifier, never through any cross-tenant listing.
#[async_trait]
pub trait AuthorizationRequestStorage: Send + Sync {
    /// Persists a new pending request.
    async fn create(&self, request: AuthorizationRequest) -> AuthResult<AuthorizationRequest>;

    /// Looks up a request by its opaque identifier.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<AuthorizationRequest>>;

    /// Binds the request to an authenticated user, exactly once.
    ///
    /// Conditional update, equivalent to:
    ///
    /// ```sql
    /// UPDATE authorization_requests
    /// SET user_id = $2, tenant_id = $3, auth_time = $4
    /// WHERE id = $1
    ///   AND user_id IS NULL
    ///   AND consumed_at IS NULL
    ///   AND expires_at > NOW()
    /// RETURNING *
    /// ```
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `Expired` if past the deadline (checked before any mutation;
    ///   user/tenant stay unset)
    /// - `InvalidState` if already authenticated or consumed
    async fn complete_authentication(
        &self,
        id: &str,
        user_id: Uuid,
        tenant_id: Uuid,
        auth_time: OffsetDateTime,
    ) -> AuthResult<AuthorizationRequest>;

    /// Atomically marks the request consumed and returns the snapshot.
    ///
    /// Single read-and-mark operation, equivalent to:
    ///
    /// ```sql
    /// UPDATE authorization_requests
    /// SET consumed_at = NOW()
    /// WHERE id = $1
    ///   AND user_id IS NOT NULL
    ///   AND consumed_at IS NULL
    ///   AND expires_at > NOW()
    /// RETURNING *
    /// ```
    ///
    /// Of two concurrent calls on the same identifier, exactly one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `Expired` if past the deadline
    /// - `InvalidState` if still pending or already consumed
    async fn consume(&self, id: &str) -> AuthResult<AuthorizationRequest>;

    /// Deletes all requests past their expiry, authenticated or not.
    /// Idempotent; safe to run concurrently with normal traffic.
    /// Returns the number of requests removed.
    async fn delete_expired(&self) -> AuthResult<u64>;
}
