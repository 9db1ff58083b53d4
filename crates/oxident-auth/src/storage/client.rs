//! Client storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Storage backend for registered clients.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Persists a new client.
    ///
    /// Fails with `Validation` if the client identifier is already taken.
    async fn create(&self, client: Client) -> AuthResult<Client>;

    /// Looks up a client by its public identifier. Returns `None` for
    /// unknown identifiers; deactivated clients are still returned and
    /// filtered by the registry.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;

    /// Replaces a client record. The identifier is immutable; only the
    /// secret hash, redirect list, and flags may change.
    ///
    /// Fails with `NotFound` if the client does not exist.
    async fn update(&self, client: Client) -> AuthResult<Client>;

    /// Soft-deactivates a client. Clients are never hard-deleted while
    /// live tokens may reference them.
    ///
    /// Fails with `NotFound` if the client does not exist.
    async fn deactivate(&self, client_id: &str) -> AuthResult<()>;
}
