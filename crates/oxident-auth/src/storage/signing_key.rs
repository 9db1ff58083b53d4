//! Signing key storage trait.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::SigningKey;

/// Storage backend for signing keys.
///
/// At most one key is active at any instant. Promotion is a single
/// atomic swap so a concurrent signer always observes exactly one
/// active key, never zero.
#[async_trait]
pub trait SigningKeyStorage: Send + Sync {
    /// Persists a new key. New keys are inserted inactive and made
    /// active through [`SigningKeyStorage::promote`].
    async fn insert(&self, key: SigningKey) -> AuthResult<SigningKey>;

    /// Returns the currently active key, if any.
    async fn find_active(&self) -> AuthResult<Option<SigningKey>>;

    /// Looks up a key by its identifier.
    async fn find_by_kid(&self, kid: &str) -> AuthResult<Option<SigningKey>>;

    /// Returns every non-expired key (active and demoted), for JWKS and
    /// token verification during rotation overlap.
    async fn verification_keys(&self) -> AuthResult<Vec<SigningKey>>;

    /// Atomically activates the named key and demotes the previous
    /// active key, stamping it with `demoted_expires_at` if it had no
    /// expiry. Returns the newly active key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no key with that identifier exists.
    async fn promote(
        &self,
        kid: &str,
        demoted_expires_at: OffsetDateTime,
    ) -> AuthResult<SigningKey>;

    /// Deletes keys past their expiry. Never touches the active key.
    /// Returns the number removed.
    async fn purge_expired(&self) -> AuthResult<u64>;
}
