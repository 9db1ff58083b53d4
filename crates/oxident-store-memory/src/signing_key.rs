//! In-memory signing key store.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use oxident_auth::AuthResult;
use oxident_auth::error::AuthError;
use oxident_auth::storage::SigningKeyStorage;
use oxident_auth::types::SigningKey;

/// Signing keys keyed by identifier.
///
/// `promote` demotes the previous active key and activates the new one
/// under a single write guard, so readers always observe exactly one
/// active key.
#[derive(Default)]
pub struct InMemorySigningKeyStore {
    keys: RwLock<HashMap<String, SigningKey>>,
}

impl InMemorySigningKeyStore {
    /// Creates an empty signing key store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SigningKeyStorage for InMemorySigningKeyStore {
    async fn insert(&self, key: SigningKey) -> AuthResult<SigningKey> {
        let mut keys = self.keys.write().await;
        keys.insert(key.kid.clone(), key.clone());
        Ok(key)
    }

    async fn find_active(&self) -> AuthResult<Option<SigningKey>> {
        let keys = self.keys.read().await;
        Ok(keys.values().find(|key| key.active).cloned())
    }

    async fn find_by_kid(&self, kid: &str) -> AuthResult<Option<SigningKey>> {
        Ok(self.keys.read().await.get(kid).cloned())
    }

    async fn verification_keys(&self) -> AuthResult<Vec<SigningKey>> {
        let keys = self.keys.read().await;
        let mut usable: Vec<SigningKey> = keys
            .values()
            .filter(|key| key.is_verification_usable())
            .cloned()
            .collect();
        // Active key first, then newest demoted keys.
        usable.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(usable)
    }

    async fn promote(
        &self,
        kid: &str,
        demoted_expires_at: OffsetDateTime,
    ) -> AuthResult<SigningKey> {
        let mut keys = self.keys.write().await;
        if !keys.contains_key(kid) {
            return Err(AuthError::not_found(format!(
                "signing key '{kid}' does not exist"
            )));
        }

        for key in keys.values_mut() {
            if key.active && key.kid != kid {
                key.active = false;
                if key.expires_at.is_none() {
                    key.expires_at = Some(demoted_expires_at);
                }
            }
        }

        // Checked above; the map is not touched between the check and here.
        let promoted = keys
            .get_mut(kid)
            .ok_or_else(|| AuthError::not_found(format!("signing key '{kid}' does not exist")))?;
        promoted.active = true;
        promoted.expires_at = None;
        Ok(promoted.clone())
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let mut keys = self.keys.write().await;
        let before = keys.len();
        keys.retain(|_, key| key.active || !key.is_expired());
        Ok((before - keys.len()) as u64)
    }
}
