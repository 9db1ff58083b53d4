//! Signing key lifecycle: bootstrap, rotation, JWKS export.
//!
//! The active key pair is cached behind an `ArcSwap` so signing reads
//! are lock-free; rotation swaps the pointer after the store promote
//! commits. Demoted keys stay verification-usable for the configured
//! overlap so tokens signed just before a rotation still verify.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use jsonwebtoken::TokenData;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::{SigningKeyStorage, with_timeout};
use crate::token::jwt::{
    self, Jwks, SigningAlgorithm, SigningKeyPair, decoding_key_from_public_pem, header_kid,
    public_pem_to_jwk, verify_with_key,
};
use crate::types::{EncryptedPem, MASTER_KEY_SIZE, SigningKey};

/// Manages the signing key set for token issuance and verification.
///
/// Thread-safe; share via `Arc`.
pub struct SigningKeyManager {
    store: Arc<dyn SigningKeyStorage>,
    master_key: [u8; MASTER_KEY_SIZE],
    algorithm: SigningAlgorithm,
    rotation_overlap: std::time::Duration,
    rotation_period: std::time::Duration,
    store_timeout: std::time::Duration,
    active: ArcSwapOption<SigningKeyPair>,
}

impl SigningKeyManager {
    /// Creates a new key manager. Call [`SigningKeyManager::bootstrap`]
    /// before issuing tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured algorithm is not supported.
    pub fn new(
        store: Arc<dyn SigningKeyStorage>,
        master_key: [u8; MASTER_KEY_SIZE],
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        let algorithm: SigningAlgorithm = config.signing.algorithm.parse()?;

        Ok(Self {
            store,
            master_key,
            algorithm,
            rotation_overlap: config.signing.rotation_overlap,
            rotation_period: config.signing.rotation_period,
            store_timeout: config.store.operation_timeout,
            active: ArcSwapOption::const_empty(),
        })
    }

    /// Loads the active key from the store, generating and promoting a
    /// first key if none exists yet. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure, or `CryptoFailure` if the
    /// stored private key cannot be opened with the master key.
    pub async fn bootstrap(&self) -> AuthResult<()> {
        if let Some(record) = with_timeout(self.store_timeout, self.store.find_active()).await? {
            let pair = self.load_pair(&record)?;
            debug!(kid = %pair.kid, "Loaded active signing key");
            self.active.store(Some(Arc::new(pair)));
            return Ok(());
        }

        let pair = self.generate_pair()?;
        self.persist(&pair).await?;
        info!(kid = %pair.kid, algorithm = %pair.algorithm, "Generated initial signing key");
        self.active.store(Some(Arc::new(pair)));
        Ok(())
    }

    /// Returns the cached active key pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when no key has been bootstrapped.
    pub fn active_pair(&self) -> AuthResult<Arc<SigningKeyPair>> {
        self.active
            .load_full()
            .ok_or_else(|| AuthError::invalid_state("no active signing key"))
    }

    /// Generates a fresh key, promotes it, and demotes the previous
    /// active key. The demoted key stays verification-usable for the
    /// rotation overlap window. Returns the new `kid`.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation or the store promote fails.
    pub async fn rotate(&self) -> AuthResult<String> {
        let pair = self.generate_pair()?;
        self.persist(&pair).await?;

        let previous = self.active.load_full().map(|p| p.kid.clone());
        info!(
            new_kid = %pair.kid,
            previous_kid = previous.as_deref().unwrap_or("none"),
            "Rotated signing key"
        );

        let kid = pair.kid.clone();
        self.active.store(Some(Arc::new(pair)));
        Ok(kid)
    }

    /// Rotates only when the active key is older than the configured
    /// rotation period. Returns the new `kid` when a rotation happened.
    /// Intended for the background maintenance loop.
    ///
    /// # Errors
    ///
    /// Returns an error if a due rotation fails.
    pub async fn rotate_if_due(&self) -> AuthResult<Option<String>> {
        let Some(active) = self.active.load_full() else {
            return Ok(None);
        };
        if OffsetDateTime::now_utc() < active.created_at + self.rotation_period {
            return Ok(None);
        }
        Ok(Some(self.rotate().await?))
    }

    /// Exports every verification-usable public key as a JWKS.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure or a malformed stored PEM.
    pub async fn jwks(&self) -> AuthResult<Jwks> {
        let mut jwks = Jwks::new();
        for record in with_timeout(self.store_timeout, self.store.verification_keys()).await? {
            jwks.add_key(public_pem_to_jwk(
                record.kid.clone(),
                record.algorithm,
                &record.public_key_pem,
            )?);
        }
        Ok(jwks)
    }

    /// Verifies a token against whichever key its `kid` header names,
    /// provided that key is still verification-usable.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown `kid`, `Expired` for a retired
    /// key or an expired token, and `CryptoFailure` for a bad signature.
    pub async fn verify_token<T: DeserializeOwned>(
        &self,
        token: &str,
        issuer: &str,
    ) -> AuthResult<TokenData<T>> {
        let kid = header_kid(token)?;

        // Fast path: the active pair verifies without a store read.
        if let Some(pair) = self.active.load_full() {
            if pair.kid == kid {
                return Ok(pair.verify(token, issuer)?);
            }
        }

        let record = with_timeout(self.store_timeout, self.store.find_by_kid(&kid))
            .await?
            .ok_or_else(|| jwt::JwtError::key_not_found(&kid))?;

        if !record.is_verification_usable() {
            return Err(AuthError::expired(format!(
                "signing key '{kid}' is past its retirement window"
            )));
        }

        let key = decoding_key_from_public_pem(record.algorithm, &record.public_key_pem)?;
        Ok(verify_with_key(token, record.algorithm, &key, issuer)?)
    }

    fn generate_pair(&self) -> Result<SigningKeyPair, AuthError> {
        let pair = if self.algorithm.is_rsa() {
            SigningKeyPair::generate_rsa(self.algorithm)?
        } else {
            SigningKeyPair::generate_ec()?
        };
        Ok(pair)
    }

    /// Inserts the pair with its private PEM sealed, then promotes it.
    async fn persist(&self, pair: &SigningKeyPair) -> AuthResult<()> {
        let record = SigningKey {
            kid: pair.kid.clone(),
            algorithm: pair.algorithm,
            private_key: EncryptedPem::seal(pair.private_key_pem(), &self.master_key)?,
            public_key_pem: pair.public_key_pem().to_string(),
            active: false,
            created_at: pair.created_at,
            expires_at: None,
        };

        with_timeout(self.store_timeout, self.store.insert(record)).await?;
        with_timeout(
            self.store_timeout,
            self.store
                .promote(&pair.kid, OffsetDateTime::now_utc() + self.rotation_overlap),
        )
        .await?;
        Ok(())
    }

    fn load_pair(&self, record: &SigningKey) -> Result<SigningKeyPair, AuthError> {
        let private_pem = record.private_key.open(&self.master_key)?;
        Ok(SigningKeyPair::from_pem(
            record.kid.clone(),
            record.algorithm,
            &private_pem,
            &record.public_key_pem,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::token::jwt::AccessTokenClaims;
    use crate::types::generate_master_key;

    /// In-memory key store mirroring the promote/demote contract.
    #[derive(Default)]
    struct MockKeyStore {
        keys: RwLock<HashMap<String, SigningKey>>,
    }

    #[async_trait]
    impl SigningKeyStorage for MockKeyStore {
        async fn insert(&self, key: SigningKey) -> AuthResult<SigningKey> {
            let mut keys = self.keys.write().await;
            keys.insert(key.kid.clone(), key.clone());
            Ok(key)
        }

        async fn find_active(&self) -> AuthResult<Option<SigningKey>> {
            let keys = self.keys.read().await;
            Ok(keys.values().find(|k| k.active).cloned())
        }

        async fn find_by_kid(&self, kid: &str) -> AuthResult<Option<SigningKey>> {
            let keys = self.keys.read().await;
            Ok(keys.get(kid).cloned())
        }

        async fn verification_keys(&self) -> AuthResult<Vec<SigningKey>> {
            let keys = self.keys.read().await;
            Ok(keys
                .values()
                .filter(|k| k.is_verification_usable())
                .cloned()
                .collect())
        }

        async fn promote(
            &self,
            kid: &str,
            demoted_expires_at: OffsetDateTime,
        ) -> AuthResult<SigningKey> {
            let mut keys = self.keys.write().await;
            if !keys.contains_key(kid) {
                return Err(AuthError::not_found(format!("key '{kid}' not found")));
            }
            for key in keys.values_mut() {
                if key.active && key.kid != kid {
                    key.active = false;
                    if key.expires_at.is_none() {
                        key.expires_at = Some(demoted_expires_at);
                    }
                }
            }
            let key = keys
                .get_mut(kid)
                .ok_or_else(|| AuthError::not_found("key vanished"))?;
            key.active = true;
            key.expires_at = None;
            Ok(key.clone())
        }

        async fn purge_expired(&self) -> AuthResult<u64> {
            let mut keys = self.keys.write().await;
            let before = keys.len();
            keys.retain(|_, k| k.active || !k.is_expired());
            Ok((before - keys.len()) as u64)
        }
    }

    fn manager(store: Arc<MockKeyStore>, master: [u8; MASTER_KEY_SIZE]) -> SigningKeyManager {
        SigningKeyManager::new(store, master, &AuthConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_creates_active_key() {
        let store = Arc::new(MockKeyStore::default());
        let mgr = manager(store.clone(), generate_master_key());

        mgr.bootstrap().await.unwrap();

        let active = store.find_active().await.unwrap().unwrap();
        assert!(active.active);
        assert!(active.expires_at.is_none());
        assert_eq!(mgr.active_pair().unwrap().kid, active.kid);
    }

    #[tokio::test]
    async fn test_bootstrap_reuses_existing_key() {
        let store = Arc::new(MockKeyStore::default());
        let master = generate_master_key();

        let first = manager(store.clone(), master);
        first.bootstrap().await.unwrap();
        let kid = first.active_pair().unwrap().kid.clone();

        // A second process bootstrapping against the same store loads
        // the same key instead of generating a new one.
        let second = manager(store.clone(), master);
        second.bootstrap().await.unwrap();
        assert_eq!(second.active_pair().unwrap().kid, kid);
    }

    #[tokio::test]
    async fn test_active_pair_before_bootstrap_fails() {
        let store = Arc::new(MockKeyStore::default());
        let mgr = manager(store, generate_master_key());
        assert!(matches!(
            mgr.active_pair().unwrap_err(),
            AuthError::InvalidState { .. }
        ));
    }

    #[tokio::test]
    async fn test_rotation_keeps_old_tokens_verifiable() {
        let store = Arc::new(MockKeyStore::default());
        let mgr = manager(store.clone(), generate_master_key());
        mgr.bootstrap().await.unwrap();

        let old_pair = mgr.active_pair().unwrap();
        let claims = AccessTokenClaims::builder(
            "https://auth.example.com",
            "user-1",
            "client-1",
            "tenant-1",
        )
        .expires_in_seconds(3600)
        .build();
        let old_token = old_pair.sign(&claims).unwrap();

        let new_kid = mgr.rotate().await.unwrap();
        assert_ne!(new_kid, old_pair.kid);
        assert_eq!(mgr.active_pair().unwrap().kid, new_kid);

        // The demoted key got an expiry but is still inside the overlap.
        let demoted = store.find_by_kid(&old_pair.kid).await.unwrap().unwrap();
        assert!(!demoted.active);
        assert!(demoted.expires_at.is_some());

        let decoded = mgr
            .verify_token::<AccessTokenClaims>(&old_token, "https://auth.example.com")
            .await
            .unwrap();
        assert_eq!(decoded.claims.sub, "user-1");

        // Tokens signed by the new key verify through the fast path.
        let new_token = mgr.active_pair().unwrap().sign(&claims).unwrap();
        assert!(
            mgr.verify_token::<AccessTokenClaims>(&new_token, "https://auth.example.com")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_kid() {
        let store = Arc::new(MockKeyStore::default());
        let mgr = manager(store, generate_master_key());
        mgr.bootstrap().await.unwrap();

        // Sign with a key the store has never seen.
        let stranger = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let claims = AccessTokenClaims::builder(
            "https://auth.example.com",
            "user-1",
            "client-1",
            "tenant-1",
        )
        .build();
        let token = stranger.sign(&claims).unwrap();

        let err = mgr
            .verify_token::<AccessTokenClaims>(&token, "https://auth.example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rotate_if_due_respects_the_period() {
        let store = Arc::new(MockKeyStore::default());
        let master = generate_master_key();

        // Default period is 30 days; a fresh key is never due.
        let mgr = manager(store.clone(), master);
        mgr.bootstrap().await.unwrap();
        assert_eq!(mgr.rotate_if_due().await.unwrap(), None);

        let mut config = AuthConfig::default();
        config.signing.rotation_period = std::time::Duration::ZERO;
        let eager = SigningKeyManager::new(store.clone(), master, &config).unwrap();
        eager.bootstrap().await.unwrap();
        let old_kid = eager.active_pair().unwrap().kid.clone();

        let new_kid = eager.rotate_if_due().await.unwrap().unwrap();
        assert_ne!(new_kid, old_kid);
        assert_eq!(eager.active_pair().unwrap().kid, new_kid);
    }

    #[tokio::test]
    async fn test_jwks_lists_active_and_demoted_keys() {
        let store = Arc::new(MockKeyStore::default());
        let mgr = manager(store, generate_master_key());
        mgr.bootstrap().await.unwrap();
        mgr.rotate().await.unwrap();

        let jwks = mgr.jwks().await.unwrap();
        assert_eq!(jwks.keys.len(), 2);
        assert!(jwks.keys.iter().all(|k| k.use_ == "sig"));
    }
}
