//! Client registration and resolution.
//!
//! The registry is the single gate through which clients enter the
//! system and through which the authorization and token paths resolve
//! them. Confidential clients receive a generated secret exactly once
//! at registration; only its Argon2 hash is persisted.

use std::sync::Arc;

use tracing::info;

use crate::AuthResult;
use crate::client_secret::{generate_client_secret, hash_client_secret, verify_client_secret};
use crate::error::AuthError;
use crate::storage::ClientStorage;
use crate::types::{ApplicationType, Client};

/// Registers and resolves relying-party clients.
///
/// Thread-safe; share via `Arc`.
pub struct ClientRegistry {
    store: Arc<dyn ClientStorage>,
}

impl ClientRegistry {
    /// Creates a new registry over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ClientStorage>) -> Self {
        Self { store }
    }

    /// Validates and persists a new client.
    ///
    /// For confidential clients registered without a secret, a secret
    /// is generated and returned in the clear exactly once; only the
    /// hash is stored. Public clients never receive a secret.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with a field-keyed error set if the client
    /// record is invalid.
    pub async fn register(&self, mut client: Client) -> AuthResult<(Client, Option<String>)> {
        let plaintext_secret = if client.application_type == ApplicationType::Confidential
            && client.client_secret_hash.is_none()
        {
            let secret = generate_client_secret();
            client.client_secret_hash = Some(
                hash_client_secret(&secret)
                    .map_err(|e| AuthError::crypto(format!("failed to hash secret: {e}")))?,
            );
            Some(secret)
        } else {
            None
        };

        client.validate()?;

        let stored = self.store.create(client).await?;
        info!(
            client_id = %stored.client_id,
            application_type = ?stored.application_type,
            "Registered client"
        );
        Ok((stored, plaintext_secret))
    }

    /// Resolves an active client by its public identifier.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such client exists or it has been
    /// deactivated. The two cases are deliberately indistinguishable.
    pub async fn resolve(&self, client_id: &str) -> AuthResult<Client> {
        let client = self
            .store
            .find_by_client_id(client_id)
            .await?
            .filter(|c| c.active)
            .ok_or_else(|| AuthError::not_found(format!("client '{client_id}' not found")))?;
        Ok(client)
    }

    /// Resolves a client and checks its credentials.
    ///
    /// Public clients present no secret. Confidential clients must
    /// present the secret issued at registration.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client and `Validation` for a
    /// missing or wrong secret.
    pub async fn authenticate(
        &self,
        client_id: &str,
        presented_secret: Option<&str>,
    ) -> AuthResult<Client> {
        let client = self.resolve(client_id).await?;

        match client.application_type {
            ApplicationType::Public => Ok(client),
            ApplicationType::Confidential => {
                let secret = presented_secret.ok_or_else(|| {
                    AuthError::validation("client_secret", "client secret is required")
                })?;
                let hash = client.client_secret_hash.as_deref().ok_or_else(|| {
                    AuthError::invalid_state("confidential client has no stored secret")
                })?;

                let matches = verify_client_secret(secret, hash)
                    .map_err(|e| AuthError::crypto(format!("malformed secret hash: {e}")))?;
                if !matches {
                    return Err(AuthError::validation(
                        "client_secret",
                        "invalid client secret",
                    ));
                }
                Ok(client)
            }
        }
    }

    /// Deactivates a client. Existing tokens are unaffected; new
    /// authorization and token requests fail `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such client exists.
    pub async fn deactivate(&self, client_id: &str) -> AuthResult<()> {
        self.store.deactivate(client_id).await?;
        info!(client_id = %client_id, "Deactivated client");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use tokio::sync::RwLock;

    use crate::types::{GrantType, ResponseType, TokenEndpointAuthMethod};

    #[derive(Default)]
    struct MockClientStore {
        clients: RwLock<HashMap<String, Client>>,
    }

    #[async_trait]
    impl ClientStorage for MockClientStore {
        async fn create(&self, client: Client) -> AuthResult<Client> {
            let mut clients = self.clients.write().await;
            if clients.contains_key(&client.client_id) {
                return Err(AuthError::validation("client_id", "already registered"));
            }
            clients.insert(client.client_id.clone(), client.clone());
            Ok(client)
        }

        async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
            Ok(self.clients.read().await.get(client_id).cloned())
        }

        async fn update(&self, client: Client) -> AuthResult<Client> {
            let mut clients = self.clients.write().await;
            if !clients.contains_key(&client.client_id) {
                return Err(AuthError::not_found("client not found"));
            }
            clients.insert(client.client_id.clone(), client.clone());
            Ok(client)
        }

        async fn deactivate(&self, client_id: &str) -> AuthResult<()> {
            let mut clients = self.clients.write().await;
            let client = clients
                .get_mut(client_id)
                .ok_or_else(|| AuthError::not_found("client not found"))?;
            client.active = false;
            Ok(())
        }
    }

    fn public_client(client_id: &str) -> Client {
        Client {
            client_id: client_id.to_string(),
            client_secret_hash: None,
            name: "Browser App".to_string(),
            application_type: ApplicationType::Public,
            redirect_uris: vec!["https://app.example.com/callback".to_string()],
            grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            response_types: vec![ResponseType::Code],
            scopes: vec!["openid".to_string(), "profile".to_string()],
            token_endpoint_auth_method: TokenEndpointAuthMethod::None,
            access_token_lifetime_secs: None,
            identity_token_lifetime_secs: None,
            refresh_token_lifetime_secs: None,
            pkce_required: true,
            active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn confidential_client(client_id: &str) -> Client {
        Client {
            client_secret_hash: None,
            application_type: ApplicationType::Confidential,
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretBasic,
            pkce_required: false,
            ..public_client(client_id)
        }
    }

    fn registry() -> (ClientRegistry, Arc<MockClientStore>) {
        let store = Arc::new(MockClientStore::default());
        (ClientRegistry::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_register_public_client_returns_no_secret() {
        let (registry, _) = registry();
        let (stored, secret) = registry.register(public_client("spa")).await.unwrap();
        assert!(secret.is_none());
        assert!(stored.client_secret_hash.is_none());
    }

    #[tokio::test]
    async fn test_register_confidential_client_issues_secret_once() {
        let (registry, store) = registry();
        let (stored, secret) = registry
            .register(confidential_client("backend"))
            .await
            .unwrap();

        let secret = secret.unwrap();
        assert!(secret.starts_with("cs_"));
        assert!(stored.client_secret_hash.as_deref().unwrap().starts_with("$argon2id$"));

        // The plaintext never reaches the store.
        let persisted = store.find_by_client_id("backend").await.unwrap().unwrap();
        assert_ne!(persisted.client_secret_hash.as_deref(), Some(secret.as_str()));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_client() {
        let (registry, _) = registry();
        let mut client = public_client("spa");
        client.redirect_uris.clear();
        let err = registry.register(client).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_deactivated_look_alike() {
        let (registry, _) = registry();
        registry.register(public_client("spa")).await.unwrap();

        let missing = registry.resolve("ghost").await.unwrap_err();
        assert!(matches!(missing, AuthError::NotFound { .. }));

        registry.deactivate("spa").await.unwrap();
        let inactive = registry.resolve("spa").await.unwrap_err();
        assert!(matches!(inactive, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_confidential_client() {
        let (registry, _) = registry();
        let (_, secret) = registry
            .register(confidential_client("backend"))
            .await
            .unwrap();
        let secret = secret.unwrap();

        assert!(registry.authenticate("backend", Some(&secret)).await.is_ok());

        let wrong = registry
            .authenticate("backend", Some("cs_wrong"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::Validation { .. }));

        let missing = registry.authenticate("backend", None).await.unwrap_err();
        assert!(matches!(missing, AuthError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_public_client_ignores_secret() {
        let (registry, _) = registry();
        registry.register(public_client("spa")).await.unwrap();
        assert!(registry.authenticate("spa", None).await.is_ok());
    }
}
