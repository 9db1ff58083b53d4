//! In-memory client store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use oxident_auth::AuthResult;
use oxident_auth::error::AuthError;
use oxident_auth::storage::ClientStorage;
use oxident_auth::types::Client;

/// Clients keyed by their public identifier.
#[derive(Default)]
pub struct InMemoryClientStore {
    clients: RwLock<HashMap<String, Client>>,
}

impl InMemoryClientStore {
    /// Creates an empty client store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStore {
    async fn create(&self, client: Client) -> AuthResult<Client> {
        let mut clients = self.clients.write().await;
        if clients.contains_key(&client.client_id) {
            return Err(AuthError::validation(
                "client_id",
                format!("client '{}' is already registered", client.client_id),
            ));
        }
        clients.insert(client.client_id.clone(), client.clone());
        Ok(client)
    }

    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }

    async fn update(&self, client: Client) -> AuthResult<Client> {
        let mut clients = self.clients.write().await;
        match clients.get_mut(&client.client_id) {
            Some(existing) => {
                *existing = client.clone();
                Ok(client)
            }
            None => Err(AuthError::not_found(format!(
                "client '{}' does not exist",
                client.client_id
            ))),
        }
    }

    async fn deactivate(&self, client_id: &str) -> AuthResult<()> {
        let mut clients = self.clients.write().await;
        match clients.get_mut(client_id) {
            Some(client) => {
                client.active = false;
                Ok(())
            }
            None => Err(AuthError::not_found(format!(
                "client '{client_id}' does not exist"
            ))),
        }
    }
}
