//! In-memory storage backend for the Oxident authorization core.
//!
//! This crate implements the storage traits from `oxident-auth` on top
//! of `tokio::sync::RwLock`-guarded maps. Every conditional operation
//! the traits require (`consume`, `rotate`, `promote`) runs under a
//! single write guard, so the atomicity contracts hold without a real
//! database.
//!
//! Intended for tests and single-process deployments where durability
//! is not required.
//!
//! # Example
//!
//! ```ignore
//! use oxident_store_memory::InMemoryRequestStore;
//! use oxident_auth::storage::AuthorizationRequestStorage;
//!
//! let store = InMemoryRequestStore::new();
//! let created = store.create(request).await?;
//! ```

mod client;
mod refresh_token;
mod request;
mod signing_key;

pub use client::InMemoryClientStore;
pub use refresh_token::InMemoryRefreshTokenStore;
pub use request::InMemoryRequestStore;
pub use signing_key::InMemorySigningKeyStore;
