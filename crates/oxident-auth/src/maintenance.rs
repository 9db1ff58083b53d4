//! Background expiry sweeps.
//!
//! Expired authorization requests, refresh tokens, and demoted signing
//! keys are garbage, not state: every read path already rejects them,
//! so the sweeper only reclaims storage. It runs on a fixed interval
//! and each sweep is idempotent and safe to run concurrently with
//! normal traffic.
//!
//! # Usage
//!
//! ```ignore
//! let sweeper = Arc::new(
//!     ExpirySweeper::new(requests, refresh_tokens, signing_keys, &config.store)
//!         .with_key_rotation(keys),
//! );
//! let handle = sweeper.spawn();
//! // ... on shutdown:
//! sweeper.shutdown();
//! handle.await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::storage::{
    AuthorizationRequestStorage, RefreshTokenStorage, SigningKeyStorage, with_timeout,
};
use crate::token::keys::SigningKeyManager;

/// Periodic sweeper for expired records.
pub struct ExpirySweeper {
    requests: Arc<dyn AuthorizationRequestStorage>,
    refresh_tokens: Arc<dyn RefreshTokenStorage>,
    signing_keys: Arc<dyn SigningKeyStorage>,
    key_rotation: Option<Arc<SigningKeyManager>>,
    interval: Duration,
    store_timeout: Duration,
    shutdown: AtomicBool,
}

/// Counts of records removed by one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Expired authorization requests removed.
    pub requests: u64,
    /// Expired refresh tokens removed.
    pub refresh_tokens: u64,
    /// Signing keys past their verification window removed.
    pub signing_keys: u64,
}

impl ExpirySweeper {
    /// Creates a new sweeper over the three expiring stores.
    #[must_use]
    pub fn new(
        requests: Arc<dyn AuthorizationRequestStorage>,
        refresh_tokens: Arc<dyn RefreshTokenStorage>,
        signing_keys: Arc<dyn SigningKeyStorage>,
        config: &StoreConfig,
    ) -> Self {
        Self {
            requests,
            refresh_tokens,
            signing_keys,
            key_rotation: None,
            interval: config.sweep_interval,
            store_timeout: config.operation_timeout,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Enables scheduled signing-key rotation: each tick asks the
    /// manager to rotate once the active key outlives its period.
    #[must_use]
    pub fn with_key_rotation(mut self, keys: Arc<SigningKeyManager>) -> Self {
        self.key_rotation = Some(keys);
        self
    }

    /// Signals the run loop to stop after the current tick.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Spawns the sweep loop on the current runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let sweeper = Arc::clone(self);
        tokio::spawn(async move {
            sweeper.run().await;
        })
    }

    /// Runs sweeps on the configured interval until `shutdown()`.
    ///
    /// A failed sweep is logged and retried at the next tick; one
    /// store being down must not stop the others from being swept.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so startup does not
        // race store initialization.
        ticker.tick().await;

        info!(interval = ?self.interval, "Expiry sweeper started");

        loop {
            ticker.tick().await;

            if self.shutdown.load(Ordering::Relaxed) {
                info!("Expiry sweeper shutting down");
                break;
            }

            if let Some(keys) = &self.key_rotation {
                match keys.rotate_if_due().await {
                    Ok(Some(kid)) => info!(kid = %kid, "Scheduled signing-key rotation"),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Scheduled signing-key rotation failed"),
                }
            }

            let report = self.sweep_once().await;
            if report != SweepReport::default() {
                info!(
                    requests = report.requests,
                    refresh_tokens = report.refresh_tokens,
                    signing_keys = report.signing_keys,
                    "Expiry sweep removed records"
                );
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    }

    /// Performs one sweep across all three stores.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match with_timeout(self.store_timeout, self.requests.delete_expired()).await {
            Ok(count) => report.requests = count,
            Err(e) => warn!(error = %e, "Authorization request sweep failed"),
        }

        match with_timeout(self.store_timeout, self.refresh_tokens.delete_expired()).await {
            Ok(count) => report.refresh_tokens = count,
            Err(e) => warn!(error = %e, "Refresh token sweep failed"),
        }

        match with_timeout(self.store_timeout, self.signing_keys.purge_expired()).await {
            Ok(count) => report.signing_keys = count,
            Err(e) => warn!(error = %e, "Signing key sweep failed"),
        }

        report
    }
}
