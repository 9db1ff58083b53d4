//! Storage trait definitions.
//!
//! All durable state lives behind these traits; the services in this
//! crate are stateless and operate on loaded snapshots. The correctness
//! of replay protection rests on the conditional operations documented
//! on each trait (`consume`, `rotate`, `promote`), which backends must
//! implement as a single atomic read-modify-write.

mod client;
mod refresh_token;
mod request;
mod signing_key;

pub use client::ClientStorage;
pub use refresh_token::RefreshTokenStorage;
pub use request::AuthorizationRequestStorage;
pub use signing_key::SigningKeyStorage;

use std::future::Future;
use std::time::Duration;

use crate::error::AuthError;
use crate::AuthResult;

/// Bounds a store call to the configured operation timeout.
///
/// No store call may block indefinitely; exceeding the limit surfaces
/// as a transient [`AuthError::StoreUnavailable`] rather than a hang.
///
/// # Errors
///
/// Returns `StoreUnavailable` when the future does not complete within
/// `limit`, otherwise the future's own result.
pub async fn with_timeout<T, F>(limit: Duration, future: F) -> AuthResult<T>
where
    F: Future<Output = AuthResult<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::store_unavailable(format!(
            "store call exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_maps_elapse_to_store_unavailable() {
        let result: AuthResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result.unwrap_err(),
            AuthError::StoreUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_propagates_inner_error() {
        let result: AuthResult<()> = with_timeout(Duration::from_secs(1), async {
            Err(AuthError::not_found("missing"))
        })
        .await;
        assert!(matches!(result.unwrap_err(), AuthError::NotFound { .. }));
    }
}
