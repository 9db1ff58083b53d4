//! Refresh token record.
//!
//! Only a one-way hash of the token secret is persisted; the plaintext
//! exists transiently in the issuance response and all lookups happen by
//! hash. Rotation is not additive: the old record is deleted in the same
//! store operation that inserts its successor, so deletion is the
//! revocation signal and at most one token per lineage is ever live.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// A persisted refresh credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// Unique token identifier.
    pub id: Uuid,

    /// SHA-256 hash of the token secret, hex-encoded.
    pub token_hash: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// User the token authenticates.
    pub user_id: Uuid,

    /// Tenant the user belongs to. Every store operation on this record
    /// filters by tenant.
    pub tenant_id: Uuid,

    /// Granted scopes.
    pub scopes: Vec<String>,

    /// Granted audience.
    pub audience: Vec<String>,

    /// Authentication time inherited from the originating authorization,
    /// carried through every rotation.
    #[serde(with = "time::serde::rfc3339")]
    pub auth_time: OffsetDateTime,

    /// Authentication methods references.
    pub amr: Vec<String>,

    /// When the token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Absolute expiry deadline.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RefreshToken {
    /// Generates a new cryptographically random token secret.
    ///
    /// 256 bits of entropy encoded as base64url without padding
    /// (43 characters).
    #[must_use]
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hashes a token secret for storage or lookup.
    ///
    /// SHA-256, hex-encoded. Fast hashing is appropriate here because
    /// the secret already carries 256 bits of entropy.
    #[must_use]
    pub fn hash_secret(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns `true` if the token is past its expiry deadline.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn make_token() -> RefreshToken {
        let now = OffsetDateTime::now_utc();
        RefreshToken {
            id: Uuid::new_v4(),
            token_hash: RefreshToken::hash_secret("secret"),
            client_id: "web-app".to_string(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            scopes: vec!["openid".to_string(), "offline_access".to_string()],
            audience: vec!["web-app".to_string()],
            auth_time: now,
            amr: vec!["pwd".to_string()],
            created_at: now,
            expires_at: now + Duration::days(30),
        }
    }

    #[test]
    fn test_generate_secret_properties() {
        let secret = RefreshToken::generate_secret();
        assert_eq!(secret.len(), 43);
        assert!(!secret.contains('='));
        assert_ne!(secret, RefreshToken::generate_secret());
    }

    #[test]
    fn test_hash_secret_is_deterministic() {
        let secret = RefreshToken::generate_secret();
        let hash = RefreshToken::hash_secret(&secret);
        assert_eq!(hash, RefreshToken::hash_secret(&secret));
        assert_eq!(hash.len(), 64); // SHA-256 hex
        assert_ne!(hash, RefreshToken::hash_secret("other"));
    }

    #[test]
    fn test_known_hash_value() {
        // SHA-256("test") as a fixed vector.
        assert_eq!(
            RefreshToken::hash_secret("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_expiry() {
        let mut token = make_token();
        assert!(!token.is_expired());

        token.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        assert!(token.is_expired());
    }

    #[test]
    fn test_serde_roundtrip() {
        let token = make_token();
        let json = serde_json::to_string(&token).unwrap();
        let parsed: RefreshToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, token.id);
        assert_eq!(parsed.token_hash, token.token_hash);
        assert_eq!(parsed.tenant_id, token.tenant_id);
        assert_eq!(parsed.amr, token.amr);
    }
}
