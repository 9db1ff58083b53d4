//! Authorization request record.
//!
//! An authorization request tracks one authorization attempt from creation
//! through code exchange. It moves through three states:
//!
//! 1. `Pending`: created after the authorization endpoint validates the
//!    parameters against the resolved client
//! 2. `Authenticated`: the end user authenticated and the request was
//!    bound to a user and tenant, exactly once
//! 3. `Consumed`: the grant was exchanged for tokens, exactly once
//!
//! Expiry is fixed at creation and never extended; any operation on an
//! expired request fails instead of transitioning.
//!
//! # Security
//!
//! - Request identifiers are cryptographically random (256 bits)
//! - Requests are short-lived (default 10 minutes)
//! - Consumption is single-use, enforced atomically by the store
//! - The PKCE challenge is stored for verification at token exchange

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::oauth::pkce::CodeChallengeMethod;
use crate::types::client::ResponseType;

/// One authorization attempt, owned by the request store.
///
/// Services operate on loaded snapshots and persist mutations through
/// conditional store updates; concurrent holders never share a mutable
/// instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Opaque request identifier, also serving as the authorization code.
    /// 256-bit random value, base64url-encoded.
    pub id: String,

    /// Client that initiated the request.
    pub client_id: String,

    /// Redirect URI, validated against the client's allow-list at creation.
    pub redirect_uri: String,

    /// Requested scopes.
    pub scopes: Vec<String>,

    /// Response type from the authorization request.
    pub response_type: ResponseType,

    /// Opaque state echoed back to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// OpenID Connect nonce, echoed into the identity token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// PKCE code challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE challenge method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<CodeChallengeMethod>,

    /// Resolved user. Absent until authentication completes; set exactly
    /// once and never overwritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    /// Resolved tenant. Absent until authentication completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,

    /// When the end user authenticated.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub auth_time: Option<OffsetDateTime>,

    /// When the request was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Absolute expiry deadline, fixed at creation.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the grant was exchanged. `None` until consumed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub consumed_at: Option<OffsetDateTime>,
}

impl AuthorizationRequest {
    /// Generates a new cryptographically random request identifier.
    ///
    /// 256 bits of entropy encoded as base64url without padding
    /// (43 characters), exceeding the RFC 6749 recommendation of at
    /// least 128 bits for authorization codes.
    #[must_use]
    pub fn generate_id() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if the request is past its expiry deadline.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if authentication has completed.
    ///
    /// Requires both a user and a tenant; a request with only one of the
    /// two is not authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() && self.tenant_id.is_some()
    }

    /// Returns `true` if the grant has been exchanged.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Returns `true` if the request can still be exchanged:
    /// authenticated, unconsumed, and unexpired.
    #[must_use]
    pub fn is_exchangeable(&self) -> bool {
        self.is_authenticated() && !self.is_consumed() && !self.is_expired()
    }

    /// Scopes joined into the space-separated wire form.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
