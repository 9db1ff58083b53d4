//! Token issuance: authorization-grant exchange and refresh rotation.
//!
//! `exchange` validates PKCE against the loaded request BEFORE consuming
//! it, so a wrong verifier leaves the grant intact for a retry with the
//! correct one. Consumption itself is the store's atomic transition;
//! once it commits, the grant can never produce a second token set.
//!
//! `refresh` rotates: the presented token is deleted and a replacement
//! inserted in one store operation, so a refresh secret can never be
//! redeemed twice and a crash mid-rotation cannot leave two live tokens
//! for the same lineage.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::oauth::pkce::validate_exchange;
use crate::oauth::service::AuthorizationService;
use crate::storage::{RefreshTokenStorage, with_timeout};
use crate::token::jwt::{AccessTokenClaims, IdTokenClaims};
use crate::token::keys::SigningKeyManager;
use crate::types::{Client, GrantType, RefreshToken};

/// Authentication method reference recorded for interactive logins.
const AMR_PASSWORD: &str = "pwd";

/// One complete issuance result. No partial sets: a failure anywhere
/// during minting returns an error and nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct TokenSet {
    /// Signed access token.
    pub access_token: String,
    /// Signed OpenID Connect identity token.
    pub identity_token: String,
    /// Plaintext refresh secret; present only when the client holds the
    /// refresh grant. This is the only time the secret exists in the
    /// clear.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Always "Bearer".
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Space-separated granted scopes.
    pub scope: String,
}

/// Mints token sets for completed authorizations and refresh rotations.
///
/// Thread-safe; share via `Arc`.
pub struct TokenIssuer {
    config: AuthConfig,
    requests: Arc<AuthorizationService>,
    refresh_store: Arc<dyn RefreshTokenStorage>,
    keys: Arc<SigningKeyManager>,
}

impl TokenIssuer {
    /// Creates a new issuer.
    #[must_use]
    pub fn new(
        config: AuthConfig,
        requests: Arc<AuthorizationService>,
        refresh_store: Arc<dyn RefreshTokenStorage>,
        keys: Arc<SigningKeyManager>,
    ) -> Self {
        Self {
            config,
            requests,
            refresh_store,
            keys,
        }
    }

    /// Exchanges a consumed authorization grant for a token set.
    ///
    /// Order matters: the redirect URI and PKCE are validated against
    /// the loaded snapshot first, then the request is consumed
    /// atomically. A mismatch therefore does not burn the grant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown request or one issued to a
    /// different client, `Expired` past the horizon, `InvalidState` for
    /// an unauthenticated or already consumed request, `Validation` for
    /// a missing or mismatched `redirect_uri`, and
    /// `PkceValidationFailed` for a bad verifier.
    pub async fn exchange(
        &self,
        client: &Client,
        request_id: &str,
        pkce_verifier: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> AuthResult<TokenSet> {
        let request = self.requests.load(request_id).await?;

        // A grant issued to another client is indistinguishable from a
        // missing one.
        if request.client_id != client.client_id {
            return Err(AuthError::not_found("authorization request not found"));
        }

        if !client.is_grant_type_allowed(GrantType::AuthorizationCode) {
            return Err(AuthError::validation(
                "grant_type",
                "authorization_code grant not allowed for this client",
            ));
        }

        // RFC 6749 section 4.1.3: the token request must repeat the
        // redirect URI sent at authorization time.
        match redirect_uri {
            Some(uri) if uri == request.redirect_uri => {}
            Some(_) => {
                return Err(AuthError::validation(
                    "redirect_uri",
                    "redirect_uri does not match the authorization request",
                ));
            }
            None => {
                return Err(AuthError::validation(
                    "redirect_uri",
                    "redirect_uri is required",
                ));
            }
        }

        validate_exchange(
            request.code_challenge.as_deref(),
            request.code_challenge_method,
            pkce_verifier,
            client.requires_pkce(),
        )?;

        let consumed = self.requests.consume(request_id).await?;

        let user_id = consumed
            .user_id
            .ok_or_else(|| AuthError::invalid_state("consumed request has no user"))?;
        let tenant_id = consumed
            .tenant_id
            .ok_or_else(|| AuthError::invalid_state("consumed request has no tenant"))?;
        let auth_time = consumed
            .auth_time
            .ok_or_else(|| AuthError::invalid_state("consumed request has no auth time"))?;

        let amr = vec![AMR_PASSWORD.to_string()];
        let set = self
            .mint(
                client,
                user_id,
                tenant_id,
                auth_time,
                &consumed.scopes,
                consumed.nonce.as_deref(),
                &amr,
            )
            .await?;

        info!(
            request_id = %request_id,
            client_id = %client.client_id,
            "Exchanged authorization grant"
        );
        Ok(set)
    }

    /// Rotates a refresh token and mints a fresh token set.
    ///
    /// With `refresh_scope_narrowing` enabled, `requested_scopes` may
    /// name a subset of the granted scopes; otherwise any requested set
    /// must equal the grant exactly.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown secret (including one already
    /// rotated away) or one issued to a different client, `Expired`
    /// past the token's horizon, and `Validation` for a scope outside
    /// the original grant.
    pub async fn refresh(
        &self,
        client: &Client,
        presented_secret: &str,
        requested_scopes: Option<&[String]>,
    ) -> AuthResult<TokenSet> {
        let hash = RefreshToken::hash_secret(presented_secret);
        let current = with_timeout(self.store_timeout(), self.refresh_store.find_by_hash(&hash))
            .await?
            .ok_or_else(|| AuthError::not_found("refresh token not found"))?;

        if current.client_id != client.client_id {
            return Err(AuthError::not_found("refresh token not found"));
        }

        if current.is_expired() {
            return Err(AuthError::expired("refresh token expired"));
        }

        let scopes = self.effective_scopes(&current, requested_scopes)?;

        let secret = RefreshToken::generate_secret();
        let now = OffsetDateTime::now_utc();
        let replacement = RefreshToken {
            id: Uuid::new_v4(),
            token_hash: RefreshToken::hash_secret(&secret),
            client_id: current.client_id.clone(),
            user_id: current.user_id,
            tenant_id: current.tenant_id,
            scopes: scopes.clone(),
            audience: current.audience.clone(),
            auth_time: current.auth_time,
            amr: current.amr.clone(),
            created_at: now,
            expires_at: now
                + client.refresh_token_lifetime(self.config.oauth.refresh_token_lifetime),
        };

        // Atomic delete-old + insert-new; the presented secret is dead
        // the instant this returns.
        let rotated = with_timeout(
            self.store_timeout(),
            self.refresh_store.rotate(current.id, replacement),
        )
        .await?;

        let access_token =
            self.mint_access_token(client, rotated.user_id, rotated.tenant_id, &scopes)?;
        let identity_token = self.mint_identity_token(
            client,
            rotated.user_id,
            rotated.tenant_id,
            rotated.auth_time,
            None,
            &rotated.amr,
        )?;

        debug!(client_id = %client.client_id, "Rotated refresh token");
        Ok(TokenSet {
            access_token,
            identity_token,
            refresh_token: Some(secret),
            token_type: "Bearer".to_string(),
            expires_in: client
                .access_token_lifetime(self.config.oauth.access_token_lifetime)
                .as_secs(),
            scope: scopes.join(" "),
        })
    }

    /// Revokes a single refresh token presented by its owner.
    ///
    /// An unknown secret is reported as success: revocation is
    /// idempotent and reveals nothing about token existence.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the token belongs to a different client.
    pub async fn revoke(&self, presented_secret: &str, client_id: &str) -> AuthResult<()> {
        let hash = RefreshToken::hash_secret(presented_secret);
        let found =
            with_timeout(self.store_timeout(), self.refresh_store.find_by_hash(&hash)).await?;
        let Some(token) = found else {
            return Ok(());
        };

        if token.client_id != client_id {
            return Err(AuthError::validation(
                "token",
                "token was not issued to this client",
            ));
        }

        with_timeout(self.store_timeout(), self.refresh_store.delete(token.id)).await?;
        info!(client_id = %client_id, "Revoked refresh token");
        Ok(())
    }

    /// Deletes every refresh token for a user+client pair within a
    /// tenant ("log out everywhere for this app"). Returns the number
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error only on store failure.
    pub async fn terminate_sessions(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        client_id: &str,
    ) -> AuthResult<u64> {
        let removed = with_timeout(
            self.store_timeout(),
            self.refresh_store
                .delete_by_user_and_client(tenant_id, user_id, client_id),
        )
        .await?;
        info!(
            client_id = %client_id,
            removed = removed,
            "Terminated sessions"
        );
        Ok(removed)
    }

    fn store_timeout(&self) -> std::time::Duration {
        self.config.store.operation_timeout
    }

    fn effective_scopes(
        &self,
        current: &RefreshToken,
        requested: Option<&[String]>,
    ) -> AuthResult<Vec<String>> {
        let Some(requested) = requested else {
            return Ok(current.scopes.clone());
        };

        let granted: HashSet<&str> = current.scopes.iter().map(String::as_str).collect();
        for scope in requested {
            if !granted.contains(scope.as_str()) {
                return Err(AuthError::validation(
                    "scope",
                    format!("scope '{scope}' exceeds the original grant"),
                ));
            }
        }

        if !self.config.oauth.refresh_scope_narrowing && requested.len() != current.scopes.len() {
            return Err(AuthError::validation(
                "scope",
                "scope narrowing on refresh is disabled",
            ));
        }

        Ok(requested.to_vec())
    }

    #[allow(clippy::too_many_arguments)]
    async fn mint(
        &self,
        client: &Client,
        user_id: Uuid,
        tenant_id: Uuid,
        auth_time: OffsetDateTime,
        scopes: &[String],
        nonce: Option<&str>,
        amr: &[String],
    ) -> AuthResult<TokenSet> {
        let access_token = self.mint_access_token(client, user_id, tenant_id, scopes)?;
        let identity_token =
            self.mint_identity_token(client, user_id, tenant_id, auth_time, nonce, amr)?;

        let refresh_token = if client.is_grant_type_allowed(GrantType::RefreshToken) {
            let secret = RefreshToken::generate_secret();
            let now = OffsetDateTime::now_utc();
            with_timeout(
                self.store_timeout(),
                self.refresh_store.create(RefreshToken {
                    id: Uuid::new_v4(),
                    token_hash: RefreshToken::hash_secret(&secret),
                    client_id: client.client_id.clone(),
                    user_id,
                    tenant_id,
                    scopes: scopes.to_vec(),
                    audience: vec![client.client_id.clone()],
                    auth_time,
                    amr: amr.to_vec(),
                    created_at: now,
                    expires_at: now
                        + client
                            .refresh_token_lifetime(self.config.oauth.refresh_token_lifetime),
                }),
            )
            .await?;
            Some(secret)
        } else {
            None
        };

        Ok(TokenSet {
            access_token,
            identity_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: client
                .access_token_lifetime(self.config.oauth.access_token_lifetime)
                .as_secs(),
            scope: scopes.join(" "),
        })
    }

    fn mint_access_token(
        &self,
        client: &Client,
        user_id: Uuid,
        tenant_id: Uuid,
        scopes: &[String],
    ) -> AuthResult<String> {
        let lifetime = client.access_token_lifetime(self.config.oauth.access_token_lifetime);
        let claims = AccessTokenClaims::builder(
            self.config.issuer.clone(),
            user_id.to_string(),
            client.client_id.clone(),
            tenant_id.to_string(),
        )
        .audience(vec![client.client_id.clone()])
        .scope(scopes.join(" "))
        .expires_in_seconds(lifetime.as_secs() as i64)
        .build();

        Ok(self.keys.active_pair()?.sign(&claims)?)
    }

    fn mint_identity_token(
        &self,
        client: &Client,
        user_id: Uuid,
        tenant_id: Uuid,
        auth_time: OffsetDateTime,
        nonce: Option<&str>,
        amr: &[String],
    ) -> AuthResult<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let lifetime = client.identity_token_lifetime(self.config.oauth.identity_token_lifetime);
        let claims = IdTokenClaims {
            iss: self.config.issuer.clone(),
            sub: user_id.to_string(),
            aud: client.client_id.clone(),
            exp: now + lifetime.as_secs() as i64,
            iat: now,
            auth_time: auth_time.unix_timestamp(),
            tenant_id: tenant_id.to_string(),
            nonce: nonce.map(str::to_string),
            amr: if amr.is_empty() {
                None
            } else {
                Some(amr.to_vec())
            },
        };

        Ok(self.keys.active_pair()?.sign(&claims)?)
    }
}
