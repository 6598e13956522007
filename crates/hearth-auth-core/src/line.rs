//! LINE federated login
//!
//! Drives the OAuth2/OIDC authorization-code flow end to end: authorization
//! URL issuance, state validation, code exchange, identity-token verification
//! against the LINE JWKS, and the hand-off between "known identity" (session
//! issuance) and "unknown identity" (pre-auth token).

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use url::Url;

use hearth_db::{HouseholdRepository, UnitOfWork, UserRepository};
use hearth_types::LineUserId;

use crate::accounts::AccountService;
use crate::config::AuthConfig;
use crate::jwks::JwksCache;
use crate::preauth::{PreAuthIdentity, PreAuthTokens};
use crate::random::random_url_safe;
use crate::session::SessionTokens;
use crate::token_store::TokenStore;
use crate::AuthError;

const STATE_BYTES: usize = 16;

/// A started login: where to send the user, and the state nonce bound to it
#[derive(Debug, Clone)]
pub struct LoginStart {
    pub auth_url: String,
    pub state: String,
}

/// Outcome of a completed callback
#[derive(Debug)]
pub enum FederatedLogin {
    /// The LINE identity maps to a local account; a session was issued
    ExistingUser { session_token: String },
    /// Verified identity with no local account; no local state was written
    Unregistered {
        line_user_id: LineUserId,
        display_name: String,
        avatar_url: String,
    },
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// Verified LINE ID-token claims
#[derive(Debug, Deserialize)]
struct LineIdClaims {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// LINE login orchestrator.
///
/// Holds no mutable state of its own beyond the injected collaborators; each
/// entry point is a self-contained sequence of blocking calls on the request
/// task.
pub struct LineLoginService<U, H, W> {
    config: AuthConfig,
    http_client: reqwest::Client,
    jwks: JwksCache,
    state_store: Arc<TokenStore>,
    sessions: SessionTokens,
    preauth: PreAuthTokens,
    users: Arc<U>,
    accounts: Arc<AccountService<U, H, W>>,
}

impl<U, H, W> LineLoginService<U, H, W>
where
    U: UserRepository,
    H: HouseholdRepository,
    W: UnitOfWork,
{
    /// Create a new LINE login service.
    ///
    /// The state store is shared with the caller so its sweep scheduler can
    /// reach it; everything else is owned.
    pub fn new(
        config: AuthConfig,
        state_store: Arc<TokenStore>,
        users: Arc<U>,
        accounts: Arc<AccountService<U, H, W>>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let jwks = JwksCache::new(config.jwks_url.clone(), config.jwks_refresh_interval);
        let sessions = SessionTokens::new(config.app_secret.clone(), config.session_lifetime);
        let preauth = PreAuthTokens::new(config.app_secret.clone(), config.preauth_lifetime);

        Self {
            config,
            http_client,
            jwks,
            state_store,
            sessions,
            preauth,
            users,
            accounts,
        }
    }

    /// Start a login: generate and store a state nonce, return the provider
    /// authorization URL.
    pub fn begin_login(&self) -> Result<LoginStart, AuthError> {
        if self.config.line_channel_id.is_empty()
            || self.config.line_channel_secret.is_empty()
            || self.config.line_redirect_uri.is_empty()
        {
            return Err(AuthError::Configuration(
                "LINE channel credentials are not configured",
            ));
        }

        // The caller is unauthenticated, so the nonce is keyed off the state
        // value itself rather than a session.
        let state = random_url_safe(STATE_BYTES);
        self.state_store
            .save(state_key(&state), state.clone(), self.config.state_lifetime);

        let auth_url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.line_channel_id.as_str()),
                ("redirect_uri", self.config.line_redirect_uri.as_str()),
                ("state", state.as_str()),
                ("scope", self.config.line_scopes.as_str()),
            ],
        )
        .map_err(|e| {
            tracing::error!("Bad authorization endpoint URL: {}", e);
            AuthError::Configuration("authorization endpoint URL is invalid")
        })?;

        Ok(LoginStart {
            auth_url: auth_url.to_string(),
            state,
        })
    }

    /// Handle the provider callback: validate and consume the state, exchange
    /// the code, verify the identity token, and decide between session
    /// issuance and the unregistered hand-off.
    pub async fn callback(&self, code: &str, state: &str) -> Result<FederatedLogin, AuthError> {
        if code.is_empty() || state.is_empty() {
            return Err(AuthError::BadRequest(
                "missing code or state in callback".to_string(),
            ));
        }

        // One-time use: the entry is consumed whether or not it matched, so a
        // replayed callback always fails.
        let key = state_key(state);
        let state_valid = self.state_store.validate(&key, state);
        self.state_store.delete(&key);
        if !state_valid {
            return Err(AuthError::InvalidState);
        }

        let raw_id_token = self.exchange_code(code).await?;
        let claims = self.verify_id_token(&raw_id_token).await?;

        let line_user_id =
            LineUserId::new(claims.sub).map_err(|_| AuthError::IdentityTokenInvalid)?;

        if let Some(user) = self.users.find_by_line_user_id(&line_user_id).await? {
            let session_token = self.sessions.issue(user.user_id())?;
            return Ok(FederatedLogin::ExistingUser { session_token });
        }

        Ok(FederatedLogin::Unregistered {
            line_user_id,
            display_name: claims.name.unwrap_or_default(),
            avatar_url: claims.picture.unwrap_or_default(),
        })
    }

    /// Issue a pre-auth token for an unregistered identity returned by
    /// [`LineLoginService::callback`].
    pub fn issue_pre_auth(
        &self,
        line_user_id: &LineUserId,
        display_name: &str,
        avatar_url: &str,
    ) -> Result<String, AuthError> {
        self.preauth.issue(line_user_id, display_name, avatar_url)
    }

    /// Link a pending LINE identity to an existing password account and log
    /// it in.
    pub async fn link_account(
        &self,
        pre_auth_token: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let identity = self.preauth.verify(pre_auth_token)?;
        let user = self
            .accounts
            .link_line_account(email, password, &identity.line_user_id)
            .await?;
        self.sessions.issue(user.user_id())
    }

    /// Create a local account for a pending LINE identity and log it in.
    ///
    /// Idempotent on the LINE user ID: a second tab or a retried request
    /// finds the already-created account and just gets a session.
    pub async fn create_account(&self, pre_auth_token: &str) -> Result<String, AuthError> {
        let identity = self.preauth.verify(pre_auth_token)?;

        if let Some(existing) = self
            .users
            .find_by_line_user_id(&identity.line_user_id)
            .await?
        {
            return self.sessions.issue(existing.user_id());
        }

        let user = self.accounts.create_line_user(&identity).await?;
        self.sessions.issue(user.user_id())
    }

    /// Exchange an authorization code for the provider's identity token
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.line_redirect_uri.as_str()),
            ("client_id", self.config.line_channel_id.as_str()),
            ("client_secret", self.config.line_channel_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Code exchange request failed: {}", e);
                AuthError::TokenExchange
            })?;

        if !response.status().is_success() {
            tracing::debug!("Code exchange returned status {}", response.status());
            return Err(AuthError::TokenExchange);
        }

        let exchange: TokenExchangeResponse = response.json().await.map_err(|e| {
            tracing::debug!("Code exchange response unreadable: {}", e);
            AuthError::TokenExchange
        })?;

        exchange.id_token.ok_or(AuthError::MissingIdentityToken)
    }

    /// Verify the identity token's signature and claims.
    ///
    /// RSA-family tokens resolve their verification key from the JWKS by the
    /// header's `kid`; HMAC-family tokens fall back to the channel secret.
    /// Anything else is rejected outright.
    async fn verify_id_token(&self, raw_id_token: &str) -> Result<LineIdClaims, AuthError> {
        let header = decode_header(raw_id_token).map_err(|e| {
            tracing::debug!("Identity token header unreadable: {}", e);
            AuthError::IdentityTokenInvalid
        })?;

        let decoding_key = match header.alg {
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
                let kid = header.kid.as_deref().ok_or_else(|| {
                    tracing::debug!("Identity token header missing kid");
                    AuthError::IdentityTokenInvalid
                })?;
                self.jwks.resolve(kid).await?
            }
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Arc::new(
                DecodingKey::from_secret(self.config.line_channel_secret.as_bytes()),
            ),
            other => {
                tracing::debug!("Unexpected identity token algorithm: {:?}", other);
                return Err(AuthError::IdentityTokenInvalid);
            }
        };

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.config.line_channel_id]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let data =
            decode::<LineIdClaims>(raw_id_token, &decoding_key, &validation).map_err(|e| {
                tracing::debug!("Identity token validation failed: {}", e);
                AuthError::IdentityTokenInvalid
            })?;

        Ok(data.claims)
    }
}

impl<U, H, W> std::fmt::Debug for LineLoginService<U, H, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineLoginService")
            .field("jwks", &self.jwks)
            .finish_non_exhaustive()
    }
}

/// Storage key for a state nonce, derived from the state value itself
fn state_key(state: &str) -> String {
    format!("line-login-{state}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_key_derivation() {
        assert_eq!(state_key("abc123"), "line-login-abc123");
    }
}
