//! Pre-auth tokens
//!
//! Short-lived HS256 JWTs carrying a verified-but-unlinked LINE identity
//! between the callback step and the link/create step. Self-contained: the
//! link/create step needs no server-side session state.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use hearth_types::LineUserId;

use crate::AuthError;

/// Type tag distinguishing pre-auth tokens from session tokens, which are
/// signed with the same application secret
pub const PRE_AUTH_TOKEN_TYPE: &str = "pre_auth_line";

/// A verified external identity not yet linked to a local account
#[derive(Debug, Clone)]
pub struct PreAuthIdentity {
    pub line_user_id: LineUserId,
    pub display_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
struct PreAuthClaims<'a> {
    sub: &'a str,
    name: &'a str,
    picture: &'a str,
    exp: i64,
    #[serde(rename = "type")]
    token_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct PreAuthClaimsWire {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default, rename = "type")]
    token_type: Option<String>,
}

/// Issues and verifies pre-auth tokens
#[derive(Clone)]
pub struct PreAuthTokens {
    secret: String,
    lifetime: Duration,
}

impl PreAuthTokens {
    /// Create an issuer/verifier over the application secret
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
        }
    }

    /// Issue a pre-auth token for an unlinked LINE identity
    pub fn issue(
        &self,
        line_user_id: &LineUserId,
        display_name: &str,
        avatar_url: &str,
    ) -> Result<String, AuthError> {
        let claims = PreAuthClaims {
            sub: line_user_id.as_str(),
            name: display_name,
            picture: avatar_url,
            exp: Utc::now().timestamp() + self.lifetime.as_secs() as i64,
            token_type: PRE_AUTH_TOKEN_TYPE,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("Failed to sign pre-auth token: {}", e);
            AuthError::Internal("failed to sign pre-auth token".to_string())
        })
    }

    /// Verify a pre-auth token and return the identity it carries.
    ///
    /// Rejects tokens whose type tag is absent or not `pre_auth_line`, so a
    /// session token can never stand in for a pre-auth hand-off.
    pub fn verify(&self, token: &str) -> Result<PreAuthIdentity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        let data = decode::<PreAuthClaimsWire>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Pre-auth token rejected: {}", e);
            AuthError::InvalidPreAuthToken
        })?;

        let claims = data.claims;

        if claims.token_type.as_deref() != Some(PRE_AUTH_TOKEN_TYPE) {
            tracing::debug!("Pre-auth token has wrong type tag");
            return Err(AuthError::InvalidPreAuthToken);
        }

        let line_user_id = claims
            .sub
            .and_then(|sub| LineUserId::new(sub).ok())
            .ok_or(AuthError::InvalidPreAuthToken)?;

        Ok(PreAuthIdentity {
            line_user_id,
            display_name: claims.name.unwrap_or_default(),
            avatar_url: claims.picture.unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for PreAuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreAuthTokens")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionTokens;
    use hearth_types::UserId;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn tokens() -> PreAuthTokens {
        PreAuthTokens::new(SECRET, Duration::from_secs(1800))
    }

    fn identity() -> LineUserId {
        LineUserId::new("U4af4980629abcdef").unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let tokens = tokens();
        let token = tokens
            .issue(&identity(), "Taro", "https://cdn.example/avatar.png")
            .unwrap();

        let verified = tokens.verify(&token).unwrap();
        assert_eq!(verified.line_user_id, identity());
        assert_eq!(verified.display_name, "Taro");
        assert_eq!(verified.avatar_url, "https://cdn.example/avatar.png");
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = PreAuthTokens::new(SECRET, Duration::from_secs(1));
        let token = tokens.issue(&identity(), "Taro", "").unwrap();

        assert!(tokens.verify(&token).is_ok());
        std::thread::sleep(Duration::from_secs(3));
        assert!(matches!(
            tokens.verify(&token),
            Err(AuthError::InvalidPreAuthToken)
        ));
    }

    #[test]
    fn test_session_token_rejected_as_pre_auth() {
        // Same secret, different token kind: the type tag must gate
        let sessions = SessionTokens::new(SECRET, Duration::from_secs(3600));
        let session_token = sessions.issue(UserId(1)).unwrap();

        assert!(matches!(
            tokens().verify(&session_token),
            Err(AuthError::InvalidPreAuthToken)
        ));
    }

    #[test]
    fn test_pre_auth_token_rejected_as_session() {
        let sessions = SessionTokens::new(SECRET, Duration::from_secs(3600));
        let pre_auth = tokens().issue(&identity(), "Taro", "").unwrap();

        assert!(matches!(
            sessions.verify(&pre_auth),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = PreAuthTokens::new("xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx", Duration::from_secs(1800));
        let token = tokens().issue(&identity(), "Taro", "").unwrap();

        assert!(matches!(
            other.verify(&token),
            Err(AuthError::InvalidPreAuthToken)
        ));
    }
}
