//! Application session tokens
//!
//! HS256 JWTs carrying the authenticated user's ID, signed with the
//! process-wide application secret.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use hearth_types::UserId;

use crate::AuthError;

#[derive(Debug, Serialize)]
struct SessionClaims {
    user_id: i64,
    iat: i64,
    exp: i64,
}

/// Raw claim shape checked once at the trust boundary. `user_id` stays a JSON
/// value until verified numeric so a malformed claim maps to `MissingClaim`
/// rather than a decode failure.
#[derive(Debug, Deserialize)]
struct SessionClaimsWire {
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    token_type: Option<String>,
}

/// Issues and verifies application session tokens
#[derive(Clone)]
pub struct SessionTokens {
    secret: String,
    lifetime: Duration,
}

impl SessionTokens {
    /// Create an issuer/verifier over the application secret
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
        }
    }

    /// Issue a session token for `user_id`, expiring `lifetime` from now
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            user_id: user_id.0,
            iat: now,
            exp: now + self.lifetime.as_secs() as i64,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("Failed to sign session token: {}", e);
            AuthError::Internal("failed to sign session token".to_string())
        })
    }

    /// Verify a session token and return the subject user ID.
    ///
    /// Rejects tokens signed with any algorithm other than the one used at
    /// issuance, expired tokens, and pre-auth tokens replayed as sessions.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        let data = decode::<SessionClaimsWire>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        let claims = data.claims;

        // A typed token (e.g. pre_auth_line) must never pass as a session
        if claims.token_type.is_some() {
            tracing::debug!("Typed token presented as session token");
            return Err(AuthError::InvalidToken);
        }

        let user_id = claims
            .user_id
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .ok_or(AuthError::MissingClaim("user_id"))?;

        Ok(UserId(user_id))
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
