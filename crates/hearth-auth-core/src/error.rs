//! Auth errors

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Provider credentials are not configured (fatal to the login attempt,
    /// not to the process)
    #[error("configuration error: {0}")]
    Configuration(&'static str),

    /// Malformed request input (empty code/state, bad invite code, ...)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// OAuth state is unknown, expired, or already consumed
    #[error("invalid state")]
    InvalidState,

    /// Authorization-code exchange with the provider failed
    #[error("code exchange failed")]
    TokenExchange,

    /// Exchange response carried no identity token
    #[error("identity token missing from exchange response")]
    MissingIdentityToken,

    /// Identity token failed signature, audience, issuer, or expiry checks
    #[error("invalid identity token")]
    IdentityTokenInvalid,

    /// JWKS endpoint unreachable, returned an error, or sent a malformed payload
    #[error("key set fetch failed: {0}")]
    KeyFetchError(String),

    /// No key with the requested key ID in the provider's key set
    #[error("signing key not found: {0}")]
    KeyNotFound(String),

    /// Pre-auth token failed verification
    #[error("invalid pre-auth token")]
    InvalidPreAuthToken,

    /// Email/password authentication failed
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Session token is malformed, badly signed, or expired
    #[error("invalid token")]
    InvalidToken,

    /// Required claim is absent or has the wrong shape
    #[error("missing or malformed claim: {0}")]
    MissingClaim(&'static str),

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::InvalidState
            | Self::TokenExchange
            | Self::MissingIdentityToken
            | Self::IdentityTokenInvalid
            | Self::KeyFetchError(_)
            | Self::KeyNotFound(_)
            | Self::InvalidPreAuthToken
            | Self::AuthenticationFailed
            | Self::InvalidToken
            | Self::MissingClaim(_) => 401,
            Self::UserNotFound => 404,
            Self::Configuration(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Whether this error is part of the login trust chain.
    ///
    /// Trust-chain failures must be indistinguishable to the end user: the
    /// API layer collapses them all into one generic "login failed" response
    /// so a probing client cannot learn which check rejected it.
    pub fn is_trust_chain_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidState
                | Self::TokenExchange
                | Self::MissingIdentityToken
                | Self::IdentityTokenInvalid
                | Self::KeyFetchError(_)
                | Self::KeyNotFound(_)
                | Self::InvalidPreAuthToken
                | Self::AuthenticationFailed
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        if self.is_trust_chain_failure() {
            return "LOGIN_FAILED";
        }
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::MissingClaim(_) => "INVALID_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            _ => "LOGIN_FAILED",
        }
    }
}

impl From<hearth_db::DbError> for AuthError {
    fn from(err: hearth_db::DbError) -> Self {
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
