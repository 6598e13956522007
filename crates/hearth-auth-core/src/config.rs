//! Configuration types for the auth core

use std::time::Duration;

/// LINE provider endpoints (production defaults, overridable for tests)
const LINE_AUTHORIZE_URL: &str = "https://access.line.me/oauth2/v2.1/authorize";
const LINE_TOKEN_URL: &str = "https://api.line.me/oauth2/v2.1/token";
const LINE_JWKS_URL: &str = "https://api.line.me/oauth2/v2.1/certs";
const LINE_ISSUER: &str = "https://access.line.me";
const LINE_SCOPES: &str = "openid profile email";

/// Auth core configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// LINE channel ID (OAuth client id)
    pub line_channel_id: String,
    /// LINE channel secret (OAuth client secret, also the HS256 fallback key)
    pub line_channel_secret: String,
    /// Registered redirect URI for the authorization-code flow
    pub line_redirect_uri: String,
    /// Requested scopes
    pub line_scopes: String,
    /// Provider authorization endpoint
    pub authorize_url: String,
    /// Provider token-exchange endpoint
    pub token_url: String,
    /// Provider JWKS endpoint
    pub jwks_url: String,
    /// Expected `iss` of provider identity tokens
    pub issuer: String,
    /// HMAC secret for application-issued tokens (session and pre-auth)
    pub app_secret: String,
    /// Session token lifetime
    pub session_lifetime: Duration,
    /// Pre-auth token lifetime
    pub preauth_lifetime: Duration,
    /// CSRF / OAuth-state token lifetime
    pub state_lifetime: Duration,
    /// JWKS cache refresh interval
    pub jwks_refresh_interval: Duration,
}

impl AuthConfig {
    /// Minimum application secret length in bytes (256 bits)
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a new auth config.
    ///
    /// Provider credentials may be empty here; [`crate::LineLoginService`]
    /// rejects login attempts against an unconfigured provider at call time.
    ///
    /// # Errors
    /// Returns an error if the application secret is shorter than 32 bytes.
    pub fn new(
        line_channel_id: impl Into<String>,
        line_channel_secret: impl Into<String>,
        line_redirect_uri: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<Self, AuthConfigError> {
        let app_secret = app_secret.into();
        if app_secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(AuthConfigError::SecretTooShort {
                actual: app_secret.len(),
                minimum: Self::MIN_SECRET_LENGTH,
            });
        }

        Ok(Self {
            line_channel_id: line_channel_id.into(),
            line_channel_secret: line_channel_secret.into(),
            line_redirect_uri: line_redirect_uri.into(),
            line_scopes: LINE_SCOPES.to_string(),
            authorize_url: LINE_AUTHORIZE_URL.to_string(),
            token_url: LINE_TOKEN_URL.to_string(),
            jwks_url: LINE_JWKS_URL.to_string(),
            issuer: LINE_ISSUER.to_string(),
            app_secret,
            session_lifetime: Duration::from_secs(12 * 60 * 60),
            preauth_lifetime: Duration::from_secs(30 * 60),
            state_lifetime: Duration::from_secs(5 * 60),
            jwks_refresh_interval: Duration::from_secs(24 * 60 * 60),
        })
    }

    /// Override the authorization endpoint
    #[must_use]
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Override the token-exchange endpoint
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Override the JWKS endpoint
    #[must_use]
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    /// Override the expected identity-token issuer
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set session token lifetime
    #[must_use]
    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Set pre-auth token lifetime
    #[must_use]
    pub fn with_preauth_lifetime(mut self, lifetime: Duration) -> Self {
        self.preauth_lifetime = lifetime;
        self
    }

    /// Set CSRF / OAuth-state token lifetime
    #[must_use]
    pub fn with_state_lifetime(mut self, lifetime: Duration) -> Self {
        self.state_lifetime = lifetime;
        self
    }

    /// Set JWKS cache refresh interval
    #[must_use]
    pub fn with_jwks_refresh_interval(mut self, interval: Duration) -> Self {
        self.jwks_refresh_interval = interval;
        self
    }
}

/// Errors that can occur when building an [`AuthConfig`]
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthConfigError {
    #[error("application secret too short: got {actual} bytes, need at least {minimum}")]
    SecretTooShort { actual: usize, minimum: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_length_enforced() {
        let result = AuthConfig::new("id", "secret", "https://app/callback", "short");
        assert!(matches!(
            result,
            Err(AuthConfigError::SecretTooShort { actual: 5, .. })
        ));

        assert!(AuthConfig::new("id", "secret", "https://app/callback", "a".repeat(32)).is_ok());
    }

    #[test]
    fn test_defaults() {
        let config =
            AuthConfig::new("id", "secret", "https://app/callback", "a".repeat(32)).unwrap();
        assert_eq!(config.issuer, "https://access.line.me");
        assert_eq!(config.session_lifetime, Duration::from_secs(43_200));
        assert_eq!(config.preauth_lifetime, Duration::from_secs(1_800));
        assert_eq!(config.state_lifetime, Duration::from_secs(300));
        assert_eq!(config.jwks_refresh_interval, Duration::from_secs(86_400));
    }
}
