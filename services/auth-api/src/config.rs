//! Configuration for the Auth API service.

use std::time::Duration;

use hearth_auth_core::AuthConfig;

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Frontend origin allowed by CORS
    pub frontend_origin: String,

    /// Cookie domain; empty means host-only cookies
    pub cookie_domain: String,

    /// Whether cookies carry the Secure attribute (off in dev)
    pub cookie_secure: bool,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Request timeout
    pub request_timeout: Duration,

    /// Interval between expired-token sweeps
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // LINE channel credentials. These may be absent in deployments that
        // only use password login; LineLoginService rejects begin_login at
        // call time when they are unset.
        let line_channel_id = std::env::var("LINE_CHANNEL_ID").unwrap_or_default();
        let line_channel_secret = std::env::var("LINE_CHANNEL_SECRET").unwrap_or_default();
        let line_redirect_uri = std::env::var("LINE_REDIRECT_URI").unwrap_or_default();

        // Application signing secret (minimum 32 bytes)
        let app_secret =
            std::env::var("APP_SECRET").map_err(|_| ConfigError::Missing("APP_SECRET"))?;

        let auth = AuthConfig::new(
            line_channel_id,
            line_channel_secret,
            line_redirect_uri,
            app_secret,
        )
        .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        // CORS / cookies
        let frontend_origin = std::env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let cookie_domain = std::env::var("COOKIE_DOMAIN").unwrap_or_default();

        let cookie_secure = std::env::var("APP_ENV")
            .map(|env| env != "dev")
            .unwrap_or(true);

        // Request timeout (default 30 seconds)
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        Ok(Self {
            http_port,
            database_url,
            frontend_origin,
            cookie_domain,
            cookie_secure,
            auth,
            request_timeout: Duration::from_secs(request_timeout_secs),
            sweep_interval: Duration::from_secs(60),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
