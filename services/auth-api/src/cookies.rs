//! Cookie reading and building helpers
//!
//! The session token travels as an HTTP-only `token` cookie alongside a
//! JS-readable `logged_in` flag; a pending LINE identity travels as an
//! HTTP-only `line_pre_auth` cookie.

use axum::http::{header, HeaderMap};

use crate::config::Config;

/// Session token cookie name
pub const SESSION_COOKIE: &str = "token";
/// JS-readable login flag cookie name
pub const LOGGED_IN_COOKIE: &str = "logged_in";
/// Pending LINE identity cookie name
pub const PRE_AUTH_COOKIE: &str = "line_pre_auth";

/// Read a cookie value from the request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|cookie| {
        let (cookie_name, value) = cookie.trim().split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}

/// Build a Set-Cookie value
pub fn build_cookie(
    config: &Config,
    name: &str,
    value: &str,
    max_age_secs: i64,
    http_only: bool,
) -> String {
    let mut cookie = format!("{name}={value}; Max-Age={max_age_secs}; Path=/");

    if !config.cookie_domain.is_empty() {
        cookie.push_str("; Domain=");
        cookie.push_str(&config.cookie_domain);
    }

    // Cross-site cookies need SameSite=None, which browsers only accept over
    // Secure; dev runs over plain HTTP and falls back to Lax.
    if config.cookie_secure {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Lax");
    }

    if http_only {
        cookie.push_str("; HttpOnly");
    }

    cookie
}

/// Session cookie pair set on every successful login
pub fn login_cookies(config: &Config, session_token: &str) -> [String; 2] {
    let max_age = config.auth.session_lifetime.as_secs() as i64;
    [
        build_cookie(config, SESSION_COOKIE, session_token, max_age, true),
        build_cookie(config, LOGGED_IN_COOKIE, "true", max_age, false),
    ]
}

/// Expired session cookie pair set on logout
pub fn logout_cookies(config: &Config) -> [String; 2] {
    [
        build_cookie(config, SESSION_COOKIE, "", -1, true),
        build_cookie(config, LOGGED_IN_COOKIE, "", -1, false),
    ]
}

/// Pre-auth cookie holding a pending LINE identity
pub fn pre_auth_cookie(config: &Config, pre_auth_token: &str) -> String {
    let max_age = config.auth.preauth_lifetime.as_secs() as i64;
    build_cookie(config, PRE_AUTH_COOKIE, pre_auth_token, max_age, true)
}

/// Expired pre-auth cookie, cleared once the identity is linked or created
pub fn clear_pre_auth_cookie(config: &Config) -> String {
    build_cookie(config, PRE_AUTH_COOKIE, "", -1, true)
}
