//! CSRF token service
//!
//! Issues per-session CSRF tokens out of an expiring token store and checks
//! the value echoed back on state-changing requests.

use std::time::Duration;

use crate::random::random_url_safe;
use crate::token_store::TokenStore;

const CSRF_TOKEN_BYTES: usize = 32;

/// CSRF token issuance and validation over a dedicated [`TokenStore`].
///
/// Each consumer (HTTP middleware, tests) gets its own instance; there is no
/// process-global store.
#[derive(Debug)]
pub struct CsrfProtection {
    store: TokenStore,
    ttl: Duration,
}

impl CsrfProtection {
    /// Create a CSRF service whose tokens live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: TokenStore::new(),
            ttl,
        }
    }

    /// Return the session's current token, generating a fresh one if the
    /// session has none or it expired.
    pub fn issue(&self, session_id: &str) -> String {
        if let Some(token) = self.store.get(session_id) {
            return token;
        }

        let token = random_url_safe(CSRF_TOKEN_BYTES);
        self.store.save(session_id, token.clone(), self.ttl);
        token
    }

    /// Check the echoed token against the session's stored token
    pub fn validate(&self, session_id: &str, token: &str) -> bool {
        self.store.validate(session_id, token)
    }

    /// Drop expired tokens; returns how many were removed
    pub fn sweep(&self) -> usize {
        self.store.sweep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_stable_until_expiry() {
        let csrf = CsrfProtection::new(Duration::from_secs(60));

        let token = csrf.issue("session-1");
        assert_eq!(csrf.issue("session-1"), token);
        assert!(csrf.validate("session-1", &token));
    }

    #[test]
    fn test_sessions_get_distinct_tokens() {
        let csrf = CsrfProtection::new(Duration::from_secs(60));

        let a = csrf.issue("session-a");
        let b = csrf.issue("session-b");
        assert_ne!(a, b);
        assert!(!csrf.validate("session-a", &b));
    }

    #[test]
    fn test_expired_token_is_replaced() {
        let csrf = CsrfProtection::new(Duration::from_millis(10));

        let old = csrf.issue("session-1");
        std::thread::sleep(Duration::from_millis(30));

        assert!(!csrf.validate("session-1", &old));
        let fresh = csrf.issue("session-1");
        assert_ne!(fresh, old);
        assert!(csrf.validate("session-1", &fresh));
    }
}
