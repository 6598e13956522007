//! Expiring token store
//!
//! Concurrent key -> (token, expiry) map backing CSRF tokens and OAuth state
//! nonces. Entries live in process memory only; a restart invalidates all
//! outstanding tokens, which is an accepted limitation of the design.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use subtle::ConstantTimeEq;

#[derive(Debug, Clone)]
struct StoredToken {
    value: String,
    expires_at: Instant,
}

/// Concurrency-safe expiring token store.
///
/// Reads (`validate`, `get`) take a shared lock and do not block each other;
/// writes (`save`, `delete`, `sweep`) are exclusive. An expired entry found
/// on the read path is lazily purged under a short exclusive lock.
#[derive(Debug, Default)]
pub struct TokenStore {
    entries: RwLock<HashMap<String, StoredToken>>,
}

impl TokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a token under `key`, unconditionally overwriting any existing
    /// entry. The entry expires `ttl` from now.
    pub fn save(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        let entry = StoredToken {
            value: value.into(),
            expires_at: Instant::now() + ttl,
        };
        self.write().insert(key.into(), entry);
    }

    /// Check that an unexpired entry for `key` exactly matches `candidate`.
    ///
    /// An expired entry is purged as a side effect. A successful match does
    /// NOT consume the entry; callers wanting one-time-use semantics must
    /// call [`TokenStore::delete`] after use.
    pub fn validate(&self, key: &str, candidate: &str) -> bool {
        let entry = match self.read().get(key) {
            Some(entry) => entry.clone(),
            None => return false,
        };

        if entry.expires_at <= Instant::now() {
            self.purge_if_expired(key);
            return false;
        }

        entry.value.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Get the unexpired token stored under `key`, purging it if expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.read().get(key).cloned()?;

        if entry.expires_at <= Instant::now() {
            self.purge_if_expired(key);
            return None;
        }

        Some(entry.value)
    }

    /// Remove the entry for `key`. Idempotent.
    pub fn delete(&self, key: &str) {
        self.write().remove(key);
    }

    /// Remove every expired entry, returning how many were dropped.
    ///
    /// Intended to run periodically to bound memory; the scheduler lives in
    /// the surrounding service.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of live entries (expired-but-unswept entries included)
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove `key` only if its entry is (still) expired. Re-checks under the
    /// exclusive lock so a concurrent overwrite is never clobbered.
    fn purge_if_expired(&self, key: &str) {
        let mut entries = self.write();
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredToken>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredToken>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_save_then_validate_and_get() {
        let store = TokenStore::new();
        store.save("session-1", "token-abc", TTL);

        assert!(store.validate("session-1", "token-abc"));
        assert_eq!(store.get("session-1").as_deref(), Some("token-abc"));
        // validate does not consume
        assert!(store.validate("session-1", "token-abc"));
    }

    #[test]
    fn test_wrong_value_rejected() {
        let store = TokenStore::new();
        store.save("session-1", "token-abc", TTL);

        assert!(!store.validate("session-1", "token-xyz"));
        assert!(!store.validate("unknown-session", "token-abc"));
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let store = TokenStore::new();
        store.save("session-1", "old", TTL);
        store.save("session-1", "new", TTL);

        assert!(!store.validate("session-1", "old"));
        assert!(store.validate("session-1", "new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_purged_lazily() {
        let store = TokenStore::new();
        store.save("session-1", "token-abc", Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));

        assert!(!store.validate("session-1", "token-abc"));
        // purged by the failed validate, so get misses without re-checking expiry
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("session-1"), None);
    }

    #[test]
    fn test_get_purges_expired_entry() {
        let store = TokenStore::new();
        store.save("session-1", "token-abc", Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(store.get("session-1"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = TokenStore::new();
        store.save("session-1", "token-abc", TTL);

        store.delete("session-1");
        store.delete("session-1");
        assert!(!store.validate("session-1", "token-abc"));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = TokenStore::new();
        store.save("expired-1", "a", Duration::from_millis(5));
        store.save("expired-2", "b", Duration::from_millis(5));
        store.save("live", "c", TTL);
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(store.sweep(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.validate("live", "c"));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = Arc::new(TokenStore::new());
        store.save("shared", "value", TTL);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for j in 0..200 {
                    if i % 2 == 0 {
                        assert!(store.validate("shared", "value"));
                    } else {
                        store.save(format!("writer-{i}-{j}"), "v", TTL);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.validate("shared", "value"));
    }
}
