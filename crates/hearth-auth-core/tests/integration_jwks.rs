//! Integration tests for the JWKS key cache
//!
//! Uses wiremock to simulate the provider's key endpoint and asserts the
//! fetch-counting properties: at most one fetch per fresh window, exactly one
//! fetch after expiry, and typed failures for unreachable or malformed key
//! sets.

mod common;

use std::time::Duration;

use hearth_auth_core::{AuthError, JwksCache};

use common::jwks_mock::TEST_KEY_ID;
use common::JwksMockServer;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn test_resolve_known_kid() {
    let server = JwksMockServer::start().await;
    let cache = JwksCache::new(server.jwks_url(), DAY);

    let key = cache.resolve(TEST_KEY_ID).await;
    assert!(key.is_ok(), "Expected key, got: {:?}", key.err());
}

#[tokio::test]
async fn test_second_resolve_within_window_is_cache_only() {
    let server = JwksMockServer::start_bare().await;
    let _guard = server.expect_jwks_calls(1).await;

    let cache = JwksCache::new(server.jwks_url(), DAY);

    cache.resolve(TEST_KEY_ID).await.unwrap();
    // Served from the cache; the guard panics on drop if a second fetch ran
    cache.resolve(TEST_KEY_ID).await.unwrap();
}

#[tokio::test]
async fn test_expired_window_triggers_exactly_one_refetch() {
    let server = JwksMockServer::start_bare().await;
    let _guard = server.expect_jwks_calls(2).await;

    let cache = JwksCache::new(server.jwks_url(), Duration::from_millis(20));

    cache.resolve(TEST_KEY_ID).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    cache.resolve(TEST_KEY_ID).await.unwrap();
}

#[tokio::test]
async fn test_unknown_kid_fails_after_exactly_one_fetch() {
    let server = JwksMockServer::start_bare().await;
    let _guard = server.expect_jwks_calls(1).await;

    let cache = JwksCache::new(server.jwks_url(), DAY);

    let result = cache.resolve("kid-missing").await;
    match result {
        Err(AuthError::KeyNotFound(kid)) => assert_eq!(kid, "kid-missing"),
        Err(other) => panic!("Expected KeyNotFound, got: {other:?}"),
        Ok(_) => panic!("Expected KeyNotFound, got Ok"),
    }
}

#[tokio::test]
async fn test_error_status_is_key_fetch_error() {
    let server = JwksMockServer::start_bare().await;
    server.with_error_response(503).await;

    let cache = JwksCache::new(server.jwks_url(), DAY);

    assert!(matches!(
        cache.resolve(TEST_KEY_ID).await,
        Err(AuthError::KeyFetchError(_))
    ));
}

#[tokio::test]
async fn test_malformed_payload_is_key_fetch_error() {
    let server = JwksMockServer::start_bare().await;
    server.with_malformed_body().await;

    let cache = JwksCache::new(server.jwks_url(), DAY);

    assert!(matches!(
        cache.resolve(TEST_KEY_ID).await,
        Err(AuthError::KeyFetchError(_))
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_key_fetch_error() {
    // Nothing listens on this port
    let cache = JwksCache::new("http://127.0.0.1:9/certs", DAY);

    assert!(matches!(
        cache.resolve(TEST_KEY_ID).await,
        Err(AuthError::KeyFetchError(_))
    ));
}

#[tokio::test]
async fn test_key_set_without_requested_kid_is_key_not_found() {
    let server = JwksMockServer::start_bare().await;
    server
        .with_custom_jwks(vec![serde_json::json!({
            "kid": "other-key",
            "kty": "EC",
            "crv": "P-256"
        })])
        .await;

    let cache = JwksCache::new(server.jwks_url(), DAY);

    // The only published key is non-RSA and skipped during decode
    assert!(matches!(
        cache.resolve(TEST_KEY_ID).await,
        Err(AuthError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let server = JwksMockServer::start_bare().await;
    let _guard = server.expect_jwks_calls(2).await;

    let cache = JwksCache::new(server.jwks_url(), DAY);

    cache.resolve(TEST_KEY_ID).await.unwrap();
    cache.invalidate();
    cache.resolve(TEST_KEY_ID).await.unwrap();
}
