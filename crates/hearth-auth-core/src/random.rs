//! Random token generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a URL-safe random string from `bytes` bytes of OS entropy.
///
/// Used for OAuth state nonces, CSRF tokens, household invite codes, and
/// placeholder passwords.
pub fn random_url_safe(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
