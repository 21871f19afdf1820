//! Session tokens and the cookie that carries them
//!
//! The cookie holds an opaque random token; the database only ever sees
//! its SHA-256 digest, so a leaked sessions table cannot be replayed.

use axum::http::HeaderMap;
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use sha2::{Digest, Sha256};
use time::Duration;

pub const SESSION_COOKIE: &str = "underneath_session";

/// Length of the raw session token in characters.
const TOKEN_LEN: usize = 48;

/// Generate a new opaque session token.
pub fn generate_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Digest a raw token into the form stored in the sessions table.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Determine if the original request was HTTPS.
pub fn is_https(headers: &HeaderMap) -> bool {
    if let Some(v) = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
    {
        return v.eq_ignore_ascii_case("https");
    }

    if let Some(v) = headers.get("forwarded").and_then(|v| v.to_str().ok()) {
        return v.to_ascii_lowercase().contains("proto=https");
    }

    false
}

/// Builds the session cookie.
/// - Host-only (no Domain attribute)
/// - HttpOnly
/// - Secure if the request came over HTTPS
pub fn build_session_cookie(
    token: String,
    ttl_hours: i64,
    headers: &HeaderMap,
) -> Cookie<'static> {
    let mut c = Cookie::new(SESSION_COOKIE, token);

    c.set_http_only(true);
    c.set_secure(is_https(headers));
    c.set_same_site(SameSite::Lax);
    c.set_path("/");
    c.set_max_age(Duration::hours(ttl_hours));

    c
}

/// Builds an expired session cookie for logout.
pub fn clear_session_cookie(headers: &HeaderMap) -> Cookie<'static> {
    let mut c = Cookie::new(SESSION_COOKIE, "");

    c.set_http_only(true);
    c.set_secure(is_https(headers));
    c.set_same_site(SameSite::Lax);
    c.set_path("/");
    c.set_max_age(Duration::seconds(0));

    c
}

pub fn read_session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_generated_tokens_are_long_and_distinct() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_is_stable_and_opaque() {
        let token = generate_token();

        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        // base64url of a SHA-256 digest, no padding
        assert_eq!(hash_token(&token).len(), 43);
    }

    #[test]
    fn test_different_tokens_hash_differently() {
        assert_ne!(hash_token("one"), hash_token("two"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = build_session_cookie("tok".to_string(), 24, &HeaderMap::new());

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::hours(24)));
    }

    #[test]
    fn test_session_cookie_is_secure_behind_https_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));

        let cookie = build_session_cookie("tok".to_string(), 24, &headers);
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&HeaderMap::new());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::seconds(0)));
    }
}
