//! Session cookies.
//!
//! The local session id travels in an `HttpOnly` cookie. `SameSite=Lax` is
//! required because the identity provider returns the browser with a
//! top-level cross-site navigation.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use ssp_session::SessionState;

/// Cookie carrying the local session id.
pub const SESSION_COOKIE_NAME: &str = "ssp_session";

/// Cookie set by the identity provider's service; expired on logout.
pub const PROVIDER_TOKEN_COOKIE_NAME: &str = "SimpleSAMLAuthToken";

/// Builds the session cookie for a session id.
#[must_use]
pub fn create_session_cookie(session_id: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE_NAME}={session_id}; HttpOnly{secure_flag}; SameSite=Lax; Path=/")
}

/// Builds a header that expires a cookie immediately.
#[must_use]
pub fn expire_cookie(name: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}=; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age=0")
}

/// Appends a `Set-Cookie` header, keeping any already present.
pub fn append_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => tracing::warn!(error = %err, "Dropping unencodable cookie"),
    }
}

/// Reads the session id from the request cookies.
///
/// Values that are not valid session ids are ignored.
pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|part| part.trim().strip_prefix(SESSION_COOKIE_NAME)?.strip_prefix('='))
        .map(str::trim)
        .find(|value| SessionState::is_valid_id(value))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = create_session_cookie("abc123", true);
        assert!(cookie.starts_with("ssp_session=abc123;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("; Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!create_session_cookie("abc123", false).contains("Secure"));
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        let cookie = expire_cookie(PROVIDER_TOKEN_COOKIE_NAME, false);
        assert!(cookie.starts_with("SimpleSAMLAuthToken=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }

    #[test]
    fn extracts_among_other_cookies() {
        let headers = request_with("theme=dark; ssp_session=abc123; other=1");
        assert_eq!(extract_session_id(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn ignores_similar_names_and_bad_values() {
        assert_eq!(extract_session_id(&request_with("ssp_session_old=abc")), None);
        assert_eq!(extract_session_id(&request_with("ssp_session=")), None);
        assert_eq!(extract_session_id(&request_with("ssp_session=a b")), None);
        assert_eq!(extract_session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn append_keeps_existing_cookies() {
        let mut headers = HeaderMap::new();
        append_cookie(&mut headers, &create_session_cookie("abc", false));
        append_cookie(&mut headers, &expire_cookie(PROVIDER_TOKEN_COOKIE_NAME, false));
        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 2);
    }
}
