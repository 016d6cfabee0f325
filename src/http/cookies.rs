//! Cookie helpers
//!
//! Reads request cookies and builds the session `Set-Cookie` value.

use cookie::{Cookie, SameSite};
use hyper::header::{HeaderMap, COOKIE};

/// Find a cookie value across all `Cookie` headers of a request
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// Build the `Set-Cookie` header value for a session id
pub fn session_cookie(name: &str, value: &str, max_age_secs: u64) -> String {
    let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(max_age))
        .build()
        .to_string()
}
