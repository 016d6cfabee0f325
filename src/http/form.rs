//! URL-encoded form and query decoding

use serde::de::DeserializeOwned;

use crate::logger;

/// Decode an `application/x-www-form-urlencoded` body
///
/// Undecodable bodies are logged and treated as an empty submission, so
/// they fail validation like any blank form would.
pub fn parse_form<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_urlencoded::from_bytes(body).unwrap_or_else(|e| {
        logger::log_warning(&format!("Undecodable form body: {e}"));
        T::default()
    })
}

/// Decode a query string (without the leading `?`)
pub fn parse_query<T: DeserializeOwned + Default>(query: Option<&str>) -> T {
    query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default()
}

/// Append a single encoded query parameter to a path
pub fn with_query_param(path: &str, key: &str, value: &str) -> String {
    match serde_urlencoded::to_string([(key, value)]) {
        Ok(encoded) => format!("{path}?{encoded}"),
        Err(_) => path.to_string(),
    }
}
