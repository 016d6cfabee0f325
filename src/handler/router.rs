//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, session and user
//! resolution, route matching, dispatch and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, REFERER, SERVER, SET_COOKIE, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode, Version};

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, Resolution};
use crate::session::Session;
use crate::store::{is_valid_username, StoreError, User};
use crate::views::{self, RequestContext};

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let start = Instant::now();
    let (parts, body) = req.into_parts();

    logger::log_headers_count(parts.headers.len(), state.config.logging.show_headers);

    let (response, remote_user) =
        match check_body_size(&parts.headers, state.config.http.max_body_size) {
            Some(resp) => (resp, None),
            None => respond(&parts, body, &state).await,
        };

    let mut response = if parts.method == Method::HEAD {
        http::strip_body(response)
    } else {
        response
    };
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.access_log_enabled() {
        log_access(&parts, &response, remote_user, peer_addr, start, &state);
    }

    Ok(response)
}

/// Resolve and dispatch a request whose headers passed the size check
///
/// Returns the response and the authenticated username, if any.
async fn respond<B>(
    parts: &Parts,
    body: B,
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<String>)
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = match read_body(body, state.config.http.max_body_size).await {
        Ok(body) => body,
        Err(resp) => return (resp, None),
    };

    let user = match resolve_user(&parts.headers, state).await {
        Ok(user) => user,
        Err(e) => {
            logger::log_error(&format!("Failed to record remote user: {e}"));
            return (http::build_500_response(), None);
        }
    };
    let remote_user = user.as_ref().map(|u| u.username.clone());

    let path = parts.uri.path();
    let response = match routing::resolve(&parts.method, path) {
        Resolution::Matched(route) => {
            let cookie =
                http::cookies::find_cookie(&parts.headers, &state.config.session.cookie_name);
            let mut ctx = RequestContext {
                method: parts.method.clone(),
                path: path.to_string(),
                query: parts.uri.query().map(ToString::to_string),
                body,
                user,
                session: state.sessions.load(cookie.as_deref()).await,
            };
            let mut response = views::dispatch(route, &mut ctx, state).await;
            persist_session(ctx.session, state, &mut response).await;
            response
        }
        Resolution::MethodNotAllowed(allow) => {
            logger::log_warning(&format!("Method not allowed: {} {path}", parts.method));
            http::build_405_response(allow)
        }
        Resolution::AppendSlash(target) => {
            let target = match parts.uri.query() {
                Some(q) => format!("{target}?{q}"),
                None => target,
            };
            http::build_redirect_response_with_code(&target, StatusCode::MOVED_PERMANENTLY)
        }
        Resolution::NotFound => http::build_404_response(),
    };

    (response, remote_user)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the request body, enforcing the size limit on chunked bodies too
async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!(
                "Request body too large (max: {max_body_size})"
            ));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_text_response(
                StatusCode::BAD_REQUEST,
                "400 Bad Request".to_string(),
            ))
        }
    }
}

/// Look up the user asserted by the authentication proxy
async fn resolve_user(headers: &HeaderMap, state: &AppState) -> Result<Option<User>, StoreError> {
    let username = headers
        .get(state.config.auth.remote_user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match username {
        Some(name) if is_valid_username(name) => state.store.ensure_user(name).await.map(Some),
        Some(name) => {
            logger::log_warning(&format!("Ignoring invalid remote user {name:?}"));
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Store the session and hand its cookie to the client when it changed
async fn persist_session(session: Session, state: &AppState, response: &mut Response<Full<Bytes>>) {
    let previous = session.id();
    let modified = session.is_modified();
    let Some(id) = state.sessions.save(session).await else {
        return;
    };
    if previous == Some(id) && !modified {
        return;
    }

    let cfg = &state.config.session;
    let cookie = http::cookies::session_cookie(&cfg.cookie_name, &id.to_string(), cfg.max_age);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => logger::log_error(&format!("Invalid session cookie: {e}")),
    }
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn log_access(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    remote_user: Option<String>,
    peer_addr: SocketAddr,
    start: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.remote_user = remote_user;
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = match parts.version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_string(&parts.headers, REFERER);
    entry.user_agent = header_string(&parts.headers, USER_AGENT);
    entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::Store;

    fn state_with(config: &Config) -> Arc<AppState> {
        Arc::new(AppState::with_store(config, Arc::new(Store::in_memory())))
    }

    fn state() -> Arc<AppState> {
        state_with(&Config::load_from("no-such-rango-config").unwrap())
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request(method: &str, uri: &str) -> hyper::http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    async fn send(
        state: &Arc<AppState>,
        builder: hyper::http::request::Builder,
        body: &'static str,
    ) -> Response<Full<Bytes>> {
        let req = builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap();
        handle_request(req, Arc::clone(state), peer()).await.unwrap()
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_id(resp: &Response<Full<Bytes>>) -> String {
        let header = resp.headers()[SET_COOKIE].to_str().unwrap();
        let cookie = cookie::Cookie::parse(header.to_string()).unwrap();
        assert_eq!(cookie.name(), "sessionid");
        assert_eq!(cookie.http_only(), Some(true));
        cookie.value().to_string()
    }

    #[tokio::test]
    async fn test_missing_slash_redirects_permanently() {
        let state = state();
        let resp = send(&state, request("GET", "/about?x=1"), "").await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()["Location"], "/about/?x=1");
    }

    #[tokio::test]
    async fn test_unknown_path_not_found() {
        let state = state();
        let resp = send(&state, request("GET", "/nowhere/"), "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_lists_allowed() {
        let state = state();
        let resp = send(&state, request("POST", "/about/"), "").await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], "GET, HEAD");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let state = state();
        let resp = send(&state, request("HEAD", "/"), "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[SERVER], "rango/0.1");
        assert!(body_string(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_visit_counter_survives_requests() {
        let state = state();
        let resp = send(&state, request("GET", "/about/"), "").await;
        let sid = session_id(&resp);
        assert!(body_string(resp).await.contains("visits: 1"));

        let resp = send(
            &state,
            request("GET", "/about/").header("Cookie", format!("sessionid={sid}")),
            "",
        )
        .await;
        // Same day, so the count holds
        assert!(body_string(resp).await.contains("visits: 1"));
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_untouched_session_sets_no_cookie() {
        let state = state();
        let resp = send(&state, request("GET", "/category/python/"), "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!resp.headers().contains_key(SET_COOKIE));
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_anonymous_redirected_to_login() {
        let state = state();
        let resp = send(&state, request("GET", "/restricted/"), "").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers()["Location"],
            "/accounts/login/?next=%2Frestricted%2F"
        );
    }

    #[tokio::test]
    async fn test_remote_user_is_recorded() {
        let state = state();
        let resp = send(
            &state,
            request("GET", "/restricted/").header("X-Remote-User", "leifos"),
            "",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.store.user_by_username("leifos").await.is_some());
    }

    #[tokio::test]
    async fn test_unsafe_remote_user_is_anonymous() {
        let state = state();
        let resp = send(
            &state,
            request("GET", "/restricted/").header("X-Remote-User", "a/b?c"),
            "",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(state.store.user_by_username("a/b?c").await.is_none());
    }

    #[tokio::test]
    async fn test_add_category_then_listed_on_index() {
        let state = state();
        let resp = send(
            &state,
            request("POST", "/add_category/")
                .header("X-Remote-User", "leifos")
                .header("Content-Type", "application/x-www-form-urlencoded"),
            "name=Rust",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()["Location"], "/");

        let resp = send(&state, request("GET", "/"), "").await;
        assert!(body_string(resp).await.contains("Rust"));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = Config::load_from("no-such-rango-config").unwrap();
        config.http.max_body_size = 8;
        let state = state_with(&config);

        let resp = send(
            &state,
            request("POST", "/add_category/").header("X-Remote-User", "leifos"),
            "name=Far+Too+Long",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = send(
            &state,
            request("POST", "/add_category/").header("Content-Length", "1000"),
            "",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(state.store.top_categories(5).await.is_empty());
    }
}
