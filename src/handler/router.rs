//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, static file
//! serving, development header injection and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub has_if_none_match: bool,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let headers = req.headers();
        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: req.method() == Method::HEAD,
            if_modified_since: headers
                .get(IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            has_if_none_match: headers.contains_key(IF_NONE_MATCH),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // Request bodies are never read
    let (parts, _body) = req.into_parts();
    let req = Request::from_parts(parts, ());
    let response = respond(&req, &state).await;

    if state.config.logging.access_log {
        let entry = access_log_entry(&req, &response, peer_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Build the complete response for a request, development headers included
pub async fn respond<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    let method = req.method();
    let mut response = match *method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext::from_request(req);
            static_files::serve(&ctx, state).await
        }
        _ => {
            logger::log_warning(&format!("Unsupported method: {method}"));
            http::build_error_response(
                StatusCode::NOT_IMPLEMENTED,
                Some(&format!("Unsupported method ('{method}')")),
                false,
            )
        }
    };

    http::apply_dev_headers(&mut response, &state.config.http.server_name);
    response
}

fn access_log_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), ToString::to_string);

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        target,
    );
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n > 0);
    entry.referer = header_string(req, REFERER);
    entry.user_agent = header_string(req, USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn header_string<B>(req: &Request<B>, name: hyper::header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{body_string, get, request, TempRoot};
    use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE, LAST_MODIFIED, LOCATION};

    const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

    fn assert_dev_headers(response: &Response<Full<Bytes>>) {
        let headers = response.headers();
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
        assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
        assert_eq!(headers[CACHE_CONTROL], NO_CACHE);
    }

    fn build_root() -> TempRoot {
        let root = TempRoot::new("router");
        root.write("index.html", "<html>game</html>");
        root.write("game.wasm", "\0asm");
        root.write("game.js", "console.log(1);");
        root.write("game.data", "DATA");
        root.write("style.css", "body{}");
        root.mkdir("assets");
        root.write("assets/b.png", "png");
        root.write("assets/A.txt", "text");
        root.mkdir("levels");
        root.write("levels/index.htm", "levels");
        root
    }

    #[tokio::test]
    async fn test_build_mime_overrides() {
        let root = build_root();
        let state = root.state();
        for (path, expected) in [
            ("/game.wasm", "application/wasm"),
            ("/game.js", "application/javascript"),
            ("/game.data", "application/octet-stream"),
            ("/style.css", "text/css"),
        ] {
            let response = respond(&get(path), &state).await;
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            assert_eq!(response.headers()[CONTENT_TYPE], expected, "{path}");
            assert_dev_headers(&response);
        }
    }

    #[tokio::test]
    async fn test_file_body_and_last_modified() {
        let root = build_root();
        let state = root.state();
        let response = respond(&get("/game.js"), &state).await;
        assert!(response.headers().contains_key(LAST_MODIFIED));
        assert_eq!(response.headers()["content-length"], "15");
        assert_eq!(body_string(response).await, "console.log(1);");
    }

    #[tokio::test]
    async fn test_head_has_headers_without_body() {
        let root = build_root();
        let state = root.state();
        let response = respond(&request(Method::HEAD, "/game.wasm"), &state).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/wasm");
        assert_eq!(response.headers()["content-length"], "4");
        assert_dev_headers(&response);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_dev_headers() {
        let root = build_root();
        let state = root.state();
        let response = respond(&get("/missing.wasm"), &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_dev_headers(&response);
        assert!(body_string(response).await.contains("File not found"));
    }

    #[tokio::test]
    async fn test_traversal_is_404() {
        let root = build_root();
        let state = root.state();
        for path in [
            "/../../etc/passwd",
            "/%2e%2e/%2e%2e/etc/passwd",
            "/assets/../../../etc/passwd",
        ] {
            let response = respond(&get(path), &state).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
            assert_dev_headers(&response);
            assert!(!body_string(response).await.contains("root:"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escaping_root_is_404() {
        let outside = TempRoot::new("outside");
        outside.write("secret.txt", "secret");
        let root = build_root();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.path().join("link.txt"))
            .unwrap();

        let response = respond(&get("/link.txt"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!body_string(response).await.contains("secret"));
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let root = build_root();
        let response = respond(&get("/"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(body_string(response).await, "<html>game</html>");
    }

    #[tokio::test]
    async fn test_second_index_file() {
        let root = build_root();
        let response = respond(&get("/levels/"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "levels");
    }

    #[tokio::test]
    async fn test_directory_redirects_to_trailing_slash() {
        let root = build_root();
        let state = root.state();

        let response = respond(&get("/assets"), &state).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/assets/");
        assert_dev_headers(&response);

        let response = respond(&get("/assets?v=1"), &state).await;
        assert_eq!(response.headers()[LOCATION], "/assets/?v=1");
    }

    #[tokio::test]
    async fn test_redirect_never_leaves_host() {
        let root = build_root();
        let state = root.state();
        for (path, expected) in [
            ("//evil.example/..", "/evil.example/../"),
            ("//assets", "/assets/"),
            ("//evil.example/..?next=1", "/evil.example/../?next=1"),
        ] {
            let response = respond(&get(path), &state).await;
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
            let location = response.headers()[LOCATION].to_str().unwrap();
            assert!(!location.starts_with("//"), "{path} -> {location}");
            assert_eq!(location, expected);
            assert_dev_headers(&response);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_file_is_403() {
        use std::os::unix::fs::PermissionsExt;

        let root = build_root();
        root.write("locked.wasm", "\0asm");
        let locked = root.path().join("locked.wasm");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits are not enforced for privileged users
        if std::fs::File::open(&locked).is_ok() {
            return;
        }

        let response = respond(&get("/locked.wasm"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_dev_headers(&response);
        assert!(body_string(response).await.contains("Permission denied"));
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let root = build_root();
        let response = respond(&get("/assets/"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_dev_headers(&response);

        let body = body_string(response).await;
        assert!(body.contains("Directory listing for /assets/"));
        let a = body.find("A.txt").unwrap();
        let b = body.find("b.png").unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_file_with_trailing_slash_is_404() {
        let root = build_root();
        let response = respond(&get("/game.js/"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_below_a_file_is_404() {
        let root = build_root();
        let response = respond(&get("/game.js/more"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let root = build_root();
        let state = root.state();

        let first = respond(&get("/game.wasm"), &state).await;
        let last_modified = first.headers()[LAST_MODIFIED].clone();

        let mut req = get("/game.wasm");
        req.headers_mut().insert(IF_MODIFIED_SINCE, last_modified.clone());
        let response = respond(&req, &state).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_dev_headers(&response);
        assert!(body_string(response).await.is_empty());

        req.headers_mut()
            .insert(IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
        let response = respond(&req, &state).await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut req = get("/game.wasm");
        req.headers_mut().insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"),
        );
        let response = respond(&req, &state).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let root = build_root();
        let response = respond(&request(Method::POST, "/game.js"), &root.state()).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_dev_headers(&response);
        assert!(body_string(response)
            .await
            .contains("Unsupported method ('POST')"));
    }

    #[tokio::test]
    async fn test_missing_root_is_404() {
        let root = build_root();
        let state = root.state().with_root(root.path().join("no-such-dir"));
        let response = respond(&get("/"), &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_dev_headers(&response);
    }

    #[test]
    fn test_access_log_entry() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/game.wasm?v=2")
            .header(USER_AGENT, "test-agent")
            .body(())
            .unwrap();
        let response = http::build_404_response(false);
        let peer: SocketAddr = "127.0.0.1:5555".parse().unwrap();

        let entry = access_log_entry(&req, &response, peer, Instant::now());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.target, "/game.wasm?v=2");
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.status, 404);
        assert!(entry.body_bytes.is_some());
        assert_eq!(entry.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(entry.referer, None);
    }
}
