//! Development response headers
//!
//! Applied to every response after the static file logic has built it.

use hyper::header::{HeaderName, HeaderValue, CACHE_CONTROL, SERVER};
use hyper::Response;

pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

pub const COOP_VALUE: &str = "same-origin";
pub const COEP_VALUE: &str = "require-corp";
pub const NO_CACHE_VALUE: &str = "no-cache, no-store, must-revalidate";

/// Insert the cross-origin isolation and no-cache headers, replacing any
/// value the response already carried
pub fn apply_dev_headers<B>(response: &mut Response<B>, server_name: &str) {
    let headers = response.headers_mut();
    // Cross-origin isolation, needed for SharedArrayBuffer
    headers.insert(
        CROSS_ORIGIN_OPENER_POLICY,
        HeaderValue::from_static(COOP_VALUE),
    );
    headers.insert(
        CROSS_ORIGIN_EMBEDDER_POLICY,
        HeaderValue::from_static(COEP_VALUE),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE_VALUE));

    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
}
