//! HTTP cache validation module
//!
//! `Last-Modified` generation and `If-Modified-Since` handling.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Format a modification time as an HTTP date, e.g. `Sun, 18 Oct 2026 10:04:05 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Check whether the client's cached copy is still current
///
/// `If-None-Match` takes precedence, so its presence disables the date check.
/// Unparseable dates are ignored. The modification time is compared with
/// second precision, the resolution of HTTP dates.
///
/// # Returns
/// Returns true if the response should be 304 Not Modified
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    has_if_none_match: bool,
    modified: Option<SystemTime>,
) -> bool {
    if has_if_none_match {
        return false;
    }
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Ok(since) = DateTime::parse_from_rfc2822(header.trim()) else {
        return false;
    };

    let modified = DateTime::<Utc>::from(modified).timestamp();
    modified <= since.timestamp()
}
