//! Static file serving module
//!
//! Maps request paths onto the serving root, handles directories (trailing
//! slash redirect, index files, listings) and builds file responses.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, uri};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Translate a raw request path into a path relative to the serving root
///
/// The path is percent-decoded and normalised segment by segment: empty and
/// `.` segments are dropped, `..` removes the previous segment but never
/// climbs above the root, and segments that would be read as separators or
/// drive prefixes by the platform are skipped.
///
/// Returns `None` for paths that cannot name a file (invalid UTF-8, NUL).
pub fn translate_path(raw_path: &str) -> Option<PathBuf> {
    let decoded = uri::decode_path(raw_path)?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.chars().any(std::path::is_separator) => {}
            s if cfg!(windows) && s.contains(':') => {}
            s => segments.push(s),
        }
    }

    Some(segments.iter().collect())
}

/// Serve a GET/HEAD request from the serving root
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let Some(relative) = translate_path(ctx.path) else {
        return http::build_404_response(ctx.is_head);
    };
    let target = state.root.join(relative);

    // File not found is common (404), no need to log at warning level
    let metadata = match fs::metadata(&target).await {
        Ok(m) => m,
        Err(e) => return io_error_response(&e, StatusCode::NOT_FOUND, ctx.is_head),
    };
    if !is_within_root(&state.root, &target, ctx.path).await {
        return http::build_404_response(ctx.is_head);
    }

    if metadata.is_dir() {
        return serve_directory(ctx, state, &target).await;
    }

    // A file cannot be addressed as a directory
    if ctx.path.ends_with('/') {
        return http::build_404_response(ctx.is_head);
    }

    serve_file(ctx, state, &target, &metadata).await
}

/// Serve a directory: redirect to the slash form, then index file, then listing
async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    dir: &Path,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        return http::build_redirect_response(&directory_location(ctx.path, ctx.query));
    }

    for index_file in &state.config.http.index_files {
        let index_path = dir.join(index_file);
        let Ok(metadata) = fs::metadata(&index_path).await else {
            continue;
        };
        if metadata.is_file() && is_within_root(&state.root, &index_path, ctx.path).await {
            return serve_file(ctx, state, &index_path, &metadata).await;
        }
    }

    match listing::read_entries(dir).await {
        Ok(entries) => {
            let display_path =
                uri::decode_path(ctx.path).unwrap_or_else(|| ctx.path.to_string());
            http::build_html_response(
                listing::render_listing(&display_path, &entries),
                ctx.is_head,
            )
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            if e.kind() == io::ErrorKind::PermissionDenied {
                http::build_error_response(
                    StatusCode::FORBIDDEN,
                    Some("No permission to list directory"),
                    ctx.is_head,
                )
            } else {
                http::build_404_response(ctx.is_head)
            }
        }
    }
}

/// Location of the slash form of a directory path
///
/// Leading slashes are collapsed so the result is always a path on this
/// host, never a protocol-relative `//host/...` reference.
fn directory_location(path: &str, query: Option<&str>) -> String {
    let path = path.trim_start_matches('/');
    match query {
        Some(query) => format!("/{path}/?{query}"),
        None => format!("/{path}/"),
    }
}

/// Serve a regular file with its content type and `Last-Modified`
async fn serve_file(
    ctx: &RequestContext<'_>,
    state: &AppState,
    path: &Path,
    metadata: &Metadata,
) -> Response<Full<Bytes>> {
    let content_type = state.mime.content_type_for(path);
    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_http_date);

    if cache::is_not_modified(
        ctx.if_modified_since.as_deref(),
        ctx.has_if_none_match,
        modified,
    ) {
        return http::build_304_response(last_modified.as_deref());
    }

    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    path.display()
                ));
            }
            return io_error_response(&e, StatusCode::INTERNAL_SERVER_ERROR, ctx.is_head);
        }
    };

    http::build_file_response(
        Bytes::from(content),
        content_type,
        last_modified.as_deref(),
        ctx.is_head,
    )
}

/// Check that `target` still resolves inside the root once symlinks are followed
async fn is_within_root(root: &Path, target: &Path, request_path: &str) -> bool {
    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Serving root not found or inaccessible '{}': {e}",
                root.display()
            ));
            return false;
        }
    };

    let Ok(target_canonical) = fs::canonicalize(target).await else {
        return false;
    };
    if target_canonical.starts_with(&root_canonical) {
        return true;
    }

    logger::log_warning(&format!(
        "Path traversal attempt blocked: {request_path} -> {}",
        target_canonical.display()
    ));
    false
}

/// Map a filesystem error to a status; `otherwise` covers unexpected kinds
fn io_error_response(
    err: &io::Error,
    otherwise: StatusCode,
    is_head: bool,
) -> Response<Full<Bytes>> {
    match err.kind() {
        io::ErrorKind::NotFound => http::build_404_response(is_head),
        io::ErrorKind::PermissionDenied => http::build_error_response(
            StatusCode::FORBIDDEN,
            Some("Permission denied"),
            is_head,
        ),
        _ if otherwise == StatusCode::NOT_FOUND => http::build_404_response(is_head),
        _ => http::build_error_response(otherwise, None, is_head),
    }
}
