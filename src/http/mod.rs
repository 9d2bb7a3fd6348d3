//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! request dispatch in `handler`.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod response;
pub mod uri;

// Re-export commonly used types
pub use headers::apply_dev_headers;
pub use response::{
    build_304_response, build_404_response, build_error_response, build_file_response,
    build_html_response, build_redirect_response,
};
