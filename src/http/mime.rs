//! MIME type detection module
//!
//! Returns the Content-Type for a served file from its extension.

use std::collections::HashMap;
use std::path::Path;

/// Content type used when nothing is known about an extension
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Entries a stock static file server adds on top of the system database
const STOCK_EXTENSIONS: [(&str, &str); 4] = [
    (".gz", "application/gzip"),
    (".Z", "application/octet-stream"),
    (".bz2", "application/x-bzip2"),
    (".xz", "application/x-xz"),
];

/// Overrides required by browser WebAssembly builds
const BUILD_OVERRIDES: [(&str, &str); 3] = [
    (".wasm", "application/wasm"),
    (".js", "application/javascript"),
    (".data", "application/octet-stream"),
];

/// Extension (with leading dot) to content type mapping
///
/// Explicit entries win over the `mime_guess` database, which stands in for
/// the platform's default mapping.
#[derive(Debug, Clone)]
pub struct MimeTable {
    entries: HashMap<String, String>,
}

impl MimeTable {
    pub fn new() -> Self {
        let entries = STOCK_EXTENSIONS
            .iter()
            .chain(BUILD_OVERRIDES.iter())
            .map(|(ext, ct)| ((*ext).to_string(), (*ct).to_string()))
            .collect();
        Self { entries }
    }

    /// Look up an extension given with or without its leading dot
    ///
    /// # Examples
    /// ```ignore
    /// let table = MimeTable::new();
    /// assert_eq!(table.lookup(".js"), "application/javascript");
    /// assert_eq!(table.lookup("png"), "image/png");
    /// assert_eq!(table.lookup(".unknown"), "application/octet-stream");
    /// ```
    pub fn lookup(&self, extension: &str) -> &str {
        let bare = extension.trim_start_matches('.');
        if bare.is_empty() {
            return DEFAULT_CONTENT_TYPE;
        }

        let dotted = format!(".{bare}");
        if let Some(ct) = self.entries.get(&dotted) {
            return ct;
        }
        if let Some(ct) = self.entries.get(&dotted.to_lowercase()) {
            return ct;
        }

        mime_guess::from_ext(bare)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Content type for a file path, based on its final extension
    pub fn content_type_for(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(DEFAULT_CONTENT_TYPE, |ext| self.lookup(ext))
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}
