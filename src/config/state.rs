// Application state module
// Immutable state shared by every connection handler

use std::path::PathBuf;

use super::types::Config;
use crate::http::mime::MimeTable;

/// Application state, built once at startup and shared behind an `Arc`
pub struct AppState {
    pub config: Config,
    pub root: PathBuf,
    pub mime: MimeTable,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let root = PathBuf::from(&config.server.root_directory);
        Self {
            config,
            root,
            mime: MimeTable::new(),
        }
    }

    #[cfg(test)]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
