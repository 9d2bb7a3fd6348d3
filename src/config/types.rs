// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Directory whose contents are exposed, relative to the working directory
pub const ROOT_DIRECTORY: &str = "build-web";

/// Port used when neither the command line nor the config file names one
pub const DEFAULT_PORT: u16 = 8000;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Fixed serving root, never read from the config file
    #[serde(skip_deserializing, default = "default_root_directory")]
    pub root_directory: String,
    pub workers: Option<usize>,
}

fn default_root_directory() -> String {
    ROOT_DIRECTORY.to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (dev, common, combined, json)
    pub access_log_format: String,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds a connection may sit idle between requests; zero disables
    /// HTTP keep-alive
    pub keep_alive_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Files tried, in order, when a directory is requested
    pub index_files: Vec<String>,
}
