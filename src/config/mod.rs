// Configuration module entry point
// Builds the immutable startup configuration and the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, DEFAULT_PORT};

/// Config file looked up in the working directory (any format `config` understands)
pub const CONFIG_FILE: &str = "devserver";

impl Config {
    /// Load configuration from the default `devserver` file
    pub fn load(port_override: Option<u16>) -> Result<Self, config::ConfigError> {
        Self::load_from(CONFIG_FILE, port_override)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence: command-line port, then the file, then built-in defaults.
    /// A missing file is not an error.
    pub fn load_from(
        config_path: &str,
        port_override: Option<u16>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "dev")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default(
                "http.server_name",
                concat!("wasm_devserver/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.index_files", vec!["index.html", "index.htm"])?;

        if let Some(port) = port_override {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// URL announced at startup
    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.server.port)
    }
}
