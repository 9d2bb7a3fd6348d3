//! Command-line parsing
//!
//! The only argument is an optional positional port: `wasm_devserver [port]`.

use crate::logger;

/// Parse the port from the arguments following the program name
///
/// Returns `Ok(None)` when no argument was given. Anything that is not a
/// valid TCP port is rejected instead of silently falling back to the default.
pub fn parse_port_arg<I>(mut args: I) -> Result<Option<u16>, config::ConfigError>
where
    I: Iterator<Item = String>,
{
    let Some(raw) = args.next() else {
        return Ok(None);
    };

    let extra: Vec<String> = args.collect();
    if !extra.is_empty() {
        logger::log_warning(&format!("Ignoring extra arguments: {}", extra.join(" ")));
    }

    raw.trim()
        .parse::<u16>()
        .map(Some)
        .map_err(|e| config::ConfigError::Message(format!("Invalid port '{raw}': {e}")))
}
