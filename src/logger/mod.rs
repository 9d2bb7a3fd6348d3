//! Logger module
//!
//! Provides logging utilities for the development server:
//! - Startup announcement
//! - Access logging with multiple formats
//! - Error and warning logging
//!
//! Informational messages go to stdout; warnings, errors and access lines go
//! to stderr so stdout carries only the startup announcement.

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;

fn write_info(message: &str) {
    println!("{message}");
}

fn write_error(message: &str) {
    eprintln!("{message}");
}

fn write_access(message: &str) {
    eprintln!("{message}");
}

/// Line announcing where the build directory is served
pub fn startup_line(config: &Config) -> String {
    format!(
        "Serving {}/ at {}",
        config.server.root_directory,
        config.local_url()
    )
}

pub fn log_server_start(config: &Config) {
    write_info(&startup_line(config));
}

pub fn log_shutdown() {
    write_info("\nKeyboard interrupt received, exiting.");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
