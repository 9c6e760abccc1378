//! Structured logging for the synchronization layer
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-component debug control via --debug-<component> flags
//! - Colored console output, mirrored into the `log` facade
//!
//! ## Usage
//!
//! ```rust
//! use dashsync::logger::{self, LogTag};
//!
//! logger::error(LogTag::Stream, "Handshake failed");
//! logger::warning(LogTag::Endpoint, "Request returned 503");
//! logger::info(LogTag::Scheduler, "Refresh schedule started");
//! logger::debug(LogTag::Broker, "Collapsed onto in-flight request"); // Only with --debug-broker
//! logger::verbose(LogTag::Stream, "Raw frame: ..."); // Only with --verbose
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, before any service starts:
//! ```rust
//! dashsync::logger::init();
//! ```
//! Logging before `init()` is allowed; it uses the default configuration
//! (Info level, no debug tags).

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from the process command-line arguments
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operational events)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the matching --debug-<component> flag is provided:
/// ```rust
/// // Only shown with --debug-stream
/// dashsync::logger::debug(dashsync::logger::LogTag::Stream, "Keepalive sent");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
