//! Structured tag-based logging for swapbot
//!
//! Colored console output with per-tag debug filtering:
//! - Standard levels (Error/Warning/Info/Debug/Verbose)
//! - `--debug` enables debug logs, `--verbose` enables everything
//! - Tags identify the emitting subsystem for grep-friendly output
//!
//! Call `logger::init(debug, verbose)` once at startup, then use the
//! level functions:
//!
//! ```ignore
//! logger::info(LogTag::Scheduler, "Tick complete");
//! logger::error(LogTag::Chain, "Submission failed");
//! ```

mod config;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger configuration.
///
/// Must be called once at startup before any logging occurs.
pub fn init(debug: bool, verbose: bool) {
    let min_level = if verbose {
        LogLevel::Verbose
    } else if debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    set_logger_config(LoggerConfig { min_level });
}

fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    // Errors always log regardless of the configured threshold
    if level != LogLevel::Error && level > get_logger_config().min_level {
        return;
    }
    format::format_and_log(tag, level, message);
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics, gated by --debug)
pub fn debug(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing, gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Verbose, message);
}
