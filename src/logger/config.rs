//! Logger configuration state
//!
//! Held in a process-wide RwLock so level functions stay cheap to call.
//! Defaults to Info until `logger::init` runs.

use super::levels::LogLevel;
use once_cell::sync::Lazy;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            min_level: LogLevel::Info,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    *LOGGER_CONFIG.read().unwrap()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write().unwrap() = config;
}
