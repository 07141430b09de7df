//! Logger setup for host binaries
//!
//! Library code only uses the `log` facade; hosts call [`init_logging`] once
//! early in `main`.

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset, in `env_logger` syntax
    /// (e.g. "info", "editor_runtime=debug")
    pub default_filter: String,
    /// Prefix lines with millisecond timestamps
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: defaults::LOG_FILTER.to_string(),
            timestamps: true,
        }
    }
}

/// Install the global logger.
///
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init_logging(config: &LoggingConfig) {
    let env = env_logger::Env::default().default_filter_or(config.default_filter.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if config.timestamps {
        builder.format_timestamp_millis();
    } else {
        builder.format_timestamp(None);
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    } else {
        log::debug!("Logging initialized");
    }
}
