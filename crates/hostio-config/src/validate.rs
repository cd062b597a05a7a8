//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound on any worker pool.
pub const MAX_THREADS: usize = 64;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_threads("executor.fs_threads", config.executor.fs_threads)?;
    validate_threads("executor.request_threads", config.executor.request_threads)?;
    validate_timeout("http.request_timeout_ms", config.http.request_timeout_ms)?;
    validate_timeout("http.transfer_timeout_ms", config.http.transfer_timeout_ms)?;
    validate_logging(config)
}

fn validate_threads(field: &str, value: usize) -> ConfigResult<()> {
    if (1..=MAX_THREADS).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_owned(),
        message: format!("{value} is out of range; must be between 1 and {MAX_THREADS}"),
    })
}

fn validate_timeout(field: &str, value: u64) -> ConfigResult<()> {
    if value > 0 {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_owned(),
        message: "timeout must be greater than zero".to_owned(),
    })
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LEVELS.join(", ")
            ),
        });
    }
    if !FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                FORMATS.join(", ")
            ),
        });
    }
    Ok(())
}
