//! Configuration types.
//!
//! Every struct implements [`Default`] matching `defaults.toml`, so a bare
//! `[section]` header produces a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker pool sizing.
    pub executor: ExecutorConfig,
    /// HTTP client defaults.
    pub http: HttpConfig,
    /// Log level and format.
    pub logging: LoggingConfig,
}

/// Worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Threads per file-system object.
    pub fs_threads: usize,
    /// Threads per request object.
    pub request_threads: usize,
    /// Prefix of worker thread names.
    pub thread_name_prefix: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            fs_threads: 3,
            request_threads: 1,
            thread_name_prefix: "hostio".to_owned(),
        }
    }
}

/// HTTP client defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout of plain requests when the caller gives none.
    pub request_timeout_ms: u64,
    /// Timeout of downloads and uploads when the caller gives none.
    pub transfer_timeout_ms: u64,
    /// Redirect hop limit.
    pub max_redirects: usize,
    /// `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            transfer_timeout_ms: 60_000,
            max_redirects: 10,
            user_agent: "hostio".to_owned(),
        }
    }
}

/// Log level and output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// `pretty`, `compact`, `json` or `full`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
        }
    }
}
