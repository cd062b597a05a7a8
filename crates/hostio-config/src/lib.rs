//! Layered configuration for hostio.
//!
//! Precedence, highest first:
//!
//! 1. `HOSTIO_*` environment variables
//! 2. The config file (an explicit path, or `<config dir>/hostio/config.toml`)
//! 3. Embedded defaults (`defaults.toml` compiled into the binary)
//!
//! ```rust,no_run
//! let config = hostio_config::Config::load(None).unwrap();
//! println!("fs workers: {}", config.executor.fs_threads);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Deep merge of TOML layers.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(explicit)
    }

    /// Load with a caller-supplied environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_env<S: std::hash::BuildHasher>(
        explicit: Option<&std::path::Path>,
        env_vars: &std::collections::HashMap<String, String, S>,
    ) -> ConfigResult<Self> {
        loader::load_with_env(explicit, env_vars)
    }
}
