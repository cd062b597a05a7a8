//! Logging setup for applications embedding hostio.
//!
//! The library crates only emit `tracing` events. An embedder calls
//! [`setup_logging`] once at startup to decide where they go.
//!
//! ```rust,no_run
//! use hostio_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), hostio_telemetry::TelemetryError> {
//! setup_logging(
//!     &LogConfig::new("info")
//!         .with_format(LogFormat::Json)
//!         .with_directive("hostio_core=debug"),
//! )?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
