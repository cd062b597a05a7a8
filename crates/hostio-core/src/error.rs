//! Bridge error types and their mapping onto host errors.

use std::time::Duration;

use thiserror::Error;

use crate::host::HostError;

/// Errors raised by the bridge and by native handlers.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Wrong argument count or kind. Surfaces as a host `TypeError`.
    #[error("{method}: {message}")]
    Argument {
        /// Method that rejected its arguments.
        method: String,
        /// What was wrong.
        message: String,
    },

    /// A native operation failed.
    #[error("{0}")]
    Native(String),

    /// Setup misuse, e.g. async methods registered without an executor.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Numeric argument outside the accepted range. Surfaces as a host
    /// `RangeError`.
    #[error("{method}: {message}")]
    Range {
        /// Method that rejected its arguments.
        method: String,
        /// What was out of range.
        message: String,
    },

    /// Lookup of an unknown or already closed handle.
    #[error("Invalid file handle: {0}")]
    InvalidHandle(u32),

    /// Every handle id has been handed out once.
    #[error("Handle ids exhausted")]
    HandlesExhausted,

    /// A pending operation did not settle in time.
    #[error("Timed out after {0:?} waiting for a pending operation")]
    Timeout(Duration),

    /// Runtime construction or event-loop failure.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl BridgeError {
    /// Build an argument error for `method`.
    #[must_use]
    pub fn argument(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Argument {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Build a range error for `method`.
    #[must_use]
    pub fn range(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Range {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Wrap any displayable native failure.
    #[must_use]
    pub fn native(err: impl std::fmt::Display) -> Self {
        Self::Native(err.to_string())
    }
}

impl From<BridgeError> for HostError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Argument { .. } => HostError::type_error(err.to_string()),
            BridgeError::Range { .. } | BridgeError::HandlesExhausted => {
                HostError::range_error(err.to_string())
            },
            other => HostError::new(other.to_string()),
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
