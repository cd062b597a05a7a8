use std::fmt;

/// Constructor family of a host error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Generic `Error`.
    Error,
    /// Wrong argument count or kind.
    TypeError,
    /// Numeric argument outside the accepted range.
    RangeError,
}

impl ErrorKind {
    /// Host-side constructor name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
        }
    }
}

/// An error value as the host sees it.
///
/// Thrown from synchronous calls and used as the rejection reason of
/// asynchronous ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    kind: ErrorKind,
    message: String,
}

impl HostError {
    /// Create a generic `Error`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Error,
            message: message.into(),
        }
    }

    /// Create a `TypeError`.
    #[must_use]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    /// Create a `RangeError`.
    #[must_use]
    pub fn range_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RangeError,
            message: message.into(),
        }
    }

    /// Constructor family.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for HostError {}
