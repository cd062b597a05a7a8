use std::fmt;

use thiserror::Error;

/// Transport failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpErrorKind {
    /// Connect or transfer timeout elapsed.
    Timeout,
    /// TCP connection could not be established.
    ConnectionFailed,
    /// Host name did not resolve.
    DnsResolutionFailed,
    /// TLS handshake or certificate failure.
    SslError,
    /// Request was abandoned.
    Cancelled,
    /// Malformed URL, method or header.
    InvalidUrl,
    /// Response could not be read or decoded.
    InvalidResponse,
    /// Local file I/O during a transfer.
    Io,
    /// Anything else.
    Unknown,
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "Timeout",
            Self::ConnectionFailed => "ConnectionFailed",
            Self::DnsResolutionFailed => "DNSResolutionFailed",
            Self::SslError => "SSLError",
            Self::Cancelled => "Cancelled",
            Self::InvalidUrl => "InvalidURL",
            Self::InvalidResponse => "InvalidResponse",
            Self::Io => "IOError",
            Self::Unknown => "Unknown",
        })
    }
}

/// A request that did not produce an HTTP response.
///
/// HTTP status failures are not errors; they come back as responses with
/// `success == false`.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct HttpError {
    /// Category.
    pub kind: HttpErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl HttpError {
    /// Build an error of `kind`.
    #[must_use]
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a reqwest failure.
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let message = chain_message(err);
        let kind = if err.is_timeout() {
            HttpErrorKind::Timeout
        } else if err.is_builder() {
            HttpErrorKind::InvalidUrl
        } else if err.is_connect() {
            let lower = message.to_ascii_lowercase();
            if lower.contains("dns") || lower.contains("lookup") || lower.contains("resolve") {
                HttpErrorKind::DnsResolutionFailed
            } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
                HttpErrorKind::SslError
            } else {
                HttpErrorKind::ConnectionFailed
            }
        } else if err.is_decode() || err.is_body() || err.is_redirect() {
            HttpErrorKind::InvalidResponse
        } else {
            HttpErrorKind::Unknown
        };
        Self { kind, message }
    }
}

/// Join an error with all of its sources.
fn chain_message(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Convenience result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = HttpError::new(HttpErrorKind::Timeout, "after 30000 ms");
        assert_eq!(err.to_string(), "Timeout: after 30000 ms");
        assert_eq!(HttpErrorKind::DnsResolutionFailed.to_string(), "DNSResolutionFailed");
    }
}
