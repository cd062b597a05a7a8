//! Request, response and transfer descriptions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default timeout of plain requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default timeout of downloads and uploads.
pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 60_000;

/// Ordered header pairs. Duplicates are kept.
pub type Headers = Vec<(String, String)>;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    #[default]
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
    /// PATCH.
    Patch,
    /// HEAD.
    Head,
    /// OPTIONS.
    Options,
}

impl HttpMethod {
    /// Canonical upper-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => return Err(UnknownMethod(s.to_owned())),
        })
    }
}

/// A single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestConfig {
    /// Absolute URL.
    pub url: String,
    /// Method.
    pub method: HttpMethod,
    /// Request headers.
    pub headers: Headers,
    /// Request body; empty means none.
    pub body: Vec<u8>,
    /// Whole-request timeout.
    pub timeout_ms: u64,
    /// Follow 3xx responses.
    pub follow_redirects: bool,
}

impl HttpRequestConfig {
    /// GET `url` with defaults.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: Vec::new(),
            body: Vec::new(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            follow_redirects: true,
        }
    }

    /// Set the method.
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Outcome of a request that reached the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status_code: u16,
    /// Reason phrase.
    pub status_message: String,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub url: String,
    /// True for 2xx.
    pub success: bool,
}

impl HttpResponse {
    /// First header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A download to a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Source URL.
    pub url: String,
    /// Where to write.
    pub destination_path: String,
    /// Extra request headers.
    pub headers: Headers,
    /// Whole-transfer timeout.
    pub timeout_ms: u64,
    /// Continue an existing partial file with a `Range` request.
    pub resumable: bool,
}

impl DownloadConfig {
    /// Download `url` to `destination_path` with defaults.
    #[must_use]
    pub fn new(url: impl Into<String>, destination_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination_path: destination_path.into(),
            headers: Vec::new(),
            timeout_ms: DEFAULT_TRANSFER_TIMEOUT_MS,
            resumable: false,
        }
    }
}

/// Outcome of a download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadResult {
    /// True if the file is complete.
    pub success: bool,
    /// Final status code.
    pub status_code: u16,
    /// Written file, empty on failure.
    pub file_path: String,
    /// Size of the file on disk.
    pub file_size: u64,
    /// `"HTTP <code>"` for status failures, empty on success.
    pub error_message: String,
}

/// A multipart upload of one local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Target URL.
    pub url: String,
    /// File to send.
    pub file_path: String,
    /// Form field of the file part.
    pub field_name: String,
    /// File name reported to the server; defaults to the path's name.
    pub file_name: Option<String>,
    /// Part content type; defaults to `application/octet-stream`.
    pub mime_type: Option<String>,
    /// Extra request headers.
    pub headers: Headers,
    /// Plain form fields sent before the file.
    pub form_fields: Vec<(String, String)>,
    /// Whole-transfer timeout.
    pub timeout_ms: u64,
}

impl UploadConfig {
    /// Upload `file_path` to `url` as field `file`.
    #[must_use]
    pub fn new(url: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            field_name: "file".to_owned(),
            file_name: None,
            mime_type: None,
            headers: Vec::new(),
            form_fields: Vec::new(),
            timeout_ms: DEFAULT_TRANSFER_TIMEOUT_MS,
        }
    }
}

/// Outcome of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadResult {
    /// True for 2xx.
    pub success: bool,
    /// Status code, 0 if no request was sent.
    pub status_code: u16,
    /// Response body.
    pub response_body: Vec<u8>,
    /// Failure detail, empty on success.
    pub error_message: String,
}

/// Download progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    /// Bytes on disk so far, including any resumed prefix.
    pub bytes_received: u64,
    /// Expected final size, if the server said.
    pub total_bytes: Option<u64>,
    /// `bytes_received / total_bytes`, or 0 when unknown.
    pub progress: f64,
}

/// Upload progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    /// Body bytes handed to the transport so far.
    pub bytes_sent: u64,
    /// Full body size.
    pub total_bytes: Option<u64>,
    /// `bytes_sent / total_bytes`, or 0 when unknown.
    pub progress: f64,
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(done: u64, total: Option<u64>) -> f64 {
    match total {
        Some(t) if t > 0 => done as f64 / t as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!("OPTIONS".parse::<HttpMethod>().unwrap(), HttpMethod::Options);
        assert_eq!(
            "TRACE".parse::<HttpMethod>().unwrap_err(),
            UnknownMethod("TRACE".to_owned())
        );
    }

    #[test]
    fn test_defaults() {
        let req = HttpRequestConfig::new("http://x");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.timeout_ms, 30_000);
        assert!(req.follow_redirects);

        assert_eq!(DownloadConfig::new("u", "p").timeout_ms, 60_000);
        let up = UploadConfig::new("u", "p");
        assert_eq!(up.field_name, "file");
        assert_eq!(up.timeout_ms, 60_000);
    }

    #[test]
    fn test_ratio() {
        assert!((ratio(50, Some(200)) - 0.25).abs() < f64::EPSILON);
        assert!(ratio(5, None).abs() < f64::EPSILON);
        assert!(ratio(5, Some(0)).abs() < f64::EPSILON);
    }
}
