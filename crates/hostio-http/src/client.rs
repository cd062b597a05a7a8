//! The [`HttpClient`] seam and its reqwest-backed implementation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{Method, StatusCode, redirect};
use tracing::{debug, warn};

use crate::error::{HttpError, HttpErrorKind, HttpResult};
use crate::types::{
    DownloadConfig, DownloadProgress, DownloadResult, Headers, HttpMethod, HttpRequestConfig,
    HttpResponse, UploadConfig, UploadProgress, UploadResult, ratio,
};

/// Progress observer. Invoked on the transfer thread.
pub type ProgressCallback<P> = Arc<dyn Fn(P) + Send + Sync>;

const COPY_CHUNK: usize = 64 * 1024;
const DEFAULT_MIME: &str = "application/octet-stream";

/// Blocking HTTP transport used by the request host object.
///
/// Implementations are called from worker threads, never from the event
/// loop. A returned `Err` means no HTTP response was obtained.
pub trait HttpClient: Send + Sync {
    /// Perform one request and buffer the whole body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure. Non-2xx statuses are `Ok`.
    fn request(&self, config: &HttpRequestConfig) -> HttpResult<HttpResponse>;

    /// Stream a response body to `config.destination_path`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or local I/O failure.
    fn download(
        &self,
        config: &DownloadConfig,
        on_progress: Option<ProgressCallback<DownloadProgress>>,
    ) -> HttpResult<DownloadResult>;

    /// POST a local file as `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    fn upload(
        &self,
        config: &UploadConfig,
        on_progress: Option<ProgressCallback<UploadProgress>>,
    ) -> HttpResult<UploadResult>;
}

/// Construction settings for [`ReqwestClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// `User-Agent` header.
    pub user_agent: String,
    /// Redirect hop limit when following.
    pub max_redirects: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("hostio/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// [`HttpClient`] over `reqwest::blocking`.
///
/// Holds one connection pool that follows redirects and one that does not.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    following: Client,
    direct: Client,
}

impl ReqwestClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(settings: &ClientSettings) -> HttpResult<Self> {
        let build = |policy: redirect::Policy| {
            Client::builder()
                .user_agent(settings.user_agent.as_str())
                .redirect(policy)
                .build()
                .map_err(|e| HttpError::from_reqwest(&e))
        };
        Ok(Self {
            following: build(redirect::Policy::limited(settings.max_redirects))?,
            direct: build(redirect::Policy::none())?,
        })
    }

    fn builder(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &Headers,
        timeout_ms: u64,
        follow: bool,
    ) -> HttpResult<RequestBuilder> {
        let parsed = url::Url::parse(url)
            .map_err(|e| HttpError::new(HttpErrorKind::InvalidUrl, format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpError::new(
                HttpErrorKind::InvalidUrl,
                format!("unsupported scheme: {}", parsed.scheme()),
            ));
        }
        let client = if follow { &self.following } else { &self.direct };
        let mut builder = client
            .request(to_reqwest_method(method), parsed)
            .timeout(Duration::from_millis(timeout_ms));
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder)
    }
}

impl HttpClient for ReqwestClient {
    fn request(&self, config: &HttpRequestConfig) -> HttpResult<HttpResponse> {
        debug!(method = %config.method, url = %config.url, "HTTP request");
        let mut builder = self.builder(
            config.method,
            &config.url,
            &config.headers,
            config.timeout_ms,
            config.follow_redirects,
        )?;
        if !config.body.is_empty() {
            builder = builder.body(config.body.clone());
        }
        let response = builder.send().map_err(|e| HttpError::from_reqwest(&e))?;

        let status = response.status();
        let url = response.url().to_string();
        let headers = collect_headers(&response);
        let body = response
            .bytes()
            .map_err(|e| HttpError::from_reqwest(&e))?
            .to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "HTTP response");
        Ok(HttpResponse {
            status_code: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body,
            url,
            success: status.is_success(),
        })
    }

    fn download(
        &self,
        config: &DownloadConfig,
        on_progress: Option<ProgressCallback<DownloadProgress>>,
    ) -> HttpResult<DownloadResult> {
        let dest = Path::new(&config.destination_path);
        let existing = if config.resumable {
            fs::metadata(dest).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        let mut builder = self.builder(
            HttpMethod::Get,
            &config.url,
            &config.headers,
            config.timeout_ms,
            true,
        )?;
        if existing > 0 {
            builder = builder.header(RANGE, format!("bytes={existing}-"));
        }
        debug!(url = %config.url, dest = %dest.display(), resume_from = existing, "HTTP download");
        let mut response = builder.send().map_err(|e| HttpError::from_reqwest(&e))?;
        let status = response.status();

        if status == StatusCode::RANGE_NOT_SATISFIABLE && existing > 0 {
            // Nothing past what we already have.
            return Ok(DownloadResult {
                success: true,
                status_code: status.as_u16(),
                file_path: config.destination_path.clone(),
                file_size: existing,
                error_message: String::new(),
            });
        }
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            warn!(url = %config.url, status = status.as_u16(), "Download failed");
            return Ok(DownloadResult {
                success: false,
                status_code: status.as_u16(),
                file_path: String::new(),
                file_size: 0,
                error_message: format!("HTTP {}", status.as_u16()),
            });
        }

        let appending = status == StatusCode::PARTIAL_CONTENT && existing > 0;
        let start = if appending { existing } else { 0 };
        let total = response.content_length().map(|len| len + start);

        let mut file = open_destination(dest, appending)?;
        let mut written = start;
        let mut buf = vec![0u8; COPY_CHUNK];
        loop {
            let n = response
                .read(&mut buf)
                .map_err(|e| HttpError::new(HttpErrorKind::InvalidResponse, e.to_string()))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).map_err(|e| io_error(dest, &e))?;
            written += n as u64;
            if let Some(cb) = &on_progress {
                cb(DownloadProgress {
                    bytes_received: written,
                    total_bytes: total,
                    progress: ratio(written, total),
                });
            }
        }
        file.flush().map_err(|e| io_error(dest, &e))?;

        Ok(DownloadResult {
            success: true,
            status_code: status.as_u16(),
            file_path: config.destination_path.clone(),
            file_size: written,
            error_message: String::new(),
        })
    }

    fn upload(
        &self,
        config: &UploadConfig,
        on_progress: Option<ProgressCallback<UploadProgress>>,
    ) -> HttpResult<UploadResult> {
        let path = Path::new(&config.file_path);
        let file = match File::open(path) {
            Ok(f) if path.is_file() => f,
            _ => {
                return Ok(UploadResult {
                    success: false,
                    status_code: 0,
                    response_body: Vec::new(),
                    error_message: format!("File not found: {}", config.file_path),
                });
            },
        };
        let file_len = file.metadata().map_err(|e| io_error(path, &e))?.len();

        let boundary = multipart_boundary();
        let file_name = config.file_name.clone().unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let prefix = multipart_prefix(
            &boundary,
            &config.form_fields,
            &config.field_name,
            &file_name,
            config.mime_type.as_deref().unwrap_or(DEFAULT_MIME),
        );
        let suffix = format!("\r\n--{boundary}--\r\n").into_bytes();
        let total = prefix.len() as u64 + file_len + suffix.len() as u64;

        let reader = Cursor::new(prefix).chain(file).chain(Cursor::new(suffix));
        let body = match on_progress {
            Some(callback) => Body::sized(
                ProgressReader {
                    inner: reader,
                    sent: 0,
                    total,
                    callback,
                },
                total,
            ),
            None => Body::sized(reader, total),
        };

        debug!(url = %config.url, file = %config.file_path, bytes = total, "HTTP upload");
        let response = self
            .builder(
                HttpMethod::Post,
                &config.url,
                &config.headers,
                config.timeout_ms,
                true,
            )?
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .send()
            .map_err(|e| HttpError::from_reqwest(&e))?;

        let status = response.status();
        let response_body = response
            .bytes()
            .map_err(|e| HttpError::from_reqwest(&e))?
            .to_vec();
        let success = status.is_success();
        Ok(UploadResult {
            success,
            status_code: status.as_u16(),
            response_body,
            error_message: if success {
                String::new()
            } else {
                format!("HTTP {}", status.as_u16())
            },
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

fn collect_headers(response: &Response) -> Headers {
    response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
        .collect()
}

fn io_error(path: &Path, err: &io::Error) -> HttpError {
    HttpError::new(HttpErrorKind::Io, format!("{}: {err}", path.display()))
}

fn open_destination(dest: &Path, append: bool) -> HttpResult<File> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
    }
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(dest).map_err(|e| io_error(dest, &e))
}

fn multipart_boundary() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("----IOHttpClientBoundary{millis}")
}

/// Everything before the file bytes: plain fields, then the file part header.
fn multipart_prefix(
    boundary: &str,
    fields: &[(String, String)],
    field_name: &str,
    file_name: &str,
    mime_type: &str,
) -> Vec<u8> {
    let mut out = String::new();
    for (key, value) in fields {
        out.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{key}\"\r\n\r\n{value}\r\n"
        ));
    }
    out.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime_type}\r\n\r\n"
    ));
    out.into_bytes()
}

struct ProgressReader<R> {
    inner: R,
    sent: u64,
    total: u64,
    callback: ProgressCallback<UploadProgress>,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            (self.callback)(UploadProgress {
                bytes_sent: self.sent,
                total_bytes: Some(self.total),
                progress: ratio(self.sent, Some(self.total)),
            });
        }
        Ok(n)
    }
}
