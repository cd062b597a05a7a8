//! The `IORequest` host object: HTTP requests, downloads and uploads.

use std::sync::Arc;

use hostio_core::host::{HostError, HostObject, HostValue, Realm};
use hostio_core::{
    ArgValue, AsyncArgs, Bridge, BridgeBuilder, BridgeError, BridgeResult, MainThreadInvoker,
    TaskExecutor, TypedValue,
};
use hostio_http::{
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TRANSFER_TIMEOUT_MS, DownloadConfig, DownloadProgress,
    DownloadResult, HttpClient, HttpMethod, HttpRequestConfig, HttpResponse, ProgressCallback,
    UnknownMethod, UploadConfig, UploadProgress, UploadResult,
};
use tracing::{debug, trace};

use crate::args::{flat_pairs, optional_bool, optional_str, required_str, timeout_ms};

/// Value of the `version` property.
pub const VERSION: &str = "1.0.0";

/// Timeouts applied when a call does not pass one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDefaults {
    /// For `request`.
    pub request_timeout_ms: u64,
    /// For `download` and `upload`.
    pub transfer_timeout_ms: u64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            transfer_timeout_ms: DEFAULT_TRANSFER_TIMEOUT_MS,
        }
    }
}

/// Host object exposing an [`HttpClient`].
pub struct RequestObject {
    bridge: Bridge,
}

impl RequestObject {
    /// Build the object.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if the bridge cannot be built.
    pub fn new(
        client: Arc<dyn HttpClient>,
        defaults: RequestDefaults,
        executor: Arc<dyn TaskExecutor>,
        invoker: Arc<dyn MainThreadInvoker>,
    ) -> BridgeResult<Self> {
        let mut builder = BridgeBuilder::new("IORequest")
            .with_executor(executor)
            .with_invoker(invoker);

        builder.register_property("version", |_| Ok(HostValue::from(VERSION)));

        let http = Arc::clone(&client);
        builder.register_async("request", 1, move |args| {
            let config = request_config(args, defaults)?;
            debug!(method = %config.method, url = %config.url, "sending request");
            let response = http.request(&config).map_err(BridgeError::native)?;
            Ok(response_value(response))
        });

        let http = Arc::clone(&client);
        builder.register_async("download", 2, move |args| {
            let config = DownloadConfig {
                url: required_str(args, 0)?.to_owned(),
                destination_path: required_str(args, 1)?.to_owned(),
                headers: flat_pairs(args, 2)?,
                timeout_ms: timeout_ms(args, 3, defaults.transfer_timeout_ms)?,
                resumable: optional_bool(args, 4)?.unwrap_or(false),
            };
            debug!(url = %config.url, dest = %config.destination_path, "starting download");
            let url = config.url.clone();
            let progress: ProgressCallback<DownloadProgress> = Arc::new(move |p: DownloadProgress| {
                trace!(
                    url = %url,
                    received = p.bytes_received,
                    total = ?p.total_bytes,
                    progress = p.progress,
                    "download progress"
                );
            });
            let result = http
                .download(&config, Some(progress))
                .map_err(BridgeError::native)?;
            Ok(download_value(result))
        });

        let http = client;
        builder.register_async("upload", 2, move |args| {
            let config = upload_config(args, defaults)?;
            debug!(url = %config.url, file = %config.file_path, "starting upload");
            let url = config.url.clone();
            let progress: ProgressCallback<UploadProgress> = Arc::new(move |p: UploadProgress| {
                trace!(
                    url = %url,
                    sent = p.bytes_sent,
                    total = ?p.total_bytes,
                    progress = p.progress,
                    "upload progress"
                );
            });
            let result = http
                .upload(&config, Some(progress))
                .map_err(BridgeError::native)?;
            Ok(upload_value(result))
        });

        Ok(Self {
            bridge: builder.build()?,
        })
    }
}

impl HostObject for RequestObject {
    fn get(&self, realm: &Realm, name: &str) -> Result<HostValue, HostError> {
        self.bridge.get(realm, name)
    }

    fn set(&self, realm: &Realm, name: &str, value: HostValue) -> Result<(), HostError> {
        self.bridge.set(realm, name, value)
    }

    fn property_names(&self) -> Vec<String> {
        self.bridge.property_names()
    }
}

impl std::fmt::Debug for RequestObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestObject")
            .field("bridge", &self.bridge)
            .finish()
    }
}

/// `request(url, method?, headers?, body?, timeout?, followRedirects?)`
fn request_config(args: &AsyncArgs, defaults: RequestDefaults) -> BridgeResult<HttpRequestConfig> {
    let method = match optional_str(args, 1)? {
        None | Some("") => HttpMethod::Get,
        Some(name) => name
            .parse()
            .map_err(|e: UnknownMethod| BridgeError::argument(args.method(), e.to_string()))?,
    };
    let body = match args.positional(3) {
        None | Some(ArgValue::Absent) => Vec::new(),
        Some(ArgValue::String(s)) => s.as_bytes().to_vec(),
        Some(ArgValue::Bytes(b)) => b.clone(),
        Some(_) => {
            return Err(BridgeError::argument(
                args.method(),
                "argument 3 must be a string or an ArrayBuffer",
            ));
        },
    };
    Ok(HttpRequestConfig {
        url: required_str(args, 0)?.to_owned(),
        method,
        headers: flat_pairs(args, 2)?,
        body,
        timeout_ms: timeout_ms(args, 4, defaults.request_timeout_ms)?,
        follow_redirects: optional_bool(args, 5)?.unwrap_or(true),
    })
}

/// `upload(url, filePath, fieldName?, fileName?, mimeType?, headers?,
/// formKeys?, formValues?, timeout?)`
fn upload_config(args: &AsyncArgs, defaults: RequestDefaults) -> BridgeResult<UploadConfig> {
    let non_empty = |i| -> BridgeResult<Option<String>> {
        Ok(optional_str(args, i)?.filter(|s| !s.is_empty()).map(str::to_owned))
    };

    let keys = args.strings_at(6)?;
    let values = args.strings_at(7)?;
    if keys.len() != values.len() {
        return Err(BridgeError::argument(
            args.method(),
            format!("{} form keys but {} form values", keys.len(), values.len()),
        ));
    }

    let mut config = UploadConfig::new(required_str(args, 0)?, required_str(args, 1)?);
    if let Some(field) = non_empty(2)? {
        config.field_name = field;
    }
    config.file_name = non_empty(3)?;
    config.mime_type = non_empty(4)?;
    config.headers = flat_pairs(args, 5)?;
    config.form_fields = keys.into_iter().zip(values).collect();
    config.timeout_ms = timeout_ms(args, 8, defaults.transfer_timeout_ms)?;
    Ok(config)
}

fn status_error(success: bool, status: u16) -> String {
    if success {
        String::new()
    } else {
        format!("HTTP {status}")
    }
}

fn response_value(response: HttpResponse) -> TypedValue {
    let (keys, values): (Vec<TypedValue>, Vec<TypedValue>) = response
        .headers
        .into_iter()
        .map(|(k, v)| (TypedValue::from(k), TypedValue::from(v)))
        .unzip();
    TypedValue::map([
        ("success", response.success.into()),
        ("statusCode", u32::from(response.status_code).into()),
        ("statusMessage", response.status_message.into()),
        ("url", response.url.into()),
        (
            "errorMessage",
            status_error(response.success, response.status_code).into(),
        ),
        ("body", response.body.into()),
        ("headerKeys", keys.into()),
        ("headerValues", values.into()),
    ])
}

fn download_value(result: DownloadResult) -> TypedValue {
    TypedValue::map([
        ("success", result.success.into()),
        ("statusCode", u32::from(result.status_code).into()),
        ("filePath", result.file_path.into()),
        ("fileSize", result.file_size.into()),
        ("errorMessage", result.error_message.into()),
    ])
}

fn upload_value(result: UploadResult) -> TypedValue {
    TypedValue::map([
        ("success", result.success.into()),
        ("statusCode", u32::from(result.status_code).into()),
        ("responseBody", result.response_body.into()),
        ("errorMessage", result.error_message.into()),
    ])
}
