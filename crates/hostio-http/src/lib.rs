//! Blocking HTTP collaborator for hostio.
//!
//! [`HttpClient`] is the seam the request host object calls from its worker
//! pool. [`ReqwestClient`] is the production implementation: buffered
//! requests, resumable downloads straight to disk, and streamed multipart
//! uploads, each with optional progress callbacks.
//!
//! Transport failures are [`HttpError`]s. HTTP status failures are not; they
//! come back as results with `success == false`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod client;
/// HTTP error types.
pub mod error;
pub mod types;

pub use client::{ClientSettings, HttpClient, ProgressCallback, ReqwestClient};
pub use error::{HttpError, HttpErrorKind, HttpResult};
pub use types::{
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TRANSFER_TIMEOUT_MS, DownloadConfig, DownloadProgress,
    DownloadResult, Headers, HttpMethod, HttpRequestConfig, HttpResponse, UnknownMethod,
    UploadConfig, UploadProgress, UploadResult,
};
