use hostio_config::ConfigError;
use hostio_core::BridgeError;
use hostio_http::HttpError;
use hostio_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while building or driving the host module.
#[derive(Debug, Error)]
pub enum HostIoError {
    /// Bridge construction or a bridged call failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(#[from] HttpError),
}

impl From<HostIoError> for BridgeError {
    fn from(err: HostIoError) -> Self {
        match err {
            HostIoError::Bridge(e) => e,
            other => BridgeError::Configuration(other.to_string()),
        }
    }
}

/// Result type for the host module.
pub type HostIoResult<T> = Result<T, HostIoError>;
