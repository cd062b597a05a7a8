//! Module entry point: object factories, HTTP client prewarm and string
//! encoding.

use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use hostio_config::Config;
use hostio_core::host::{ArrayBuffer, HostValue, Realm};
use hostio_core::{AsyncArgs, Bridge, BridgeBuilder, BridgeError, MainThreadInvoker, ThreadPool};
use hostio_http::{ClientSettings, HttpClient, ReqwestClient};
use hostio_telemetry::{LogConfig, LogFormat, setup_logging};
use tracing::{debug, info};

use crate::args::optional_str;
use crate::encoding::{Encoding, EncodingError};
use crate::error::HostIoResult;
use crate::fs_object::FileSystemObject;
use crate::platform::PlatformObject;
use crate::request::{RequestDefaults, RequestObject};

/// Factory for the host objects, bound to one interpreter thread's invoker.
pub struct NativeStdIo {
    invoker: Arc<dyn MainThreadInvoker>,
    config: Config,
    http: OnceLock<Arc<dyn HttpClient>>,
}

impl NativeStdIo {
    /// Module with default configuration.
    #[must_use]
    pub fn new(invoker: Arc<dyn MainThreadInvoker>) -> Self {
        Self::from_config(invoker, &Config::default())
    }

    /// Module using `config` for pool sizes and HTTP defaults.
    #[must_use]
    pub fn from_config(invoker: Arc<dyn MainThreadInvoker>, config: &Config) -> Self {
        Self {
            invoker,
            config: config.clone(),
            http: OnceLock::new(),
        }
    }

    /// Use `client` instead of building a [`ReqwestClient`].
    #[must_use]
    pub fn with_http_client(self, client: Arc<dyn HttpClient>) -> Self {
        if self.http.set(client).is_err() {
            debug!("http client already installed; keeping the existing one");
        }
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a `FileSystem` object with its own pool of `num_threads`
    /// workers. Zero, negative and NaN use the configured size.
    ///
    /// # Errors
    ///
    /// Fails if the worker pool or the bridge cannot be built.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn create_file_system(&self, num_threads: f64) -> HostIoResult<FileSystemObject> {
        let size = if num_threads >= 1.0 {
            num_threads as usize
        } else {
            self.config.executor.fs_threads
        };
        let pool = ThreadPool::new(size, self.pool_name("fs"))?;
        info!(threads = pool.size(), "file system object created");
        Ok(FileSystemObject::new(Arc::new(pool), Arc::clone(&self.invoker))?)
    }

    /// Create an `IORequest` object over the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client, the worker pool or the bridge cannot be
    /// built.
    pub fn create_io_request(&self) -> HostIoResult<RequestObject> {
        let client = self.http_client()?;
        let pool = ThreadPool::new(self.config.executor.request_threads, self.pool_name("http"))?;
        let defaults = RequestDefaults {
            request_timeout_ms: self.config.http.request_timeout_ms,
            transfer_timeout_ms: self.config.http.transfer_timeout_ms,
        };
        info!(threads = pool.size(), "request object created");
        Ok(RequestObject::new(
            client,
            defaults,
            Arc::new(pool),
            Arc::clone(&self.invoker),
        )?)
    }

    /// Create the `Platform` object.
    ///
    /// # Errors
    ///
    /// Fails if the bridge cannot be built.
    pub fn create_platform(&self) -> HostIoResult<PlatformObject> {
        Ok(PlatformObject::new()?)
    }

    /// Build the shared HTTP client now instead of on first request.
    /// Later calls do nothing.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn install_http_client(&self) -> HostIoResult<()> {
        self.http_client().map(|_| ())
    }

    /// Render `buffer` as text. `None` means UTF-8; `base64` and `hex`
    /// render the raw bytes in that form.
    ///
    /// # Errors
    ///
    /// An unknown encoding is an argument error.
    pub fn decode_string(&self, buffer: &ArrayBuffer, encoding: Option<&str>) -> HostIoResult<String> {
        let encoding = Encoding::from_name(encoding).map_err(|e| encoding_error("decodeString", e))?;
        Ok(encoding.decode(&buffer.to_vec()))
    }

    /// Encode `text` into a new buffer in `realm`. `None` means UTF-8; for
    /// `base64` and `hex` the text is parsed back into raw bytes.
    ///
    /// # Errors
    ///
    /// An unknown encoding is an argument error; malformed base64 or hex
    /// text is a native error.
    pub fn encode_string(
        &self,
        realm: &Realm,
        text: &str,
        encoding: Option<&str>,
    ) -> HostIoResult<ArrayBuffer> {
        let encoding = Encoding::from_name(encoding).map_err(|e| encoding_error("encodeString", e))?;
        let bytes = encoding
            .encode(text)
            .map_err(|e| encoding_error("encodeString", e))?;
        Ok(realm.new_array_buffer(&bytes))
    }

    /// Expose the module itself to the host as an object with
    /// `createFileSystem`, `createIORequest`, `createPlatform`,
    /// `installHttpClient`, `decodeString` and `encodeString`.
    ///
    /// # Errors
    ///
    /// Fails if the bridge cannot be built.
    pub fn into_host_object(self) -> HostIoResult<Bridge> {
        let module = Rc::new(self);
        let mut builder = BridgeBuilder::new("NativeStdIo");

        let m = Rc::clone(&module);
        builder.register_sync("createFileSystem", 0, move |_, args| {
            let threads = args.first().and_then(HostValue::as_number).unwrap_or(0.0);
            Ok(HostValue::HostObject(Rc::new(m.create_file_system(threads)?)))
        });
        let m = Rc::clone(&module);
        builder.register_sync("createIORequest", 0, move |_, _| {
            Ok(HostValue::HostObject(Rc::new(m.create_io_request()?)))
        });
        let m = Rc::clone(&module);
        builder.register_sync("createPlatform", 0, move |_, _| {
            Ok(HostValue::HostObject(Rc::new(m.create_platform()?)))
        });
        let m = Rc::clone(&module);
        builder.register_sync("installHttpClient", 0, move |_, _| {
            m.install_http_client()?;
            Ok(HostValue::Undefined)
        });
        let m = Rc::clone(&module);
        builder.register_sync("decodeString", 1, move |_, args| {
            let args = AsyncArgs::extract("decodeString", args)?;
            let buffer = ArrayBuffer::new(args.buffer(0)?.to_vec());
            Ok(HostValue::String(m.decode_string(&buffer, optional_str(&args, 1)?)?))
        });
        let m = module;
        builder.register_sync("encodeString", 1, move |realm, args| {
            let args = AsyncArgs::extract("encodeString", args)?;
            let text = args.string(0)?;
            Ok(HostValue::ArrayBuffer(m.encode_string(realm, text, optional_str(&args, 1)?)?))
        });

        Ok(builder.build()?)
    }

    fn http_client(&self) -> HostIoResult<Arc<dyn HttpClient>> {
        if let Some(client) = self.http.get() {
            return Ok(Arc::clone(client));
        }
        let settings = ClientSettings {
            user_agent: format!("{}/{}", self.config.http.user_agent, env!("CARGO_PKG_VERSION")),
            max_redirects: self.config.http.max_redirects,
        };
        let built: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&settings)?);
        debug!(user_agent = %settings.user_agent, "http client installed");
        Ok(Arc::clone(self.http.get_or_init(|| built)))
    }

    fn pool_name(&self, role: &str) -> String {
        format!("{}-{role}", self.config.executor.thread_name_prefix)
    }
}

impl std::fmt::Debug for NativeStdIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeStdIo")
            .field("config", &self.config)
            .field("http_installed", &self.http.get().is_some())
            .finish_non_exhaustive()
    }
}

fn encoding_error(method: &str, err: EncodingError) -> BridgeError {
    match err {
        EncodingError::Unknown(_) => BridgeError::argument(method, err.to_string()),
        EncodingError::Invalid { .. } => BridgeError::native(err),
    }
}

/// Install the global `tracing` subscriber from the `[logging]` section.
///
/// # Errors
///
/// Fails on an unknown format or if a subscriber is already installed.
pub fn init_logging(config: &Config) -> HostIoResult<()> {
    let format: LogFormat = config.logging.format.parse()?;
    setup_logging(&LogConfig::new(&config.logging.level).with_format(format))?;
    Ok(())
}
