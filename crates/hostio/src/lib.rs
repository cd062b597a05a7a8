//! hostio - native I/O host objects for a single-threaded script host.
//!
//! [`NativeStdIo`] is the module entry point. It creates three host objects:
//!
//! - [`FileSystemObject`]: whole-file, directory and path operations in
//!   blocking (`*Sync`) and promise-returning forms, plus numeric file
//!   handles for streaming reads and writes.
//! - [`RequestObject`]: HTTP requests, resumable downloads and multipart
//!   uploads.
//! - [`PlatformObject`]: OS name and well-known directories.
//!
//! Promise-returning methods run on a worker pool owned by each object and
//! settle on the interpreter thread through the [`MainThreadInvoker`] the
//! module was created with.
//!
//! ```rust,ignore
//! let event_loop = EventLoop::new()?;
//! let io = NativeStdIo::from_config(event_loop.invoker(), &Config::load(None)?);
//! let fs = io.create_file_system(0.0)?;
//! ```
//!
//! [`MainThreadInvoker`]: hostio_core::MainThreadInvoker

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod args;
pub mod encoding;
/// Host module error types.
pub mod error;
pub mod fs_object;
pub mod module;
pub mod platform;
pub mod request;

pub use encoding::{Encoding, EncodingError};
pub use error::{HostIoError, HostIoResult};
pub use fs_object::FileSystemObject;
pub use module::{NativeStdIo, init_logging};
pub use platform::{PlatformDirs, PlatformObject};
pub use request::{RequestDefaults, RequestObject};
