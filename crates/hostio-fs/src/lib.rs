//! hostio filesystem - the native side of the `FileSystem` host object.
//!
//! Everything here is synchronous and thread-safe. The host bridge runs
//! these calls on its worker pool; nothing in this crate knows about
//! promises or realms.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Filesystem error types.
pub mod error;
pub mod fs;
pub mod handle;
pub mod hash;
pub mod path;
pub mod types;

pub use error::{FsError, FsResult};
pub use fs::FileSystem;
pub use handle::{FileHandle, MAX_LINE_LENGTH};
pub use hash::HashAlgorithm;
pub use types::{DirEntry, EntityType, FileMetadata, OpenMode, SeekOrigin, WriteMode};
