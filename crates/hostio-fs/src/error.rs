use std::io;
use std::path::Path;

use thiserror::Error;

/// Filesystem errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Missing file or directory.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A directory was expected.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A regular file was expected.
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// Non-recursive removal of a directory with contents.
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Insufficient permission.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Bad mode number, origin or size.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation on a closed file handle.
    #[error("File handle is closed")]
    HandleClosed,

    /// Read on a write-only handle or write on a read-only one.
    #[error("File not opened for {0}")]
    ModeViolation(&'static str),

    /// A previous operation on the handle panicked mid-way.
    #[error("File handle is unusable after a failed operation")]
    LockPoisoned,

    /// Any other I/O failure.
    #[error("{op} failed for {path}: {source}")]
    Io {
        /// What was being attempted.
        op: &'static str,
        /// Path involved.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classify an I/O error raised while performing `op` on `path`.
    #[must_use]
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        let display = path.display().to_string();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(display),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(display),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(display),
            io::ErrorKind::NotADirectory => Self::NotADirectory(display),
            io::ErrorKind::IsADirectory => Self::NotAFile(display),
            io::ErrorKind::DirectoryNotEmpty => Self::DirectoryNotEmpty(display),
            _ => Self::Io {
                op,
                path: display,
                source,
            },
        }
    }
}

/// Convenience result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
