//! Streaming file handles.
//!
//! A [`FileHandle`] owns one open file and serializes every operation on it
//! behind a mutex, so concurrent callers never observe a half-finished read
//! or write. Their relative order is whatever order they take the lock in.
//!
//! Closing never waits for that lock. If an operation is in flight the
//! handle is only marked closed, and the operation drops the file when it
//! finishes.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

use tracing::{debug, trace, warn};

use crate::error::{FsError, FsResult};
use crate::types::{OpenMode, SeekOrigin};

/// Longest line [`FileHandle::read_line`] returns, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

const LINE_CHUNK: usize = 512;

struct Inner {
    file: Option<File>,
    size: Option<u64>,
}

/// An open file addressed by the host through a handle id.
pub struct FileHandle {
    path: PathBuf,
    mode: OpenMode,
    closed: AtomicBool,
    inner: Mutex<Inner>,
}

fn options_for(mode: OpenMode) -> OpenOptions {
    let mut options = OpenOptions::new();
    match mode {
        OpenMode::Read => options.read(true),
        OpenMode::Write => options.write(true).create(true).truncate(true),
        OpenMode::Append => options.append(true).create(true),
        OpenMode::ReadWrite => options.read(true).write(true),
        OpenMode::WriteRead => options.read(true).write(true).create(true).truncate(true),
        OpenMode::AppendRead => options.read(true).append(true).create(true),
    };
    options
}

impl FileHandle {
    /// Open `path` in `mode`, optionally creating missing parent
    /// directories first.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened in that mode (for example, a
    /// missing file in [`OpenMode::Read`]).
    pub fn open(path: impl AsRef<Path>, mode: OpenMode, create_parents: bool) -> FsResult<Self> {
        let path = path.as_ref();
        if create_parents
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| FsError::io("create parent directories", parent, e))?;
        }
        let file = options_for(mode)
            .open(path)
            .map_err(|e| FsError::io("open", path, e))?;
        debug!(path = %path.display(), ?mode, "file handle opened");
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            closed: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                file: Some(file),
                size: None,
            }),
        })
    }

    /// Path the handle was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the handle was opened with.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// False once [`FileHandle::close`] has run.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn lock(&self) -> FsResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| FsError::LockPoisoned)
    }

    fn io(&self, op: &'static str, e: std::io::Error) -> FsError {
        FsError::io(op, &self.path, e)
    }

    /// Run `f` with the open file under the lock. Finishes a close that
    /// was requested while the lock was held.
    fn with_file<T>(
        &self,
        f: impl FnOnce(&mut File, &mut Option<u64>) -> FsResult<T>,
    ) -> FsResult<T> {
        let mut guard = self.lock()?;
        let Inner { file, size } = &mut *guard;
        let result = match file.as_mut() {
            Some(open) if self.is_open() => f(open, size),
            _ => Err(FsError::HandleClosed),
        };
        if !self.is_open() {
            self.release(file.take());
        }
        result
    }

    fn release(&self, file: Option<File>) {
        if let Some(mut file) = file {
            if let Err(e) = file.flush() {
                warn!(path = %self.path.display(), error = %e, "flush on close failed");
            }
            debug!(path = %self.path.display(), "file handle closed");
        }
    }

    fn require_read(&self) -> FsResult<()> {
        if self.mode.can_read() {
            Ok(())
        } else {
            Err(FsError::ModeViolation("reading"))
        }
    }

    fn require_write(&self) -> FsResult<()> {
        if self.mode.can_write() {
            Ok(())
        } else {
            Err(FsError::ModeViolation("writing"))
        }
    }

    /// Move the cursor and return the new position.
    ///
    /// # Errors
    ///
    /// Fails on a negative absolute offset, a seek before the start, or a
    /// closed handle.
    pub fn seek(&self, offset: i64, origin: SeekOrigin) -> FsResult<u64> {
        let target = match origin {
            SeekOrigin::Begin => SeekFrom::Start(u64::try_from(offset).map_err(|_| {
                FsError::InvalidArgument(format!("cannot seek to negative offset {offset}"))
            })?),
            SeekOrigin::Current => SeekFrom::Current(offset),
            SeekOrigin::End => SeekFrom::End(offset),
        };
        self.with_file(|file, _| file.seek(target).map_err(|e| self.io("seek", e)))
    }

    /// Move the cursor to the start.
    ///
    /// # Errors
    ///
    /// Fails on a closed handle.
    pub fn rewind(&self) -> FsResult<()> {
        self.with_file(|file, _| file.rewind().map_err(|e| self.io("rewind", e)))
    }

    /// Current cursor position.
    ///
    /// # Errors
    ///
    /// Fails on a closed handle.
    pub fn position(&self) -> FsResult<u64> {
        self.with_file(|file, _| file.stream_position().map_err(|e| self.io("tell", e)))
    }

    fn cached_size(&self, file: &File, size: &mut Option<u64>) -> FsResult<u64> {
        if let Some(s) = *size {
            return Ok(s);
        }
        let len = file.metadata().map_err(|e| self.io("stat", e))?.len();
        *size = Some(len);
        Ok(len)
    }

    /// File size. Cached until the next write or truncate through this
    /// handle.
    ///
    /// # Errors
    ///
    /// Fails on a closed handle.
    pub fn size(&self) -> FsResult<u64> {
        self.with_file(|file, size| self.cached_size(file, size))
    }

    /// True when the cursor is at or past the end.
    ///
    /// # Errors
    ///
    /// Fails on a closed handle.
    pub fn is_eof(&self) -> FsResult<bool> {
        self.with_file(|file, size| {
            let pos = file.stream_position().map_err(|e| self.io("tell", e))?;
            Ok(pos >= self.cached_size(file, size)?)
        })
    }

    /// Read up to `len` bytes, or everything left when `len` is `None`.
    ///
    /// # Errors
    ///
    /// Fails on a write-only or closed handle, or a read error.
    pub fn read(&self, len: Option<u64>) -> FsResult<Vec<u8>> {
        self.require_read()?;
        self.with_file(|file, _| {
            let mut buf = Vec::new();
            let result = match len {
                Some(n) => Read::by_ref(file).take(n).read_to_end(&mut buf),
                None => file.read_to_end(&mut buf),
            };
            result.map_err(|e| self.io("read", e))?;
            trace!(path = %self.path.display(), bytes = buf.len(), "handle read");
            Ok(buf)
        })
    }

    /// Like [`FileHandle::read`], decoded as UTF-8 with replacement.
    ///
    /// # Errors
    ///
    /// See [`FileHandle::read`].
    pub fn read_string(&self, len: Option<u64>) -> FsResult<String> {
        let bytes = self.read(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read through the next `\n` and return the line without it (and
    /// without a trailing `\r`). Returns `""` at end of file. Lines longer
    /// than [`MAX_LINE_LENGTH`] are split.
    ///
    /// # Errors
    ///
    /// Fails on a write-only or closed handle, or a read error.
    pub fn read_line(&self) -> FsResult<String> {
        self.require_read()?;
        self.with_file(|file, _| {
            let mut line = Vec::new();
            let mut chunk = [0u8; LINE_CHUNK];
            'outer: loop {
                let n = match file.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(self.io("read line", e)),
                };
                for (i, &byte) in chunk[..n].iter().enumerate() {
                    let done = if byte == b'\n' {
                        true
                    } else {
                        line.push(byte);
                        line.len() >= MAX_LINE_LENGTH
                    };
                    if done {
                        let unread = n - i - 1;
                        if unread > 0 {
                            let back = i64::try_from(unread).unwrap_or(i64::MAX);
                            file.seek(SeekFrom::Current(-back))
                                .map_err(|e| self.io("read line", e))?;
                        }
                        break 'outer;
                    }
                }
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            Ok(String::from_utf8_lossy(&line).into_owned())
        })
    }

    /// Write `bytes` at the cursor (or at the end in append modes).
    ///
    /// # Errors
    ///
    /// Fails on a read-only or closed handle, or a write error.
    pub fn write(&self, bytes: &[u8]) -> FsResult<usize> {
        self.require_write()?;
        self.with_file(|file, size| {
            file.write_all(bytes).map_err(|e| self.io("write", e))?;
            *size = None;
            Ok(bytes.len())
        })
    }

    /// Write `text` as UTF-8.
    ///
    /// # Errors
    ///
    /// See [`FileHandle::write`].
    pub fn write_string(&self, text: &str) -> FsResult<usize> {
        self.write(text.as_bytes())
    }

    /// Write `text` followed by `\n` in a single locked operation.
    ///
    /// # Errors
    ///
    /// See [`FileHandle::write`].
    pub fn write_line(&self, text: &str) -> FsResult<usize> {
        let mut line = Vec::with_capacity(text.len().saturating_add(1));
        line.extend_from_slice(text.as_bytes());
        line.push(b'\n');
        self.write(&line)
    }

    /// Flush buffered writes.
    ///
    /// # Errors
    ///
    /// Fails on a closed handle.
    pub fn flush(&self) -> FsResult<()> {
        self.with_file(|file, _| file.flush().map_err(|e| self.io("flush", e)))
    }

    /// Cut the file at the current position.
    ///
    /// # Errors
    ///
    /// Fails on a read-only or closed handle.
    pub fn truncate(&self) -> FsResult<()> {
        self.require_write()?;
        self.with_file(|file, size| {
            file.flush().map_err(|e| self.io("flush", e))?;
            let pos = file.stream_position().map_err(|e| self.io("tell", e))?;
            file.set_len(pos).map_err(|e| self.io("truncate", e))?;
            *size = None;
            Ok(())
        })
    }

    /// Close the file. Idempotent; later operations fail with
    /// [`FsError::HandleClosed`].
    ///
    /// Returns at once. If another thread is mid-operation the file is
    /// released when that operation ends, or when the last reference drops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let file = match self.inner.try_lock() {
            Ok(mut inner) => inner.file.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().file.take(),
            Err(TryLockError::WouldBlock) => {
                debug!(path = %self.path.display(), "close deferred to in-flight operation");
                return;
            },
        };
        self.release(file);
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
