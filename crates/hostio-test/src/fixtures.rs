//! Filesystem fixtures and tracing setup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;

/// A temporary directory removed on drop.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// Create an empty workspace.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        match tempfile::Builder::new().prefix("hostio-test-").tempdir() {
            Ok(dir) => Self { dir },
            Err(e) => panic!("failed to create temp workspace: {e}"),
        }
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the workspace.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Like [`TempWorkspace::path`], as a `String`.
    #[must_use]
    pub fn path_str(&self, relative: &str) -> String {
        self.path(relative).to_string_lossy().into_owned()
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics on any I/O error.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            panic!("failed to create {}: {e}", parent.display());
        }
        if let Err(e) = fs::write(&path, contents) {
            panic!("failed to write {}: {e}", path.display());
        }
        path
    }

    /// Create directory `relative` and its parents.
    ///
    /// # Panics
    ///
    /// Panics on any I/O error.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        if let Err(e) = fs::create_dir_all(&path) {
            panic!("failed to create {}: {e}", path.display());
        }
        path
    }

    /// Contents of `relative`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, relative: &str) -> Vec<u8> {
        let path = self.path(relative);
        match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => panic!("failed to read {}: {e}", path.display()),
        }
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

static TRACING: Once = Once::new();

/// Install a test-writer tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
