//! The `Platform` host object: OS name and well-known directories.

use std::path::Path;
use std::sync::OnceLock;

use directories::{BaseDirs, UserDirs};
use hostio_core::host::{HostError, HostObject, HostValue, Realm};
use hostio_core::{Bridge, BridgeBuilder, BridgeResult};

/// Resolved directory paths. A directory the OS does not define is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformDirs {
    /// User home.
    pub home: String,
    /// Documents.
    pub documents: String,
    /// Downloads.
    pub downloads: String,
    /// Pictures.
    pub pictures: String,
    /// Music.
    pub music: String,
    /// Videos.
    pub movies: String,
    /// Per-user cache.
    pub cache: String,
    /// Per-user application data.
    pub data: String,
    /// Per-user configuration.
    pub config: String,
    /// Temporary files.
    pub temp: String,
}

impl PlatformDirs {
    /// Resolve every directory now.
    #[must_use]
    pub fn resolve() -> Self {
        let mut dirs = Self {
            temp: display(&std::env::temp_dir()),
            ..Self::default()
        };
        if let Some(base) = BaseDirs::new() {
            dirs.home = display(base.home_dir());
            dirs.cache = display(base.cache_dir());
            dirs.data = display(base.data_dir());
            dirs.config = display(base.config_dir());
        }
        if let Some(user) = UserDirs::new() {
            dirs.documents = user.document_dir().map(display).unwrap_or_default();
            dirs.downloads = user.download_dir().map(display).unwrap_or_default();
            dirs.pictures = user.picture_dir().map(display).unwrap_or_default();
            dirs.music = user.audio_dir().map(display).unwrap_or_default();
            dirs.movies = user.video_dir().map(display).unwrap_or_default();
        }
        dirs
    }

    /// Process-wide copy, resolved on first use.
    #[must_use]
    pub fn cached() -> &'static Self {
        static DIRS: OnceLock<PlatformDirs> = OnceLock::new();
        DIRS.get_or_init(Self::resolve)
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

type DirReader = fn(&PlatformDirs) -> &str;

/// Property names and how each reads [`PlatformDirs`].
fn directory_properties() -> [(&'static str, DirReader); 11] {
    [
        ("homeDir", |d| d.home.as_str()),
        ("documentsDir", |d| d.documents.as_str()),
        ("downloadsDir", |d| d.downloads.as_str()),
        ("picturesDir", |d| d.pictures.as_str()),
        ("musicDir", |d| d.music.as_str()),
        ("moviesDir", |d| d.movies.as_str()),
        ("cacheDir", |d| d.cache.as_str()),
        ("dataDir", |d| d.data.as_str()),
        ("filesDir", |d| d.data.as_str()),
        ("configDir", |d| d.config.as_str()),
        ("tempDir", |d| d.temp.as_str()),
    ]
}

/// Read-only host object over [`PlatformDirs::cached`].
pub struct PlatformObject {
    bridge: Bridge,
}

impl PlatformObject {
    /// Build the object.
    ///
    /// # Errors
    ///
    /// Returns [`hostio_core::BridgeError::Configuration`] if the bridge
    /// cannot be built.
    pub fn new() -> BridgeResult<Self> {
        let mut builder = BridgeBuilder::new("Platform");
        builder.register_property("platform", |_| Ok(HostValue::from(std::env::consts::OS)));
        for (name, read) in directory_properties() {
            builder.register_property(name, move |_| {
                Ok(HostValue::from(read(PlatformDirs::cached())))
            });
        }
        Ok(Self {
            bridge: builder.build()?,
        })
    }
}

impl HostObject for PlatformObject {
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

impl std::fmt::Debug for PlatformObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformObject")
            .field("bridge", &self.bridge)
            .finish()
    }
}
