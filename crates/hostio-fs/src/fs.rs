//! Whole-file and directory operations.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{FsError, FsResult};
use crate::hash::HashAlgorithm;
use crate::path;
use crate::types::{DirEntry, EntityType, FileMetadata, WriteMode};

/// Synchronous facade over the host filesystem.
///
/// Stateless; cheap to clone and share across worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

fn millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

fn entity_type(meta: &fs::Metadata) -> EntityType {
    if meta.is_file() {
        EntityType::File
    } else if meta.is_dir() {
        EntityType::Directory
    } else {
        EntityType::NotFound
    }
}

fn ensure_parent(path: &Path) -> FsResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| FsError::io("create parent directories", parent, e)),
        _ => Ok(()),
    }
}

impl FileSystem {
    /// Create the facade.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// True if anything exists at `path` (symlinks are followed).
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    /// True if `path` is a regular file.
    #[must_use]
    pub fn is_file(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    /// True if `path` is a directory.
    #[must_use]
    pub fn is_directory(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    /// Size, modification time and kind. A missing path is not an error: it
    /// yields [`EntityType::NotFound`] with zeros.
    #[must_use]
    pub fn metadata(&self, path: &str) -> FileMetadata {
        let Ok(meta) = fs::metadata(path) else {
            return FileMetadata::default();
        };
        let entity_type = entity_type(&meta);
        FileMetadata {
            size: if entity_type == EntityType::File { meta.len() } else { 0 },
            modified_time_ms: meta.modified().map(millis).unwrap_or(0),
            entity_type,
        }
    }

    /// Size of `path` in bytes.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be stat'ed.
    pub fn file_size(&self, path: &str) -> FsResult<u64> {
        fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| FsError::io("get file size", Path::new(path), e))
    }

    /// Last modification time in milliseconds since the epoch.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be stat'ed.
    pub fn modified_time(&self, path: &str) -> FsResult<i64> {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map(millis)
            .map_err(|e| FsError::io("get modified time", Path::new(path), e))
    }

    /// Whole file as a string; invalid UTF-8 is replaced.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn read_string(&self, path: &str) -> FsResult<String> {
        let bytes = self.read_bytes(path)?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Whole file as bytes.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn read_bytes(&self, path: &str) -> FsResult<Vec<u8>> {
        fs::read(path).map_err(|e| FsError::io("read", Path::new(path), e))
    }

    /// Write `content` as UTF-8.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or written.
    pub fn write_string(
        &self,
        path: &str,
        content: &str,
        mode: WriteMode,
        create_parents: bool,
    ) -> FsResult<()> {
        self.write_bytes(path, content.as_bytes(), mode, create_parents)
    }

    /// Write `content`, truncating or appending per `mode`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or written.
    pub fn write_bytes(
        &self,
        path: &str,
        content: &[u8],
        mode: WriteMode,
        create_parents: bool,
    ) -> FsResult<()> {
        let target = Path::new(path);
        if create_parents {
            ensure_parent(target)?;
        }
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Overwrite => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };
        let mut file = options
            .open(target)
            .map_err(|e| FsError::io("open for writing", target, e))?;
        file.write_all(content)
            .map_err(|e| FsError::io("write", target, e))?;
        trace!(path, bytes = content.len(), ?mode, "wrote file");
        Ok(())
    }

    /// Create `path` empty, truncating it if it exists.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created.
    pub fn create_file(&self, path: &str, create_parents: bool) -> FsResult<()> {
        let target = Path::new(path);
        if create_parents {
            ensure_parent(target)?;
        }
        File::create(target)
            .map(drop)
            .map_err(|e| FsError::io("create file", target, e))
    }

    /// Remove the file at `path`. Returns false if nothing was there.
    ///
    /// # Errors
    ///
    /// Fails if the path exists but cannot be removed (including when it is
    /// a directory).
    pub fn delete_file(&self, path: &str) -> FsResult<bool> {
        let target = Path::new(path);
        match fs::remove_file(target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FsError::io("delete file", target, e)),
        }
    }

    /// Copy a file.
    ///
    /// # Errors
    ///
    /// Fails with [`FsError::AlreadyExists`] if `dst` exists and `overwrite`
    /// is false, or if the copy itself fails.
    pub fn copy_file(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        let dst_path = Path::new(dst);
        if !overwrite && dst_path.exists() {
            return Err(FsError::AlreadyExists(dst.to_owned()));
        }
        fs::copy(src, dst_path)
            .map(drop)
            .map_err(|e| FsError::io("copy file", Path::new(src), e))
    }

    /// Rename a file.
    ///
    /// # Errors
    ///
    /// Fails if the rename fails.
    pub fn move_file(&self, src: &str, dst: &str) -> FsResult<()> {
        fs::rename(src, dst).map_err(|e| FsError::io("move file", Path::new(src), e))
    }

    /// Rename a directory.
    ///
    /// # Errors
    ///
    /// Fails if the rename fails.
    pub fn move_directory(&self, src: &str, dst: &str) -> FsResult<()> {
        fs::rename(src, dst).map_err(|e| FsError::io("move directory", Path::new(src), e))
    }

    /// Create a directory. With `recursive`, create missing parents and
    /// accept an existing directory.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn create_directory(&self, path: &str, recursive: bool) -> FsResult<()> {
        let target = Path::new(path);
        let result = if recursive {
            fs::create_dir_all(target)
        } else {
            fs::create_dir(target)
        };
        result.map_err(|e| FsError::io("create directory", target, e))
    }

    /// Remove a directory and return how many entries were removed.
    ///
    /// The non-recursive form removes only an empty directory. The
    /// recursive count includes the directory itself. A missing path
    /// removes nothing and returns 0.
    ///
    /// # Errors
    ///
    /// Fails with [`FsError::DirectoryNotEmpty`] for a non-recursive delete
    /// of a directory with contents, or if removal fails.
    pub fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<u64> {
        let target = Path::new(path);
        if fs::symlink_metadata(target).is_err() {
            return Ok(0);
        }
        if !recursive {
            return fs::remove_dir(target)
                .map(|()| 1)
                .map_err(|e| FsError::io("delete directory", target, e));
        }

        let count = WalkDir::new(target).into_iter().filter_map(Result::ok).count();
        fs::remove_dir_all(target).map_err(|e| FsError::io("delete directory", target, e))?;
        debug!(path, count, "removed directory tree");
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    /// Entries under `path`. The recursive form walks the whole tree
    /// (directories before their contents); `path` itself is not listed.
    ///
    /// # Errors
    ///
    /// Fails if `path` cannot be read.
    pub fn list_directory(&self, path: &str, recursive: bool) -> FsResult<Vec<DirEntry>> {
        let root = Path::new(path);
        if !root.is_dir() {
            let meta = fs::metadata(root).map_err(|e| FsError::io("list directory", root, e))?;
            if !meta.is_dir() {
                return Err(FsError::NotADirectory(path.to_owned()));
            }
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let at = e.path().unwrap_or(root).to_path_buf();
                match e.into_io_error() {
                    Some(io) => FsError::io("list directory", &at, io),
                    None => FsError::Io {
                        op: "list directory",
                        path: at.display().to_string(),
                        source: std::io::Error::other("filesystem loop"),
                    },
                }
            })?;
            let (entity_type, size) = match fs::metadata(entry.path()) {
                Ok(meta) => {
                    let kind = entity_type(&meta);
                    (kind, if kind == EntityType::File { meta.len() } else { 0 })
                },
                Err(_) => (EntityType::NotFound, 0),
            };
            entries.push(DirEntry {
                path: entry.path().to_string_lossy().into_owned(),
                name: entry.file_name().to_string_lossy().into_owned(),
                entity_type,
                size,
            });
        }
        Ok(entries)
    }

    /// See [`path::parent_path`].
    #[must_use]
    pub fn parent_path(&self, p: &str) -> String {
        path::parent_path(p)
    }

    /// See [`path::file_name`].
    #[must_use]
    pub fn file_name(&self, p: &str) -> String {
        path::file_name(p)
    }

    /// See [`path::extension`].
    #[must_use]
    pub fn extension(&self, p: &str) -> String {
        path::extension(p)
    }

    /// See [`path::file_stem`].
    #[must_use]
    pub fn file_stem(&self, p: &str) -> String {
        path::file_stem(p)
    }

    /// See [`path::join_paths`].
    #[must_use]
    pub fn join_paths<S: AsRef<str>>(&self, parts: &[S]) -> String {
        path::join_paths(parts)
    }

    /// See [`path::absolute_path`].
    ///
    /// # Errors
    ///
    /// Fails if the current directory cannot be read.
    pub fn absolute_path(&self, p: &str) -> FsResult<String> {
        path::absolute_path(p)
    }

    /// See [`path::normalize_path`].
    #[must_use]
    pub fn normalize_path(&self, p: &str) -> String {
        path::normalize_path(p)
    }

    /// Bytes available to the current user on the volume holding `path`.
    ///
    /// # Errors
    ///
    /// Fails if the volume cannot be queried.
    pub fn available_space(&self, path: &str) -> FsResult<u64> {
        fs2::available_space(path).map_err(|e| FsError::io("query storage", Path::new(path), e))
    }

    /// Total capacity of the volume holding `path`.
    ///
    /// # Errors
    ///
    /// Fails if the volume cannot be queried.
    pub fn total_space(&self, path: &str) -> FsResult<u64> {
        fs2::total_space(path).map_err(|e| FsError::io("query storage", Path::new(path), e))
    }

    /// Lowercase hex digest of the file's content. The file is streamed,
    /// not loaded whole.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn calc_hash(&self, path: &str, algorithm: HashAlgorithm) -> FsResult<String> {
        let target = Path::new(path);
        let file = File::open(target).map_err(|e| FsError::io("open for hashing", target, e))?;
        algorithm
            .digest_reader(BufReader::new(file))
            .map_err(|e| FsError::io("hash", target, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, FileSystem) {
        (tempfile::tempdir().unwrap(), FileSystem::new())
    }

    fn p(dir: &tempfile::TempDir, rel: &str) -> String {
        dir.path().join(rel).to_string_lossy().into_owned()
    }

    #[test]
    fn test_metadata_of_missing_path() {
        let (dir, fs) = sandbox();
        let meta = fs.metadata(&p(&dir, "nope"));
        assert_eq!(meta, FileMetadata::default());
        assert_eq!(meta.entity_type, EntityType::NotFound);
    }

    #[test]
    fn test_metadata_of_file_and_directory() {
        let (dir, fs) = sandbox();
        let file = p(&dir, "a.txt");
        fs.write_string(&file, "hello", WriteMode::Overwrite, false).unwrap();

        let meta = fs.metadata(&file);
        assert_eq!(meta.entity_type, EntityType::File);
        assert_eq!(meta.size, 5);
        assert!(meta.modified_time_ms > 0);

        let meta = fs.metadata(&dir.path().to_string_lossy());
        assert_eq!(meta.entity_type, EntityType::Directory);
        assert_eq!(meta.size, 0);
    }

    #[test]
    fn test_write_modes() {
        let (dir, fs) = sandbox();
        let file = p(&dir, "log.txt");
        fs.write_string(&file, "a", WriteMode::Overwrite, false).unwrap();
        fs.write_string(&file, "b", WriteMode::Append, false).unwrap();
        assert_eq!(fs.read_string(&file).unwrap(), "ab");
        fs.write_bytes(&file, b"z", WriteMode::Overwrite, false).unwrap();
        assert_eq!(fs.read_bytes(&file).unwrap(), b"z");
    }

    #[test]
    fn test_create_parents() {
        let (dir, fs) = sandbox();
        let nested = p(&dir, "x/y/z.txt");
        assert!(matches!(
            fs.write_string(&nested, "1", WriteMode::Overwrite, false),
            Err(FsError::NotFound(_))
        ));
        fs.write_string(&nested, "1", WriteMode::Overwrite, true).unwrap();
        assert!(fs.is_file(&nested));

        let created = p(&dir, "q/r/empty");
        fs.create_file(&created, true).unwrap();
        assert_eq!(fs.file_size(&created).unwrap(), 0);
    }

    #[test]
    fn test_create_file_truncates() {
        let (dir, fs) = sandbox();
        let file = p(&dir, "t");
        fs.write_string(&file, "content", WriteMode::Overwrite, false).unwrap();
        fs.create_file(&file, false).unwrap();
        assert_eq!(fs.file_size(&file).unwrap(), 0);
    }

    #[test]
    fn test_delete_file_reports_presence() {
        let (dir, fs) = sandbox();
        let file = p(&dir, "d");
        fs.create_file(&file, false).unwrap();
        assert!(fs.delete_file(&file).unwrap());
        assert!(!fs.delete_file(&file).unwrap());
    }

    #[test]
    fn test_copy_respects_overwrite() {
        let (dir, fs) = sandbox();
        let (src, dst) = (p(&dir, "src"), p(&dir, "dst"));
        fs.write_string(&src, "new", WriteMode::Overwrite, false).unwrap();
        fs.write_string(&dst, "old", WriteMode::Overwrite, false).unwrap();

        assert!(matches!(fs.copy_file(&src, &dst, false), Err(FsError::AlreadyExists(_))));
        assert_eq!(fs.read_string(&dst).unwrap(), "old");

        fs.copy_file(&src, &dst, true).unwrap();
        assert_eq!(fs.read_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_move_file_and_directory() {
        let (dir, fs) = sandbox();
        let (a, b) = (p(&dir, "a"), p(&dir, "b"));
        fs.create_file(&a, false).unwrap();
        fs.move_file(&a, &b).unwrap();
        assert!(!fs.exists(&a) && fs.exists(&b));

        let (d1, d2) = (p(&dir, "d1"), p(&dir, "d2"));
        fs.create_directory(&d1, false).unwrap();
        fs.move_directory(&d1, &d2).unwrap();
        assert!(fs.is_directory(&d2));
    }

    #[test]
    fn test_create_directory_recursive() {
        let (dir, fs) = sandbox();
        let deep = p(&dir, "a/b/c");
        assert!(fs.create_directory(&deep, false).is_err());
        fs.create_directory(&deep, true).unwrap();
        fs.create_directory(&deep, true).unwrap();
        assert!(matches!(
            fs.create_directory(&deep, false),
            Err(FsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_delete_directory_counts() {
        let (dir, fs) = sandbox();
        let root = p(&dir, "tree");
        fs.write_string(&p(&dir, "tree/a.txt"), "1", WriteMode::Overwrite, true).unwrap();
        fs.write_string(&p(&dir, "tree/sub/b.txt"), "2", WriteMode::Overwrite, true).unwrap();

        assert!(matches!(
            fs.delete_directory(&root, false),
            Err(FsError::DirectoryNotEmpty(_))
        ));
        // tree, a.txt, sub, sub/b.txt
        assert_eq!(fs.delete_directory(&root, true).unwrap(), 4);
        assert!(!fs.exists(&root));
        assert_eq!(fs.delete_directory(&root, true).unwrap(), 0);

        let empty = p(&dir, "empty");
        fs.create_directory(&empty, false).unwrap();
        assert_eq!(fs.delete_directory(&empty, false).unwrap(), 1);
    }

    #[test]
    fn test_list_directory() {
        let (dir, fs) = sandbox();
        fs.write_string(&p(&dir, "b.txt"), "22", WriteMode::Overwrite, false).unwrap();
        fs.write_string(&p(&dir, "a/inner.txt"), "1", WriteMode::Overwrite, true).unwrap();
        let root = dir.path().to_string_lossy().into_owned();

        let flat = fs.list_directory(&root, false).unwrap();
        let names: Vec<_> = flat.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b.txt"]);
        assert_eq!(flat[0].entity_type, EntityType::Directory);
        assert_eq!(flat[1].size, 2);

        let deep = fs.list_directory(&root, true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().any(|e| e.name == "inner.txt" && e.path.ends_with("a/inner.txt")));

        assert!(fs.list_directory(&p(&dir, "b.txt"), false).is_err());
        assert!(matches!(fs.list_directory(&p(&dir, "none"), false), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_space_queries() {
        let (dir, fs) = sandbox();
        let root = dir.path().to_string_lossy().into_owned();
        let total = fs.total_space(&root).unwrap();
        let available = fs.available_space(&root).unwrap();
        assert!(total > 0);
        assert!(available <= total);
    }

    #[test]
    fn test_calc_hash_of_file() {
        let (dir, fs) = sandbox();
        let file = p(&dir, "abc");
        fs.write_string(&file, "abc", WriteMode::Overwrite, false).unwrap();
        assert_eq!(
            fs.calc_hash(&file, HashAlgorithm::default()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(matches!(
            fs.calc_hash(&p(&dir, "missing"), HashAlgorithm::Md5),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_string_replaces_invalid_utf8() {
        let (dir, fs) = sandbox();
        let file = p(&dir, "bin");
        fs.write_bytes(&file, &[b'o', b'k', 0xff], WriteMode::Overwrite, false).unwrap();
        assert_eq!(fs.read_string(&file).unwrap(), "ok\u{fffd}");
    }
}
