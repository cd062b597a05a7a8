//! Pure path helpers. None of these touch the filesystem except
//! [`absolute_path`] (current directory) and [`normalize_path`]
//! (canonicalization of existing paths).

use std::path::{Component, Path, PathBuf};

use crate::error::{FsError, FsResult};

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parent directory, or `""` if there is none.
#[must_use]
pub fn parent_path(path: &str) -> String {
    Path::new(path).parent().map(lossy).unwrap_or_default()
}

/// Final component, or `""`.
#[must_use]
pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extension including the leading dot (`".txt"`), or `""`.
#[must_use]
pub fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// File name without its extension.
#[must_use]
pub fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Join components left to right. An absolute component restarts the path.
#[must_use]
pub fn join_paths<S: AsRef<str>>(parts: &[S]) -> String {
    let mut iter = parts.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let joined = iter.fold(PathBuf::from(first.as_ref()), |acc, part| {
        acc.join(part.as_ref())
    });
    lossy(&joined)
}

/// Absolute form of `path` against the current directory, without resolving
/// symlinks.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read or `path` is
/// empty.
pub fn absolute_path(path: &str) -> FsResult<String> {
    std::path::absolute(path)
        .map(|p| lossy(&p))
        .map_err(|e| FsError::io("absolute", Path::new(path), e))
}

/// Canonical path if `path` exists, otherwise its lexical normal form.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let p = Path::new(path);
    if p.exists()
        && let Ok(canonical) = p.canonicalize()
    {
        return lossy(&canonical);
    }
    lossy(&lexically_normal(p))
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` directly under the root is dropped. Leading `..` in a relative path
/// is kept. An empty result becomes `"."`.
#[must_use]
pub fn lexically_normal(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                },
                Some(Component::RootDir | Component::Prefix(_)) => {},
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}
