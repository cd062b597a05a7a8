//! Plain data types shared by the filesystem facade and file handles.

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Kind of entity found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Nothing there (or something that is neither file nor directory).
    #[default]
    NotFound = 0,
    /// Regular file.
    File = 1,
    /// Directory.
    Directory = 2,
}

impl EntityType {
    /// Numeric code exposed to the host.
    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// How whole-file writes treat existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    /// Truncate, then write.
    #[default]
    Overwrite = 0,
    /// Append to existing content.
    Append = 1,
}

impl WriteMode {
    /// Map a host number; anything other than 1 overwrites.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        if code == 1 { Self::Append } else { Self::Overwrite }
    }
}

/// Size, modification time and kind of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Size in bytes; 0 for directories and missing paths.
    pub size: u64,
    /// Last modification, milliseconds since the Unix epoch.
    pub modified_time_ms: i64,
    /// What the path points at.
    pub entity_type: EntityType,
}

/// One result of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Full path of the entry.
    pub path: String,
    /// Final component.
    pub name: String,
    /// What the entry is.
    pub entity_type: EntityType,
    /// Size in bytes for files, 0 otherwise.
    pub size: u64,
}

/// Access mode of a [`crate::FileHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OpenMode {
    /// Read only; the file must exist.
    #[default]
    Read = 0,
    /// Write only; create or truncate.
    Write = 1,
    /// Write at end; create if missing.
    Append = 2,
    /// Read and write; the file must exist.
    ReadWrite = 3,
    /// Read and write; create or truncate.
    WriteRead = 4,
    /// Read anywhere, write at end; create if missing.
    AppendRead = 5,
}

impl OpenMode {
    /// Parse a host mode number.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidArgument`] for numbers outside 0..=5.
    pub fn from_code(code: i64) -> FsResult<Self> {
        Ok(match code {
            0 => Self::Read,
            1 => Self::Write,
            2 => Self::Append,
            3 => Self::ReadWrite,
            4 => Self::WriteRead,
            5 => Self::AppendRead,
            other => {
                return Err(FsError::InvalidArgument(format!(
                    "unknown open mode {other}"
                )));
            },
        })
    }

    /// True if the mode permits reads.
    #[must_use]
    pub fn can_read(self) -> bool {
        !matches!(self, Self::Write | Self::Append)
    }

    /// True if the mode permits writes.
    #[must_use]
    pub fn can_write(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Reference point of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeekOrigin {
    /// From the start of the file.
    #[default]
    Begin = 0,
    /// From the current position.
    Current = 1,
    /// From the end of the file.
    End = 2,
}

impl SeekOrigin {
    /// Map a host number; unknown values seek from the start.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Current,
            2 => Self::End,
            _ => Self::Begin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes() {
        assert_eq!(OpenMode::from_code(0).unwrap(), OpenMode::Read);
        assert_eq!(OpenMode::from_code(5).unwrap(), OpenMode::AppendRead);
        assert!(matches!(OpenMode::from_code(6), Err(FsError::InvalidArgument(_))));
        assert!(OpenMode::from_code(-1).is_err());
    }

    #[test]
    fn test_mode_permissions() {
        assert!(OpenMode::Read.can_read() && !OpenMode::Read.can_write());
        assert!(!OpenMode::Write.can_read() && OpenMode::Write.can_write());
        assert!(!OpenMode::Append.can_read());
        for mode in [OpenMode::ReadWrite, OpenMode::WriteRead, OpenMode::AppendRead] {
            assert!(mode.can_read() && mode.can_write());
        }
    }

    #[test]
    fn test_entity_codes() {
        assert_eq!(EntityType::NotFound.code(), 0);
        assert_eq!(EntityType::File.code(), 1);
        assert_eq!(EntityType::Directory.code(), 2);
    }

    #[test]
    fn test_lenient_codes() {
        assert_eq!(WriteMode::from_code(1), WriteMode::Append);
        assert_eq!(WriteMode::from_code(7), WriteMode::Overwrite);
        assert_eq!(SeekOrigin::from_code(2), SeekOrigin::End);
        assert_eq!(SeekOrigin::from_code(9), SeekOrigin::Begin);
    }

    #[test]
    fn test_metadata_serializes() {
        let meta = FileMetadata {
            size: 2,
            modified_time_ms: 10,
            entity_type: EntityType::File,
        };
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(json["entity_type"], "file");
        assert_eq!(json["size"], 2);
    }
}
