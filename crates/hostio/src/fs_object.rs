//! The `FileSystem` host object.
//!
//! Whole-file and directory operations are registered twice: a `*Sync`
//! method that runs on the interpreter thread and a promise-returning method
//! that runs on the object's worker pool. Both parse their arguments through
//! the same [`AsyncArgs`] view, so the two forms accept identical inputs.
//!
//! Streaming file handles are numeric ids into a [`HandleTable`] owned by the
//! object. Dropping the object closes every handle still open.

use std::sync::Arc;

use hostio_core::host::{HostError, HostObject, HostValue, Realm};
use hostio_core::{
    AsyncArgs, Bridge, BridgeBuilder, BridgeError, BridgeResult, HandleTable, MainThreadInvoker,
    TaskExecutor, TypedValue,
};
use hostio_fs::{
    DirEntry, FileHandle, FileMetadata, FileSystem, HashAlgorithm, OpenMode, SeekOrigin, WriteMode,
};
use tracing::debug;

use crate::args::{byte_count, code, handle_id};

/// Value of the `version` property.
pub const VERSION: &str = "1.0.0";

type Handles = Arc<HandleTable<FileHandle>>;

/// Host object exposing [`FileSystem`] and [`FileHandle`].
pub struct FileSystemObject {
    bridge: Bridge,
    handles: Handles,
}

impl FileSystemObject {
    /// Build the object over `executor`, settling promises through `invoker`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if the bridge cannot be built.
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        invoker: Arc<dyn MainThreadInvoker>,
    ) -> BridgeResult<Self> {
        let handles: Handles = Arc::new(HandleTable::new());
        let mut builder = BridgeBuilder::new("FileSystem")
            .with_executor(executor)
            .with_invoker(invoker);

        builder.register_property("version", |_| Ok(HostValue::from(VERSION)));
        builder.register_property("platform", |_| Ok(HostValue::from(std::env::consts::OS)));

        register_whole_file_ops(&mut builder);
        register_directory_ops(&mut builder);
        register_path_helpers(&mut builder);
        register_handle_lifecycle(&mut builder, &handles);
        register_handle_ops(&mut builder, &handles);

        builder.register_async("calcHash", 1, |args| {
            let algorithm = HashAlgorithm::from_code(code(args.number_or(0, 2.0)));
            let digest = FileSystem::new()
                .calc_hash(args.string(0)?, algorithm)
                .map_err(BridgeError::native)?;
            Ok(digest.into())
        });

        Ok(Self {
            bridge: builder.build()?,
            handles,
        })
    }

    /// Number of handles currently open.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }
}

impl HostObject for FileSystemObject {
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

impl Drop for FileSystemObject {
    fn drop(&mut self) {
        let open = self.handles.drain();
        if !open.is_empty() {
            debug!(count = open.len(), "closing file handles left open");
        }
        for handle in open {
            handle.close();
        }
    }
}

impl std::fmt::Debug for FileSystemObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemObject")
            .field("bridge", &self.bridge)
            .field("open_handles", &self.handles.len())
            .finish()
    }
}

/// Register `name` as an async method and `nameSync` as its blocking twin.
fn register_pair<F>(builder: &mut BridgeBuilder, name: &str, min_args: usize, op: F)
where
    F: Fn(&AsyncArgs) -> BridgeResult<TypedValue> + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let blocking = Arc::clone(&op);
    let sync_name = format!("{name}Sync");
    let method = sync_name.clone();
    builder.register_sync(&sync_name, min_args, move |realm, args| {
        let args = AsyncArgs::extract(&method, args)?;
        Ok(blocking(&args)?.into_host(realm))
    });
    builder.register_async(name, min_args, move |args| op(args));
}

fn register_whole_file_ops(builder: &mut BridgeBuilder) {
    let fs = FileSystem::new();

    register_pair(builder, "exists", 1, move |a| Ok(fs.exists(a.string(0)?).into()));
    register_pair(builder, "isFile", 1, move |a| Ok(fs.is_file(a.string(0)?).into()));
    register_pair(builder, "isDirectory", 1, move |a| {
        Ok(fs.is_directory(a.string(0)?).into())
    });
    register_pair(builder, "getMetadata", 1, move |a| {
        Ok(metadata_value(fs.metadata(a.string(0)?)))
    });
    register_pair(builder, "getFileSize", 1, move |a| {
        Ok(fs.file_size(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "getModifiedTime", 1, move |a| {
        Ok(fs.modified_time(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "readString", 1, move |a| {
        Ok(fs.read_string(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "readBytes", 1, move |a| {
        Ok(fs.read_bytes(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "writeString", 2, move |a| {
        let mode = WriteMode::from_code(code(a.number_or(0, 0.0)));
        fs.write_string(a.string(0)?, a.string(1)?, mode, a.bool_or(0, false))
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_pair(builder, "writeBytes", 2, move |a| {
        let mode = WriteMode::from_code(code(a.number_or(0, 0.0)));
        fs.write_bytes(a.string(0)?, a.buffer(0)?, mode, a.bool_or(0, false))
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_pair(builder, "createFile", 1, move |a| {
        fs.create_file(a.string(0)?, a.bool_or(0, false))
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_pair(builder, "deleteFile", 1, move |a| {
        Ok(fs.delete_file(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "copyFile", 2, move |a| {
        fs.copy_file(a.string(0)?, a.string(1)?, a.bool_or(0, true))
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_pair(builder, "moveFile", 2, move |a| {
        fs.move_file(a.string(0)?, a.string(1)?)
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_pair(builder, "getAvailableSpace", 1, move |a| {
        Ok(fs.available_space(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "getTotalSpace", 1, move |a| {
        Ok(fs.total_space(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "getAbsolutePath", 1, move |a| {
        Ok(fs.absolute_path(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_pair(builder, "normalizePath", 1, move |a| {
        Ok(fs.normalize_path(a.string(0)?).into())
    });
}

fn register_directory_ops(builder: &mut BridgeBuilder) {
    let fs = FileSystem::new();

    register_pair(builder, "createDirectory", 1, move |a| {
        fs.create_directory(a.string(0)?, a.bool_or(0, false))
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_pair(builder, "deleteDirectory", 1, move |a| {
        let removed = fs
            .delete_directory(a.string(0)?, a.bool_or(0, false))
            .map_err(BridgeError::native)?;
        Ok(removed.into())
    });
    register_pair(builder, "listDirectory", 1, move |a| {
        let entries = fs
            .list_directory(a.string(0)?, a.bool_or(0, false))
            .map_err(BridgeError::native)?;
        Ok(TypedValue::List(entries.into_iter().map(entry_value).collect()))
    });
    register_pair(builder, "moveDirectory", 2, move |a| {
        fs.move_directory(a.string(0)?, a.string(1)?)
            .map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
}

fn register_path_helpers(builder: &mut BridgeBuilder) {
    let helpers: [(&str, fn(&FileSystem, &str) -> String); 4] = [
        ("getParentPath", FileSystem::parent_path),
        ("getFileName", FileSystem::file_name),
        ("getFileExtension", FileSystem::extension),
        ("getFileNameWithoutExtension", FileSystem::file_stem),
    ];
    for (name, helper) in helpers {
        let method = name.to_owned();
        builder.register_sync(name, 1, move |_, args| {
            let args = AsyncArgs::extract(&method, args)?;
            Ok(HostValue::String(helper(&FileSystem::new(), args.string(0)?)))
        });
    }

    builder.register_sync("joinPaths", 0, |_, args| {
        let args = AsyncArgs::extract("joinPaths", args)?;
        Ok(HostValue::String(FileSystem::new().join_paths(args.strings())))
    });
}

fn register_handle_lifecycle(builder: &mut BridgeBuilder, handles: &Handles) {
    let table = Arc::clone(handles);
    builder.register_sync("openFile", 1, move |_, args| {
        let args = AsyncArgs::extract("openFile", args)?;
        let path = args.string(0)?;
        let mode = OpenMode::from_code(code(args.number_or(0, 0.0)))
            .map_err(|e| BridgeError::argument("openFile", e.to_string()))?;
        let create_parents = args.bool_or(0, false);
        let id = table.open_with(|| {
            FileHandle::open(path, mode, create_parents).map_err(BridgeError::native)
        })?;
        debug!(handle = id, path, ?mode, "file opened");
        Ok(HostValue::Number(f64::from(id)))
    });

    let table = Arc::clone(handles);
    builder.register_sync("fileClose", 1, move |_, args| {
        let args = AsyncArgs::extract("fileClose", args)?;
        let id = handle_id("fileClose", args.number(0)?)?;
        if let Some(handle) = table.remove(id) {
            handle.close();
            debug!(handle = id, "file closed");
        }
        Ok(HostValue::Undefined)
    });
}

/// Register an async method whose first argument is a handle id.
fn register_handle_op<F>(
    builder: &mut BridgeBuilder,
    handles: &Handles,
    name: &str,
    min_args: usize,
    op: F,
) where
    F: Fn(&FileHandle, &AsyncArgs) -> BridgeResult<TypedValue> + Send + Sync + 'static,
{
    let table = Arc::clone(handles);
    builder.register_async(name, min_args, move |args| {
        let id = handle_id(args.method(), args.number(0)?)?;
        let handle = table.get(id)?;
        op(&handle, args)
    });
}

fn register_handle_ops(builder: &mut BridgeBuilder, handles: &Handles) {
    register_handle_op(builder, handles, "fileSeek", 2, |h, a| {
        let origin = SeekOrigin::from_code(code(a.number_or(2, 0.0)));
        let pos = h.seek(code(a.number(1)?), origin).map_err(BridgeError::native)?;
        Ok(pos.into())
    });
    register_handle_op(builder, handles, "fileRewind", 1, |h, _| {
        h.rewind().map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_handle_op(builder, handles, "fileGetPosition", 1, |h, _| {
        Ok(h.position().map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileGetSize", 1, |h, _| {
        Ok(h.size().map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileIsEOF", 1, |h, _| {
        Ok(h.is_eof().map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileFlush", 1, |h, _| {
        h.flush().map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_handle_op(builder, handles, "fileTruncate", 1, |h, _| {
        h.truncate().map_err(BridgeError::native)?;
        Ok(TypedValue::Unit)
    });
    register_handle_op(builder, handles, "fileRead", 1, |h, a| {
        let len = byte_count(a.numbers().get(1).copied());
        Ok(h.read(len).map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileReadString", 1, |h, a| {
        let len = byte_count(a.numbers().get(1).copied());
        Ok(h.read_string(len).map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileReadLine", 1, |h, _| {
        Ok(h.read_line().map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileWrite", 2, |h, a| {
        Ok(h.write(a.buffer(0)?).map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileWriteString", 2, |h, a| {
        Ok(h.write_string(a.string(0)?).map_err(BridgeError::native)?.into())
    });
    register_handle_op(builder, handles, "fileWriteLine", 2, |h, a| {
        Ok(h.write_line(a.string(0)?).map_err(BridgeError::native)?.into())
    });
}

fn metadata_value(meta: FileMetadata) -> TypedValue {
    TypedValue::map([
        ("size", meta.size.into()),
        ("modifiedTime", meta.modified_time_ms.into()),
        ("type", meta.entity_type.code().into()),
    ])
}

fn entry_value(entry: DirEntry) -> TypedValue {
    TypedValue::map([
        ("path", entry.path.into()),
        ("name", entry.name.into()),
        ("type", entry.entity_type.code().into()),
        ("size", entry.size.into()),
    ])
}
