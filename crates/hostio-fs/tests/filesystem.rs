use hostio_fs::{
    EntityType, FileHandle, FileSystem, FsError, HashAlgorithm, OpenMode, SeekOrigin, WriteMode,
};

fn path_in(dir: &tempfile::TempDir, rel: &str) -> String {
    dir.path().join(rel).to_string_lossy().into_owned()
}

#[test]
fn test_write_append_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FileSystem::new();
    let file = path_in(&dir, "notes/today.txt");

    fs.write_string(&file, "hello", WriteMode::Overwrite, true).unwrap();
    fs.write_string(&file, ", world", WriteMode::Append, false).unwrap();

    assert_eq!(fs.read_string(&file).unwrap(), "hello, world");
    assert_eq!(fs.file_size(&file).unwrap(), 12);
    assert_eq!(fs.extension(&file), ".txt");
    assert_eq!(fs.file_stem(&file), "today");
    assert_eq!(fs.parent_path(&file), path_in(&dir, "notes"));
}

#[test]
fn test_tree_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FileSystem::new();
    let root = path_in(&dir, "project");

    fs.create_directory(&fs.join_paths(&[root.as_str(), "src", "bin"]), true).unwrap();
    fs.write_string(&path_in(&dir, "project/src/lib.rs"), "//", WriteMode::Overwrite, false)
        .unwrap();
    fs.create_file(&path_in(&dir, "project/src/bin/main.rs"), false).unwrap();

    let listing = fs.list_directory(&root, true).unwrap();
    let files = listing.iter().filter(|e| e.entity_type == EntityType::File).count();
    let dirs = listing.iter().filter(|e| e.entity_type == EntityType::Directory).count();
    assert_eq!((files, dirs), (2, 2));

    assert!(matches!(fs.delete_directory(&root, false), Err(FsError::DirectoryNotEmpty(_))));
    assert_eq!(fs.delete_directory(&root, true).unwrap(), 5);
    assert_eq!(fs.metadata(&root).entity_type, EntityType::NotFound);
}

#[test]
fn test_handle_stream_and_hash_agree() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FileSystem::new();
    let file = path_in(&dir, "stream.log");

    let handle = FileHandle::open(&file, OpenMode::WriteRead, false).unwrap();
    for i in 0..3 {
        handle.write_line(&format!("line {i}")).unwrap();
    }
    handle.flush().unwrap();
    handle.seek(0, SeekOrigin::Begin).unwrap();
    assert_eq!(handle.read_line().unwrap(), "line 0");
    handle.close();

    let whole = fs.read_bytes(&file).unwrap();
    assert_eq!(
        fs.calc_hash(&file, HashAlgorithm::Sha1).unwrap(),
        HashAlgorithm::Sha1.digest_bytes(&whole)
    );
}

#[test]
fn test_normalize_existing_path_is_canonical() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FileSystem::new();
    fs.create_directory(&path_in(&dir, "a/b"), true).unwrap();

    let normalized = fs.normalize_path(&path_in(&dir, "a/b/../b/."));
    let canonical = dir.path().join("a/b").canonicalize().unwrap();
    assert_eq!(normalized, canonical.to_string_lossy());
}
