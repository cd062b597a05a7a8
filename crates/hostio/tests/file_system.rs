//! The `FileSystem` host object driven through a real event loop.

use hostio::{FileSystemObject, NativeStdIo};
use hostio_core::host::{Array, ArrayBuffer, ErrorKind, HostObject, HostValue};
use hostio_test::{TempWorkspace, TestLoop, field, init_test_tracing};

fn setup() -> (TestLoop, FileSystemObject, TempWorkspace) {
    init_test_tracing();
    let test_loop = TestLoop::new();
    let fs = NativeStdIo::new(test_loop.invoker())
        .create_file_system(2.0)
        .unwrap();
    (test_loop, fs, TempWorkspace::new())
}

fn s(v: &str) -> HostValue {
    HostValue::from(v)
}

#[test]
fn test_properties() {
    let (test_loop, fs, _ws) = setup();
    let realm = test_loop.realm();
    assert_eq!(fs.get(realm, "version").unwrap().as_str(), Some("1.0.0"));
    assert_eq!(
        fs.get(realm, "platform").unwrap().as_str(),
        Some(std::env::consts::OS)
    );
    assert!(fs.property_names().contains(&"readStringSync".to_owned()));
    assert!(fs.property_names().contains(&"readString".to_owned()));
}

#[test]
fn test_async_write_append_read() {
    let (mut test_loop, fs, ws) = setup();
    let path = ws.path_str("out/note.txt");

    test_loop.call_await(
        &fs,
        "writeString",
        &[s(&path), s("hello"), 0.0.into(), true.into()],
    );
    test_loop.call_await(&fs, "writeString", &[s(&path), s(" world"), 1.0.into()]);

    let text = test_loop.call_await(&fs, "readString", &[s(&path)]);
    assert_eq!(text.as_str(), Some("hello world"));
    assert_eq!(ws.read("out/note.txt"), b"hello world");

    let meta = test_loop.call_await(&fs, "getMetadata", &[s(&path)]);
    assert_eq!(field(&meta, "size").as_number(), Some(11.0));
    assert_eq!(field(&meta, "type").as_number(), Some(1.0));
    assert!(field(&meta, "modifiedTime").as_number().unwrap() > 0.0);
}

#[test]
fn test_sync_forms_share_semantics() {
    let (test_loop, fs, ws) = setup();
    let realm = test_loop.realm();
    ws.write("data/a.bin", [1u8, 2, 3]);
    let path = ws.path_str("data/a.bin");

    assert_eq!(test_loop.call(&fs, "existsSync", &[s(&path)]).unwrap().as_bool(), Some(true));
    assert_eq!(
        test_loop.call(&fs, "isDirectorySync", &[s(&ws.path_str("data"))]).unwrap().as_bool(),
        Some(true)
    );

    let bytes = test_loop.call(&fs, "readBytesSync", &[s(&path)]).unwrap();
    assert_eq!(bytes.as_array_buffer().unwrap().to_vec(), [1, 2, 3]);

    let copy = ws.path_str("data/b.bin");
    test_loop.call(&fs, "copyFileSync", &[s(&path), s(&copy)]).unwrap();
    let buffer = HostValue::ArrayBuffer(realm.new_array_buffer(&[9]));
    test_loop
        .call(&fs, "writeBytesSync", &[s(&copy), buffer, 1.0.into()])
        .unwrap();
    assert_eq!(ws.read("data/b.bin"), [1, 2, 3, 9]);

    let size = test_loop.call(&fs, "getFileSizeSync", &[s(&copy)]).unwrap();
    assert_eq!(size.as_number(), Some(4.0));
    assert_eq!(
        test_loop.call(&fs, "deleteFileSync", &[s(&copy)]).unwrap().as_bool(),
        Some(true)
    );
    assert_eq!(
        test_loop.call(&fs, "deleteFileSync", &[s(&copy)]).unwrap().as_bool(),
        Some(false)
    );
}

#[test]
fn test_directory_tree() {
    let (mut test_loop, fs, ws) = setup();
    let root = ws.path_str("tree");
    let nested = ws.path_str("tree/x/y");

    test_loop.call_await(&fs, "createDirectory", &[s(&nested), true.into()]);
    ws.write("tree/x/y/leaf.txt", "leaf");
    ws.write("tree/top.txt", "top");

    let flat = test_loop.call_await(&fs, "listDirectory", &[s(&root)]);
    assert_eq!(flat.as_array().unwrap().len(), 2);

    let deep = test_loop.call_await(&fs, "listDirectory", &[s(&root), true.into()]);
    let entries = deep.as_array().unwrap().to_vec();
    assert_eq!(entries.len(), 4);
    let leaf = entries
        .iter()
        .find(|e| field(e, "name").as_str() == Some("leaf.txt"))
        .unwrap();
    assert_eq!(field(leaf, "type").as_number(), Some(1.0));
    assert_eq!(field(leaf, "size").as_number(), Some(4.0));

    let refused = test_loop.call(&fs, "deleteDirectory", &[s(&root)]).unwrap();
    test_loop.await_err(&refused);

    let removed = test_loop.call_await(&fs, "deleteDirectory", &[s(&root), true.into()]);
    assert_eq!(removed.as_number(), Some(5.0));
    assert!(!ws.path("tree").exists());
}

#[test]
fn test_path_helpers() {
    let (test_loop, fs, _ws) = setup();
    let call = |name: &str, args: &[HostValue]| {
        test_loop
            .call(&fs, name, args)
            .unwrap()
            .as_str()
            .unwrap()
            .to_owned()
    };

    assert_eq!(call("getParentPath", &[s("/a/b/c.txt")]), "/a/b");
    assert_eq!(call("getFileName", &[s("/a/b/c.txt")]), "c.txt");
    assert_eq!(call("getFileExtension", &[s("/a/b/c.txt")]), ".txt");
    assert_eq!(call("getFileNameWithoutExtension", &[s("/a/b/c.txt")]), "c");

    let expected = std::path::Path::new("a").join("b").join("c");
    assert_eq!(
        call("joinPaths", &[s("a"), s("b"), s("c")]),
        expected.to_string_lossy()
    );
}

#[test]
fn test_calc_hash_defaults_to_sha256() {
    let (mut test_loop, fs, ws) = setup();
    ws.write("abc.txt", "abc");
    let path = ws.path_str("abc.txt");

    let sha256 = test_loop.call_await(&fs, "calcHash", &[s(&path)]);
    assert_eq!(
        sha256.as_str(),
        Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
    let md5 = test_loop.call_await(&fs, "calcHash", &[s(&path), 0.0.into()]);
    assert_eq!(md5.as_str(), Some("900150983cd24fb0d6963f7d28e17f72"));
}

#[test]
fn test_handle_lifecycle() {
    let (mut test_loop, fs, ws) = setup();
    let path = ws.path_str("logs/run.log");

    let id = test_loop
        .call(&fs, "openFile", &[s(&path), 4.0.into(), true.into()])
        .unwrap();
    assert_eq!(fs.open_handles(), 1);

    test_loop.call_await(&fs, "fileWriteLine", &[id.clone(), s("first\r")]);
    test_loop.call_await(&fs, "fileWriteString", &[id.clone(), s("second")]);
    let pos = test_loop.call_await(&fs, "fileSeek", &[id.clone(), 0.0.into()]);
    assert_eq!(pos.as_number(), Some(0.0));

    let line = test_loop.call_await(&fs, "fileReadLine", &[id.clone()]);
    assert_eq!(line.as_str(), Some("first"));
    let rest = test_loop.call_await(&fs, "fileReadString", &[id.clone()]);
    assert_eq!(rest.as_str(), Some("second"));
    let eof = test_loop.call_await(&fs, "fileIsEOF", &[id.clone()]);
    assert_eq!(eof.as_bool(), Some(true));

    test_loop.call(&fs, "fileClose", &[id.clone()]).unwrap();
    assert_eq!(fs.open_handles(), 0);

    let closed = test_loop.call(&fs, "fileReadLine", &[id.clone()]).unwrap();
    let n = id.as_number().unwrap();
    assert_eq!(test_loop.await_err(&closed), format!("Invalid file handle: {n}"));
}

#[test]
fn test_handle_partial_reads_and_truncate() {
    let (mut test_loop, fs, ws) = setup();
    ws.write("digits.txt", "0123456789");
    let path = ws.path_str("digits.txt");

    let id = test_loop.call(&fs, "openFile", &[s(&path), 3.0.into()]).unwrap();
    let head = test_loop.call_await(&fs, "fileRead", &[id.clone(), 4.0.into()]);
    assert_eq!(head.as_array_buffer().unwrap().to_vec(), b"0123");
    let pos = test_loop.call_await(&fs, "fileGetPosition", &[id.clone()]);
    assert_eq!(pos.as_number(), Some(4.0));

    test_loop.call_await(&fs, "fileTruncate", &[id.clone()]);
    let size = test_loop.call_await(&fs, "fileGetSize", &[id.clone()]);
    assert_eq!(size.as_number(), Some(4.0));

    let buffer = HostValue::ArrayBuffer(ArrayBuffer::new(b"AB".to_vec()));
    let written = test_loop.call_await(&fs, "fileWrite", &[id.clone(), buffer]);
    assert_eq!(written.as_number(), Some(2.0));
    test_loop.call_await(&fs, "fileFlush", &[id.clone()]);
    test_loop.call_await(&fs, "fileRewind", &[id.clone()]);
    let all = test_loop.call_await(&fs, "fileRead", &[id.clone()]);
    assert_eq!(all.as_array_buffer().unwrap().to_vec(), b"0123AB");

    test_loop.call(&fs, "fileClose", &[id]).unwrap();
    assert_eq!(ws.read("digits.txt"), b"0123AB");
}

#[test]
fn test_argument_errors_throw_type_errors() {
    let (test_loop, fs, ws) = setup();
    let path = ws.path_str("x.txt");

    let arity = test_loop.call(&fs, "readString", &[]).unwrap_err();
    assert_eq!(arity.kind(), ErrorKind::TypeError);

    let bad_mode = test_loop
        .call(&fs, "openFile", &[s(&path), 9.0.into()])
        .unwrap_err();
    assert_eq!(bad_mode.kind(), ErrorKind::TypeError);

    let fractional = test_loop.call(&fs, "fileClose", &[1.5.into()]).unwrap_err();
    assert_eq!(fractional.kind(), ErrorKind::TypeError);

    let negative = test_loop.call(&fs, "fileClose", &[(-1.0).into()]).unwrap_err();
    assert_eq!(negative.kind(), ErrorKind::RangeError);

    let nested = HostValue::Array(Array::from_vec(vec![HostValue::Object(
        test_loop.realm().new_object(),
    )]));
    let unsupported = test_loop.call(&fs, "writeString", &[s(&path), nested]).unwrap_err();
    assert_eq!(unsupported.kind(), ErrorKind::TypeError);
}

#[test]
fn test_native_failures() {
    let (mut test_loop, fs, ws) = setup();
    let missing = ws.path_str("missing.txt");

    let thrown = test_loop.call(&fs, "readStringSync", &[s(&missing)]).unwrap_err();
    assert_eq!(thrown.kind(), ErrorKind::Error);

    let rejected = test_loop.call(&fs, "readString", &[s(&missing)]).unwrap();
    assert!(!test_loop.await_err(&rejected).is_empty());

    let open = test_loop.call(&fs, "openFile", &[s(&missing)]).unwrap_err();
    assert_eq!(open.kind(), ErrorKind::Error);
    assert_eq!(fs.open_handles(), 0);
}

#[test]
fn test_drop_closes_open_handles() {
    let (test_loop, fs, ws) = setup();
    let path = ws.path_str("left-open.txt");
    test_loop
        .call(&fs, "openFile", &[s(&path), 1.0.into()])
        .unwrap();
    test_loop
        .call(&fs, "openFile", &[s(&path), 2.0.into()])
        .unwrap();
    assert_eq!(fs.open_handles(), 2);
    drop(fs);
    assert!(ws.path("left-open.txt").exists());
}
