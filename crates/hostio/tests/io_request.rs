//! The `IORequest` host object against a local HTTP server.

use hostio::{NativeStdIo, RequestObject};
use hostio_core::host::{Array, HostObject, HostValue};
use hostio_test::{TempWorkspace, TestLoop, TestResponse, TestServer, field};

fn setup() -> (TestLoop, RequestObject) {
    let test_loop = TestLoop::new();
    let request = NativeStdIo::new(test_loop.invoker())
        .create_io_request()
        .unwrap();
    (test_loop, request)
}

fn s(v: &str) -> HostValue {
    HostValue::from(v)
}

fn strings(items: &[&str]) -> HostValue {
    HostValue::Array(Array::from_vec(items.iter().map(|i| s(i)).collect()))
}

fn string_list(value: &HostValue) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .to_vec()
        .iter()
        .map(|v| v.as_str().unwrap().to_owned())
        .collect()
}

#[test]
fn test_version_property() {
    let (test_loop, request) = setup();
    let version = request.get(test_loop.realm(), "version").unwrap();
    assert_eq!(version.as_str(), Some("1.0.0"));
}

#[test]
fn test_request_resolves_with_response_shape() {
    let server = TestServer::start(|req| {
        TestResponse::ok(format!("{} {}", req.method, String::from_utf8_lossy(&req.body)))
            .with_header("X-Echo", "yes")
    });
    let (mut test_loop, request) = setup();

    let response = test_loop.call_await(
        &request,
        "request",
        &[
            s(&server.url("/echo")),
            s("post"),
            strings(&["X-Token", "abc"]),
            s("payload"),
            5000.0.into(),
            true.into(),
        ],
    );

    assert_eq!(field(&response, "success").as_bool(), Some(true));
    assert_eq!(field(&response, "statusCode").as_number(), Some(200.0));
    assert_eq!(field(&response, "statusMessage").as_str(), Some("OK"));
    assert_eq!(field(&response, "errorMessage").as_str(), Some(""));
    assert_eq!(field(&response, "url").as_str(), Some(server.url("/echo").as_str()));
    assert_eq!(
        field(&response, "body").as_array_buffer().unwrap().to_vec(),
        b"POST payload"
    );

    let keys = string_list(&field(&response, "headerKeys"));
    let values = string_list(&field(&response, "headerValues"));
    assert_eq!(keys.len(), values.len());
    let echo = keys.iter().position(|k| k.eq_ignore_ascii_case("x-echo")).unwrap();
    assert_eq!(values[echo], "yes");

    assert_eq!(server.last_request().header("X-Token"), Some("abc"));
}

#[test]
fn test_binary_body_and_status_failure() {
    let server = TestServer::fixed(TestResponse::status(404).with_body("gone"));
    let (mut test_loop, request) = setup();
    let body = HostValue::ArrayBuffer(test_loop.realm().new_array_buffer(&[0, 1, 2]));

    let response = test_loop.call_await(
        &request,
        "request",
        &[s(&server.url("/x")), s("PUT"), HostValue::Null, body],
    );

    assert_eq!(field(&response, "success").as_bool(), Some(false));
    assert_eq!(field(&response, "statusCode").as_number(), Some(404.0));
    assert_eq!(field(&response, "errorMessage").as_str(), Some("HTTP 404"));
    assert_eq!(server.last_request().body, [0, 1, 2]);
}

#[test]
fn test_misuse_and_transport_failures_reject() {
    let (mut test_loop, request) = setup();

    let bad_method = test_loop
        .call(&request, "request", &[s("http://127.0.0.1:9/"), s("BREW")])
        .unwrap();
    assert!(test_loop.await_err(&bad_method).contains("BREW"));

    let odd_headers = test_loop
        .call(
            &request,
            "request",
            &[s("http://127.0.0.1:9/"), s("GET"), strings(&["lonely"])],
        )
        .unwrap();
    assert!(test_loop.await_err(&odd_headers).contains("key/value pairs"));

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let refused = test_loop
        .call(&request, "request", &[s(&format!("http://127.0.0.1:{port}/"))])
        .unwrap();
    assert!(test_loop.await_err(&refused).starts_with("ConnectionFailed"));
}

#[test]
fn test_download_to_file() {
    let server = TestServer::fixed(TestResponse::ok(vec![b'q'; 4096]));
    let (mut test_loop, request) = setup();
    let ws = TempWorkspace::new();
    let dest = ws.path_str("downloads/blob.bin");

    let result = test_loop.call_await(
        &request,
        "download",
        &[s(&server.url("/blob")), s(&dest), strings(&["Accept", "*/*"])],
    );

    assert_eq!(field(&result, "success").as_bool(), Some(true));
    assert_eq!(field(&result, "statusCode").as_number(), Some(200.0));
    assert_eq!(field(&result, "fileSize").as_number(), Some(4096.0));
    assert_eq!(field(&result, "filePath").as_str(), Some(dest.as_str()));
    assert_eq!(field(&result, "errorMessage").as_str(), Some(""));
    assert_eq!(ws.read("downloads/blob.bin").len(), 4096);
    assert_eq!(server.last_request().header("Accept"), Some("*/*"));
}

#[test]
fn test_resumable_download_appends() {
    let server = TestServer::start(|req| match req.header("Range") {
        Some("bytes=3-") => TestResponse::status(206).with_body("def"),
        _ => TestResponse::ok("abcdef"),
    });
    let (mut test_loop, request) = setup();
    let ws = TempWorkspace::new();
    ws.write("part.txt", "abc");

    let result = test_loop.call_await(
        &request,
        "download",
        &[
            s(&server.url("/f")),
            s(&ws.path_str("part.txt")),
            HostValue::Undefined,
            HostValue::Undefined,
            true.into(),
        ],
    );

    assert_eq!(field(&result, "statusCode").as_number(), Some(206.0));
    assert_eq!(ws.read("part.txt"), b"abcdef");
}

#[test]
fn test_upload_with_form_fields() {
    let server = TestServer::fixed(TestResponse::ok("thanks"));
    let (mut test_loop, request) = setup();
    let ws = TempWorkspace::new();
    ws.write("report.csv", "a,b\n1,2\n");

    let result = test_loop.call_await(
        &request,
        "upload",
        &[
            s(&server.url("/up")),
            s(&ws.path_str("report.csv")),
            s("document"),
            s("q3.csv"),
            s("text/csv"),
            strings(&["X-Batch", "7"]),
            strings(&["owner", "team"]),
            strings(&["ana", "ops"]),
        ],
    );

    assert_eq!(field(&result, "success").as_bool(), Some(true));
    assert_eq!(field(&result, "statusCode").as_number(), Some(200.0));
    assert_eq!(
        field(&result, "responseBody").as_array_buffer().unwrap().to_vec(),
        b"thanks"
    );

    let seen = server.last_request();
    assert_eq!(seen.header("X-Batch"), Some("7"));
    let body = String::from_utf8(seen.body).unwrap();
    assert!(body.contains("name=\"owner\"\r\n\r\nana\r\n"));
    assert!(body.contains("name=\"team\"\r\n\r\nops\r\n"));
    assert!(body.contains(
        "name=\"document\"; filename=\"q3.csv\"\r\nContent-Type: text/csv\r\n\r\na,b\n1,2\n"
    ));
}

#[test]
fn test_upload_missing_file_resolves_failed() {
    let server = TestServer::fixed(TestResponse::ok(""));
    let (mut test_loop, request) = setup();

    let result = test_loop.call_await(
        &request,
        "upload",
        &[s(&server.url("/up")), s("/definitely/not/here.bin")],
    );

    assert_eq!(field(&result, "success").as_bool(), Some(false));
    assert_eq!(field(&result, "statusCode").as_number(), Some(0.0));
    assert_eq!(
        field(&result, "errorMessage").as_str(),
        Some("File not found: /definitely/not/here.bin")
    );
}
