use std::sync::{Arc, Mutex};
use std::time::Duration;

use hostio_http::{
    ClientSettings, DownloadConfig, DownloadProgress, HttpClient, HttpErrorKind, HttpMethod,
    HttpRequestConfig, ReqwestClient, UploadConfig, UploadProgress,
};
use hostio_test::{TestResponse, TestServer};

fn client() -> ReqwestClient {
    ReqwestClient::new(&ClientSettings::default()).unwrap()
}

#[test]
fn test_request_round_trip() {
    let server = TestServer::start(|req| {
        TestResponse::ok(format!("{} {}", req.method, req.body.len())).with_header("X-Echo", "yes")
    });

    let resp = client()
        .request(
            &HttpRequestConfig::new(server.url("/items?id=4"))
                .with_method(HttpMethod::Post)
                .with_header("X-Token", "abc")
                .with_body("payload"),
        )
        .unwrap();

    assert!(resp.success);
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.status_message, "OK");
    assert_eq!(resp.body, b"POST 7");
    assert_eq!(resp.header("x-echo"), Some("yes"));
    assert_eq!(resp.url, server.url("/items?id=4"));

    let seen = server.last_request();
    assert_eq!(seen.url, "/items?id=4");
    assert_eq!(seen.header("X-Token"), Some("abc"));
    assert!(seen.header("User-Agent").unwrap().starts_with("hostio/"));
}

#[test]
fn test_status_failure_is_not_an_error() {
    let server = TestServer::fixed(TestResponse::status(404).with_body("missing"));
    let resp = client().request(&HttpRequestConfig::new(server.url("/nope"))).unwrap();
    assert!(!resp.success);
    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.status_message, "Not Found");
    assert_eq!(resp.body, b"missing");
}

#[test]
fn test_redirect_policy() {
    let server = TestServer::start(|req| {
        if req.url == "/old" {
            TestResponse::status(302).with_header("Location", "/new")
        } else {
            TestResponse::ok("landed")
        }
    });

    let followed = client().request(&HttpRequestConfig::new(server.url("/old"))).unwrap();
    assert_eq!(followed.status_code, 200);
    assert_eq!(followed.url, server.url("/new"));

    let mut config = HttpRequestConfig::new(server.url("/old"));
    config.follow_redirects = false;
    let direct = client().request(&config).unwrap();
    assert_eq!(direct.status_code, 302);
    assert!(!direct.success);
    assert_eq!(direct.header("location"), Some("/new"));
}

#[test]
fn test_timeout_is_classified() {
    let server = TestServer::start(|_| {
        std::thread::sleep(Duration::from_millis(1200));
        TestResponse::ok("late")
    });
    let mut config = HttpRequestConfig::new(server.url("/slow"));
    config.timeout_ms = 150;
    let err = client().request(&config).unwrap_err();
    assert_eq!(err.kind, HttpErrorKind::Timeout);
}

#[test]
fn test_connection_refused_is_classified() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client()
        .request(&HttpRequestConfig::new(format!("http://127.0.0.1:{port}/")))
        .unwrap_err();
    assert_eq!(err.kind, HttpErrorKind::ConnectionFailed);
}

#[test]
fn test_download_with_progress() {
    let payload = vec![b'z'; 200_000];
    let server = TestServer::fixed(TestResponse::ok(payload.clone()));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested/blob.bin");

    let last = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&last);
    let result = client()
        .download(
            &DownloadConfig::new(server.url("/blob"), dest.to_string_lossy()),
            Some(Arc::new(move |p: DownloadProgress| {
                *sink.lock().unwrap() = Some(p);
            })),
        )
        .unwrap();

    assert!(result.success);
    assert_eq!(result.file_size, 200_000);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    let progress = last.lock().unwrap().unwrap();
    assert_eq!(progress.bytes_received, 200_000);
    assert_eq!(progress.total_bytes, Some(200_000));
    assert!((progress.progress - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_download_resumes_with_range() {
    let server = TestServer::start(|req| match req.header("Range") {
        Some("bytes=5-") => TestResponse::status(206).with_body("56789"),
        _ => TestResponse::ok("0123456789"),
    });
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("part.txt");
    std::fs::write(&dest, "01234").unwrap();

    let mut config = DownloadConfig::new(server.url("/file"), dest.to_string_lossy());
    config.resumable = true;
    let result = client().download(&config, None).unwrap();

    assert!(result.success);
    assert_eq!(result.status_code, 206);
    assert_eq!(result.file_size, 10);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "0123456789");
}

#[test]
fn test_download_range_not_satisfiable_means_complete() {
    let server = TestServer::fixed(TestResponse::status(416));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("done.txt");
    std::fs::write(&dest, "complete").unwrap();

    let mut config = DownloadConfig::new(server.url("/file"), dest.to_string_lossy());
    config.resumable = true;
    let result = client().download(&config, None).unwrap();

    assert!(result.success);
    assert_eq!(result.file_size, 8);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "complete");
}

#[test]
fn test_download_status_failure_leaves_file_alone() {
    let server = TestServer::fixed(TestResponse::status(500).with_body("boom"));
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("keep.txt");
    std::fs::write(&dest, "old").unwrap();

    let result = client()
        .download(&DownloadConfig::new(server.url("/x"), dest.to_string_lossy()), None)
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status_code, 500);
    assert_eq!(result.error_message, "HTTP 500");
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "old");
}

#[test]
fn test_upload_multipart_body() {
    let server = TestServer::fixed(TestResponse::status(201).with_body("stored"));
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("photo.jpg");
    std::fs::write(&file, b"JPEGDATA").unwrap();

    let mut config = UploadConfig::new(server.url("/upload"), file.to_string_lossy());
    config.field_name = "image".to_owned();
    config.mime_type = Some("image/jpeg".to_owned());
    config.form_fields = vec![("album".to_owned(), "trip".to_owned())];

    let sent = Arc::new(Mutex::new(0u64));
    let sink = Arc::clone(&sent);
    let result = client()
        .upload(
            &config,
            Some(Arc::new(move |p: UploadProgress| {
                *sink.lock().unwrap() = p.bytes_sent;
            })),
        )
        .unwrap();

    assert!(result.success);
    assert_eq!(result.status_code, 201);
    assert_eq!(result.response_body, b"stored");

    let req = server.last_request();
    assert_eq!(req.method, "POST");
    let content_type = req.header("Content-Type").unwrap().to_owned();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap();
    let body = String::from_utf8(req.body.clone()).unwrap();
    let album = body.find("name=\"album\"\r\n\r\ntrip\r\n").unwrap();
    let image = body
        .find("name=\"image\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA")
        .unwrap();
    assert!(album < image);
    assert!(body.ends_with(&format!("\r\n--{boundary}--\r\n")));
    assert_eq!(*sent.lock().unwrap(), req.body.len() as u64);
}

#[test]
fn test_upload_missing_file_is_a_failed_result() {
    let server = TestServer::fixed(TestResponse::ok(""));
    let result = client()
        .upload(&UploadConfig::new(server.url("/u"), "/no/such/file.bin"), None)
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.status_code, 0);
    assert_eq!(result.error_message, "File not found: /no/such/file.bin");
    assert!(server.requests().is_empty());
}
