//! Local HTTP server for client tests.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tiny_http::{Header, Response, Server};

/// A request as seen by the [`TestServer`].
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    /// Upper-case method.
    pub method: String,
    /// Path and query.
    pub url: String,
    /// Header pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// First header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Status code.
    pub status: u16,
    /// Header pairs.
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl TestResponse {
    /// `status` with an empty body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// 200 with `body`.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::status(200).with_body(body)
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }
}

type Handler = dyn Fn(&RecordedRequest) -> TestResponse + Send + Sync;

/// `tiny_http` server on an ephemeral localhost port.
///
/// Every request is recorded and answered by the handler. The server
/// thread stops when the value is dropped.
pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server answering every request with `handler`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> TestResponse + Send + Sync + 'static,
    {
        let server = match Server::http("127.0.0.1:0") {
            Ok(server) => server,
            Err(e) => panic!("failed to bind test server: {e}"),
        };
        let Some(addr) = server.server_addr().to_ip() else {
            panic!("test server is not bound to an IP address");
        };

        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let handler: Arc<Handler> = Arc::new(handler);

        let thread = {
            let requests = Arc::clone(&requests);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("hostio-test-server".to_owned())
                .spawn(move || serve(&server, &handler, &requests, &stop))
                .ok()
        };

        Self {
            addr,
            requests,
            stop,
            thread,
        }
    }

    /// Server that answers every request with `response`.
    pub fn fixed(response: TestResponse) -> Self {
        Self::start(move |_| response.clone())
    }

    /// Absolute URL of `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request.
    ///
    /// # Panics
    ///
    /// Panics if no request has arrived.
    #[must_use]
    pub fn last_request(&self) -> RecordedRequest {
        match self.requests().pop() {
            Some(r) => r,
            None => panic!("test server received no requests"),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl std::fmt::Debug for TestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

fn serve(
    server: &Server,
    handler: &Arc<Handler>,
    requests: &Mutex<Vec<RecordedRequest>>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        let mut request = match server.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "test server receive failed");
                break;
            },
        };

        let mut body = Vec::new();
        let _ = request.as_reader().read_to_end(&mut body);
        let recorded = RecordedRequest {
            method: request.method().to_string().to_ascii_uppercase(),
            url: request.url().to_owned(),
            headers: request
                .headers()
                .iter()
                .map(|h| (h.field.to_string(), h.value.to_string()))
                .collect(),
            body,
        };
        let reply = handler(&recorded);
        requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);

        let mut response = Response::from_data(reply.body).with_status_code(reply.status);
        for (name, value) in &reply.headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        let _ = request.respond(response);
    }
}
