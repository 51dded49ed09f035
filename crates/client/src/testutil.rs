//! Canned-response mock backend for controller tests.

use gateway::{CredentialStore, Gateway};
use parking_lot::Mutex;
use shared::config::ClientConfig;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

/// One request as the mock backend saw it.
pub(crate) struct Recorded {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// A canned response served in order.
pub(crate) struct Canned {
    pub status: u16,
    pub body: String,
    pub delay_ms: u64,
}

impl Canned {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    /// Hold the response back for a while, to let the test interleave
    /// state changes with an in-flight request.
    pub fn after_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

pub(crate) struct MockBackend {
    pub base_url: String,
    pub seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn requests(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn body_json(&self, index: usize) -> serde_json::Value {
        serde_json::from_str(&self.seen.lock()[index].body).unwrap()
    }
}

/// Serve the given responses in order on an ephemeral port. The serving
/// thread exits after the last one.
pub(crate) fn spawn_backend(responses: Vec<Canned>) -> MockBackend {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let base_url = format!("http://{addr}/api");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_tx = seen.clone();
    std::thread::spawn(move || {
        for canned in responses {
            let mut request = match server.recv() {
                Ok(r) => r,
                Err(_) => return,
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            seen_tx.lock().push(Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body,
            });
            if canned.delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(canned.delay_ms));
            }
            let response = tiny_http::Response::from_string(canned.body)
                .with_status_code(canned.status)
                .with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .unwrap(),
                );
            let _ = request.respond(response);
        }
    });
    MockBackend { base_url, seen }
}

/// A gateway wired to the mock backend, with a throwaway credential file.
pub(crate) fn gateway_for(backend: &MockBackend) -> (Arc<Gateway>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CredentialStore::at(dir.path().join("token")));
    let config = ClientConfig {
        base_url: backend.base_url.clone(),
    };
    (Arc::new(Gateway::new(&config, store).unwrap()), dir)
}
