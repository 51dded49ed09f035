//! The single choke point for backend requests.

use crate::credentials::CredentialStore;
use parking_lot::RwLock;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::config::ClientConfig;
use shared::error::{ApiError, RemoteError};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Callback run when a response reports an authorization failure.
pub type UnauthorizedHook = Box<dyn Fn() + Send + Sync>;

/// A downloaded file handed back to the caller as-is.
#[derive(Debug, Clone)]
pub struct Download {
    /// Filename suggested by the backend's `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Wraps every backend call: attaches the stored bearer credential on the
/// way out, and on the way back normalizes errors and enforces the global
/// authorization-failure contract.
///
/// On a 401 response — from any endpoint, regardless of which caller issued
/// the request — the gateway clears the credential store and runs every
/// registered hook exactly once for that response, before the error
/// propagates to the caller.
pub struct Gateway {
    http: Client,
    base_url: Url,
    credentials: Arc<CredentialStore>,
    unauthorized_hooks: RwLock<Vec<UnauthorizedHook>>,
}

impl Gateway {
    pub fn new(config: &ClientConfig, credentials: Arc<CredentialStore>) -> Result<Self, ApiError> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(&format!("{base}/"))
            .map_err(|err| ApiError::Validation(format!("invalid backend URL: {err}")))?;
        Ok(Self {
            http: SHARED_HTTP.clone(),
            base_url,
            credentials,
            unauthorized_hooks: RwLock::new(Vec::new()),
        })
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Register a callback for authorization failures. Controllers use this
    /// to drop their authenticated state the moment any request comes back
    /// with an invalid credential.
    pub fn on_unauthorized(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.unauthorized_hooks.write().push(Box::new(hook));
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.request(Method::GET, path).send().await;
        self.check(resp).await?.json().await.map_err(transport)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::POST, path).json(body).send().await;
        self.check(resp).await?.json().await.map_err(transport)
    }

    /// POST where only success matters; the response body is discarded.
    pub async fn post_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let resp = self.request(Method::POST, path).json(body).send().await;
        self.check(resp).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.request(Method::DELETE, path).send().await;
        self.check(resp).await.map(|_| ())
    }

    /// POST that expects an opaque binary file back. Error responses still
    /// carry JSON bodies and normalize like everything else.
    pub async fn post_download<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Download, ApiError> {
        let resp = self.request(Method::POST, path).json(body).send().await;
        let resp = self.check(resp).await?;
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(Download {
            filename,
            bytes: bytes.to_vec(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .unwrap_or_else(|_| self.base_url.clone());
        let mut req = self.http.request(method, url);
        if let Some(token) = self.credentials.read() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn check(
        &self,
        resp: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, ApiError> {
        let resp = resp.map_err(transport)?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = resp.text().await.unwrap_or_default();
            let remote = RemoteError::from_body(status.as_u16(), &body);
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized {
                message: remote.message,
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Remote(RemoteError::from_body(
                status.as_u16(),
                &body,
            )));
        }
        Ok(resp)
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("authorization failure, clearing credentials");
        self.credentials.clear();
        for hook in self.unauthorized_hooks.read().iter() {
            hook();
        }
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn filename_from_disposition(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One request as the mock backend saw it.
    pub struct Recorded {
        pub method: String,
        pub url: String,
        pub authorization: Option<String>,
        pub body: String,
    }

    /// A canned response the mock backend will serve.
    pub struct Canned {
        pub status: u16,
        pub body: String,
        pub headers: Vec<(String, String)>,
    }

    impl Canned {
        pub fn json(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                headers: vec![("Content-Type".into(), "application/json".into())],
            }
        }
    }

    /// Serve the given responses in order on an ephemeral port, recording
    /// each request. The serving thread exits once all responses are sent.
    pub fn spawn_backend(
        responses: Vec<Canned>,
    ) -> (String, Arc<parking_lot::Mutex<Vec<Recorded>>>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}/api");
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
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
                    authorization: request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("Authorization"))
                        .map(|h| h.value.to_string()),
                    body,
                });
                let mut response =
                    tiny_http::Response::from_string(canned.body).with_status_code(canned.status);
                for (field, value) in &canned.headers {
                    response.add_header(
                        tiny_http::Header::from_bytes(field.as_bytes(), value.as_bytes()).unwrap(),
                    );
                }
                let _ = request.respond(response);
            }
        });
        (base, seen)
    }

    pub fn gateway_at(base_url: &str) -> Gateway {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CredentialStore::at(dir.path().join("token")));
        // Keep the tempdir alive for the process; tests are short-lived.
        std::mem::forget(dir);
        let config = ClientConfig {
            base_url: base_url.to_string(),
        };
        Gateway::new(&config, store).unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct Pong {
        ok: bool,
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let (base, seen) = spawn_backend(vec![
            Canned::json(200, r#"{"ok": true}"#),
            Canned::json(200, r#"{"ok": true}"#),
        ]);
        let gateway = gateway_at(&base);

        let _: Pong = gateway.get_json("ping").await.unwrap();
        gateway.credentials().save("jwt-123");
        let _: Pong = gateway.get_json("ping").await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen[0].authorization, None);
        assert_eq!(seen[1].authorization.as_deref(), Some("Bearer jwt-123"));
        assert_eq!(seen[1].url, "/api/ping");
    }

    #[tokio::test]
    async fn unauthorized_clears_store_and_fires_hooks_once() {
        let (base, _seen) = spawn_backend(vec![Canned::json(
            401,
            r#"{"msg": "Token has expired"}"#,
        )]);
        let gateway = gateway_at(&base);
        gateway.credentials().save("stale-token");

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_hook = fired.clone();
        gateway.on_unauthorized(move || {
            fired_hook.fetch_add(1, Ordering::SeqCst);
        });

        let err = gateway.get_json::<Pong>("sessions").await.unwrap_err();
        match err {
            ApiError::Unauthorized { message } => assert_eq!(message, "Token has expired"),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gateway.credentials().is_present());
    }

    #[tokio::test]
    async fn remote_errors_are_normalized() {
        let (base, _seen) = spawn_backend(vec![
            Canned::json(500, r#"{"error": "quiz generation failed"}"#),
            Canned::json(502, "not json at all"),
        ]);
        let gateway = gateway_at(&base);

        let structured = gateway.get_json::<Pong>("x").await.unwrap_err();
        assert_eq!(structured.message(), "quiz generation failed");

        let fallback = gateway.get_json::<Pong>("x").await.unwrap_err();
        assert_eq!(fallback.message(), "request failed: HTTP 502");
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        // Nothing listens on this port.
        let gateway = gateway_at("http://127.0.0.1:1/api");
        let err = gateway.get_json::<Pong>("ping").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn download_carries_suggested_filename() {
        let (base, _seen) = spawn_backend(vec![Canned {
            status: 200,
            body: "Term,Definition".into(),
            headers: vec![
                ("Content-Type".into(), "text/csv".into()),
                (
                    "Content-Disposition".into(),
                    "attachment;filename=\"cells_flashcards.csv\"".into(),
                ),
            ],
        }]);
        let gateway = gateway_at(&base);

        let download = gateway
            .post_download("download-flashcards", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(download.filename.as_deref(), Some("cells_flashcards.csv"));
        assert_eq!(download.bytes, b"Term,Definition");
    }

    #[test]
    fn disposition_parsing_handles_quotes_and_params() {
        assert_eq!(
            filename_from_disposition("attachment;filename=\"a b.pdf\""),
            Some("a b.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=notes.pdf; size=12"),
            Some("notes.pdf".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }
}
