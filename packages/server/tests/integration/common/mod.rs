use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ::common::storage::{BlobCategory, BlobStore, MediaKind, StorageError, StoredBlob};
use futures::StreamExt;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

use server::config::{AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig};
use server::state::AppState;
use server::store::{CollectionStore, MemoryCollectionStore, SqlCollectionStore};
use server::utils::jwt;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const TIMELINES: &str = "/api/v1/timelines";
    pub const PROGRAMS: &str = "/api/v1/programs";
    pub const WS: &str = "/ws";

    pub fn timeline(id: &str) -> String {
        format!("/api/v1/timelines/{id}")
    }

    pub fn program(id: &str) -> String {
        format!("/api/v1/programs/{id}")
    }

    pub fn program_entries(id: &str) -> String {
        format!("/api/v1/programs/{id}/entries")
    }

    pub fn program_entry(id: &str, entry_id: &str) -> String {
        format!("/api/v1/programs/{id}/entries/{entry_id}")
    }

    pub fn timeline_entries(id: &str) -> String {
        format!("/api/v1/timelines/{id}/entries")
    }
}

/// Blob store double that records every call instead of storing bytes.
#[derive(Default)]
pub struct RecordingBlobs {
    uploads: Mutex<Vec<(String, String)>>,
    deletes: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl RecordingBlobs {
    /// `(url, mime type)` of every upload, in order.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn fail_delete_of(&self, url: &str) {
        self.failing_deletes.lock().unwrap().insert(url.to_string());
    }
}

#[async_trait]
impl BlobStore for RecordingBlobs {
    async fn upload(
        &self,
        _data: &[u8],
        mime_type: &str,
        category: BlobCategory,
    ) -> Result<StoredBlob, StorageError> {
        let mut uploads = self.uploads.lock().unwrap();
        let url = format!("/uploads/{category}/{}", uploads.len());
        uploads.push((url.clone(), mime_type.to_string()));
        Ok(StoredBlob {
            url,
            kind: MediaKind::from_mime(mime_type),
        })
    }

    async fn delete(&self, url: &str) -> Result<bool, StorageError> {
        self.deletes.lock().unwrap().push(url.to_string());
        if self.failing_deletes.lock().unwrap().contains(url) {
            return Err(StorageError::Backend("delete refused".into()));
        }
        Ok(true)
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub blobs: Arc<RecordingBlobs>,
    pub token: String,
    _dir: Option<tempfile::TempDir>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// `data.id` as a string.
    pub fn id(&self) -> String {
        self.body["data"]["id"]
            .as_str()
            .unwrap_or_else(|| panic!("response has no data.id: {}", self.text))
            .to_string()
    }
}

fn test_config(database_url: Option<String>) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
        },
        storage: Default::default(),
    }
}

impl TestApp {
    /// Server backed by the in-memory store.
    pub async fn spawn() -> Self {
        Self::start(test_config(None), Arc::new(MemoryCollectionStore::new()), None).await
    }

    /// Server backed by a SQLite database in a temporary directory.
    pub async fn spawn_sqlite() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display());
        let config = test_config(Some(url.clone()));
        let db = server::database::init_db(&config.database, &url)
            .await
            .expect("Failed to initialize SQLite database");
        Self::start(config, Arc::new(SqlCollectionStore::new(db)), Some(dir)).await
    }

    async fn start(
        config: AppConfig,
        store: Arc<dyn CollectionStore>,
        dir: Option<tempfile::TempDir>,
    ) -> Self {
        let blobs = Arc::new(RecordingBlobs::default());
        let state = AppState::new(config, store, blobs.clone());
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            blobs,
            token: token_with_role("admin"),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req.send().await.expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn create_timeline(&self, year: i32, x: f64, y: f64) -> String {
        let body = serde_json::json!({ "year": year, "xPosition": x, "yPosition": y });
        let res = self
            .post_json(routes::TIMELINES, &body, Some(&self.token))
            .await;
        assert_eq!(res.status, 201, "Timeline creation failed: {}", res.text);
        res.id()
    }

    pub async fn create_program(&self, title: &str, x: f64, y: f64) -> String {
        let body = serde_json::json!({ "title": title, "xPosition": x, "yPosition": y });
        let res = self
            .post_json(routes::PROGRAMS, &body, Some(&self.token))
            .await;
        assert_eq!(res.status, 201, "Program creation failed: {}", res.text);
        res.id()
    }

    pub async fn connect_viewer(&self) -> Viewer {
        let (stream, _) =
            tokio_tungstenite::connect_async(format!("ws://{}{}", self.addr, routes::WS))
                .await
                .expect("Failed to open viewer socket");
        Viewer { stream }
    }
}

pub fn token_with_role(role: &str) -> String {
    jwt::sign(JWT_SECRET, "tester", role, chrono::Duration::hours(1))
        .expect("Failed to sign test token")
}

/// A file part as a browser would send it.
pub fn file_part(name: &str, mime: &str) -> Part {
    Part::bytes(b"FILE_DATA".to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .expect("Failed to set MIME type")
}

/// A connected viewer socket.
pub struct Viewer {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Viewer {
    /// Next `{event, data}` message, failing the test after two seconds.
    pub async fn next_event(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(2), self.stream.next())
                .await
                .expect("Timed out waiting for viewer event")
                .expect("Viewer socket closed")
                .expect("Viewer socket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("Viewer event is not JSON");
            }
        }
    }

    /// Skip events until one named `name` arrives.
    pub async fn wait_for(&mut self, name: &str) -> Value {
        loop {
            let event = self.next_event().await;
            if event["event"] == name {
                return event;
            }
        }
    }

    pub async fn send(&mut self, event: Value) {
        use futures::SinkExt;
        self.stream
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("Failed to send viewer message");
    }

    /// Assert that nothing arrives within a short window.
    pub async fn expect_silence(&mut self) {
        let next = tokio::time::timeout(Duration::from_millis(300), self.stream.next()).await;
        assert!(next.is_err(), "unexpected viewer message: {next:?}");
    }
}
