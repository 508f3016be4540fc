#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use secov_admin::AppState;
use secov_admin::api::models::UserRecord;
use secov_admin::config::Config;
use secov_admin::session::MemoryStorage;

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: None,
        }
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("status"),
            body,
            delay: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = dyn Fn(&Hit) -> Reply + Send + Sync;

struct Shared {
    hits: Mutex<Vec<Hit>>,
    respond: Box<Responder>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockBackend {
    pub async fn start(respond: impl Fn(&Hit) -> Reply + Send + Sync + 'static) -> Self {
        let shared = Arc::new(Shared {
            hits: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        });
        let app = Router::new()
            .fallback(record)
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self { addr, shared }
    }

    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.shared.hits.lock().expect("hits").clone()
    }

    pub fn hits_to(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }
}

async fn record(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let hit = Hit {
        method,
        path: uri.path().to_string(),
        query,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    shared.hits.lock().expect("hits").push(hit.clone());

    let reply = (shared.respond)(&hit);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, axum::Json(reply.body)).into_response()
}

pub fn user(permissions: &[&str]) -> UserRecord {
    UserRecord {
        id: 12,
        name: "Carmen".to_string(),
        first_name: Some("Rojas".to_string()),
        last_name: Some("Paredes".to_string()),
        email: Some("carmen@secov.gob.pe".to_string()),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        extra: BTreeMap::new(),
    }
}

pub fn state_for(backend: &MockBackend) -> AppState {
    state_with(Config::new(backend.url()))
}

pub fn state_with(config: Config) -> AppState {
    AppState::new(config, Arc::new(MemoryStorage::new())).expect("app state")
}

/// Application state already signed in with the given permissions.
pub async fn signed_in(backend: &MockBackend, permissions: &[&str]) -> AppState {
    let state = state_for(backend);
    state
        .session
        .begin(user(permissions), "token-123".to_string(), Duration::from_secs(3600))
        .await
        .expect("begin session");
    state
}

/// List body with `rows` and `last_page` pages.
pub fn page(rows: Value, last_page: u32) -> Value {
    json!({
        "data": rows,
        "message": "ok",
        "meta": {"current_page": 1, "last_page": last_page, "per_page": 10, "total": 0}
    })
}
