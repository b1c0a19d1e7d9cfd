#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use api_types::tenant::TenantStatus;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use client::{Api, Gateway, MemorySessionStore, RecordingNavigator, Session, TenantId};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// In-process stand-in for the Email Engine backend.
///
/// Every request is recorded. Responses are scripted per `METHOD path`; the
/// last scripted response for a route is repeated, unscripted routes answer
/// 404.
#[derive(Clone, Default)]
pub struct FakeBackend {
    requests: Arc<Mutex<Vec<Recorded>>>,
    scripts: Arc<Mutex<HashMap<String, VecDeque<(StatusCode, Value)>>>>,
}

impl FakeBackend {
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.scripts
            .lock()
            .unwrap()
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back((status, body));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    fn next_response(&self, method: &Method, path: &str) -> (StatusCode, Value) {
        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(&format!("{method} {path}")) else {
            return (StatusCode::NOT_FOUND, json!({ "detail": "Not Found" }));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

async fn handle(
    State(backend): State<FakeBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    backend.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    let (status, payload) = backend.next_response(&method, uri.path());
    (status, Json(payload)).into_response()
}

pub async fn spawn_with_listener(backend: FakeBackend) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(handle).with_state(backend);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub fn session(tenant: &str, status: TenantStatus) -> Session {
    Session {
        user_id: "user_1".to_string(),
        email: "ada@example.com".to_string(),
        full_name: "Ada".to_string(),
        tenant_id: TenantId::parse(tenant).unwrap(),
        tenant_status: status,
        role: "owner".to_string(),
        token: "jwt-token".to_string(),
    }
}

pub struct Harness {
    pub backend: FakeBackend,
    pub api: Api,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
}

pub async fn harness(session: Option<Session>) -> Harness {
    let backend = FakeBackend::default();
    let addr = spawn_with_listener(backend.clone()).await;

    let store = Arc::new(match session {
        Some(session) => MemorySessionStore::with_session(session),
        None => MemorySessionStore::new(),
    });
    let navigator = Arc::new(RecordingNavigator::new());
    let gateway = Gateway::builder()
        .base_url(&format!("http://{addr}"))
        .sessions(store.clone())
        .navigator(navigator.clone())
        .build()
        .unwrap();

    Harness {
        backend,
        api: Api::new(gateway),
        store,
        navigator,
    }
}
