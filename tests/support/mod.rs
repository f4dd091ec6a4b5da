//! In-process stand-in for the design backend.
//!
//! Every request is recorded before its scripted reply is produced, so tests
//! can assert on the wire contract and on requests that never arrived.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use nail_designer::{
    models::{ColorConfiguration, Length, Shape, Style},
    AttributeSelection, AuthProvider, Config, DesignError, Gateway, Identity,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self { status, body: body.to_string(), delay: None, gate: None }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn images(urls: &[&str]) -> Self {
        Self::ok(serde_json::json!({ "imageUrls": urls }))
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self { status, body: body.to_string(), delay: None, gate: None }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold the reply until a permit is added to `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[derive(Default)]
struct StubState {
    requests: Mutex<Vec<Recorded>>,
    routes: Mutex<HashMap<String, Reply>>,
    models: Mutex<HashMap<String, Reply>>,
}

pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url: format!("http://{addr}"), state }
    }

    /// Script the reply for `"METHOD /path"`.
    pub fn route(&self, key: &str, reply: Reply) {
        self.state.routes.lock().insert(key.to_string(), reply);
    }

    /// Script the `/api/generate` reply for one model.
    pub fn model(&self, model: &str, reply: Reply) {
        self.state.models.lock().insert(model.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub async fn wait_for_requests(&self, count: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.state.requests.lock().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "expected {count} request(s), saw {}", self.state.requests.lock().len());
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let recorded = Recorded { method: method.clone(), path: uri.path().to_string(), headers, body };
    state.requests.lock().push(recorded.clone());

    let reply = if recorded.path == "/api/generate" {
        let model = recorded.json()["model"].as_str().unwrap_or_default().to_string();
        state.models.lock().get(&model).cloned()
    } else {
        state.routes.lock().get(&format!("{} {}", method, recorded.path)).cloned()
    };
    let reply = reply.unwrap_or_else(|| Reply::error(StatusCode::NOT_FOUND, "no scripted reply"));

    if let Some(gate) = &reply.gate {
        gate.acquire().await.unwrap().forget();
    }
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, [(header::CONTENT_TYPE, "application/json")], reply.body)
}

/// Auth provider double that counts token fetches.
pub struct FakeAuth {
    identity: Option<Identity>,
    token: String,
    pub token_calls: AtomicUsize,
    pub refresh_flags: Mutex<Vec<bool>>,
}

impl FakeAuth {
    pub fn signed_in() -> Arc<Self> {
        Arc::new(Self {
            identity: Some(Identity { uid: "test-uid".into() }),
            token: "test-token".into(),
            token_calls: AtomicUsize::new(0),
            refresh_flags: Mutex::new(Vec::new()),
        })
    }

    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self {
            identity: None,
            token: String::new(),
            token_calls: AtomicUsize::new(0),
            refresh_flags: Mutex::new(Vec::new()),
        })
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn token(&self, identity: &Identity, force_refresh: bool) -> Result<String, DesignError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_flags.lock().push(force_refresh);
        match &self.identity {
            Some(own) if own == identity => Ok(self.token.clone()),
            _ => Err(DesignError::TokenUnavailable("unknown identity".into())),
        }
    }
}

pub const MODELS: [&str; 4] = ["model-a", "model-b", "model-c", "model-d"];

pub fn config_for(stub: &StubBackend) -> Config {
    Config {
        api_base: stub.base_url.clone(),
        models: MODELS.iter().map(|m| m.to_string()).collect(),
        ..Config::default()
    }
}

pub fn gateway_for(stub: &StubBackend, auth: Arc<FakeAuth>) -> Arc<Gateway> {
    Arc::new(Gateway::new(&config_for(stub), auth))
}

/// Short / Round / Floral / Monochromatic.
pub fn scenario_a_selection() -> AttributeSelection {
    let mut selection = AttributeSelection::new();
    selection.select_length(Length::Short);
    selection.select_shape(Shape::Round);
    selection.select_style(Style::Floral);
    selection.select_color("Mono".parse::<ColorConfiguration>().unwrap());
    selection
}
