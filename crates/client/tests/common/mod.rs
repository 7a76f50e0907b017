//! Stub analysis service for integration tests.
//!
//! Stands up a real HTTP server on `127.0.0.1:0` speaking the canonical
//! service contract, so the client and the polling loop are exercised
//! end to end. Each analysis is scripted as a sequence of statuses; a
//! status request serves the current entry and advances the cursor, with
//! the final entry repeating. Request counts are recorded so tests can
//! assert that polling stops after a terminal status.

#![allow(dead_code)] // each test binary uses a subset of the helpers

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Token issued by the stub's auth endpoints.
pub const TEST_TOKEN: &str = "stub-access-token";

/// Fixed timestamp used for every `created_at`/`updated_at`.
pub const TEST_TIMESTAMP: &str = "2025-06-01T10:00:00Z";

type Shared = Arc<Mutex<StubState>>;

#[derive(Default)]
pub struct StubState {
    /// Registered accounts, email → password.
    pub users: BTreeMap<String, String>,
    /// Scripted analyses by id.
    pub analyses: BTreeMap<String, ScriptedAnalysis>,
    /// Raw bodies received by `POST /analyses`.
    pub submitted: Vec<Value>,
    /// `GET /analyses/{id}` hits per id.
    pub status_requests: BTreeMap<String, usize>,
    /// Token accepted on authenticated routes; `None` rejects everything.
    pub valid_token: Option<String>,
    /// Ids assigned to submitted analyses, in order.
    next_analysis: usize,
}

pub struct ScriptedAnalysis {
    statuses: Vec<&'static str>,
    cursor: usize,
    result: Option<Value>,
}

impl ScriptedAnalysis {
    pub fn new(statuses: Vec<&'static str>, result: Option<Value>) -> Self {
        assert!(!statuses.is_empty(), "script needs at least one status");
        Self {
            statuses,
            cursor: 0,
            result,
        }
    }

    /// Status a request arriving now would observe.
    fn current(&self) -> &'static str {
        self.statuses[self.cursor.min(self.statuses.len() - 1)]
    }

    /// Serve the current status and advance, final entry repeating.
    fn serve(&mut self) -> &'static str {
        let status = self.current();
        self.cursor = (self.cursor + 1).min(self.statuses.len() - 1);
        status
    }
}

pub struct StubService {
    pub addr: SocketAddr,
    pub state: Shared,
    _server: tokio::task::JoinHandle<()>,
}

impl StubService {
    /// Bind to an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(StubState {
            valid_token: Some(TEST_TOKEN.to_string()),
            ..StubState::default()
        }));

        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap()
    }

    /// Pre-register an account.
    pub fn add_user(&self, email: &str, password: &str) {
        self.lock().users.insert(email.into(), password.into());
    }

    /// Script an analysis: the statuses it will serve in order, and the
    /// result returned once it reports `completed`.
    pub fn script(&self, id: &str, statuses: Vec<&'static str>, result: Option<Value>) {
        self.lock()
            .analyses
            .insert(id.into(), ScriptedAnalysis::new(statuses, result));
    }

    /// How many status requests `id` has received.
    pub fn status_requests(&self, id: &str) -> usize {
        self.lock().status_requests.get(id).copied().unwrap_or(0)
    }

    /// Reject every authenticated call from now on.
    pub fn revoke_tokens(&self) {
        self.lock().valid_token = None;
    }
}

/// A canned risk result for scripted analyses.
pub fn sample_result() -> Value {
    json!({
        "risk_tier": "WARNING",
        "risk_percent": 62.5,
        "clinical_action": "Consult a physician within a month.",
        "confidence": "medium",
        "explanations": [
            {
                "feature": "LBXHGB",
                "label": "Hemoglobin",
                "text": "below reference range",
                "direction": "negative"
            }
        ]
    })
}

/// A fully satisfied lab panel (base fields + composite BMI).
pub fn complete_panel() -> verae_core::panel::LabValues {
    [
        ("LBXHGB", 120.0),
        ("LBXMCVSI", 80.0),
        ("LBXMCHSI", 330.0),
        ("LBXRDW", 14.5),
        ("LBXRBCSI", 4.5),
        ("LBXHCT", 38.0),
        ("RIDAGEYR", 31.0),
        ("BMXBMI", 23.0),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

// ---------------------------------------------------------------------------
// Router / handlers
// ---------------------------------------------------------------------------

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/analyses", get(list_analyses).post(create_analysis))
        .route("/analyses/{id}", get(analysis_status))
        .route("/analyses/{id}/result", get(analysis_result))
        .with_state(state)
}

fn auth_body(email: &str) -> Value {
    json!({
        "access_token": TEST_TOKEN,
        "token_type": "Bearer",
        "expires_in": 3600,
        "user": {
            "id": "u-1",
            "email": email,
            "created_at": TEST_TIMESTAMP
        }
    })
}

fn snapshot_body(id: &str, status: &str) -> Value {
    json!({
        "analysis_id": id,
        "status": status,
        "progress_stage": status,
        "created_at": TEST_TIMESTAMP,
        "updated_at": TEST_TIMESTAMP
    })
}

fn detail(status: StatusCode, error_code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"detail": {"error_code": error_code, "message": message}})),
    )
        .into_response()
}

/// Check the bearer token, returning a 401 response on mismatch.
fn check_auth(state: &MutexGuard<'_, StubState>, headers: &HeaderMap) -> Result<(), Response> {
    let expected = state
        .valid_token
        .as_ref()
        .map(|token| format!("Bearer {token}"));
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if expected.as_deref() == presented && expected.is_some() {
        Ok(())
    } else {
        Err(detail(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Token missing or invalid",
        ))
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    let mut state = state.lock().unwrap();
    if state.users.contains_key(&email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"detail": "User with this email already exists"})),
        )
            .into_response();
    }
    state.users.insert(email.clone(), password);
    (StatusCode::CREATED, Json(auth_body(&email))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let state = state.lock().unwrap();
    match state.users.get(email) {
        Some(stored) if stored == password => Json(auth_body(email)).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid credentials"})),
        )
            .into_response(),
    }
}

async fn create_analysis(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Err(response) = check_auth(&state, &headers) {
        return response;
    }

    state.submitted.push(body);
    state.next_analysis += 1;
    let id = format!("a-{}", state.next_analysis);
    state
        .analyses
        .insert(id.clone(), ScriptedAnalysis::new(vec!["pending"], None));

    (StatusCode::ACCEPTED, Json(snapshot_body(&id, "pending"))).into_response()
}

async fn list_analyses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if let Err(response) = check_auth(&state, &headers) {
        return response;
    }

    let analyses: Vec<Value> = state
        .analyses
        .iter()
        .map(|(id, analysis)| {
            json!({
                "analysis_id": id,
                "status": analysis.current(),
                "created_at": TEST_TIMESTAMP
            })
        })
        .collect();
    Json(json!({ "analyses": analyses })).into_response()
}

async fn analysis_status(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Err(response) = check_auth(&state, &headers) {
        return response;
    }

    *state.status_requests.entry(id.clone()).or_insert(0) += 1;
    match state.analyses.get_mut(&id) {
        None => detail(
            StatusCode::NOT_FOUND,
            "analysis_not_found",
            "Analysis not found for current user",
        ),
        Some(analysis) => {
            let status = analysis.serve();
            Json(snapshot_body(&id, status)).into_response()
        }
    }
}

async fn analysis_result(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = state.lock().unwrap();
    if let Err(response) = check_auth(&state, &headers) {
        return response;
    }

    match state.analyses.get(&id) {
        None => detail(
            StatusCode::NOT_FOUND,
            "analysis_not_found",
            "Analysis not found for current user",
        ),
        Some(analysis) if analysis.current() != "completed" => detail(
            StatusCode::CONFLICT,
            "analysis_not_completed",
            "Analysis is not completed yet",
        ),
        Some(analysis) => match &analysis.result {
            Some(result) => Json(result.clone()).into_response(),
            None => detail(
                StatusCode::NOT_FOUND,
                "analysis_not_found",
                "Result missing for completed analysis",
            ),
        },
    }
}
