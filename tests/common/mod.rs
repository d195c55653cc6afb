#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use zoneforge_editor::Dialogs;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct BackendState {
    requests: Vec<Recorded>,
    rejections: Vec<(String, String, u16, String)>,
    next_user_id: u64,
}

type Shared = Arc<Mutex<BackendState>>;

/// In-process stand-in for the ZoneForge REST API
pub struct MockBackend {
    pub base_url: String,
    state: Shared,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            next_user_id: 9,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/api/login", post(login))
            .fallback(handle)
            .with_state(state.clone());

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockBackend {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Answer `method path` with an error instead of the default reply
    pub fn reject(&self, method: &str, path: &str, status: u16, message: &str) {
        self.state.lock().unwrap().rejections.push((
            method.to_string(),
            path.to_string(),
            status,
            message.to_string(),
        ));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Every non-GET request as `METHOD /path`
    pub fn mutations(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|request| request.method != "GET")
            .map(|request| format!("{} {}", request.method, request.path))
            .collect()
    }

    pub fn body_of(&self, method: &str, path: &str) -> Option<Value> {
        self.requests()
            .into_iter()
            .find(|request| request.method == method && request.path == path)
            .map(|request| request.body)
    }
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] == "admin" && body["password"] == "secret" {
        (
            StatusCode::OK,
            Json(json!({"token": TOKEN, "refresh_token": "refresh"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid username or password"})),
        )
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {}", TOKEN))
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Missing or invalid token"})));
    }

    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut state = state.lock().unwrap();
    state.requests.push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        body: body.clone(),
    });

    if let Some((_, _, status, message)) = state
        .rejections
        .iter()
        .find(|(m, p, _, _)| *m == method.as_str() && *p == path)
    {
        let status = StatusCode::from_u16(*status).unwrap();
        return (status, Json(json!({ "message": message })));
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let (status, reply) = match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "user"]) => (
            200,
            json!({"users": [
                {"id": 7, "user_name": "alice", "group": "None"},
                {"id": 8, "user_name": "bob", "group": "admins"},
            ]}),
        ),
        ("GET", ["api", "group"]) => (
            200,
            json!({"groups": [
                {"id": 1, "group_name": "admins"},
                {"id": 2, "group_name": "operators"},
                {"id": 4, "group_name": "ops"},
            ]}),
        ),
        ("GET", ["api", "role"]) => (
            200,
            json!({"roles": [
                {"id": 1, "role_name": "A"},
                {"id": 2, "role_name": "B"},
                {"id": 3, "role_name": "C"},
            ]}),
        ),
        ("GET", ["api", "types", "recordtype", "MX"]) => {
            (200, json!({"type": "MX", "fields": ["preference", "exchange"]}))
        }
        ("GET", ["api", "types", "recordtype", "A"]) => (200, json!({"type": "A", "fields": ["address"]})),
        ("GET", ["api", "zones", "example.com", "records", "mail"]) => (
            200,
            json!([{
                "name": "mail",
                "type": "MX",
                "ttl": 3600,
                "data": {"preference": 10, "exchange": "mx1.example.com."},
                "comment": "",
                "index": 0
            }]),
        ),
        ("POST", ["api", "user"]) => {
            let id = state.next_user_id;
            state.next_user_id += 1;
            (
                200,
                json!({"id": id, "user_name": body["username"], "message": "User created successfully"}),
            )
        }
        ("PATCH", ["api", "user", _]) => (200, json!({"message": "User updated successfully"})),
        ("POST", ["api", "group"]) => (201, json!({"message": "Group created successfully"})),
        ("PUT", ["api", "group", _]) => (200, json!({"message": "Group updated successfully"})),
        ("POST", ["api", "group", _, "user", _]) => (200, json!({"message": "User assign to a group successfully"})),
        ("PUT", ["api", "group", _, "user", _]) => (200, json!({"message": "User assign to the new group"})),
        ("POST", ["api", "group", _, "role", _]) => (201, json!({"message": "Role assign to group successfully"})),
        ("DELETE", ["api", "group", _, "role", _]) => {
            (200, json!({"message": "Role association from this group deleted"}))
        }
        ("PUT", ["api", "role", _]) => (200, json!({"message": "Role updated successfully"})),
        ("DELETE", ["api", "role", _]) => (200, json!({"message": "Role deleted"})),
        ("POST", ["api", "zones", _, "records"]) => (200, json!({"name": body["name"], "type": body["type"]})),
        ("PUT", ["api", "zones", _, "records", _]) => (200, json!({"name": "mail", "type": "MX"})),
        ("DELETE", ["api", "zones", _, "records", _]) => (200, json!({})),
        _ => (404, json!({"message": "Not found"})),
    };

    (StatusCode::from_u16(status).unwrap(), Json(reply))
}

/// Dialogs answering from a script and remembering what they showed
#[derive(Default)]
pub struct ScriptedDialogs {
    answers: RefCell<VecDeque<bool>>,
    pub confirms: RefCell<Vec<String>>,
    pub alerts: RefCell<Vec<String>>,
}

impl ScriptedDialogs {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }
}

impl Dialogs for ScriptedDialogs {
    fn confirm(&self, message: &str) -> bool {
        self.confirms.borrow_mut().push(message.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or(true)
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}
