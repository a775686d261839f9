use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
}

/// What `/echo` saw: method, headers (lowercased names) and the JSON body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
pub struct AppState {
    users: Arc<RwLock<HashMap<u64, User>>>,
    next_id: Arc<AtomicU64>,
    echo_hits: Arc<AtomicU64>,
}

impl AppState {
    /// Store holding user 1 ("alice"); new users start at id 2.
    pub fn seeded() -> Self {
        let users = HashMap::from([(
            1,
            User {
                id: 1,
                name: "alice".to_string(),
            },
        )]);
        Self {
            users: Arc::new(RwLock::new(users)),
            next_id: Arc::new(AtomicU64::new(2)),
            echo_hits: Arc::new(AtomicU64::new(0)),
        }
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/echo", any(echo))
        .route("/echo/hits", get(echo_hits))
        .route("/status/{code}", any(status))
        .route("/malformed", get(malformed))
        .fallback(not_found)
        .with_state(AppState::seeded())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type ApiError = (StatusCode, Json<Value>);

fn not_found_error() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
}

async fn not_found() -> ApiError {
    not_found_error()
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state.users.read().await;
    let mut users: Vec<User> = users.values().cloned().collect();
    users.sort_by_key(|user| user.id);
    Json(users)
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> (StatusCode, Json<User>) {
    let user = User {
        id: state.next_id.fetch_add(1, Ordering::SeqCst),
        name: input.name,
    };
    tracing::debug!(id = user.id, "created user");
    state.users.write().await.insert(user.id, user.clone());
    (StatusCode::CREATED, Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<User>, ApiError> {
    let users = state.users.read().await;
    users.get(&id).cloned().map(Json).ok_or_else(not_found_error)
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let mut users = state.users.write().await;
    let user = users.get_mut(&id).ok_or_else(not_found_error)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<User>, ApiError> {
    let removed = state.users.write().await.remove(&id);
    tracing::debug!(id, found = removed.is_some(), "delete user");
    removed.map(Json).ok_or_else(not_found_error)
}

async fn echo(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    state.echo_hits.fetch_add(1, Ordering::SeqCst);

    let mut seen = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        seen.insert(name.as_str().to_string(), values.join(", "));
    }

    let body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    };

    Json(Echo {
        method: method.to_string(),
        headers: seen,
        body,
    })
}

async fn echo_hits(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"hits": state.echo_hits.load(Ordering::SeqCst)}))
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status @ (StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED)) => status.into_response(),
        Ok(status) => (status, Json(json!({"status": code}))).into_response(),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid status code"})),
        )
            .into_response(),
    }
}

async fn malformed() -> &'static str {
    "this is not json"
}
