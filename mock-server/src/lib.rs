use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{watch, RwLock},
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub content: String,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub content: String,
}

#[derive(Deserialize)]
pub struct SignIn {
    pub username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
}

/// Todos in creation order. Every subscriber holds a receiver on this channel.
pub type Db = Arc<watch::Sender<Vec<Todo>>>;
pub type Sessions = Arc<RwLock<HashMap<Uuid, String>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new() -> Self {
        let (db, _) = watch::channel(Vec::new());
        Self {
            db: Arc::new(db),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// A request carrying a bearer token for a live session.
pub struct Authed {
    pub token: Uuid,
    pub username: String,
}

impl FromRequestParts<AppState> for Authed {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;
        let sessions = state.sessions.read().await;
        let username = sessions.get(&token).cloned().ok_or(StatusCode::UNAUTHORIZED)?;
        Ok(Authed { token, username })
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/session", post(sign_in).delete(sign_out))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/subscribe", get(subscribe))
        .route("/todos/{id}", delete(delete_todo))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignIn>,
) -> Result<(StatusCode, Json<Session>), StatusCode> {
    if input.username.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let session = Session {
        token: Uuid::new_v4(),
        username: input.username,
    };
    state.sessions.write().await.insert(session.token, session.username.clone());
    tracing::info!(username = %session.username, "signed in");
    Ok((StatusCode::CREATED, Json(session)))
}

async fn sign_out(auth: Authed, State(state): State<AppState>) -> StatusCode {
    state.sessions.write().await.remove(&auth.token);
    tracing::info!(username = %auth.username, "signed out");
    StatusCode::NO_CONTENT
}

async fn list_todos(_auth: Authed, State(state): State<AppState>) -> Json<Vec<Todo>> {
    let todos = state.db.borrow().clone();
    Json(todos)
}

async fn create_todo(
    auth: Authed,
    State(state): State<AppState>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), StatusCode> {
    if input.content.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let todo = Todo {
        id: Uuid::new_v4(),
        content: input.content,
    };
    state.db.send_modify(|todos| todos.push(todo.clone()));
    tracing::debug!(id = %todo.id, username = %auth.username, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn delete_todo(
    auth: Authed,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let removed = state.db.send_if_modified(|todos| {
        let before = todos.len();
        todos.retain(|t| t.id != id);
        todos.len() != before
    });
    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }
    tracing::debug!(%id, username = %auth.username, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Push the current todos, then the full list again after every change.
async fn subscribe(
    auth: Authed,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(username = %auth.username, "subscriber attached");
    let mut rx = state.db.subscribe();
    rx.mark_changed();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.changed().await.ok()?;
        let todos = rx.borrow_and_update().clone();
        Some((Event::default().event("snapshot").json_data(&todos), rx))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
