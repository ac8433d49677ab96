//! HTTP routes for the stub backend.
//!
//! Implements the REST surface the client speaks: auth, task CRUD,
//! completion toggle, and the chat agent. Response shapes come from
//! `taskdeck-api`, so the client and this fixture cannot drift apart.
//!
//! Ownership is enforced by lookup scope: a task or conversation owned
//! by someone else is answered with 404, never 403.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;

use taskdeck_api::auth::{AuthResponse, LoginRequest, RegisterRequest};
use taskdeck_api::chat::{ChatRequest, ChatResponse, MessageListResponse};
use taskdeck_api::task::{TaskCreate, TaskToggle, TaskUpdate};
use taskdeck_api::{ErrorBody, MAX_TITLE_LEN, TaskId, TaskListResponse};

use crate::agent;
use crate::state::{StubEndpoint, StubState};

/// How long an issued token is advertised to live, in seconds.
const TOKEN_EXPIRES_IN: u64 = 24 * 60 * 60;

const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Builds the stub's router over shared state.
pub fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/v1/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/v1/tasks/{id}/complete", patch(toggle_task))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/conversations", get(conversations))
        .route(
            "/api/v1/conversations/{id}/messages",
            get(conversation_messages),
        )
        .with_state(state)
}

/// Pagination query parameters.
#[derive(Debug, serde::Deserialize)]
struct Pagination {
    limit: Option<u32>,
    offset: Option<u32>,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn register(
    State(state): State<Arc<StubState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    match state.register(&req.email, &req.password) {
        Some(user) => (StatusCode::CREATED, Json(user)).into_response(),
        None => error(StatusCode::BAD_REQUEST, "Email already registered", None),
    }
}

async fn login(State(state): State<Arc<StubState>>, Json(req): Json<LoginRequest>) -> Response {
    if let Some(status) = state.take_fault(StubEndpoint::Login) {
        return fault_response(status);
    }
    match state.login(&req.email, &req.password) {
        Some((token, user)) => Json(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            user,
            expires_in: Some(TOKEN_EXPIRES_IN),
        })
        .into_response(),
        None => error(
            StatusCode::UNAUTHORIZED,
            "Incorrect email or password",
            None,
        ),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn list_tasks(
    State(state): State<Arc<StubState>>,
    Query(page): Query<Pagination>,
    headers: HeaderMap,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::ListTasks) {
        return fault_response(status);
    }
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = page.offset.unwrap_or(0);
    let (data, total) = state.list_tasks(&user_id, limit, offset);
    Json(TaskListResponse {
        data,
        total,
        limit,
        offset,
    })
    .into_response()
}

async fn create_task(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(req): Json<TaskCreate>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::CreateTask) {
        return fault_response(status);
    }
    if let Some(resp) = reject_bad_title(&req.title) {
        return resp;
    }
    let task = state.create_task(&user_id, &req.title, req.description.as_deref());
    (StatusCode::CREATED, Json(task)).into_response()
}

async fn get_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::GetTask) {
        return fault_response(status);
    }
    match state.get_task(&user_id, &TaskId::new(id)) {
        Some(task) => Json(task).into_response(),
        None => task_not_found(),
    }
}

async fn update_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<TaskUpdate>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::UpdateTask) {
        return fault_response(status);
    }
    if let Some(resp) = reject_bad_title(&req.title) {
        return resp;
    }
    match state.update_task(
        &user_id,
        &TaskId::new(id),
        &req.title,
        req.description.as_deref(),
        req.completed,
    ) {
        Some(task) => Json(task).into_response(),
        None => task_not_found(),
    }
}

async fn toggle_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<TaskToggle>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::ToggleTask) {
        return fault_response(status);
    }
    match state.toggle_task(&user_id, &TaskId::new(id), req.completed) {
        Some(task) => Json(task).into_response(),
        None => task_not_found(),
    }
}

async fn delete_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::DeleteTask) {
        return fault_response(status);
    }
    if state.delete_task(&user_id, &TaskId::new(id)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        task_not_found()
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

async fn chat(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Some(status) = state.take_fault(StubEndpoint::Chat) {
        return fault_response(status);
    }
    if req.message.trim().is_empty() {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Message must not be empty",
            None,
        );
    }

    let reply = agent::respond(&state, &user_id, &req.message);
    let (conversation_id, message_id) = state.record_exchange(
        &user_id,
        req.conversation_id.as_deref(),
        &req.message,
        &reply.response,
        reply.tool_calls.clone(),
    );

    Json(ChatResponse {
        conversation_id,
        message_id,
        user_message: req.message,
        agent_response: reply.response,
        tool_calls: reply.tool_calls,
        created_at: Utc::now(),
    })
    .into_response()
}

async fn conversations(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    Json(state.conversations(&user_id)).into_response()
}

async fn conversation_messages(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
    headers: HeaderMap,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = page.offset.unwrap_or(0);
    match state.conversation_messages(&user_id, &id, limit, offset) {
        Some((data, total)) => Json(MessageListResponse {
            data,
            total,
            limit,
            offset,
        })
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "Conversation not found", None),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolves the bearer token in `headers` to a user id, or builds the
/// 401 response the client's session layer reacts to.
fn authenticate(state: &StubState, headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(token) = token else {
        return Err(error(StatusCode::UNAUTHORIZED, "Not authenticated", None));
    };
    state.authenticate(token).ok_or_else(|| {
        error(
            StatusCode::UNAUTHORIZED,
            "Could not validate credentials",
            None,
        )
    })
}

fn error(status: StatusCode, detail: &str, code: Option<&str>) -> Response {
    let body = match code {
        Some(code) => ErrorBody::with_code(detail, code),
        None => ErrorBody::new(detail),
    };
    (status, Json(body)).into_response()
}

/// Builds the response for an armed fault. 500s carry no JSON body so
/// clients exercise their opaque-failure path.
fn fault_response(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        status.into_response()
    } else {
        error(status, "Injected failure", Some("injected"))
    }
}

fn task_not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Task not found", None)
}

fn reject_bad_title(title: &str) -> Option<Response> {
    if title.trim().is_empty() {
        return Some(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Title must not be empty",
            None,
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Some(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Title too long",
            None,
        ));
    }
    None
}
