//! Authenticated API client: the sole HTTP entry point.
//!
//! Every call funnels through [`ApiClient::request`], which attaches the
//! bearer token, enforces JSON in/out, and applies the uniform failure
//! contract:
//!
//! - **401** clears the session, emits [`ClientEvent::SessionExpired`]
//!   (the terminal analog of redirecting to the login page), and fails
//!   with [`ApiError::SessionExpired`];
//! - other non-2xx statuses are parsed into the backend's `{detail}`
//!   body when possible, otherwise surfaced as a generic `HTTP <status>`
//!   failure;
//! - **204** resolves to [`ApiBody::NoContent`], distinct from JSON
//!   `null`;
//! - transport failures (no response at all) are a separate error kind
//!   from HTTP-level failures.
//!
//! No retries, no backoff, no cancellation: every failure is terminal
//! for that one invocation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use taskdeck_api::chat::{ChatRequest, ChatResponse, Conversation, MessageListResponse};
use taskdeck_api::{
    AuthResponse, ErrorBody, LoginRequest, RegisterRequest, Task, TaskCreate, TaskId,
    TaskListResponse, TaskToggle, TaskUpdate, User, paths,
};

use crate::session::{SessionError, SessionStore};

/// Events pushed from the client core to whatever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A 401 was observed: the session has already been cleared and the
    /// user must sign in again. The rendering layer navigates to its
    /// login entry point on receipt.
    SessionExpired,
}

/// A successful response body: parsed JSON or an explicit "no content".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBody<T> {
    /// A 2xx response with a JSON body, typed by the caller.
    Json(T),
    /// A 204 response; there was no body to read.
    NoContent,
}

/// Failures surfaced by the request helper.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A 401 was received; the session is cleared and the caller must
    /// not assume anything about the request's effect.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// Non-2xx with a parseable `{detail}` body; the message is
    /// surfaced to the user verbatim.
    #[error("{detail}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Backend-supplied failure description.
        detail: String,
        /// Optional machine-readable code, logged but not branched on.
        code: Option<String>,
    },

    /// Non-2xx without a parseable body.
    #[error("HTTP {status}: {reason}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
    },

    /// Transport-level failure: no response was received.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A 2xx body that did not match the expected shape. Not a handled
    /// case: the contract says success bodies are well-formed, so this
    /// is surfaced as-is.
    #[error("malformed response body: {0}")]
    Decode(#[source] reqwest::Error),

    /// The session could not be persisted after login.
    #[error("failed to persist session: {0}")]
    Session(#[from] SessionError),
}

/// Authenticated HTTP client over the backend REST API.
///
/// Holds the shared [`SessionStore`] rather than module-level state, so
/// several clients (or tests) can run against independent sessions.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl ApiClient {
    /// Creates a client for `base_url` (no trailing slash) and returns
    /// it together with the receiving end of its event channel.
    ///
    /// # Errors
    ///
    /// Returns the underlying builder error if the TLS backend cannot
    /// be initialized.
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ClientEvent>), reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let (events, events_rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                http,
                base_url: base_url.into(),
                session,
                events,
            },
            events_rx,
        ))
    }

    /// The session store this client reads its credential from.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Issues one authenticated JSON request.
    ///
    /// Caller-supplied `headers` are merged first; the bearer header is
    /// applied afterwards so it can never be clobbered. The token is
    /// attached if and only if the session currently holds one.
    ///
    /// # Errors
    ///
    /// See [`ApiError`] for the full taxonomy. After
    /// [`ApiError::SessionExpired`] the session is guaranteed cleared
    /// and a [`ClientEvent::SessionExpired`] has been emitted.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&B>,
    ) -> Result<ApiBody<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.http.request(method.clone(), &url).headers(headers);

        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request failed at transport level");
            ApiError::Network(e)
        })?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(%method, path, "401 received, invalidating session");
            self.session.clear();
            // Receiver may already be gone (e.g. one-shot CLI commands).
            let _ = self.events.send(ClientEvent::SessionExpired);
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_string();
            return match resp.json::<ErrorBody>().await {
                Ok(body) => {
                    tracing::debug!(%method, path, status = status.as_u16(), detail = %body.detail, "server-reported failure");
                    Err(ApiError::Server {
                        status: status.as_u16(),
                        detail: body.detail,
                        code: body.code,
                    })
                }
                Err(_) => Err(ApiError::Http {
                    status: status.as_u16(),
                    reason,
                }),
            };
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiBody::NoContent);
        }

        resp.json::<T>().await.map(ApiBody::Json).map_err(ApiError::Decode)
    }

    /// GET returning a typed JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        match self
            .request::<T, ()>(Method::GET, path, HeaderMap::new(), None)
            .await?
        {
            ApiBody::Json(v) => Ok(v),
            ApiBody::NoContent => Err(ApiError::Http {
                status: 204,
                reason: "No Content".to_string(),
            }),
        }
    }

    /// Request with a JSON body, returning a typed JSON body.
    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        match self
            .request::<T, B>(method, path, HeaderMap::new(), Some(body))
            .await?
        {
            ApiBody::Json(v) => Ok(v),
            ApiBody::NoContent => Err(ApiError::Http {
                status: 204,
                reason: "No Content".to_string(),
            }),
        }
    }

    // -- Auth ---------------------------------------------------------------

    /// Exchanges credentials for a bearer token and stores the session.
    ///
    /// # Errors
    ///
    /// Returns the server's failure (`401` from the login endpoint
    /// arrives while no token is held, so it surfaces as a plain
    /// [`ApiError::Server`] rather than a session invalidation — there
    /// is no session to invalidate yet), or [`ApiError::Session`] if
    /// the token cannot be persisted afterwards.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        // The login endpoint's own 401 must not trip the session-expiry
        // path; short-circuit since no token is attached anyway.
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let url = format!("{}{}", self.base_url, paths::LOGIN);
        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(ApiError::Network)?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_string();
            return match resp.json::<ErrorBody>().await {
                Ok(body) => Err(ApiError::Server {
                    status: status.as_u16(),
                    detail: body.detail,
                    code: body.code,
                }),
                Err(_) => Err(ApiError::Http {
                    status: status.as_u16(),
                    reason,
                }),
            };
        }
        let auth: AuthResponse = resp.json().await.map_err(ApiError::Decode)?;

        self.session
            .set(auth.access_token.clone(), Some(auth.user.clone()))?;
        tracing::info!(user = %auth.user.email, "logged in");
        Ok(auth)
    }

    /// Creates an account. Returns the user record; no token is issued
    /// (the caller logs in afterwards).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any non-2xx response.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let req = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, paths::REGISTER, &req).await
    }

    /// Discards the local session. Purely client-side.
    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("logged out");
    }

    // -- Tasks --------------------------------------------------------------

    /// Fetches one page of the caller's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn list_tasks(&self, limit: u32, offset: u32) -> Result<TaskListResponse, ApiError> {
        self.get_json(&paths::tasks(limit, offset)).await
    }

    /// Fetches a single task. A 404 covers both "absent" and "owned by
    /// someone else"; the two are indistinguishable by design.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn get_task(&self, id: &TaskId) -> Result<Task, ApiError> {
        self.get_json(&paths::task(id)).await
    }

    /// Creates a task and returns the server's record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn create_task(&self, draft: &TaskCreate) -> Result<Task, ApiError> {
        self.send_json(Method::POST, paths::TASKS, draft).await
    }

    /// Replaces a task's title/description/completed and returns the
    /// server's record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, ApiError> {
        self.send_json(Method::PUT, &paths::task(id), update).await
    }

    /// Sets only the completion flag and returns the server's record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn toggle_task(&self, id: &TaskId, completed: bool) -> Result<Task, ApiError> {
        self.send_json(
            Method::PATCH,
            &paths::task_complete(id),
            &TaskToggle { completed },
        )
        .await
    }

    /// Deletes a task. A 204 settles cleanly without reading a body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), ApiError> {
        match self
            .request::<serde_json::Value, ()>(Method::DELETE, &paths::task(id), HeaderMap::new(), None)
            .await?
        {
            ApiBody::NoContent | ApiBody::Json(_) => Ok(()),
        }
    }

    // -- Assistant ----------------------------------------------------------

    /// Sends a message to the assistant agent, optionally continuing an
    /// existing conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn chat(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        let req = ChatRequest {
            message: message.to_string(),
            conversation_id: conversation_id.map(String::from),
        };
        self.send_json(Method::POST, paths::CHAT, &req).await
    }

    /// Lists the caller's conversations.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(paths::CONVERSATIONS).await
    }

    /// Fetches one page of a conversation's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<MessageListResponse, ApiError> {
        self.get_json(&paths::conversation_messages(conversation_id, limit, offset))
            .await
    }
}
