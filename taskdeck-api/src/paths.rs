//! Endpoint path builders shared by the client and the stub server.
//!
//! Keeping the paths in one place means the client and the test fixture
//! cannot drift apart silently.

use crate::task::TaskId;

/// `POST` — exchange credentials for a bearer token.
pub const LOGIN: &str = "/api/v1/auth/login";

/// `POST` — create an account (returns the user record, no token).
pub const REGISTER: &str = "/api/v1/auth/register";

/// `POST` — send a message to the assistant agent.
pub const CHAT: &str = "/api/v1/chat";

/// `GET` — list the caller's conversations.
pub const CONVERSATIONS: &str = "/api/v1/conversations";

/// Builds the paginated task listing path.
#[must_use]
pub fn tasks(limit: u32, offset: u32) -> String {
    format!("/api/v1/tasks?limit={limit}&offset={offset}")
}

/// Builds the path for a single task.
#[must_use]
pub fn task(id: &TaskId) -> String {
    format!("/api/v1/tasks/{id}")
}

/// `POST` target for task creation.
pub const TASKS: &str = "/api/v1/tasks";

/// Builds the completion-toggle path for a task.
#[must_use]
pub fn task_complete(id: &TaskId) -> String {
    format!("/api/v1/tasks/{id}/complete")
}

/// Builds the paginated message listing path for a conversation.
#[must_use]
pub fn conversation_messages(conversation_id: &str, limit: u32, offset: u32) -> String {
    format!("/api/v1/conversations/{conversation_id}/messages?limit={limit}&offset={offset}")
}
