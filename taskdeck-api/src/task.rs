//! Task record and mutation payloads.
//!
//! The client holds a read/write *view* of these records; the server is
//! the source of truth. Title and description change only through the
//! full create/update round-trip, completion only through the toggle
//! endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, ValidationError};

/// Opaque, server-assigned task identifier.
///
/// The client never parses or orders these; they are stable lookup keys
/// and URL path segments, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a raw identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A task record as returned by every task endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Owning user's identifier (assigned from the bearer token, never
    /// supplied by the client).
    pub user_id: String,
    /// Task title (1–255 characters).
    pub title: String,
    /// Optional free-form description (up to 4000 characters).
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the task is marked complete.
    pub completed: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Paginated task list, returned by `GET /api/v1/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListResponse {
    /// The requested page of tasks.
    pub data: Vec<Task>,
    /// Total number of tasks owned by the caller.
    pub total: u64,
    /// Page size that was applied.
    pub limit: u32,
    /// Page offset that was applied.
    pub offset: u32,
}

/// Payload for `POST /api/v1/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreate {
    /// Task title (validated client-side before submission).
    pub title: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload for `PUT /api/v1/tasks/{id}` (full update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// New title.
    pub title: String,
    /// New description (`None` clears it).
    pub description: Option<String>,
    /// New completion state.
    pub completed: bool,
}

/// Payload for `PATCH /api/v1/tasks/{id}/complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskToggle {
    /// Desired completion state.
    pub completed: bool,
}

/// Validates a task title against the length bounds.
///
/// # Errors
///
/// Returns [`ValidationError::TitleEmpty`] for an empty or
/// whitespace-only title, or [`ValidationError::TitleTooLong`] past 255
/// characters. Lengths are counted in characters, not bytes.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validates an optional task description against the length bound.
///
/// # Errors
///
/// Returns [`ValidationError::DescriptionTooLong`] past 4000 characters.
pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    if let Some(d) = description
        && d.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

/// Validates a full task draft (title + description) before submission.
///
/// # Errors
///
/// Returns the first failing check; see [`validate_title`] and
/// [`validate_description`].
pub fn validate_draft(title: &str, description: Option<&str>) -> Result<(), ValidationError> {
    validate_title(title)?;
    validate_description(description)
}
