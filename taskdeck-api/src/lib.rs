//! Shared wire types for the taskdeck to-do service API.
//!
//! Request/response DTOs exchanged between the client and the backend,
//! client-side validation rules, and endpoint path builders. Everything
//! here mirrors the backend's JSON contract one-to-one; the client never
//! invents fields and the stub server never omits them.

pub mod auth;
pub mod chat;
pub mod error;
pub mod paths;
pub mod task;

pub use auth::{AuthResponse, LoginRequest, RegisterRequest, User};
pub use error::ErrorBody;
pub use task::{Task, TaskCreate, TaskId, TaskListResponse, TaskToggle, TaskUpdate};

use thiserror::Error;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// Minimum allowed password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Client-side validation failures.
///
/// These block submission before any network call is made; they are
/// reported inline and never travel through the HTTP error path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {MAX_TITLE_LEN} characters)")]
    TitleTooLong,
    /// Task description exceeds the maximum length.
    #[error("task description too long (max {MAX_DESCRIPTION_LEN} characters)")]
    DescriptionTooLong,
    /// Email address is not plausibly valid.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// Password is shorter than the minimum length.
    #[error("password too short (min {MIN_PASSWORD_LEN} characters)")]
    PasswordTooShort,
    /// Password and confirmation do not match.
    #[error("passwords do not match")]
    PasswordMismatch,
}
