//! Optimistic task mutation on top of the authenticated API client.
//!
//! [`TaskListView`] holds the locally cached page of tasks;
//! [`MutationCoordinator`] applies optimistic transitions (toggle,
//! delete) against it and reconciles with server truth, rolling back
//! on failure.

pub mod coordinator;
pub mod view;

pub use coordinator::{MutationCoordinator, ToggleOutcome};
pub use view::TaskListView;

use taskdeck_api::{TaskId, ValidationError};

use crate::api::ApiError;

/// Errors surfaced by the mutation coordinator.
///
/// All of these are terminal for the one invocation that produced them:
/// no retry, no backoff, never process-fatal. By the time the caller
/// sees one, the local view has already been restored to match server
/// truth.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Pre-flight validation failed; no request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A delete is already in flight; at most one destructive action is
    /// surfaced at a time.
    #[error("a delete is already in flight for task {0}")]
    DeleteInFlight(TaskId),

    /// The task is not present in the local view.
    #[error("task not in local view: {0}")]
    UnknownTask(TaskId),

    /// The request failed; the optimistic change has been reverted.
    #[error(transparent)]
    Api(#[from] ApiError),
}
