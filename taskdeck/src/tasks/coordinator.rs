//! Optimistic mutation coordinator for the task collection.
//!
//! Two destructive paths get optimistic treatment:
//!
//! - **toggle**: the local `completed` flag flips immediately, then a
//!   PATCH reconciles. Each task carries a generation counter; a
//!   settlement whose generation is no longer current is dropped, so
//!   rapid re-toggles converge on the last *intended* state rather than
//!   the last request to happen to settle.
//! - **delete**: guarded by a process-wide lock holding the id being
//!   deleted — an owned token, not a disabled button. A second delete
//!   while one is in flight is rejected. Success removes the task
//!   locally; failure keeps it and returns the error so the
//!   confirmation prompt stays open.
//!
//! Create and update are not optimistic: they validate locally, then
//! round-trip through the server before the view changes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use taskdeck_api::task::validate_draft;
use taskdeck_api::{Task, TaskCreate, TaskId, TaskListResponse, TaskUpdate};

use super::{MutationError, TaskListView};
use crate::api::ApiClient;

/// How a toggle invocation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server confirmed this toggle; the view holds its record.
    Applied(Task),
    /// A newer toggle for the same task was issued before this one
    /// settled; the settlement was dropped without touching the view.
    Superseded,
}

/// Applies optimistic task transitions and reconciles with the server.
pub struct MutationCoordinator {
    api: Arc<ApiClient>,
    view: TaskListView,
    /// Per-task toggle generation; a settlement is applied only if its
    /// captured generation is still current.
    toggle_gen: Mutex<HashMap<TaskId, u64>>,
    /// Id of the task whose delete is in flight, if any.
    delete_lock: Mutex<Option<TaskId>>,
}

impl MutationCoordinator {
    /// Creates a coordinator with an empty local view.
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            view: TaskListView::new(),
            toggle_gen: Mutex::new(HashMap::new()),
            delete_lock: Mutex::new(None),
        }
    }

    /// The local task view.
    #[must_use]
    pub fn view(&self) -> &TaskListView {
        &self.view
    }

    /// Reloads the collection from the server, replacing the view.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Api`] on any request failure; the view
    /// keeps its previous contents in that case.
    pub async fn refresh(&self, limit: u32, offset: u32) -> Result<TaskListResponse, MutationError> {
        let page = self.api.list_tasks(limit, offset).await?;
        self.view.replace(page.data.clone());
        Ok(page)
    }

    /// Flips a task's completion flag optimistically and reconciles.
    ///
    /// The flip is visible in the view before the request is issued. On
    /// a current-generation failure the flag is reverted before the
    /// error is returned, so the visible state never diverges from
    /// server truth. Stale settlements return
    /// [`ToggleOutcome::Superseded`] and leave the view alone.
    ///
    /// # Errors
    ///
    /// [`MutationError::UnknownTask`] if the task is not in the view;
    /// [`MutationError::Api`] if the request failed (already reverted).
    pub async fn toggle_completion(&self, id: &TaskId) -> Result<ToggleOutcome, MutationError> {
        let Some(previous) = self.view.get(id).map(|t| t.completed) else {
            return Err(MutationError::UnknownTask(id.clone()));
        };
        let desired = !previous;

        // Optimistic flip, tagged with a fresh generation.
        self.view.set_completed(id, desired);
        let generation = self.bump_generation(id);

        let result = self.api.toggle_task(id, desired).await;

        if !self.is_current_generation(id, generation) {
            // A newer toggle owns the task's state now.
            tracing::debug!(task = %id, "stale toggle settlement dropped");
            return Ok(ToggleOutcome::Superseded);
        }

        match result {
            Ok(task) => {
                self.view.upsert(task.clone());
                Ok(ToggleOutcome::Applied(task))
            }
            Err(e) => {
                tracing::warn!(task = %id, error = %e, "toggle failed, reverting");
                self.view.set_completed(id, previous);
                Err(e.into())
            }
        }
    }

    /// Deletes a task under the process-wide delete lock.
    ///
    /// # Errors
    ///
    /// [`MutationError::DeleteInFlight`] if another delete has not yet
    /// settled; [`MutationError::Api`] if the request failed — the task
    /// stays in the view and the lock is released either way.
    pub async fn delete(&self, id: &TaskId) -> Result<(), MutationError> {
        self.try_acquire_delete(id)?;

        let result = self.api.delete_task(id).await;
        self.release_delete();

        match result {
            Ok(()) => {
                self.view.remove(id);
                tracing::info!(task = %id, "task deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(task = %id, error = %e, "delete failed");
                Err(e.into())
            }
        }
    }

    /// Creates a task after pre-flight validation and appends the
    /// server's record to the view.
    ///
    /// # Errors
    ///
    /// [`MutationError::Validation`] before any network I/O;
    /// [`MutationError::Api`] on request failure.
    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, MutationError> {
        validate_draft(title, description)?;
        let draft = TaskCreate {
            title: title.to_string(),
            description: description.map(String::from),
        };
        let task = self.api.create_task(&draft).await?;
        self.view.upsert(task.clone());
        Ok(task)
    }

    /// Updates title/description/completed via the full round-trip path
    /// and installs the server's record.
    ///
    /// # Errors
    ///
    /// [`MutationError::Validation`] before any network I/O;
    /// [`MutationError::Api`] on request failure (view untouched).
    pub async fn update(&self, id: &TaskId, update: TaskUpdate) -> Result<Task, MutationError> {
        validate_draft(&update.title, update.description.as_deref())?;
        let task = self.api.update_task(id, &update).await?;
        self.view.upsert(task.clone());
        Ok(task)
    }

    fn bump_generation(&self, id: &TaskId) -> u64 {
        let mut gens = self.toggle_gen.lock();
        let entry = gens.entry(id.clone()).or_insert(0);
        *entry += 1;
        *entry
    }

    fn is_current_generation(&self, id: &TaskId, generation: u64) -> bool {
        self.toggle_gen.lock().get(id).copied() == Some(generation)
    }

    /// Acquires the delete lock for `id`.
    ///
    /// # Errors
    ///
    /// [`MutationError::DeleteInFlight`] with the pending task's id if
    /// the lock is held.
    fn try_acquire_delete(&self, id: &TaskId) -> Result<(), MutationError> {
        let mut lock = self.delete_lock.lock();
        if let Some(pending) = lock.as_ref() {
            return Err(MutationError::DeleteInFlight(pending.clone()));
        }
        *lock = Some(id.clone());
        Ok(())
    }

    fn release_delete(&self) {
        *self.delete_lock.lock() = None;
    }
}
