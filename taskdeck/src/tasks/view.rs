//! Locally cached view of the caller's task collection.
//!
//! The view mirrors one fetched page of server records. It is never the
//! source of truth: the coordinator mutates it optimistically and then
//! reconciles against what the server actually returned.

use parking_lot::RwLock;

use taskdeck_api::{Task, TaskId};

/// Thread-safe in-memory task collection.
///
/// Ordering follows the server's listing order; optimistic edits keep
/// records in place so the rendering layer does not see rows jump.
#[derive(Default)]
pub struct TaskListView {
    tasks: RwLock<Vec<Task>>,
}

impl TaskListView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection with a freshly fetched page.
    pub fn replace(&self, tasks: Vec<Task>) {
        *self.tasks.write() = tasks;
    }

    /// Returns a snapshot of the collection.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().iter().find(|t| &t.id == id).cloned()
    }

    /// Returns whether a task with the given id is present.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.read().iter().any(|t| &t.id == id)
    }

    /// Number of tasks currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Sets the completion flag, returning the previous value if the
    /// task exists.
    pub fn set_completed(&self, id: &TaskId, completed: bool) -> Option<bool> {
        let mut tasks = self.tasks.write();
        let task = tasks.iter_mut().find(|t| &t.id == id)?;
        let previous = task.completed;
        task.completed = completed;
        Some(previous)
    }

    /// Replaces an existing record in place, or appends it.
    pub fn upsert(&self, task: Task) {
        let mut tasks = self.tasks.write();
        if let Some(existing) = tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            tasks.push(task);
        }
    }

    /// Removes a task, returning it if it was present.
    pub fn remove(&self, id: &TaskId) -> Option<Task> {
        let mut tasks = self.tasks.write();
        let idx = tasks.iter().position(|t| &t.id == id)?;
        Some(tasks.remove(idx))
    }
}
