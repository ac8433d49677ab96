//! In-memory state for the stub backend: users, sessions, tasks, and
//! conversations, plus one-shot fault injection for tests.
//!
//! Everything lives behind `parking_lot` locks; the stub is a fixture,
//! not a database. User isolation is enforced the way the real backend
//! does it: a foreign task id is indistinguishable from a missing one
//! (both are 404 at the route layer).

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use taskdeck_api::chat::{Conversation, MessageRecord, Role, ToolCall};
use taskdeck_api::{Task, TaskId, User};

/// Endpoint classes that can have faults armed against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubEndpoint {
    /// `POST /api/v1/auth/login`
    Login,
    /// `GET /api/v1/tasks`
    ListTasks,
    /// `POST /api/v1/tasks`
    CreateTask,
    /// `GET /api/v1/tasks/{id}`
    GetTask,
    /// `PUT /api/v1/tasks/{id}`
    UpdateTask,
    /// `PATCH /api/v1/tasks/{id}/complete`
    ToggleTask,
    /// `DELETE /api/v1/tasks/{id}`
    DeleteTask,
    /// `POST /api/v1/chat`
    Chat,
}

/// A registered account, password held in the clear (test fixture).
#[derive(Debug, Clone)]
struct StubUser {
    user: User,
    password: String,
}

/// A conversation plus its message log.
#[derive(Debug, Clone)]
pub struct StoredConversation {
    /// Conversation metadata as served to the client.
    pub meta: Conversation,
    /// Messages, oldest first.
    pub messages: Vec<MessageRecord>,
}

/// Shared stub server state.
#[derive(Default)]
pub struct StubState {
    /// Email -> account.
    users: RwLock<HashMap<String, StubUser>>,
    /// Bearer token -> user id.
    tokens: RwLock<HashMap<String, String>>,
    /// User id -> owned tasks, in creation order.
    tasks: RwLock<HashMap<String, Vec<Task>>>,
    /// Conversation id -> conversation.
    conversations: RwLock<HashMap<String, StoredConversation>>,
    /// Armed one-shot faults per endpoint class.
    faults: Mutex<HashMap<StubEndpoint, VecDeque<u16>>>,
}

impl StubState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Fault injection ----------------------------------------------------

    /// Arms a one-shot fault: the next request hitting `endpoint`
    /// (after authentication) fails with `status`.
    pub fn fail_next(&self, endpoint: StubEndpoint, status: u16) {
        self.faults
            .lock()
            .entry(endpoint)
            .or_default()
            .push_back(status);
    }

    /// Consumes an armed fault for `endpoint`, if any.
    #[must_use]
    pub fn take_fault(&self, endpoint: StubEndpoint) -> Option<u16> {
        self.faults
            .lock()
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
    }

    // -- Accounts and sessions ----------------------------------------------

    /// Registers an account. Returns the user record, or `None` when
    /// the email is already taken.
    #[must_use]
    pub fn register(&self, email: &str, password: &str) -> Option<User> {
        let mut users = self.users.write();
        if users.contains_key(email) {
            return None;
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        users.insert(
            email.to_string(),
            StubUser {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        Some(user)
    }

    /// Verifies credentials and issues an opaque bearer token.
    #[must_use]
    pub fn login(&self, email: &str, password: &str) -> Option<(String, User)> {
        let users = self.users.read();
        let account = users.get(email).filter(|a| a.password == password)?;
        let token = Uuid::new_v4().simple().to_string();
        self.tokens
            .write()
            .insert(token.clone(), account.user.id.clone());
        Some((token, account.user.clone()))
    }

    /// Resolves a bearer token to a user id.
    #[must_use]
    pub fn authenticate(&self, token: &str) -> Option<String> {
        self.tokens.read().get(token).cloned()
    }

    /// Invalidates a token, simulating server-side expiry. Later
    /// requests carrying it will see 401.
    pub fn revoke_token(&self, token: &str) {
        self.tokens.write().remove(token);
    }

    // -- Tasks --------------------------------------------------------------

    /// Creates a task owned by `user_id`.
    #[must_use]
    pub fn create_task(&self, user_id: &str, title: &str, description: Option<&str>) -> Task {
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: description.map(String::from),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        self.tasks
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(task.clone());
        task
    }

    /// Returns one page of `user_id`'s tasks plus the total count.
    #[must_use]
    pub fn list_tasks(&self, user_id: &str, limit: u32, offset: u32) -> (Vec<Task>, u64) {
        let tasks = self.tasks.read();
        let owned = tasks.get(user_id).map_or(&[][..], Vec::as_slice);
        let total = owned.len() as u64;
        let page = owned
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        (page, total)
    }

    /// Looks up a task, enforcing ownership: a foreign id reads as
    /// absent.
    #[must_use]
    pub fn get_task(&self, user_id: &str, id: &TaskId) -> Option<Task> {
        let tasks = self.tasks.read();
        tasks
            .get(user_id)?
            .iter()
            .find(|t| &t.id == id)
            .cloned()
    }

    /// Replaces title/description/completed on an owned task.
    #[must_use]
    pub fn update_task(
        &self,
        user_id: &str,
        id: &TaskId,
        title: &str,
        description: Option<&str>,
        completed: bool,
    ) -> Option<Task> {
        let mut tasks = self.tasks.write();
        let task = tasks.get_mut(user_id)?.iter_mut().find(|t| &t.id == id)?;
        task.title = title.to_string();
        task.description = description.map(String::from);
        task.completed = completed;
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    /// Sets only the completion flag on an owned task.
    #[must_use]
    pub fn toggle_task(&self, user_id: &str, id: &TaskId, completed: bool) -> Option<Task> {
        let mut tasks = self.tasks.write();
        let task = tasks.get_mut(user_id)?.iter_mut().find(|t| &t.id == id)?;
        task.completed = completed;
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    /// Removes an owned task. Returns whether anything was deleted.
    #[must_use]
    pub fn delete_task(&self, user_id: &str, id: &TaskId) -> bool {
        let mut tasks = self.tasks.write();
        let Some(owned) = tasks.get_mut(user_id) else {
            return false;
        };
        let before = owned.len();
        owned.retain(|t| &t.id != id);
        owned.len() != before
    }

    /// Finds an owned task by exact (case-insensitive) title. Used by
    /// the stub agent.
    #[must_use]
    pub fn find_task_by_title(&self, user_id: &str, title: &str) -> Option<Task> {
        let tasks = self.tasks.read();
        tasks
            .get(user_id)?
            .iter()
            .find(|t| t.title.eq_ignore_ascii_case(title))
            .cloned()
    }

    // -- Conversations ------------------------------------------------------

    /// Appends a user/agent exchange to a conversation, creating it if
    /// `conversation_id` is absent or unknown. Returns the conversation
    /// id and the agent message's id.
    pub fn record_exchange(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        user_message: &str,
        agent_response: &str,
        tool_calls: Vec<ToolCall>,
    ) -> (String, String) {
        let now = Utc::now();
        let mut conversations = self.conversations.write();

        let conv_id = conversation_id
            .filter(|id| {
                conversations
                    .get(*id)
                    .is_some_and(|c| c.meta.user_id == user_id)
            })
            .map_or_else(
                || {
                    let id = Uuid::new_v4().to_string();
                    let title: String = user_message.chars().take(60).collect();
                    conversations.insert(
                        id.clone(),
                        StoredConversation {
                            meta: Conversation {
                                id: id.clone(),
                                user_id: user_id.to_string(),
                                title,
                                created_at: now,
                                updated_at: now,
                                message_count: Some(0),
                            },
                            messages: Vec::new(),
                        },
                    );
                    id
                },
                String::from,
            );

        let agent_message_id = Uuid::new_v4().to_string();
        if let Some(conv) = conversations.get_mut(&conv_id) {
            conv.messages.push(MessageRecord {
                id: Uuid::new_v4().to_string(),
                conversation_id: conv_id.clone(),
                user_id: user_id.to_string(),
                role: Role::User,
                content: user_message.to_string(),
                tool_calls: Vec::new(),
                created_at: now,
            });
            conv.messages.push(MessageRecord {
                id: agent_message_id.clone(),
                conversation_id: conv_id.clone(),
                user_id: user_id.to_string(),
                role: Role::Agent,
                content: agent_response.to_string(),
                tool_calls,
                created_at: now,
            });
            conv.meta.updated_at = now;
            conv.meta.message_count = Some(conv.messages.len() as u64);
        }

        (conv_id, agent_message_id)
    }

    /// Lists `user_id`'s conversations, most recently active first.
    #[must_use]
    pub fn conversations(&self, user_id: &str) -> Vec<Conversation> {
        let conversations = self.conversations.read();
        let mut owned: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.meta.user_id == user_id)
            .map(|c| c.meta.clone())
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned
    }

    /// Returns one page of an owned conversation's messages plus the
    /// total count. A foreign conversation reads as absent.
    #[must_use]
    pub fn conversation_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        limit: u32,
        offset: u32,
    ) -> Option<(Vec<MessageRecord>, u64)> {
        let conversations = self.conversations.read();
        let conv = conversations
            .get(conversation_id)
            .filter(|c| c.meta.user_id == user_id)?;
        let total = conv.messages.len() as u64;
        let page = conv
            .messages
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Some((page, total))
    }
}
