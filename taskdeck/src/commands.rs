//! Command handlers: wire config, session, and client together and
//! render results to the terminal.
//!
//! This is the rendering layer over the client core. It owns no
//! protocol logic: every operation goes through [`ApiClient`],
//! [`MutationCoordinator`], or [`Assistant`], and every failure is
//! printed, never panicked on.

use std::sync::Arc;

use tokio::sync::mpsc;

use taskdeck_api::auth::validate_registration;
use taskdeck_api::chat::ToolCall;
use taskdeck_api::{Task, TaskId, TaskUpdate, ValidationError};

use crate::api::{ApiClient, ApiError, ClientEvent};
use crate::assistant::{Assistant, DEFAULT_HISTORY_PAGE};
use crate::cli::Command;
use crate::config::ClientConfig;
use crate::session::SessionStore;
use crate::tasks::{MutationCoordinator, MutationError, ToggleOutcome};

/// Failures surfaced by a command invocation.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No live session, and the command needs one.
    #[error("not signed in — run `taskdeck login <email> <password>` first")]
    NotSignedIn,

    /// Pre-flight validation failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A task mutation failed.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// The HTTP client could not be constructed.
    #[error("failed to initialize HTTP client: {0}")]
    Init(#[from] reqwest::Error),
}

/// Runs one CLI command against the configured backend.
///
/// # Errors
///
/// Returns [`CommandError`]; the caller prints it and exits non-zero.
pub async fn run(config: &ClientConfig, command: Command) -> Result<(), CommandError> {
    let session = Arc::new(SessionStore::load(&config.session_file));
    let (api, mut events) =
        ApiClient::new(config.api_url.clone(), session, config.request_timeout)?;
    let api = Arc::new(api);

    let result = dispatch(config, &api, command).await;
    drain_events(&mut events);
    result
}

async fn dispatch(
    config: &ClientConfig,
    api: &Arc<ApiClient>,
    command: Command,
) -> Result<(), CommandError> {
    match command {
        Command::Login { email, password } => {
            let auth = api.login(&email, &password).await?;
            println!("Signed in as {}", auth.user.email);
            Ok(())
        }
        Command::Register {
            email,
            password,
            confirm,
        } => {
            let confirm = confirm.as_deref().unwrap_or(&password);
            validate_registration(&email, &password, confirm)?;
            let user = api.register(&email, &password).await?;
            println!("Account created for {}. Sign in with `taskdeck login`.", user.email);
            Ok(())
        }
        Command::Logout => {
            api.logout();
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            require_session(api)?;
            match api.session().user() {
                Some(user) => println!("{} ({})", user.email, user.id),
                None => println!("Signed in (no cached profile)."),
            }
            Ok(())
        }
        Command::List { limit, offset } => {
            require_session(api)?;
            let coordinator = MutationCoordinator::new(Arc::clone(api));
            let page = coordinator
                .refresh(limit.unwrap_or(config.page_size), offset)
                .await?;
            if page.data.is_empty() {
                println!("No tasks yet.");
            } else {
                for task in &page.data {
                    print_task_row(task, &config.timestamp_format);
                }
                println!(
                    "Showing {} of {} (offset {})",
                    page.data.len(),
                    page.total,
                    page.offset
                );
            }
            Ok(())
        }
        Command::Show { id } => {
            require_session(api)?;
            let task = api.get_task(&TaskId::new(id)).await?;
            print_task_detail(&task, &config.timestamp_format);
            Ok(())
        }
        Command::Add { title, description } => {
            require_session(api)?;
            let coordinator = MutationCoordinator::new(Arc::clone(api));
            let task = coordinator.create(&title, description.as_deref()).await?;
            println!("Created {} — {}", task.id, task.title);
            Ok(())
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            require_session(api)?;
            let id = TaskId::new(id);
            // Seed the coordinator's view so completion is preserved.
            let current = api.get_task(&id).await?;
            let coordinator = MutationCoordinator::new(Arc::clone(api));
            coordinator.view().upsert(current.clone());
            let task = coordinator
                .update(
                    &id,
                    TaskUpdate {
                        title,
                        description,
                        completed: current.completed,
                    },
                )
                .await?;
            println!("Updated {} — {}", task.id, task.title);
            Ok(())
        }
        Command::Toggle { id } => {
            require_session(api)?;
            let id = TaskId::new(id);
            let current = api.get_task(&id).await?;
            let coordinator = MutationCoordinator::new(Arc::clone(api));
            coordinator.view().upsert(current);
            match coordinator.toggle_completion(&id).await? {
                ToggleOutcome::Applied(task) => {
                    let state = if task.completed { "done" } else { "open" };
                    println!("{} is now {state}", task.id);
                }
                ToggleOutcome::Superseded => {
                    // Cannot happen for a single CLI toggle, but the
                    // contract allows it.
                    println!("Toggle superseded by a newer one.");
                }
            }
            Ok(())
        }
        Command::Rm { id } => {
            require_session(api)?;
            let id = TaskId::new(id);
            let current = api.get_task(&id).await?;
            let coordinator = MutationCoordinator::new(Arc::clone(api));
            coordinator.view().upsert(current);
            coordinator.delete(&id).await?;
            println!("Deleted {id}");
            Ok(())
        }
        Command::Chat {
            message,
            conversation,
        } => {
            require_session(api)?;
            let assistant = Assistant::new(Arc::clone(api));
            let reply = assistant.send(&message, conversation.as_deref()).await?;
            println!("{}", reply.agent_response);
            for call in &reply.tool_calls {
                print_tool_call(call);
            }
            println!("(conversation {})", reply.conversation_id);
            Ok(())
        }
        Command::Conversations => {
            require_session(api)?;
            let assistant = Assistant::new(Arc::clone(api));
            let conversations = assistant.conversations().await?;
            if conversations.is_empty() {
                println!("No conversations yet.");
            }
            for c in conversations {
                let count = c
                    .message_count
                    .map_or(String::new(), |n| format!(" ({n} messages)"));
                println!(
                    "{}  {}  {}{count}",
                    c.id,
                    c.updated_at.format(&config.timestamp_format),
                    c.title
                );
            }
            Ok(())
        }
        Command::Messages { id, limit, offset } => {
            require_session(api)?;
            let assistant = Assistant::new(Arc::clone(api));
            let page = assistant
                .history(&id, limit.unwrap_or(DEFAULT_HISTORY_PAGE), offset)
                .await?;
            for msg in &page.data {
                let role = match msg.role {
                    taskdeck_api::chat::Role::User => "you",
                    taskdeck_api::chat::Role::Agent => "assistant",
                };
                println!(
                    "[{}] {role}: {}",
                    msg.created_at.format(&config.timestamp_format),
                    msg.content
                );
                for call in &msg.tool_calls {
                    print_tool_call(call);
                }
            }
            println!("Showing {} of {}", page.data.len(), page.total);
            Ok(())
        }
    }
}

/// Advisory pre-flight check: fail fast with a usable hint when no
/// session is held. The backend's own 401 remains the real boundary.
fn require_session(api: &ApiClient) -> Result<(), CommandError> {
    if api.session().is_authenticated() {
        Ok(())
    } else {
        Err(CommandError::NotSignedIn)
    }
}

/// Prints any events the core emitted during the command, most notably
/// the session-expiry notice (the terminal's "redirect to login").
fn drain_events(events: &mut mpsc::UnboundedReceiver<ClientEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            ClientEvent::SessionExpired => {
                eprintln!("Session expired. Run `taskdeck login <email> <password>` to sign in again.");
            }
        }
    }
}

fn print_task_row(task: &Task, timestamp_format: &str) {
    let mark = if task.completed { "x" } else { " " };
    println!(
        "[{mark}] {}  {}  {}",
        task.id,
        task.created_at.format(timestamp_format),
        task.title
    );
}

fn print_task_detail(task: &Task, timestamp_format: &str) {
    let state = if task.completed { "done" } else { "open" };
    println!("{} — {} [{state}]", task.id, task.title);
    if let Some(description) = &task.description {
        println!("{description}");
    }
    println!(
        "created {}  updated {}",
        task.created_at.format(timestamp_format),
        task.updated_at.format(timestamp_format)
    );
}

fn print_tool_call(call: &ToolCall) {
    let status = call
        .status
        .map_or(String::new(), |s| format!(" [{s:?}]").to_lowercase());
    println!("  · {}{status}: {}", call.name, call.input);
}
