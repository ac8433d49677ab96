//! Integration tests for the assistant chat flow.
//!
//! The stub's agent understands `add`, `complete`, `delete`, and `list`
//! and records a tool call per operation; these tests check that agent
//! mutations are visible through the normal task endpoints and that
//! conversation history accumulates correctly.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use taskdeck::api::{ApiClient, ApiError};
use taskdeck::assistant::Assistant;
use taskdeck::session::SessionStore;
use taskdeck_api::chat::{Role, ToolStatus};
use taskdeck_stub::server::start_server_with_state;
use taskdeck_stub::state::StubState;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

async fn start_backend() -> (Arc<StubState>, String) {
    let state = Arc::new(StubState::new());
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start stub backend");
    (state, format!("http://{addr}"))
}

fn session_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "taskdeck-chat-it-{}-{name}.json",
        std::process::id()
    ))
}

/// Registers, signs in, and wraps the client in an assistant handle.
async fn signed_in_assistant(base: &str, name: &str) -> (Arc<ApiClient>, Assistant) {
    let session = Arc::new(SessionStore::anonymous(session_path(name)));
    let (api, _events) =
        ApiClient::new(base, session, Duration::from_secs(5)).expect("failed to build HTTP client");
    let email = format!("{name}@example.com");
    api.register(&email, "password-123").await.unwrap();
    api.login(&email, "password-123").await.unwrap();
    let api = Arc::new(api);
    (Arc::clone(&api), Assistant::new(api))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn agent_created_task_appears_in_the_list() {
    let (_state, base) = start_backend().await;
    let (api, assistant) = signed_in_assistant(&base, "agent-add").await;

    let reply = assistant.send("add Buy milk", None).await.unwrap();
    assert!(reply.agent_response.contains("Buy milk"));
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "create_task");
    assert_eq!(reply.tool_calls[0].status, Some(ToolStatus::Completed));

    // Agent mutations are ordinary task mutations.
    let page = api.list_tasks(10, 0).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].title, "Buy milk");

    api.session().clear();
}

#[tokio::test]
async fn agent_completes_a_task_by_title() {
    let (_state, base) = start_backend().await;
    let (api, assistant) = signed_in_assistant(&base, "agent-complete").await;

    let _ = assistant.send("add Water plants", None).await.unwrap();
    let reply = assistant.send("complete water plants", None).await.unwrap();
    assert_eq!(reply.tool_calls[0].name, "complete_task");

    let page = api.list_tasks(10, 0).await.unwrap();
    assert!(page.data[0].completed);

    api.session().clear();
}

#[tokio::test]
async fn unknown_title_yields_a_failed_tool_call() {
    let (_state, base) = start_backend().await;
    let (api, assistant) = signed_in_assistant(&base, "agent-miss").await;

    let reply = assistant.send("delete Ghost task", None).await.unwrap();
    assert!(reply.agent_response.contains("couldn't find"));
    assert_eq!(reply.tool_calls[0].status, Some(ToolStatus::Failed));

    api.session().clear();
}

#[tokio::test]
async fn conversation_accumulates_history() {
    let (_state, base) = start_backend().await;
    let (api, assistant) = signed_in_assistant(&base, "agent-history").await;

    let first = assistant.send("add One", None).await.unwrap();
    let second = assistant
        .send("add Two", Some(&first.conversation_id))
        .await
        .unwrap();
    assert_eq!(first.conversation_id, second.conversation_id);

    let conversations = assistant.conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].message_count, Some(4));

    // Two exchanges, oldest first, roles alternating.
    let page = assistant
        .history(&first.conversation_id, 10, 0)
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.data[0].role, Role::User);
    assert_eq!(page.data[1].role, Role::Agent);
    assert_eq!(page.data[0].content, "add One");

    api.session().clear();
}

#[tokio::test]
async fn message_without_conversation_starts_a_new_one() {
    let (_state, base) = start_backend().await;
    let (api, assistant) = signed_in_assistant(&base, "agent-new-conv").await;

    let first = assistant.send("list", None).await.unwrap();
    let second = assistant.send("list", None).await.unwrap();
    assert_ne!(first.conversation_id, second.conversation_id);

    let conversations = assistant.conversations().await.unwrap();
    assert_eq!(conversations.len(), 2);

    api.session().clear();
}

#[tokio::test]
async fn chat_requires_authentication() {
    let (_state, base) = start_backend().await;
    let session = Arc::new(SessionStore::anonymous(session_path("agent-anon")));
    let (api, _events) =
        ApiClient::new(&base, session, Duration::from_secs(5)).expect("failed to build HTTP client");
    let assistant = Assistant::new(Arc::new(api));

    let err = assistant.send("add Sneaky task", None).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
}
