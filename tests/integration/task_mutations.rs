//! Integration tests for task CRUD and the optimistic mutation paths.
//!
//! Exercises the coordinator against the stub backend: toggle with
//! failure rollback, single-delete exclusivity, 204 delete settlement,
//! pre-flight validation, and per-user isolation.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use taskdeck::api::{ApiClient, ApiError};
use taskdeck::session::SessionStore;
use taskdeck::tasks::{MutationCoordinator, MutationError, ToggleOutcome};
use taskdeck_api::ValidationError;
use taskdeck_stub::server::start_server_with_state;
use taskdeck_stub::state::{StubEndpoint, StubState};

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
        "taskdeck-tasks-it-{}-{name}.json",
        std::process::id()
    ))
}

/// Registers, signs in, and wraps the client in a coordinator.
async fn signed_in_coordinator(base: &str, name: &str) -> (Arc<ApiClient>, MutationCoordinator) {
    let session = Arc::new(SessionStore::anonymous(session_path(name)));
    let (api, _events) =
        ApiClient::new(base, session, Duration::from_secs(5)).expect("failed to build HTTP client");
    let email = format!("{name}@example.com");
    api.register(&email, "password-123").await.unwrap();
    api.login(&email, "password-123").await.unwrap();
    let api = Arc::new(api);
    (Arc::clone(&api), MutationCoordinator::new(api))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_refresh_and_delete_round_trip() {
    let (_state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "round-trip").await;

    let task = coord.create("Buy milk", Some("2 liters")).await.unwrap();
    assert!(!task.completed);

    let page = coord.refresh(10, 0).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].title, "Buy milk");

    // 204 from the backend settles the delete cleanly.
    coord.delete(&task.id).await.unwrap();
    assert!(coord.view().is_empty());

    let err = api.get_task(&task.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 404, .. }));

    api.session().clear();
}

#[tokio::test]
async fn toggle_applies_optimistically_and_confirms() {
    let (_state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "toggle-ok").await;

    let task = coord.create("Water plants", None).await.unwrap();
    let outcome = coord.toggle_completion(&task.id).await.unwrap();

    match outcome {
        ToggleOutcome::Applied(confirmed) => assert!(confirmed.completed),
        ToggleOutcome::Superseded => panic!("single toggle cannot be superseded"),
    }
    assert_eq!(coord.view().get(&task.id).map(|t| t.completed), Some(true));
    assert!(api.get_task(&task.id).await.unwrap().completed);

    api.session().clear();
}

#[tokio::test]
async fn toggle_failure_reverts_the_local_flag() {
    let (state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "toggle-revert").await;

    let task = coord.create("Call the bank", None).await.unwrap();
    state.fail_next(StubEndpoint::ToggleTask, 500);

    let err = coord.toggle_completion(&task.id).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Api(ApiError::Http { status: 500, .. })
    ));

    // The optimistic flip was rolled back and the server never changed.
    assert_eq!(coord.view().get(&task.id).map(|t| t.completed), Some(false));
    assert!(!api.get_task(&task.id).await.unwrap().completed);

    api.session().clear();
}

#[tokio::test]
async fn rapid_toggles_converge_on_the_last_intent() {
    let (_state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "toggle-rapid").await;

    let task = coord.create("Pack bags", None).await.unwrap();
    let _ = coord.toggle_completion(&task.id).await.unwrap(); // -> done
    let _ = coord.toggle_completion(&task.id).await.unwrap(); // -> open

    assert_eq!(coord.view().get(&task.id).map(|t| t.completed), Some(false));
    assert!(!api.get_task(&task.id).await.unwrap().completed);

    api.session().clear();
}

#[tokio::test]
async fn failed_delete_keeps_the_task_and_releases_the_lock() {
    let (state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "delete-fail").await;

    let task = coord.create("Renew passport", None).await.unwrap();
    state.fail_next(StubEndpoint::DeleteTask, 500);

    let err = coord.delete(&task.id).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Api(ApiError::Http { status: 500, .. })
    ));

    // The task survives locally and on the server.
    assert!(coord.view().contains(&task.id));
    assert!(api.get_task(&task.id).await.is_ok());

    // The lock was released on failure: a retry goes through.
    coord.delete(&task.id).await.unwrap();
    assert!(!coord.view().contains(&task.id));

    api.session().clear();
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_backend() {
    let (_state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "validation").await;

    let empty = coord.create("   ", None).await.unwrap_err();
    assert!(matches!(
        empty,
        MutationError::Validation(ValidationError::TitleEmpty)
    ));

    let overlong = coord.create(&"x".repeat(256), None).await.unwrap_err();
    assert!(matches!(
        overlong,
        MutationError::Validation(ValidationError::TitleTooLong)
    ));

    // Nothing was created server-side.
    let page = coord.refresh(10, 0).await.unwrap();
    assert_eq!(page.total, 0);

    api.session().clear();
}

#[tokio::test]
async fn update_replaces_title_and_description() {
    let (_state, base) = start_backend().await;
    let (api, coord) = signed_in_coordinator(&base, "update").await;

    let task = coord.create("Old title", Some("old notes")).await.unwrap();
    let updated = coord
        .update(
            &task.id,
            taskdeck_api::TaskUpdate {
                title: "New title".to_string(),
                description: None,
                completed: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "New title");
    assert_eq!(updated.description, None);
    assert_eq!(
        coord.view().get(&task.id).map(|t| t.title),
        Some("New title".to_string())
    );

    api.session().clear();
}

#[tokio::test]
async fn tasks_are_invisible_across_users() {
    let (_state, base) = start_backend().await;
    let (api_a, coord_a) = signed_in_coordinator(&base, "owner").await;
    let (api_b, _coord_b) = signed_in_coordinator(&base, "stranger").await;

    let task = coord_a.create("Private errand", None).await.unwrap();

    // Ownership is hidden behind 404, indistinguishable from absence.
    let err = api_b.get_task(&task.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 404, .. }));

    api_a.session().clear();
    api_b.session().clear();
}
