//! Integration tests for session persistence and 401-driven
//! invalidation.
//!
//! The session must survive a process restart via its on-disk copy, and
//! any authenticated endpoint answering 401 must converge the client to
//! the signed-out state: cleared token, removed file, and a
//! [`ClientEvent::SessionExpired`] for the rendering layer.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use taskdeck::api::{ApiClient, ApiError, ClientEvent};
use taskdeck::session::SessionStore;
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
        "taskdeck-session-it-{}-{name}.json",
        std::process::id()
    ))
}

/// Builds a client over an explicit session-file path, loading whatever
/// that file currently holds.
fn client_at(base: &str, path: &Path) -> (ApiClient, UnboundedReceiver<ClientEvent>) {
    let session = Arc::new(SessionStore::load(path));
    ApiClient::new(base, session, Duration::from_secs(5)).expect("failed to build HTTP client")
}

/// Registers and signs in a user, returning the issued token.
async fn sign_in(api: &ApiClient, email: &str) -> String {
    api.register(email, "password-123").await.unwrap();
    let auth = api.login(email, "password-123").await.unwrap();
    auth.access_token
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn persisted_session_survives_process_restart() {
    let (_state, base) = start_backend().await;
    let path = session_path("restart");

    // First "process": sign in, which persists the session file.
    {
        let (api, _events) = client_at(&base, &path);
        sign_in(&api, "alice@example.com").await;
    }

    // Second "process": loads the file and is authenticated without a
    // fresh login.
    let (api, _events) = client_at(&base, &path);
    assert!(api.session().is_authenticated());
    let page = api.list_tasks(10, 0).await.unwrap();
    assert_eq!(page.total, 0);

    api.session().clear();
}

#[tokio::test]
async fn revoked_token_converges_to_signed_out() {
    let (state, base) = start_backend().await;
    let path = session_path("revoked");
    let (api, mut events) = client_at(&base, &path);

    let token = sign_in(&api, "bob@example.com").await;

    // Server-side expiry: the token stops validating.
    state.revoke_token(&token);

    let err = api.list_tasks(10, 0).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));

    // Both stores are cleared and the rendering layer was told to
    // navigate to sign-in.
    assert!(!api.session().is_authenticated());
    assert!(!path.exists());
    assert_eq!(events.try_recv().ok(), Some(ClientEvent::SessionExpired));
}

#[tokio::test]
async fn anonymous_request_is_rejected_as_expired() {
    let (_state, base) = start_backend().await;
    let path = session_path("anonymous");
    let (api, mut events) = client_at(&base, &path);

    // No token is held, so none is attached; the backend's 401 drives
    // the same convergence path.
    let err = api.list_tasks(10, 0).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert!(!api.session().is_authenticated());
    assert_eq!(events.try_recv().ok(), Some(ClientEvent::SessionExpired));
}

#[tokio::test]
async fn requests_after_invalidation_stay_signed_out() {
    let (state, base) = start_backend().await;
    let path = session_path("stays-out");
    let (api, mut events) = client_at(&base, &path);

    let token = sign_in(&api, "carol@example.com").await;
    state.revoke_token(&token);

    let first = api.list_tasks(10, 0).await.unwrap_err();
    assert!(matches!(first, ApiError::SessionExpired));

    // The cleared session does not resurrect; a later call fails the
    // same way and emits another event.
    let second = api.list_tasks(10, 0).await.unwrap_err();
    assert!(matches!(second, ApiError::SessionExpired));
    assert_eq!(events.try_recv().ok(), Some(ClientEvent::SessionExpired));
    assert_eq!(events.try_recv().ok(), Some(ClientEvent::SessionExpired));
}

#[tokio::test]
async fn fresh_login_after_expiry_restores_access() {
    let (state, base) = start_backend().await;
    let path = session_path("relogin");
    let (api, _events) = client_at(&base, &path);

    let token = sign_in(&api, "dave@example.com").await;
    state.revoke_token(&token);
    let _ = api.list_tasks(10, 0).await.unwrap_err();

    // Signing in again issues a new token and access resumes.
    api.login("dave@example.com", "password-123").await.unwrap();
    assert!(api.session().is_authenticated());
    let page = api.list_tasks(10, 0).await.unwrap();
    assert_eq!(page.total, 0);

    api.session().clear();
}
