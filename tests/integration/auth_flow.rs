//! Integration tests for registration and login against the stub
//! backend.
//!
//! Covers credential exchange, the login endpoint's failure shape, and
//! the rule that login failures never count as session expiry (there is
//! no session to expire yet).

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
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

/// Boots a stub backend on an OS-assigned port, returning its state and
/// base URL.
async fn start_backend() -> (Arc<StubState>, String) {
    let state = Arc::new(StubState::new());
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start stub backend");
    (state, format!("http://{addr}"))
}

fn session_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("taskdeck-auth-it-{}-{name}.json", std::process::id()))
}

/// Creates a client with a fresh anonymous session.
fn make_client(base: &str, name: &str) -> (ApiClient, UnboundedReceiver<ClientEvent>) {
    let session = Arc::new(SessionStore::anonymous(session_path(name)));
    ApiClient::new(base, session, Duration::from_secs(5)).expect("failed to build HTTP client")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_then_login_signs_in() {
    let (_state, base) = start_backend().await;
    let (api, _events) = make_client(&base, "register-login");

    let user = api
        .register("alice@example.com", "password-123")
        .await
        .unwrap();
    assert_eq!(user.email, "alice@example.com");

    let auth = api.login("alice@example.com", "password-123").await.unwrap();
    assert_eq!(auth.token_type, "Bearer");
    assert!(!auth.access_token.is_empty());
    assert!(api.session().is_authenticated());
    assert_eq!(
        api.session().user().map(|u| u.email),
        Some("alice@example.com".to_string())
    );

    api.session().clear();
}

#[tokio::test]
async fn register_alone_does_not_sign_in() {
    let (_state, base) = start_backend().await;
    let (api, _events) = make_client(&base, "register-only");

    api.register("bob@example.com", "password-123").await.unwrap();
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn duplicate_registration_is_rejected_with_detail() {
    let (_state, base) = start_backend().await;
    let (api, _events) = make_client(&base, "duplicate");

    api.register("carol@example.com", "password-123")
        .await
        .unwrap();
    let err = api
        .register("carol@example.com", "different-123")
        .await
        .unwrap_err();

    match err {
        ApiError::Server { status, detail, .. } => {
            assert_eq!(status, 400);
            assert!(detail.contains("already registered"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn wrong_password_is_a_server_error_not_session_expiry() {
    let (_state, base) = start_backend().await;
    let (api, mut events) = make_client(&base, "wrong-password");

    api.register("dave@example.com", "password-123")
        .await
        .unwrap();
    let err = api
        .login("dave@example.com", "wrong-password")
        .await
        .unwrap_err();

    // The login endpoint's own 401 carries the backend's message and
    // must not trip the expiry machinery.
    match err {
        ApiError::Server { status, detail, .. } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Incorrect email or password");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert!(!api.session().is_authenticated());
    assert!(events.try_recv().is_err(), "no expiry event expected");
}

#[tokio::test]
async fn logout_discards_session_locally() {
    let (_state, base) = start_backend().await;
    let (api, _events) = make_client(&base, "logout");

    api.register("erin@example.com", "password-123")
        .await
        .unwrap();
    api.login("erin@example.com", "password-123").await.unwrap();
    assert!(api.session().is_authenticated());

    api.logout();
    assert!(!api.session().is_authenticated());
    assert!(!api.session().path().exists());
}

#[tokio::test]
async fn each_login_issues_a_fresh_token() {
    let (_state, base) = start_backend().await;
    let (api, _events) = make_client(&base, "fresh-token");

    api.register("fred@example.com", "password-123")
        .await
        .unwrap();
    let first = api.login("fred@example.com", "password-123").await.unwrap();
    let second = api.login("fred@example.com", "password-123").await.unwrap();

    assert_ne!(first.access_token, second.access_token);
    // The session holds the most recent token.
    assert_eq!(api.session().token(), Some(second.access_token));

    api.session().clear();
}
