//! Server bootstrap: bind, serve, and hand back the bound address.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::routes;
use crate::state::StubState;

/// Starts the stub with fresh empty state.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to `addr`.
pub async fn start_server(
    addr: &str,
) -> Result<(SocketAddr, JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>> {
    start_server_with_state(addr, Arc::new(StubState::new())).await
}

/// Starts the stub with pre-seeded state.
///
/// Tests keep their own `Arc` to the state so they can arm faults and
/// revoke tokens while the server runs. Bind to `127.0.0.1:0` to get an
/// OS-assigned port; the bound address is returned.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to `addr`.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<StubState>,
) -> Result<(SocketAddr, JoinHandle<()>), Box<dyn std::error::Error + Send + Sync>> {
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "stub server error");
        }
    });

    Ok((bound_addr, handle))
}
