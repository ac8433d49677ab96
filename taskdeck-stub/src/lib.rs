//! In-memory stand-in for the taskdeck backend.
//!
//! Serves the same REST surface as the production API (auth, task CRUD,
//! completion toggle, chat agent) from process-local state. Used as a
//! development server and as the fixture the client's integration tests
//! run against; [`state::StubState::fail_next`] lets tests arm one-shot
//! failures per endpoint.

pub mod agent;
pub mod config;
pub mod routes;
pub mod server;
pub mod state;
