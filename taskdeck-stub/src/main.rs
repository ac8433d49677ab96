//! taskdeck-stub — in-memory backend for development and tests.
//!
//! ```bash
//! # Run on the default address 127.0.0.1:8000
//! cargo run --bin taskdeck-stub
//!
//! # Run on a custom address
//! cargo run --bin taskdeck-stub -- --bind 127.0.0.1:9000
//! ```

use clap::Parser;

use taskdeck_stub::config::{StubCliArgs, StubConfig};
use taskdeck_stub::server;

#[tokio::main]
async fn main() {
    let cli = StubCliArgs::parse();

    let config = match StubConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskdeck stub backend");

    match server::start_server(&config.bind_addr).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "stub backend listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "stub server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start stub server");
            std::process::exit(1);
        }
    }
}
