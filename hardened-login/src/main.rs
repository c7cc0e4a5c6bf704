//! # hardened-login
//!
//! Demo login server with a session-gated home page and hardened responses.
//!
//! ## Architecture
//!
//! - **Auth**: pluggable credential verifier; fixed demo pair or a TOML credentials file
//! - **Gate**: anonymous → authenticated session transition on a successful login
//! - **Sessions**: in-memory store with idle expiry and a background sweeper
//! - **HTTP**: Axum router behind an explicit middleware stack whose first stage
//!   sets security headers and hardens cookies on every response

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod auth;
mod config;
mod gate;
mod http;
mod session;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::auth::{CredentialVerifier, FileCredentials, FixedCredentials};
use crate::config::{AppConfig, Cli, CredentialSource};
use crate::gate::AccessGate;
use crate::http::{router, AppState};
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    let verifier: Arc<dyn CredentialVerifier> = match &config.credentials {
        CredentialSource::Demo => Arc::new(FixedCredentials::demo()),
        CredentialSource::AuthFile(path) => {
            Arc::new(FileCredentials::load(path).context("failed to load credentials file")?)
        }
    };
    let gate = AccessGate::new(verifier);

    info!(
        bind = %config.bind,
        credentials = %gate.verifier().describe(),
        session_idle = %humantime::format_duration(config.session_idle),
        sweep_interval = %humantime::format_duration(config.sweep_interval),
        "configuration loaded"
    );
    if config.credentials == CredentialSource::Demo {
        warn!("using built-in demo credentials; set --auth-file for real users");
    }

    let sessions = SessionStore::new(config.session_idle);
    spawn_session_sweeper(sessions.clone(), config.sweep_interval);

    let state = AppState { gate, sessions };

    let app = router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "hardened-login listening");

    serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

/// Spawns a background task that drops expired sessions on every tick.
fn spawn_session_sweeper(sessions: SessionStore, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired();
            if removed > 0 {
                debug!(removed, remaining = sessions.count(), "expired sessions swept");
            }
        }
    });
}
