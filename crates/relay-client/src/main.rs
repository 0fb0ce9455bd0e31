//! Relay chat client entry point (headless).
//!
//! Runs the assignment-and-session loop for the life of the process: ask the
//! manager for the active worker, open a session against it, and whenever
//! that worker goes away fall back to the manager for a new assignment.
//! Session trouble never exits the process; only Ctrl-C does.

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relay_client::{acquire_connection, load_config, Session, SessionError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "client.toml".to_string());
    let config = load_config(Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;

    loop {
        let connection = acquire_connection(&config).await;
        let session = Session::new(connection, &config.user.username, &config.user.password);

        if let Err(e) = open_session(&session).await {
            if e.is_connection_loss() {
                warn!("worker connection lost: {e}; requesting a new assignment");
            } else {
                warn!("session setup failed: {e}; retrying");
            }
            tokio::time::sleep(config.manager.retry_backoff()).await;
            continue;
        }

        info!("session up; press Ctrl-C to log out and exit");
        tokio::signal::ctrl_c().await?;

        match session.logout().await {
            Ok(()) => info!("logged out"),
            Err(e) => warn!("logout failed: {e}"),
        }
        return Ok(());
    }
}

/// Brings one session up: account, login, a first look around.
async fn open_session(session: &Session) -> Result<(), SessionError> {
    let account_id = session.create_account().await?;
    info!(account_id, "account ready");
    session.login().await?;

    let channels = session.list_channels().await?;
    info!(?channels, "channels visible");
    session
        .send_message(
            channels.first().copied().unwrap_or(0),
            "hello from relay-client",
        )
        .await?;
    Ok(())
}
