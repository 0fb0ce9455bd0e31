//! Relay worker server entry point.
//!
//! Wires the pieces together and starts the Tokio runtime:
//!
//! ```text
//! main()
//!  ├─ load ServerConfig (server.toml or first CLI argument)
//!  ├─ ManagerLink::run        -- background register/reconnect task
//!  ├─ ConnectionSupervisor    -- client accept loop (bind failure is fatal)
//!  └─ ctrl-c                  -- orderly shutdown
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_server::infrastructure::local_ip;
use relay_server::{
    load_config, AccountIdAllocator, ActivityLog, ConnectionSupervisor, Dispatcher, ManagerLink,
    NullDirectory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "server.toml".to_string());
    let config = load_config(Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;

    let advertised = local_ip::advertised_ipv4();
    info!(%advertised, manager = %config.manager.address, "relay server starting");

    let link = ManagerLink::new(
        config.manager.address.clone(),
        advertised,
        config.manager.reconnect_backoff(),
    );
    tokio::spawn(Arc::clone(&link).run());

    let activity = ActivityLog::new(Arc::clone(&link));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(AccountIdAllocator::new()),
        Arc::new(NullDirectory),
        activity.clone(),
    ));

    // The one fatal error: if the listener cannot bind there is no service.
    let supervisor = ConnectionSupervisor::bind(&config.network.listen_addr(), dispatcher, activity)
        .await
        .with_context(|| format!("binding client listener on {}", config.network.listen_addr()))?;

    tokio::select! {
        _ = supervisor.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("relay server stopped");
    Ok(())
}
