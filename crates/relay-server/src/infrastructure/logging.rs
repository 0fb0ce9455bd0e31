//! Activity logging.
//!
//! Every noteworthy event lands in the local `tracing` output; client-facing
//! events are additionally forwarded to the manager over the link so the
//! operator sees one merged stream. Forwarding is best-effort and never
//! blocks or fails a request.

use std::sync::Arc;

use tracing::info;

use super::manager_link::ManagerLink;

/// Which stream an activity line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogChannel {
    /// Server lifecycle: bind, shutdown, accept errors.
    Server,
    /// Client request traffic; forwarded to the manager.
    Client,
    /// Manager link lifecycle.
    Manager,
}

/// Shared activity logger handed to the dispatch and supervisor layers.
#[derive(Clone)]
pub struct ActivityLog {
    link: Arc<ManagerLink>,
}

impl ActivityLog {
    pub fn new(link: Arc<ManagerLink>) -> Self {
        Self { link }
    }

    pub async fn log(&self, channel: LogChannel, line: &str) {
        match channel {
            LogChannel::Server => info!(target: "relay_server::activity", "[SERVER] {line}"),
            LogChannel::Manager => info!(target: "relay_server::activity", "[MANAGER] {line}"),
            LogChannel::Client => {
                info!(target: "relay_server::activity", "[CLIENT] {line}");
                self.link.forward_log(line).await;
            }
        }
    }
}
