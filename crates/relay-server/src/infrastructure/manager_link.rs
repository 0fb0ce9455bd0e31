//! The server's persistent connection to the manager.
//!
//! The link runs as one background task for the lifetime of the process:
//! connect, register, serve manager frames, and on any failure fall back to
//! reconnecting with a fixed backoff. Client traffic never waits on this
//! link; log forwarding is best-effort and silently skipped while the link
//! is down.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use relay_core::{
    decode_payload, encode_payload, read_frame, write_frame, FrameHeader, LogPayload, Operation,
    Payload, RegisterPayload, ResourceType, Status, MAX_PAYLOAD,
};

/// Where the link currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No manager connection; nothing is forwarded.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and the register request has been sent.
    Registered,
    /// The manager has activated this server for client assignment.
    Active,
}

struct Shared {
    writer: Option<OwnedWriteHalf>,
    state: LinkState,
}

/// Handle to the manager connection shared by the dispatch path (for log
/// forwarding) and the background `run` task.
pub struct ManagerLink {
    manager_addr: String,
    advertised_ip: Ipv4Addr,
    backoff: Duration,
    shared: Mutex<Shared>,
    server_id: AtomicU8,
}

impl ManagerLink {
    pub fn new(manager_addr: String, advertised_ip: Ipv4Addr, backoff: Duration) -> Arc<Self> {
        Arc::new(Self {
            manager_addr,
            advertised_ip,
            backoff,
            shared: Mutex::new(Shared {
                writer: None,
                state: LinkState::Disconnected,
            }),
            server_id: AtomicU8::new(0),
        })
    }

    /// The manager-assigned server ID; 0 until the first register ack.
    pub fn server_id(&self) -> u8 {
        self.server_id.load(Ordering::Relaxed)
    }

    pub async fn state(&self) -> LinkState {
        self.shared.lock().await.state
    }

    /// Runs the connect/register/serve/reconnect loop forever.
    pub async fn run(self: Arc<Self>) {
        loop {
            self.set_state(LinkState::Connecting).await;

            let stream = match TcpStream::connect(&self.manager_addr).await {
                Ok(s) => s,
                Err(e) => {
                    debug!(addr = %self.manager_addr, "manager connect failed: {e}");
                    self.reset().await;
                    tokio::time::sleep(self.backoff).await;
                    continue;
                }
            };
            let (mut reader, mut writer) = stream.into_split();

            // Register immediately; the first registration carries ID 0 and
            // the manager's ack assigns the real one. After a reconnect the
            // previously assigned ID is re-announced.
            let register = Payload::Register(RegisterPayload {
                server_ip: u32::from(self.advertised_ip),
                server_id: self.server_id(),
            });
            let header = FrameHeader::request(ResourceType::System, Operation::Create);
            if let Err(e) = write_frame(&mut writer, &header, &encode_payload(&register)).await {
                warn!("manager register send failed: {e}");
                self.reset().await;
                tokio::time::sleep(self.backoff).await;
                continue;
            }

            {
                let mut shared = self.shared.lock().await;
                shared.writer = Some(writer);
                shared.state = LinkState::Registered;
            }
            info!(addr = %self.manager_addr, "registered with manager");

            loop {
                match read_frame(&mut reader, MAX_PAYLOAD).await {
                    Ok(Some((header, body))) => self.handle_manager_frame(&header, &body).await,
                    Ok(None) => {
                        info!("manager closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("manager link read failed: {e}");
                        break;
                    }
                }
            }

            self.reset().await;
            tokio::time::sleep(self.backoff).await;
        }
    }

    /// Forwards one log line to the manager. Best-effort: dropped without a
    /// trace when the link is not up.
    pub async fn forward_log(&self, line: &str) {
        let mut shared = self.shared.lock().await;
        if !matches!(shared.state, LinkState::Registered | LinkState::Active) {
            return;
        }
        let Some(writer) = shared.writer.as_mut() else {
            return;
        };

        let payload = encode_payload(&Payload::Log(LogPayload {
            server_id: self.server_id(),
            text: line.as_bytes().to_vec(),
        }));
        let header = FrameHeader::request(ResourceType::Log, Operation::Create);
        if let Err(e) = write_frame(writer, &header, &payload).await {
            // The read side of the loop will notice the broken stream and
            // reconnect; here we only stop writing into it.
            debug!("log forward failed: {e}");
            shared.writer = None;
        }
    }

    async fn handle_manager_frame(&self, header: &FrameHeader, body: &[u8]) {
        match (header.resource_type(), header.operation_kind(), header.is_ack) {
            // Register ack: adopt the assigned ID.
            (Some(ResourceType::System), Some(Operation::Create), true) => {
                match decode_payload(ResourceType::System, Operation::Create, body) {
                    Ok(Payload::Register(ack)) => {
                        self.server_id.store(ack.server_id, Ordering::Relaxed);
                        info!(server_id = ack.server_id, "manager assigned server id");
                    }
                    Ok(_) | Err(_) => warn!("malformed register ack from manager"),
                }
            }
            // Activation: the manager selects this server to receive clients.
            // Answer with our address so it can hand it out, then go active.
            (Some(ResourceType::System), Some(Operation::Update), false) => {
                if let Ok(Payload::Register(req)) =
                    decode_payload(ResourceType::System, Operation::Update, body)
                {
                    if req.server_id != 0 {
                        self.server_id.store(req.server_id, Ordering::Relaxed);
                    }
                }
                let payload = encode_payload(&Payload::Register(RegisterPayload {
                    server_ip: u32::from(self.advertised_ip),
                    server_id: self.server_id(),
                }));
                let header = FrameHeader::ack(ResourceType::System, Operation::Update, Status::Ok);
                let mut shared = self.shared.lock().await;
                if let Some(writer) = shared.writer.as_mut() {
                    if let Err(e) = write_frame(writer, &header, &payload).await {
                        warn!("activation ack send failed: {e}");
                        shared.writer = None;
                        return;
                    }
                }
                shared.state = LinkState::Active;
                info!(server_id = self.server_id(), "activated by manager");
            }
            // Anything else is tolerated so a newer manager does not kill
            // the link.
            _ => {
                warn!(
                    resource = header.resource,
                    operation = header.operation,
                    is_ack = header.is_ack,
                    "unexpected frame from manager"
                );
            }
        }
    }

    async fn set_state(&self, state: LinkState) {
        self.shared.lock().await.state = state;
    }

    async fn reset(&self) {
        let mut shared = self.shared.lock().await;
        shared.writer = None;
        shared.state = LinkState::Disconnected;
    }
}
