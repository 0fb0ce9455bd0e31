//! Worker assignment: asking the manager which server to use.
//!
//! The exchange is a single short-lived connection: send a get-active-server
//! request with a zeroed payload, read the ack, hang up. An all-zero ack
//! means no worker is active right now; that is a retryable outcome, not an
//! error, and the caller must never dial 0.0.0.0.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use relay_core::{
    decode_payload, encode_payload, read_frame, write_frame, FrameHeader, Operation, Payload,
    RegisterPayload, ResourceType, Status, TransportError, MAX_PAYLOAD,
};

use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::network::WorkerConnection;

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("manager connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The manager answered with something other than a well-formed
    /// get-active-server ack.
    #[error("unexpected answer from manager: {0}")]
    UnexpectedAnswer(String),

    /// The manager refused the query.
    #[error("manager refused assignment query with status {0:?}")]
    Refused(Status),
}

/// Asks the manager for the active worker.
///
/// Returns `Ok(None)` when no worker is currently active.
pub async fn query_assignment(
    manager_addr: &str,
) -> Result<Option<(Ipv4Addr, u8)>, AssignmentError> {
    let mut stream = TcpStream::connect(manager_addr).await?;

    let header = FrameHeader::request(ResourceType::System, Operation::Read);
    let body = encode_payload(&Payload::Register(RegisterPayload::unassigned()));
    write_frame(&mut stream, &header, &body).await?;

    let (ack, ack_body) = read_frame(&mut stream, MAX_PAYLOAD)
        .await?
        .ok_or_else(|| AssignmentError::UnexpectedAnswer("closed without answering".into()))?;

    if !ack.is_ack
        || ack.resource_type() != Some(ResourceType::System)
        || ack.operation_kind() != Some(Operation::Read)
    {
        return Err(AssignmentError::UnexpectedAnswer(format!(
            "resource {:#04x} operation {:#03x} ack {}",
            ack.resource, ack.operation, ack.is_ack
        )));
    }
    match ack.status_code() {
        Some(Status::Ok) => {}
        Some(status) => return Err(AssignmentError::Refused(status)),
        None => {
            return Err(AssignmentError::UnexpectedAnswer(format!(
                "unknown status {:#04x}",
                ack.status
            )))
        }
    }

    let Ok(Payload::Register(assignment)) =
        decode_payload(ResourceType::System, Operation::Read, &ack_body)
    else {
        return Err(AssignmentError::UnexpectedAnswer(
            "malformed assignment payload".into(),
        ));
    };

    if assignment.is_unassigned() {
        debug!("manager has no active worker");
        return Ok(None);
    }
    Ok(Some((assignment.ip(), assignment.server_id)))
}

/// Acquires a connection to the currently active worker, retrying forever.
///
/// Every failure mode short of success — no active worker, a manager that is
/// down, an assigned worker that refuses the connect — is logged and retried
/// after the configured backoff. This is the loop the client re-enters
/// whenever it loses its worker.
pub async fn acquire_connection(config: &ClientConfig) -> WorkerConnection {
    loop {
        match query_assignment(&config.manager.address).await {
            Ok(Some((worker_ip, worker_id))) => {
                let addr = SocketAddr::from((worker_ip, config.worker.port));
                match WorkerConnection::connect(addr, config.worker.ack_timeout()).await {
                    Ok(connection) => {
                        info!(%addr, worker_id, "connected to assigned worker");
                        return connection;
                    }
                    Err(e) => warn!(%addr, "assigned worker refused the connection: {e}"),
                }
            }
            Ok(None) => info!("no active worker yet, retrying"),
            Err(e) => warn!("assignment query failed: {e}"),
        }
        tokio::time::sleep(config.manager.retry_backoff()).await;
    }
}
