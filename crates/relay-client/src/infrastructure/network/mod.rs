//! Client connection to an assigned worker.
//!
//! The stream is split: a background receive task completes outstanding
//! requests through one-shot slots keyed by (resource, operation), and the
//! write half sits behind a mutex so session operations can share the
//! connection. The protocol has no correlation ID, so at most one request
//! per (resource, operation) pair may be outstanding; the slot table
//! enforces that.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use relay_core::{
    encode_payload, read_frame, write_frame, FrameHeader, Operation, Payload, ResourceType,
    TransportError, MAX_PAYLOAD,
};

/// Errors surfaced to session operations.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A request for this (resource, operation) pair is already waiting for
    /// its ack; without correlation IDs a second one would be ambiguous.
    #[error("a {resource:?}/{operation:?} request is already in flight")]
    RequestInFlight {
        resource: ResourceType,
        operation: Operation,
    },

    /// No ack arrived within the configured window.
    #[error("timed out waiting for the ack")]
    AckTimeout,

    /// The worker went away while the request was outstanding.
    #[error("connection to the worker was lost")]
    ConnectionLost,
}

type AckSlot = oneshot::Sender<(FrameHeader, Vec<u8>)>;

/// Completion slots for outstanding requests.
#[derive(Default)]
struct PendingAcks {
    slots: StdMutex<HashMap<(u8, u8), AckSlot>>,
}

impl PendingAcks {
    fn register(
        &self,
        resource: ResourceType,
        operation: Operation,
    ) -> Result<oneshot::Receiver<(FrameHeader, Vec<u8>)>, ConnectionError> {
        let mut slots = self.slots.lock().expect("pending lock poisoned");
        let key = (resource as u8, operation as u8);
        if slots.contains_key(&key) {
            return Err(ConnectionError::RequestInFlight {
                resource,
                operation,
            });
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(key, tx);
        Ok(rx)
    }

    fn complete(&self, key: (u8, u8), frame: (FrameHeader, Vec<u8>)) -> bool {
        let slot = self.slots.lock().expect("pending lock poisoned").remove(&key);
        match slot {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    fn forget(&self, key: (u8, u8)) {
        self.slots.lock().expect("pending lock poisoned").remove(&key);
    }

    /// Drops every waiting sender; their receivers resolve to "lost".
    fn fail_all(&self) {
        self.slots.lock().expect("pending lock poisoned").clear();
    }
}

/// An open connection to a worker server.
pub struct WorkerConnection {
    writer: Mutex<OwnedWriteHalf>,
    pending: Arc<PendingAcks>,
    ack_timeout: Duration,
    recv_task: JoinHandle<()>,
}

impl WorkerConnection {
    pub async fn connect(addr: SocketAddr, ack_timeout: Duration) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        let pending = Arc::new(PendingAcks::default());
        let recv_task = tokio::spawn(receive_loop(reader, Arc::clone(&pending)));
        Ok(Self {
            writer: Mutex::new(writer),
            pending,
            ack_timeout,
            recv_task,
        })
    }

    /// Sends a request and waits for its ack.
    pub async fn request(
        &self,
        resource: ResourceType,
        operation: Operation,
        payload: &Payload,
    ) -> Result<(FrameHeader, Vec<u8>), ConnectionError> {
        let key = (resource as u8, operation as u8);
        let rx = self.pending.register(resource, operation)?;

        let header = FrameHeader::request(resource, operation);
        let body = encode_payload(payload);
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = write_frame(&mut *writer, &header, &body).await {
                self.pending.forget(key);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.ack_timeout, rx).await {
            Ok(Ok(frame)) => Ok(frame),
            Ok(Err(_)) => Err(ConnectionError::ConnectionLost),
            Err(_) => {
                self.pending.forget(key);
                Err(ConnectionError::AckTimeout)
            }
        }
    }

    /// Sends a request that gets no ack (posting a message).
    pub async fn send(
        &self,
        resource: ResourceType,
        operation: Operation,
        payload: &Payload,
    ) -> Result<(), ConnectionError> {
        let header = FrameHeader::request(resource, operation);
        let body = encode_payload(payload);
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &header, &body).await?;
        Ok(())
    }
}

impl Drop for WorkerConnection {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Reads acks off the wire and completes the matching slot.
async fn receive_loop(mut reader: OwnedReadHalf, pending: Arc<PendingAcks>) {
    loop {
        match read_frame(&mut reader, MAX_PAYLOAD).await {
            Ok(Some((header, body))) => {
                if !header.is_ack {
                    warn!(
                        resource = header.resource,
                        operation = header.operation,
                        "unexpected non-ack frame from worker, dropping"
                    );
                    continue;
                }
                let key = (header.resource, header.operation);
                if !pending.complete(key, (header, body)) {
                    debug!(?key, "ack with no waiting request, dropping");
                }
            }
            Ok(None) => {
                debug!("worker closed the connection");
                break;
            }
            Err(e) => {
                warn!("worker connection read failed: {e}");
                break;
            }
        }
    }
    pending.fail_all();
}
