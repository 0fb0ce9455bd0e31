//! Client-facing listener: accept loop and per-connection frame service.
//!
//! Each accepted socket gets its own task running frames sequentially
//! through admission and dispatch. Rejections are per-frame: the connection
//! survives an invalid request. Only framing damage (a declared length the
//! transport refuses, a mid-frame EOF) closes it.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use relay_core::{
    read_frame, validate_request, write_frame, FrameHeader, Status, TransportError, MAX_PAYLOAD,
};

use crate::application::dispatch::Dispatcher;
use crate::infrastructure::logging::{ActivityLog, LogChannel};

/// Owns the listening socket and fans connections out to tasks.
pub struct ConnectionSupervisor {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    activity: ActivityLog,
}

impl ConnectionSupervisor {
    /// Binds the client-facing listener. Failure here is fatal to the
    /// process; everything after bind degrades per-connection instead.
    pub async fn bind(
        addr: &str,
        dispatcher: Arc<Dispatcher>,
        activity: ActivityLog,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            dispatcher,
            activity,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the task is dropped.
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            self.activity
                .log(LogChannel::Server, &format!("listening on {addr}"))
                .await;
        }
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    info!(%peer, "client connected");
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, dispatcher).await {
                            debug!(%peer, "connection ended with error: {e}");
                        }
                        info!(%peer, "client disconnected");
                    });
                }
                Err(e) => {
                    // Transient accept failures (fd exhaustion and the like)
                    // must not take the listener down.
                    warn!("accept failed: {e}");
                }
            }
        }
    }
}

/// Serves one client connection, frame by frame, until it closes.
async fn serve_connection(
    mut stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), TransportError> {
    loop {
        match read_frame(&mut stream, MAX_PAYLOAD).await {
            Ok(Some((header, body))) => {
                match validate_request(&header, MAX_PAYLOAD) {
                    Ok((resource, operation)) => {
                        if let Some((ack, payload)) =
                            dispatcher.dispatch(resource, operation, &body).await
                        {
                            write_frame(&mut stream, &ack, &payload).await?;
                        }
                    }
                    Err(status) => {
                        // Header-only refusal echoing the raw request bits;
                        // the stream is still framed, so keep serving it.
                        debug!(
                            resource = header.resource,
                            operation = header.operation,
                            ?status,
                            "request refused"
                        );
                        let ack = FrameHeader::ack_raw(header.resource, header.operation, status);
                        write_frame(&mut stream, &ack, &[]).await?;
                    }
                }
            }
            Ok(None) => return Ok(()),
            Err(TransportError::PayloadTooLarge {
                resource,
                operation,
                declared,
                ..
            }) => {
                // The declared payload will never be consumed, so framing is
                // lost. Tell the peer why, then close.
                debug!(declared, "refusing frame larger than receive capacity");
                let ack = FrameHeader::ack_raw(resource, operation, Status::InvalidSize);
                let _ = write_frame(&mut stream, &ack, &[]).await;
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}
