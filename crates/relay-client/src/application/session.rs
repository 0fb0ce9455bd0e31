//! Session operations over a worker connection.
//!
//! Each operation builds the request payload from the session's credentials,
//! waits for the ack where the protocol defines one, and translates a
//! non-Ok status into [`SessionError::Refused`] so callers never inspect
//! raw status bytes.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

use relay_core::{
    decode_payload, AccountCreatePayload, ChannelReadPayload, ChannelsPayload,
    LoginLogoutPayload, MessageCreatePayload, MessageReadPayload, Name16, Operation, Payload,
    ResourceType, Status, UserReadPayload, SESSION_LOGIN, SESSION_LOGOUT,
};

use crate::infrastructure::network::{ConnectionError, WorkerConnection};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The worker answered with a non-Ok status.
    #[error("request refused with status {0:?}")]
    Refused(Status),

    /// The ack carried a payload of the wrong shape.
    #[error("unexpected payload in acknowledgement")]
    UnexpectedPayload,
}

impl SessionError {
    /// Whether the worker behind this session is gone and the caller should
    /// go back to the manager for a fresh assignment.
    ///
    /// A refused request or an odd payload means the worker is alive and
    /// answering; only socket-level trouble and missing acks count as loss.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            SessionError::Connection(
                ConnectionError::ConnectionLost
                    | ConnectionError::AckTimeout
                    | ConnectionError::Io(_)
                    | ConnectionError::Transport(_)
            )
        )
    }
}

/// A user's session against one worker.
pub struct Session {
    connection: WorkerConnection,
    username: Name16,
    password: Name16,
    client_ip: u32,
}

impl Session {
    pub fn new(connection: WorkerConnection, username: &str, password: &str) -> Self {
        Self {
            connection,
            username: Name16::new(username),
            password: Name16::new(password),
            // The worker sees the real source address on the socket; this
            // field mirrors what the UI displayed and is not authoritative.
            client_ip: 0,
        }
    }

    /// Creates the account and returns the worker-assigned account ID.
    pub async fn create_account(&self) -> Result<u8, SessionError> {
        let payload = Payload::AccountCreate(AccountCreatePayload {
            username: self.username,
            password: self.password,
            client_id: 0,
        });
        let body = self
            .checked(ResourceType::User, Operation::Create, &payload)
            .await?;
        match decode_payload(ResourceType::User, Operation::Create, &body) {
            Ok(Payload::AccountCreate(ack)) => {
                info!(account_id = ack.client_id, "account created");
                Ok(ack.client_id)
            }
            _ => Err(SessionError::UnexpectedPayload),
        }
    }

    pub async fn login(&self) -> Result<(), SessionError> {
        self.session_change(SESSION_LOGIN).await
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.session_change(SESSION_LOGOUT).await
    }

    async fn session_change(&self, status: u8) -> Result<(), SessionError> {
        let payload = Payload::LoginLogout(LoginLogoutPayload {
            username: self.username,
            password: self.password,
            client_ip: self.client_ip,
            status,
        });
        self.checked(ResourceType::User, Operation::Update, &payload)
            .await?;
        Ok(())
    }

    /// Looks up another user's account ID.
    pub async fn read_user(&self, target: &str) -> Result<u8, SessionError> {
        let payload = Payload::UserRead(UserReadPayload {
            username: self.username,
            password: self.password,
            target_username: Name16::new(target),
            user_id: 0,
        });
        let body = self
            .checked(ResourceType::User, Operation::Read, &payload)
            .await?;
        match decode_payload(ResourceType::User, Operation::Read, &body) {
            Ok(Payload::UserRead(ack)) => Ok(ack.user_id),
            _ => Err(SessionError::UnexpectedPayload),
        }
    }

    /// Reads a channel's member list.
    pub async fn read_channel(&self, name: &str, channel_id: u8) -> Result<Vec<u8>, SessionError> {
        let payload = Payload::ChannelRead(ChannelReadPayload {
            username: self.username,
            password: self.password,
            channel_name: Name16::new(name),
            channel_id,
            members: Vec::new(),
        });
        let body = self
            .checked(ResourceType::Channel, Operation::Read, &payload)
            .await?;
        match decode_payload(ResourceType::Channel, Operation::Read, &body) {
            Ok(Payload::ChannelRead(ack)) => Ok(ack.members),
            _ => Err(SessionError::UnexpectedPayload),
        }
    }

    /// Lists the channel IDs visible to this user.
    pub async fn list_channels(&self) -> Result<Vec<u8>, SessionError> {
        let payload = Payload::Channels(ChannelsPayload {
            username: self.username,
            password: self.password,
            channels: Vec::new(),
        });
        let body = self
            .checked(ResourceType::Channels, Operation::Update, &payload)
            .await?;
        match decode_payload(ResourceType::Channels, Operation::Update, &body) {
            Ok(Payload::Channels(ack)) => Ok(ack.channels),
            _ => Err(SessionError::UnexpectedPayload),
        }
    }

    /// Posts a message. Fire-and-forget: the protocol defines no ack for it.
    pub async fn send_message(&self, channel_id: u8, text: &str) -> Result<(), SessionError> {
        let payload = Payload::MessageCreate(MessageCreatePayload {
            username: self.username,
            password: self.password,
            timestamp: unix_now(),
            channel_id,
            text: text.as_bytes().to_vec(),
        });
        self.connection
            .send(ResourceType::Message, Operation::Create, &payload)
            .await?;
        Ok(())
    }

    /// Reads an archived message from a channel.
    pub async fn read_message(
        &self,
        channel_id: u8,
        timestamp: u64,
    ) -> Result<MessageReadPayload, SessionError> {
        let payload = Payload::MessageRead(MessageReadPayload {
            username: self.username,
            password: self.password,
            timestamp,
            channel_id,
            sender_user_id: 0,
            text: Vec::new(),
        });
        let body = self
            .checked(ResourceType::Message, Operation::Read, &payload)
            .await?;
        match decode_payload(ResourceType::Message, Operation::Read, &body) {
            Ok(Payload::MessageRead(ack)) => Ok(ack),
            _ => Err(SessionError::UnexpectedPayload),
        }
    }

    /// Sends a request, waits for the ack, and fails on a non-Ok status.
    async fn checked(
        &self,
        resource: ResourceType,
        operation: Operation,
        payload: &Payload,
    ) -> Result<Vec<u8>, SessionError> {
        let (header, body) = self.connection.request(resource, operation, payload).await?;
        match header.status_code() {
            Some(Status::Ok) => Ok(body),
            Some(status) => Err(SessionError::Refused(status)),
            None => Err(SessionError::UnexpectedPayload),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
