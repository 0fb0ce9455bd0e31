//! Request dispatch: maps admitted (resource, operation) pairs to handlers.
//!
//! The dispatcher only ever sees frames that passed admission, so the pair is
//! already typed and the payload length already bounded. Its contract with
//! the supervisor is narrow: `dispatch` returns the ack to send, or `None`
//! when the interaction has no reply (posting a message).
//!
//! Handler faults never kill the connection. A payload that does not parse
//! is answered with `MalformedRequest`; a directory failure with
//! `InternalError`; both as header-only acks.

use std::sync::Arc;

use tracing::warn;

use relay_core::{
    decode_payload, encode_payload, AccountCreatePayload, ChannelReadPayload, ChannelsPayload,
    FrameHeader, LoginLogoutPayload, MessageCreatePayload, MessageReadPayload, Operation, Payload,
    ResourceType, Status, UserReadPayload, SESSION_LOGIN, SESSION_LOGOUT,
};

use crate::application::allocator::AccountIdAllocator;
use crate::infrastructure::logging::{ActivityLog, LogChannel};
use crate::infrastructure::storage::{Directory, DirectoryError};

/// Shared request dispatcher; one instance serves every connection task.
pub struct Dispatcher {
    allocator: Arc<AccountIdAllocator>,
    directory: Arc<dyn Directory>,
    activity: ActivityLog,
}

impl Dispatcher {
    pub fn new(
        allocator: Arc<AccountIdAllocator>,
        directory: Arc<dyn Directory>,
        activity: ActivityLog,
    ) -> Self {
        Self {
            allocator,
            directory,
            activity,
        }
    }

    /// Handles one admitted request and returns the ack to send back, if any.
    pub async fn dispatch(
        &self,
        resource: ResourceType,
        operation: Operation,
        body: &[u8],
    ) -> Option<(FrameHeader, Vec<u8>)> {
        let payload = match decode_payload(resource, operation, body) {
            Ok(p) => p,
            Err(e) => {
                warn!(?resource, ?operation, "request payload rejected: {e}");
                return Some((
                    FrameHeader::ack(resource, operation, Status::MalformedRequest),
                    Vec::new(),
                ));
            }
        };

        let outcome = match payload {
            Payload::AccountCreate(p) => self.create_account(p).await.map(Some),
            Payload::LoginLogout(p) => self.login_logout(p).await.map(Some),
            Payload::UserRead(p) => self.read_user(p).await.map(Some),
            Payload::ChannelRead(p) => self.read_channel(p).await.map(Some),
            Payload::Channels(p) => self.list_channels(p).await.map(Some),
            // Posts never get a reply, success or failure; an ack here would
            // be mis-correlated with the sender's next Message request.
            Payload::MessageCreate(p) => {
                if let Err(e) = self.post_message(p).await {
                    warn!("message post failed: {e}");
                }
                return None;
            }
            Payload::MessageRead(p) => self.read_message(p).await.map(Some),
            // System and Log frames never reach the dispatcher; admission
            // rejects them on the client path.
            Payload::Register(_) | Payload::Log(_) => {
                return Some((
                    FrameHeader::ack(resource, operation, Status::InvalidType),
                    Vec::new(),
                ));
            }
        };

        match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(?resource, ?operation, "handler failed: {e}");
                Some((
                    FrameHeader::ack(resource, operation, Status::InternalError),
                    Vec::new(),
                ))
            }
        }
    }

    /// User/Create: assign the next account ID and echo the payload with it.
    /// A drained ID space is answered with `ResourceExhausted`.
    async fn create_account(
        &self,
        request: AccountCreatePayload,
    ) -> Result<(FrameHeader, Vec<u8>), DirectoryError> {
        let Some(account_id) = self.allocator.allocate() else {
            warn!("account id space exhausted");
            return Ok((
                FrameHeader::ack(
                    ResourceType::User,
                    Operation::Create,
                    Status::ResourceExhausted,
                ),
                Vec::new(),
            ));
        };
        self.activity
            .log(
                LogChannel::Client,
                &format!("[CREATE]  user: {} id: {account_id}", request.username),
            )
            .await;

        let ack = AccountCreatePayload {
            client_id: account_id,
            ..request
        };
        Ok(self.ok(
            ResourceType::User,
            Operation::Create,
            &Payload::AccountCreate(ack),
        ))
    }

    /// User/Update: login or logout. Credentials are not verified against a
    /// store; the request is acknowledged and the session change logged.
    async fn login_logout(
        &self,
        request: LoginLogoutPayload,
    ) -> Result<(FrameHeader, Vec<u8>), DirectoryError> {
        let action = match request.status {
            SESSION_LOGIN => "[LOGIN]",
            SESSION_LOGOUT => "[LOGOUT]",
            other => {
                warn!(status = other, "unknown session status, acknowledging anyway");
                "[SESSION]"
            }
        };
        self.activity
            .log(
                LogChannel::Client,
                &format!("{action}  user: {}", request.username),
            )
            .await;

        Ok(self.ok(
            ResourceType::User,
            Operation::Update,
            &Payload::LoginLogout(request),
        ))
    }

    /// User/Read: fill the target's account ID from the directory, echoing
    /// the requested slot when the directory resolves nothing.
    async fn read_user(
        &self,
        request: UserReadPayload,
    ) -> Result<(FrameHeader, Vec<u8>), DirectoryError> {
        let user_id = self
            .directory
            .lookup_user_id(&request.target_username)?
            .unwrap_or(request.user_id);
        self.activity
            .log(
                LogChannel::Client,
                &format!("[READ]    user: {}", request.target_username),
            )
            .await;

        let ack = UserReadPayload { user_id, ..request };
        Ok(self.ok(ResourceType::User, Operation::Read, &Payload::UserRead(ack)))
    }

    /// Channel/Read: fill the member list from the directory.
    async fn read_channel(
        &self,
        request: ChannelReadPayload,
    ) -> Result<(FrameHeader, Vec<u8>), DirectoryError> {
        let members = self
            .directory
            .channel_members(request.channel_id)?
            .unwrap_or_else(|| request.members.clone());
        self.activity
            .log(
                LogChannel::Client,
                &format!(
                    "[READ]    channel: {} id: {}",
                    request.channel_name, request.channel_id
                ),
            )
            .await;

        let ack = ChannelReadPayload { members, ..request };
        Ok(self.ok(
            ResourceType::Channel,
            Operation::Read,
            &Payload::ChannelRead(ack),
        ))
    }

    /// Channels/Update: fill the channel ID list visible to the user.
    async fn list_channels(
        &self,
        request: ChannelsPayload,
    ) -> Result<(FrameHeader, Vec<u8>), DirectoryError> {
        let listed = self.directory.list_channels(&request.username)?;
        let channels = if listed.is_empty() {
            request.channels.clone()
        } else {
            listed
        };
        self.activity
            .log(
                LogChannel::Client,
                &format!("[LIST]    channels for: {}", request.username),
            )
            .await;

        let ack = ChannelsPayload { channels, ..request };
        Ok(self.ok(
            ResourceType::Channels,
            Operation::Update,
            &Payload::Channels(ack),
        ))
    }

    /// Message/Create: store and log. No ack travels back for this pair.
    async fn post_message(&self, request: MessageCreatePayload) -> Result<(), DirectoryError> {
        self.directory.store_message(&request)?;
        self.activity
            .log(
                LogChannel::Client,
                &format!(
                    "[MESSAGE] user: {} channel: {} bytes: {}",
                    request.username,
                    request.channel_id,
                    request.text.len()
                ),
            )
            .await;
        Ok(())
    }

    /// Message/Read: return the archived message, echoing when none matches.
    async fn read_message(
        &self,
        request: MessageReadPayload,
    ) -> Result<(FrameHeader, Vec<u8>), DirectoryError> {
        let ack = self
            .directory
            .fetch_message(request.channel_id, request.timestamp)?
            .unwrap_or_else(|| request.clone());
        self.activity
            .log(
                LogChannel::Client,
                &format!(
                    "[READ]    message channel: {} ts: {}",
                    request.channel_id, request.timestamp
                ),
            )
            .await;

        Ok(self.ok(
            ResourceType::Message,
            Operation::Read,
            &Payload::MessageRead(ack),
        ))
    }

    fn ok(
        &self,
        resource: ResourceType,
        operation: Operation,
        payload: &Payload,
    ) -> (FrameHeader, Vec<u8>) {
        (
            FrameHeader::ack(resource, operation, Status::Ok),
            encode_payload(payload),
        )
    }
}
