//! Directory lookups behind the request handlers.
//!
//! The wire protocol carries slots for user IDs, channel member lists, and
//! archived messages, but the current deployment has no backing store: every
//! lookup resolves to "nothing" and handlers echo the request payload back.
//! The trait is the seam where a real store plugs in later without touching
//! the dispatch layer.

use relay_core::{MessageCreatePayload, MessageReadPayload, Name16};
use thiserror::Error;

/// A directory lookup failed for an operational reason (as opposed to the
/// entry simply not existing, which is `Ok(None)`).
#[derive(Debug, Error)]
#[error("directory error: {0}")]
pub struct DirectoryError(pub String);

/// Lookups the request handlers depend on.
pub trait Directory: Send + Sync {
    /// Resolves a username to its account ID, if known.
    fn lookup_user_id(&self, username: &Name16) -> Result<Option<u8>, DirectoryError>;

    /// Lists the member IDs of a channel, if the channel is known.
    fn channel_members(&self, channel_id: u8) -> Result<Option<Vec<u8>>, DirectoryError>;

    /// Lists the channel IDs visible to a user.
    fn list_channels(&self, username: &Name16) -> Result<Vec<u8>, DirectoryError>;

    /// Records a posted message.
    fn store_message(&self, message: &MessageCreatePayload) -> Result<(), DirectoryError>;

    /// Fetches the archived message matching a read request, if any.
    fn fetch_message(
        &self,
        channel_id: u8,
        timestamp: u64,
    ) -> Result<Option<MessageReadPayload>, DirectoryError>;
}

/// The no-store directory: every lookup resolves to nothing.
#[derive(Debug, Default)]
pub struct NullDirectory;

impl Directory for NullDirectory {
    fn lookup_user_id(&self, _username: &Name16) -> Result<Option<u8>, DirectoryError> {
        Ok(None)
    }

    fn channel_members(&self, _channel_id: u8) -> Result<Option<Vec<u8>>, DirectoryError> {
        Ok(None)
    }

    fn list_channels(&self, _username: &Name16) -> Result<Vec<u8>, DirectoryError> {
        Ok(Vec::new())
    }

    fn store_message(&self, _message: &MessageCreatePayload) -> Result<(), DirectoryError> {
        Ok(())
    }

    fn fetch_message(
        &self,
        _channel_id: u8,
        _timestamp: u64,
    ) -> Result<Option<MessageReadPayload>, DirectoryError> {
        Ok(None)
    }
}
