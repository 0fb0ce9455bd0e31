//! All relay-chat protocol message types.
//!
//! Frames follow the fixed binary wire format: an 8-byte header followed by a
//! payload whose layout is determined by the (resource, operation) pair in the
//! header. All multi-byte integers are big-endian, with one deliberate
//! exception: the log payload's length field is little-endian for
//! compatibility with the fixed external packet-inspection tooling.

// ── Protocol constants ────────────────────────────────────────────────────────

/// Protocol version, major nibble. Current version is 0.2.
pub const PROTO_VER_MAJOR: u8 = 0x0;

/// Protocol version, minor nibble.
pub const PROTO_VER_MINOR: u8 = 0x2;

/// Total size of the frame header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest message payload accepted on the Message resource (u16 max).
pub const MAX_MESSAGE_SIZE: usize = 65_535;

/// Receive buffer capacity: the largest payload a peer may declare.
///
/// Sized above a maximum Message frame (65 535 text bytes plus the fixed
/// prefix) so that an oversized message is judged by the message-size check
/// rather than the buffer-capacity check.
pub const MAX_PAYLOAD: usize = 128 * 1024;

/// Login marker in the [`LoginLogoutPayload`] status byte.
pub const SESSION_LOGIN: u8 = 0x00;

/// Logout marker in the [`LoginLogoutPayload`] status byte.
pub const SESSION_LOGOUT: u8 = 0x01;

// ── Header field enums ────────────────────────────────────────────────────────

/// Resource identifier carried in the 5-bit header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResourceType {
    System = 0x00,
    User = 0x02,
    Log = 0x03,
    Channel = 0x04,
    Channels = 0x05,
    Message = 0x06,
}

impl TryFrom<u8> for ResourceType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ResourceType::System),
            0x02 => Ok(ResourceType::User),
            0x03 => Ok(ResourceType::Log),
            0x04 => Ok(ResourceType::Channel),
            0x05 => Ok(ResourceType::Channels),
            0x06 => Ok(ResourceType::Message),
            _ => Err(()),
        }
    }
}

/// CRUD operation carried in the 2-bit header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    Create = 0x0,
    Read = 0x1,
    Update = 0x2,
}

impl TryFrom<u8> for Operation {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Operation::Create),
            0x1 => Ok(Operation::Read),
            0x2 => Ok(Operation::Update),
            _ => Err(()),
        }
    }
}

/// Status byte (`status_major` nibble ‖ `status_minor` nibble).
///
/// 0x40–0x4F are sender faults (the problem is with what the peer sent);
/// 0x80–0x8F are receiver faults (the problem is on this side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    InvalidVersion = 0x40,
    InvalidType = 0x41,
    InvalidSize = 0x42,
    MalformedRequest = 0x43,
    InvalidCredentials = 0x44,
    NotFound = 0x45,
    AlreadyExists = 0x46,
    NotRegistered = 0x47,
    Forbidden = 0x48,
    NotChannelMember = 0x49,
    InternalError = 0x80,
    ServiceUnavailable = 0x81,
    ResourceExhausted = 0x82,
    MessageTooLarge = 0x83,
    Timeout = 0x84,
}

impl Status {
    /// The raw status byte as carried on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the 0x40–0x4F range.
    pub fn is_sender_fault(self) -> bool {
        (self as u8) & 0xF0 == 0x40
    }

    /// Returns `true` for the 0x80–0x8F range.
    pub fn is_receiver_fault(self) -> bool {
        (self as u8) & 0xF0 == 0x80
    }
}

impl TryFrom<u8> for Status {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Status::Ok),
            0x40 => Ok(Status::InvalidVersion),
            0x41 => Ok(Status::InvalidType),
            0x42 => Ok(Status::InvalidSize),
            0x43 => Ok(Status::MalformedRequest),
            0x44 => Ok(Status::InvalidCredentials),
            0x45 => Ok(Status::NotFound),
            0x46 => Ok(Status::AlreadyExists),
            0x47 => Ok(Status::NotRegistered),
            0x48 => Ok(Status::Forbidden),
            0x49 => Ok(Status::NotChannelMember),
            0x80 => Ok(Status::InternalError),
            0x81 => Ok(Status::ServiceUnavailable),
            0x82 => Ok(Status::ResourceExhausted),
            0x83 => Ok(Status::MessageTooLarge),
            0x84 => Ok(Status::Timeout),
            _ => Err(()),
        }
    }
}

// ── Frame header ──────────────────────────────────────────────────────────────

/// 8-byte header prepended to every frame on the wire.
///
/// Resource, operation, and status are kept as raw bytes so that a receiver
/// can echo the offending bits back in an error reply even when they do not
/// map to a known enum value. Use [`FrameHeader::resource_type`] and friends
/// for the typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Protocol version, major nibble.
    pub version_major: u8,
    /// Protocol version, minor nibble.
    pub version_minor: u8,
    /// Raw 5-bit resource identifier.
    pub resource: u8,
    /// Raw 2-bit operation.
    pub operation: u8,
    /// 0 = request, 1 = acknowledgement.
    pub is_ack: bool,
    /// Raw status byte.
    pub status: u8,
    /// Exact byte count of the payload that follows the header.
    pub payload_length: u32,
}

impl FrameHeader {
    /// A request header for a known interaction, status Ok, length 0.
    ///
    /// The payload length is recomputed by the encoder from the bytes actually
    /// written; the value stored here is never trusted.
    pub fn request(resource: ResourceType, operation: Operation) -> Self {
        Self {
            version_major: PROTO_VER_MAJOR,
            version_minor: PROTO_VER_MINOR,
            resource: resource as u8,
            operation: operation as u8,
            is_ack: false,
            status: Status::Ok.code(),
            payload_length: 0,
        }
    }

    /// An acknowledgement header for a known interaction.
    pub fn ack(resource: ResourceType, operation: Operation, status: Status) -> Self {
        Self {
            is_ack: true,
            status: status.code(),
            ..Self::request(resource, operation)
        }
    }

    /// An acknowledgement header echoing raw resource/operation bits.
    ///
    /// Used for error replies to frames whose bits do not map to any known
    /// interaction.
    pub fn ack_raw(resource: u8, operation: u8, status: Status) -> Self {
        Self {
            version_major: PROTO_VER_MAJOR,
            version_minor: PROTO_VER_MINOR,
            resource: resource & 0x1F,
            operation: operation & 0x03,
            is_ack: true,
            status: status.code(),
            payload_length: 0,
        }
    }

    /// Typed view of the resource field, `None` for unknown values.
    pub fn resource_type(&self) -> Option<ResourceType> {
        ResourceType::try_from(self.resource).ok()
    }

    /// Typed view of the operation field, `None` for unknown values.
    pub fn operation_kind(&self) -> Option<Operation> {
        Operation::try_from(self.operation).ok()
    }

    /// Typed view of the status byte, `None` for unknown values.
    pub fn status_code(&self) -> Option<Status> {
        Status::try_from(self.status).ok()
    }

    /// Whether the header carries the protocol version this build implements.
    pub fn version_matches(&self) -> bool {
        self.version_major == PROTO_VER_MAJOR && self.version_minor == PROTO_VER_MINOR
    }
}

// ── Fixed-width name field ────────────────────────────────────────────────────

/// A 16-byte, zero-padded name field (username, password, channel name).
///
/// Longer inputs are truncated at 16 bytes on construction; the wire always
/// carries exactly 16 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name16(pub [u8; 16]);

impl Name16 {
    /// Builds a name from a string, truncating at 16 bytes and zero-padding.
    pub fn new(s: &str) -> Self {
        let mut bytes = [0u8; 16];
        let n = s.len().min(16);
        bytes[..n].copy_from_slice(&s.as_bytes()[..n]);
        Self(bytes)
    }

    /// The raw 16 wire bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The name with trailing NULs stripped, lossily decoded.
    pub fn as_str(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(16);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl From<[u8; 16]> for Name16 {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for Name16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Name16({:?})", self.as_str())
    }
}

impl std::fmt::Display for Name16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Payload structs ───────────────────────────────────────────────────────────

/// System resource payload, shared by register, activate, and
/// get-active-server interactions (5 bytes).
///
/// A zeroed payload means "no assignment": requests carry zeros, and a
/// manager with no active worker answers with zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterPayload {
    /// Worker's advertised IPv4 address as a big-endian u32.
    pub server_ip: u32,
    /// Manager-assigned worker ID; 0 when unassigned.
    pub server_id: u8,
}

impl RegisterPayload {
    /// The all-zero payload used in assignment queries and fresh registrations.
    pub fn unassigned() -> Self {
        Self { server_ip: 0, server_id: 0 }
    }

    /// Whether this payload names no worker.
    pub fn is_unassigned(&self) -> bool {
        self.server_ip == 0 && self.server_id == 0
    }

    /// The advertised address as an [`std::net::Ipv4Addr`].
    pub fn ip(&self) -> std::net::Ipv4Addr {
        std::net::Ipv4Addr::from(self.server_ip)
    }
}

/// User/Create payload (33 bytes). `client_id` is 0 in the request and is
/// filled with the allocator-assigned ID in the acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountCreatePayload {
    pub username: Name16,
    pub password: Name16,
    pub client_id: u8,
}

/// User/Update payload (37 bytes); login and logout share the layout,
/// disambiguated by the status byte ([`SESSION_LOGIN`] / [`SESSION_LOGOUT`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginLogoutPayload {
    pub username: Name16,
    pub password: Name16,
    /// Client's IPv4 address as a big-endian u32.
    pub client_ip: u32,
    /// Raw session status byte; values other than login/logout are
    /// acknowledged permissively.
    pub status: u8,
}

/// User/Read payload (49 bytes). `user_id` is 0 in the request and is filled
/// by the directory lookup in the acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserReadPayload {
    pub username: Name16,
    pub password: Name16,
    pub target_username: Name16,
    pub user_id: u8,
}

/// Log/Create payload (3 bytes + text). The length prefix on the wire is
/// little-endian; every other multi-byte field in the protocol is big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPayload {
    pub server_id: u8,
    pub text: Vec<u8>,
}

/// Channel/Read payload (50 bytes + member IDs). The member list is empty in
/// the request and filled by the directory in the acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReadPayload {
    pub username: Name16,
    pub password: Name16,
    pub channel_name: Name16,
    pub channel_id: u8,
    pub members: Vec<u8>,
}

/// Channels/Update payload (33 bytes + channel IDs). The list is empty in the
/// request and filled in the acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelsPayload {
    pub username: Name16,
    pub password: Name16,
    pub channels: Vec<u8>,
}

/// Message/Create payload (43 bytes + text). Fire-and-forget: no
/// acknowledgement is ever sent for this interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCreatePayload {
    pub username: Name16,
    pub password: Name16,
    /// Sender-supplied timestamp, seconds since the Unix epoch.
    pub timestamp: u64,
    pub channel_id: u8,
    pub text: Vec<u8>,
}

/// Message/Read payload (44 bytes + text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReadPayload {
    pub username: Name16,
    pub password: Name16,
    pub timestamp: u64,
    pub channel_id: u8,
    pub sender_user_id: u8,
    pub text: Vec<u8>,
}

// ── Top-level payload enum ────────────────────────────────────────────────────

/// All payload variants, discriminated by the header's (resource, operation)
/// pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Register(RegisterPayload),
    AccountCreate(AccountCreatePayload),
    LoginLogout(LoginLogoutPayload),
    UserRead(UserReadPayload),
    Log(LogPayload),
    ChannelRead(ChannelReadPayload),
    Channels(ChannelsPayload),
    MessageCreate(MessageCreatePayload),
    MessageRead(MessageReadPayload),
}
