//! Binary codec for encoding and decoding relay-chat frames.
//!
//! Wire format:
//! ```text
//! [ver_major:4|ver_minor:4][resource:5|operation:2|ack:1][status:8][padding:8][payload_len:32][payload:N]
//! ```
//! Header size: 8 bytes. All multi-byte integers are big-endian except the
//! log payload's length prefix, which stays little-endian for the external
//! packet-inspection tooling.
//!
//! Header packing is done with explicit shifts and masks over a fixed 8-byte
//! array, never through struct layout, so the wire image is identical on
//! every platform.

use thiserror::Error;

use crate::protocol::messages::{
    AccountCreatePayload, ChannelReadPayload, ChannelsPayload, FrameHeader, LogPayload,
    LoginLogoutPayload, MessageCreatePayload, MessageReadPayload, Name16, Operation, Payload,
    RegisterPayload, ResourceType, Status, UserReadPayload, HEADER_SIZE,
};

/// Errors that can occur while decoding a frame's bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The payload is shorter than the fixed part of its declared layout.
    #[error("truncated {context} payload: need at least {needed} bytes, got {available}")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// A variable-length count inside the payload overruns the supplied buffer.
    #[error("{context}: declared count of {declared} bytes overruns buffer of {available}")]
    CountOverrun {
        context: &'static str,
        declared: usize,
        available: usize,
    },

    /// The (resource, operation) pair has no defined payload layout.
    #[error("no payload layout for resource {resource:#04x} operation {operation:#03x}")]
    UnknownInteraction { resource: u8, operation: u8 },
}

// ── Header packing ────────────────────────────────────────────────────────────

/// Packs a header into its 8 wire bytes.
///
/// The padding byte is always written as zero and `payload_length` is taken
/// from the header verbatim; [`encode_frame`] and the frame transport
/// recompute it from the actual payload before calling this.
pub fn encode_header(h: &FrameHeader) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0] = (h.version_major & 0x0F) << 4 | (h.version_minor & 0x0F);
    buf[1] = (h.resource & 0x1F) << 3 | (h.operation & 0x03) << 1 | u8::from(h.is_ack);
    buf[2] = h.status;
    buf[3] = 0x00; // padding
    buf[4..8].copy_from_slice(&h.payload_length.to_be_bytes());
    buf
}

/// Unpacks the 8 wire bytes of a header.
///
/// All fields are taken at face value; unknown resource/operation/status bits
/// are preserved so the caller can echo them in an error reply. The padding
/// byte is ignored.
pub fn decode_header(bytes: &[u8; HEADER_SIZE]) -> FrameHeader {
    FrameHeader {
        version_major: bytes[0] >> 4,
        version_minor: bytes[0] & 0x0F,
        resource: bytes[1] >> 3,
        operation: (bytes[1] >> 1) & 0x03,
        is_ack: bytes[1] & 0x01 != 0,
        status: bytes[2],
        payload_length: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    }
}

// ── Frame encoding ────────────────────────────────────────────────────────────

/// Encodes a complete frame (header + payload) into a byte vector.
///
/// `payload_length` is recomputed from the encoded payload; a caller-supplied
/// length is never trusted.
pub fn encode_frame(
    resource: ResourceType,
    operation: Operation,
    is_ack: bool,
    status: Status,
    payload: &Payload,
) -> Vec<u8> {
    let body = encode_payload(payload);
    let header = FrameHeader {
        version_major: crate::protocol::messages::PROTO_VER_MAJOR,
        version_minor: crate::protocol::messages::PROTO_VER_MINOR,
        resource: resource as u8,
        operation: operation as u8,
        is_ack,
        status: status.code(),
        payload_length: body.len() as u32,
    };
    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
    buf.extend_from_slice(&encode_header(&header));
    buf.extend_from_slice(&body);
    buf
}

// ── Payload encoding ──────────────────────────────────────────────────────────

/// Encodes a payload into its wire bytes (without the frame header).
pub fn encode_payload(payload: &Payload) -> Vec<u8> {
    let mut buf = Vec::new();
    match payload {
        Payload::Register(p) => encode_register(&mut buf, p),
        Payload::AccountCreate(p) => encode_account_create(&mut buf, p),
        Payload::LoginLogout(p) => encode_login_logout(&mut buf, p),
        Payload::UserRead(p) => encode_user_read(&mut buf, p),
        Payload::Log(p) => encode_log(&mut buf, p),
        Payload::ChannelRead(p) => encode_channel_read(&mut buf, p),
        Payload::Channels(p) => encode_channels(&mut buf, p),
        Payload::MessageCreate(p) => encode_message_create(&mut buf, p),
        Payload::MessageRead(p) => encode_message_read(&mut buf, p),
    }
    buf
}

/// Decodes a payload according to the (resource, operation) pair that arrived
/// in the header.
///
/// Never reads past `bytes`: a declared variable-length count that overruns
/// the buffer is a [`WireError::CountOverrun`].
pub fn decode_payload(
    resource: ResourceType,
    operation: Operation,
    bytes: &[u8],
) -> Result<Payload, WireError> {
    match (resource, operation) {
        // All three System interactions (register, activate, get-active-server)
        // share the Register layout.
        (ResourceType::System, _) => decode_register(bytes).map(Payload::Register),
        (ResourceType::User, Operation::Create) => {
            decode_account_create(bytes).map(Payload::AccountCreate)
        }
        (ResourceType::User, Operation::Update) => {
            decode_login_logout(bytes).map(Payload::LoginLogout)
        }
        (ResourceType::User, Operation::Read) => decode_user_read(bytes).map(Payload::UserRead),
        (ResourceType::Log, Operation::Create) => decode_log(bytes).map(Payload::Log),
        (ResourceType::Channel, Operation::Read) => {
            decode_channel_read(bytes).map(Payload::ChannelRead)
        }
        (ResourceType::Channels, Operation::Update) => {
            decode_channels(bytes).map(Payload::Channels)
        }
        (ResourceType::Message, Operation::Create) => {
            decode_message_create(bytes).map(Payload::MessageCreate)
        }
        (ResourceType::Message, Operation::Read) => {
            decode_message_read(bytes).map(Payload::MessageRead)
        }
        _ => Err(WireError::UnknownInteraction {
            resource: resource as u8,
            operation: operation as u8,
        }),
    }
}

// ── Per-payload encode helpers ────────────────────────────────────────────────

fn encode_register(buf: &mut Vec<u8>, p: &RegisterPayload) {
    buf.extend_from_slice(&p.server_ip.to_be_bytes());
    buf.push(p.server_id);
}

fn encode_account_create(buf: &mut Vec<u8>, p: &AccountCreatePayload) {
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.push(p.client_id);
}

fn encode_login_logout(buf: &mut Vec<u8>, p: &LoginLogoutPayload) {
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.extend_from_slice(&p.client_ip.to_be_bytes());
    buf.push(p.status);
}

fn encode_user_read(buf: &mut Vec<u8>, p: &UserReadPayload) {
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.extend_from_slice(p.target_username.as_bytes());
    buf.push(p.user_id);
}

fn encode_log(buf: &mut Vec<u8>, p: &LogPayload) {
    let len = p.text.len().min(u16::MAX as usize) as u16;
    buf.push(p.server_id);
    // Little-endian by dissector requirement; the lone exception on this wire.
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&p.text[..len as usize]);
}

fn encode_channel_read(buf: &mut Vec<u8>, p: &ChannelReadPayload) {
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.extend_from_slice(p.channel_name.as_bytes());
    buf.push(p.channel_id);
    buf.push(p.members.len().min(u8::MAX as usize) as u8);
    buf.extend_from_slice(&p.members[..p.members.len().min(u8::MAX as usize)]);
}

fn encode_channels(buf: &mut Vec<u8>, p: &ChannelsPayload) {
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.push(p.channels.len().min(u8::MAX as usize) as u8);
    buf.extend_from_slice(&p.channels[..p.channels.len().min(u8::MAX as usize)]);
}

fn encode_message_create(buf: &mut Vec<u8>, p: &MessageCreatePayload) {
    let len = p.text.len().min(u16::MAX as usize) as u16;
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.extend_from_slice(&p.timestamp.to_be_bytes());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.push(p.channel_id);
    buf.extend_from_slice(&p.text[..len as usize]);
}

fn encode_message_read(buf: &mut Vec<u8>, p: &MessageReadPayload) {
    let len = p.text.len().min(u16::MAX as usize) as u16;
    buf.extend_from_slice(p.username.as_bytes());
    buf.extend_from_slice(p.password.as_bytes());
    buf.extend_from_slice(&p.timestamp.to_be_bytes());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.push(p.channel_id);
    buf.push(p.sender_user_id);
    buf.extend_from_slice(&p.text[..len as usize]);
}

// ── Per-payload decode helpers ────────────────────────────────────────────────

fn decode_register(p: &[u8]) -> Result<RegisterPayload, WireError> {
    require_len(p, 5, "Register")?;
    Ok(RegisterPayload {
        server_ip: read_u32_be(p, 0),
        server_id: p[4],
    })
}

fn decode_account_create(p: &[u8]) -> Result<AccountCreatePayload, WireError> {
    require_len(p, 33, "AccountCreate")?;
    Ok(AccountCreatePayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        client_id: p[32],
    })
}

fn decode_login_logout(p: &[u8]) -> Result<LoginLogoutPayload, WireError> {
    require_len(p, 37, "LoginLogout")?;
    Ok(LoginLogoutPayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        client_ip: read_u32_be(p, 32),
        status: p[36],
    })
}

fn decode_user_read(p: &[u8]) -> Result<UserReadPayload, WireError> {
    require_len(p, 49, "UserRead")?;
    Ok(UserReadPayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        target_username: read_name16(p, 32),
        user_id: p[48],
    })
}

fn decode_log(p: &[u8]) -> Result<LogPayload, WireError> {
    require_len(p, 3, "Log")?;
    // Little-endian length; see encode_log.
    let len = u16::from_le_bytes([p[1], p[2]]) as usize;
    require_tail(p, 3, len, "Log text")?;
    Ok(LogPayload {
        server_id: p[0],
        text: p[3..3 + len].to_vec(),
    })
}

fn decode_channel_read(p: &[u8]) -> Result<ChannelReadPayload, WireError> {
    require_len(p, 50, "ChannelRead")?;
    let count = p[49] as usize;
    require_tail(p, 50, count, "ChannelRead members")?;
    Ok(ChannelReadPayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        channel_name: read_name16(p, 32),
        channel_id: p[48],
        members: p[50..50 + count].to_vec(),
    })
}

fn decode_channels(p: &[u8]) -> Result<ChannelsPayload, WireError> {
    require_len(p, 33, "Channels")?;
    let count = p[32] as usize;
    require_tail(p, 33, count, "Channels list")?;
    Ok(ChannelsPayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        channels: p[33..33 + count].to_vec(),
    })
}

fn decode_message_create(p: &[u8]) -> Result<MessageCreatePayload, WireError> {
    require_len(p, 43, "MessageCreate")?;
    let len = u16::from_be_bytes([p[40], p[41]]) as usize;
    require_tail(p, 43, len, "MessageCreate text")?;
    Ok(MessageCreatePayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        timestamp: read_u64_be(p, 32),
        channel_id: p[42],
        text: p[43..43 + len].to_vec(),
    })
}

fn decode_message_read(p: &[u8]) -> Result<MessageReadPayload, WireError> {
    require_len(p, 44, "MessageRead")?;
    let len = u16::from_be_bytes([p[40], p[41]]) as usize;
    require_tail(p, 44, len, "MessageRead text")?;
    Ok(MessageReadPayload {
        username: read_name16(p, 0),
        password: read_name16(p, 16),
        timestamp: read_u64_be(p, 32),
        channel_id: p[42],
        sender_user_id: p[43],
        text: p[44..44 + len].to_vec(),
    })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize, context: &'static str) -> Result<(), WireError> {
    if buf.len() < needed {
        Err(WireError::Truncated {
            context,
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Checks that a variable tail of `declared` bytes starting at `offset` fits
/// inside the buffer.
fn require_tail(
    buf: &[u8],
    offset: usize,
    declared: usize,
    context: &'static str,
) -> Result<(), WireError> {
    if buf.len() < offset + declared {
        Err(WireError::CountOverrun {
            context,
            declared,
            available: buf.len() - offset,
        })
    } else {
        Ok(())
    }
}

fn read_name16(buf: &[u8], offset: usize) -> Name16 {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&buf[offset..offset + 16]);
    Name16(bytes)
}

fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_u64_be(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{PROTO_VER_MAJOR, PROTO_VER_MINOR, SESSION_LOGIN};

    fn round_trip(resource: ResourceType, operation: Operation, payload: &Payload) -> Payload {
        let encoded = encode_payload(payload);
        decode_payload(resource, operation, &encoded).expect("decode failed")
    }

    // ── Header packing ────────────────────────────────────────────────────────

    #[test]
    fn test_header_round_trip() {
        let h = FrameHeader {
            version_major: PROTO_VER_MAJOR,
            version_minor: PROTO_VER_MINOR,
            resource: ResourceType::Message as u8,
            operation: Operation::Read as u8,
            is_ack: true,
            status: Status::Ok.code(),
            payload_length: 44,
        };
        let bytes = encode_header(&h);
        assert_eq!(decode_header(&bytes), h);
    }

    #[test]
    fn test_header_version_byte_packs_major_high_minor_low() {
        let h = FrameHeader::request(ResourceType::User, Operation::Create);
        let bytes = encode_header(&h);
        assert_eq!(bytes[0], 0x02, "version 0.2 must encode as 0x02");
    }

    #[test]
    fn test_header_type_byte_matches_dissector_layout() {
        // resource << 3 | operation << 1 | ack, per the external tooling.
        let h = FrameHeader::ack(ResourceType::User, Operation::Update, Status::Ok);
        let bytes = encode_header(&h);
        assert_eq!(bytes[1], (0x02 << 3) | (0x2 << 1) | 1);
    }

    #[test]
    fn test_header_padding_byte_is_always_zero() {
        let mut h = FrameHeader::request(ResourceType::Log, Operation::Create);
        h.payload_length = 0xDEAD_BEEF;
        let bytes = encode_header(&h);
        assert_eq!(bytes[3], 0x00);
    }

    #[test]
    fn test_header_payload_length_is_big_endian() {
        let mut h = FrameHeader::request(ResourceType::Message, Operation::Create);
        h.payload_length = 0x0001_0203;
        let bytes = encode_header(&h);
        assert_eq!(&bytes[4..8], &[0x00, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_header_preserves_unknown_resource_bits() {
        // 0x1F is not a known resource; the raw value must survive a round trip
        // so an error reply can echo it.
        let h = FrameHeader::ack_raw(0x1F, 0x3, Status::InvalidType);
        let decoded = decode_header(&encode_header(&h));
        assert_eq!(decoded.resource, 0x1F);
        assert_eq!(decoded.operation, 0x3);
        assert_eq!(decoded.resource_type(), None);
    }

    #[test]
    fn test_decode_header_ignores_padding_byte() {
        let h = FrameHeader::request(ResourceType::User, Operation::Read);
        let mut bytes = encode_header(&h);
        bytes[3] = 0xFF;
        assert_eq!(decode_header(&bytes), h);
    }

    // ── Payload round trips ───────────────────────────────────────────────────

    #[test]
    fn test_register_round_trip() {
        let p = Payload::Register(RegisterPayload {
            server_ip: u32::from(std::net::Ipv4Addr::new(192, 168, 1, 7)),
            server_id: 7,
        });
        assert_eq!(round_trip(ResourceType::System, Operation::Create, &p), p);
    }

    #[test]
    fn test_register_zero_payload_is_unassigned() {
        let p = RegisterPayload::unassigned();
        assert!(p.is_unassigned());
        let decoded = round_trip(
            ResourceType::System,
            Operation::Read,
            &Payload::Register(p),
        );
        assert_eq!(decoded, Payload::Register(p));
    }

    #[test]
    fn test_account_create_round_trip() {
        let p = Payload::AccountCreate(AccountCreatePayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            client_id: 0,
        });
        assert_eq!(round_trip(ResourceType::User, Operation::Create, &p), p);
    }

    #[test]
    fn test_account_create_is_exactly_33_bytes() {
        let p = Payload::AccountCreate(AccountCreatePayload {
            username: Name16::new("a"),
            password: Name16::new("b"),
            client_id: 255,
        });
        assert_eq!(encode_payload(&p).len(), 33);
    }

    #[test]
    fn test_login_logout_round_trip() {
        let p = Payload::LoginLogout(LoginLogoutPayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            client_ip: u32::from(std::net::Ipv4Addr::new(10, 0, 0, 9)),
            status: SESSION_LOGIN,
        });
        assert_eq!(round_trip(ResourceType::User, Operation::Update, &p), p);
    }

    #[test]
    fn test_user_read_round_trip() {
        let p = Payload::UserRead(UserReadPayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            target_username: Name16::new("bob"),
            user_id: 42,
        });
        assert_eq!(round_trip(ResourceType::User, Operation::Read, &p), p);
    }

    #[test]
    fn test_log_round_trip() {
        let p = Payload::Log(LogPayload {
            server_id: 3,
            text: b"[LOGIN]  User: alice".to_vec(),
        });
        assert_eq!(round_trip(ResourceType::Log, Operation::Create, &p), p);
    }

    #[test]
    fn test_log_with_empty_text_round_trip() {
        let p = Payload::Log(LogPayload {
            server_id: 0,
            text: Vec::new(),
        });
        assert_eq!(round_trip(ResourceType::Log, Operation::Create, &p), p);
    }

    #[test]
    fn test_channel_read_round_trip_with_members() {
        let p = Payload::ChannelRead(ChannelReadPayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            channel_name: Name16::new("general"),
            channel_id: 255,
            members: vec![1, 2, 3, 4, 5],
        });
        assert_eq!(round_trip(ResourceType::Channel, Operation::Read, &p), p);
    }

    #[test]
    fn test_channel_read_round_trip_empty_member_list() {
        let p = Payload::ChannelRead(ChannelReadPayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            channel_name: Name16::new("general"),
            channel_id: 1,
            members: Vec::new(),
        });
        assert_eq!(round_trip(ResourceType::Channel, Operation::Read, &p), p);
    }

    #[test]
    fn test_channels_round_trip() {
        let p = Payload::Channels(ChannelsPayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            channels: vec![1, 4, 9],
        });
        assert_eq!(round_trip(ResourceType::Channels, Operation::Update, &p), p);
    }

    #[test]
    fn test_message_create_round_trip() {
        let p = Payload::MessageCreate(MessageCreatePayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            timestamp: 1_700_000_000,
            channel_id: 4,
            text: b"hello, channel".to_vec(),
        });
        assert_eq!(round_trip(ResourceType::Message, Operation::Create, &p), p);
    }

    #[test]
    fn test_message_create_empty_text_round_trip() {
        let p = Payload::MessageCreate(MessageCreatePayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            timestamp: 0,
            channel_id: 0,
            text: Vec::new(),
        });
        assert_eq!(round_trip(ResourceType::Message, Operation::Create, &p), p);
    }

    #[test]
    fn test_message_read_round_trip() {
        let p = Payload::MessageRead(MessageReadPayload {
            username: Name16::new("alice"),
            password: Name16::new("hunter2"),
            timestamp: u64::MAX,
            channel_id: 255,
            sender_user_id: 17,
            text: b"archived line".to_vec(),
        });
        assert_eq!(round_trip(ResourceType::Message, Operation::Read, &p), p);
    }

    // ── Endianness asymmetry ──────────────────────────────────────────────────

    #[test]
    fn test_log_frame_mixes_little_endian_length_with_big_endian_header() {
        // Within one encoded Log frame, the payload's length prefix must be
        // little-endian while the header's payload_length stays big-endian.
        let text = vec![b'x'; 0x0102]; // 258 bytes
        let frame = encode_frame(
            ResourceType::Log,
            Operation::Create,
            false,
            Status::Ok,
            &Payload::Log(LogPayload { server_id: 1, text }),
        );

        // Header payload_length = 3 + 258 = 261 = 0x0105, big-endian.
        assert_eq!(&frame[4..8], &[0x00, 0x00, 0x01, 0x05]);
        // Payload log_length = 258 = 0x0102, little-endian: low byte first.
        assert_eq!(&frame[HEADER_SIZE + 1..HEADER_SIZE + 3], &[0x02, 0x01]);
    }

    // ── Overrun rejection ─────────────────────────────────────────────────────

    #[test]
    fn test_decode_log_rejects_length_overrunning_buffer() {
        // Declares 100 text bytes but supplies 2.
        let mut p = vec![1u8];
        p.extend_from_slice(&100u16.to_le_bytes());
        p.extend_from_slice(b"ab");
        let result = decode_payload(ResourceType::Log, Operation::Create, &p);
        assert!(matches!(result, Err(WireError::CountOverrun { .. })));
    }

    #[test]
    fn test_decode_channel_read_rejects_member_count_overrun() {
        let mut p = encode_payload(&Payload::ChannelRead(ChannelReadPayload {
            username: Name16::new("a"),
            password: Name16::new("b"),
            channel_name: Name16::new("c"),
            channel_id: 1,
            members: vec![1, 2],
        }));
        p[49] = 200; // claim 200 members, supply 2
        let result = decode_payload(ResourceType::Channel, Operation::Read, &p);
        assert!(matches!(result, Err(WireError::CountOverrun { .. })));
    }

    #[test]
    fn test_decode_message_create_rejects_text_overrun() {
        let mut p = encode_payload(&Payload::MessageCreate(MessageCreatePayload {
            username: Name16::new("a"),
            password: Name16::new("b"),
            timestamp: 1,
            channel_id: 1,
            text: b"hi".to_vec(),
        }));
        p[40..42].copy_from_slice(&9999u16.to_be_bytes());
        let result = decode_payload(ResourceType::Message, Operation::Create, &p);
        assert!(matches!(result, Err(WireError::CountOverrun { .. })));
    }

    #[test]
    fn test_decode_truncated_fixed_struct_is_rejected() {
        let result = decode_payload(ResourceType::User, Operation::Read, &[0u8; 10]);
        assert!(matches!(
            result,
            Err(WireError::Truncated { needed: 49, .. })
        ));
    }

    #[test]
    fn test_decode_unknown_interaction_is_rejected() {
        // Message/Update has no payload layout.
        let result = decode_payload(ResourceType::Message, Operation::Update, &[0u8; 64]);
        assert_eq!(
            result,
            Err(WireError::UnknownInteraction {
                resource: ResourceType::Message as u8,
                operation: Operation::Update as u8,
            })
        );
    }

    // ── Frame encoding ────────────────────────────────────────────────────────

    #[test]
    fn test_encode_frame_recomputes_payload_length() {
        let frame = encode_frame(
            ResourceType::User,
            Operation::Create,
            true,
            Status::Ok,
            &Payload::AccountCreate(AccountCreatePayload {
                username: Name16::new("alice"),
                password: Name16::new("pw"),
                client_id: 9,
            }),
        );
        let declared = u32::from_be_bytes(frame[4..8].try_into().unwrap());
        assert_eq!(declared as usize, frame.len() - HEADER_SIZE);
        assert_eq!(declared, 33);
    }

    // ── Name16 ────────────────────────────────────────────────────────────────

    #[test]
    fn test_name16_truncates_and_zero_pads() {
        let long = Name16::new("a_username_longer_than_sixteen");
        assert_eq!(long.as_bytes().len(), 16);
        let short = Name16::new("bob");
        assert_eq!(&short.as_bytes()[..4], b"bob\0");
        assert_eq!(short.as_str(), "bob");
    }

    // ── Status ────────────────────────────────────────────────────────────────

    #[test]
    fn test_status_fault_ranges() {
        assert!(Status::InvalidVersion.is_sender_fault());
        assert!(Status::NotChannelMember.is_sender_fault());
        assert!(Status::MessageTooLarge.is_receiver_fault());
        assert!(!Status::Ok.is_sender_fault());
        assert!(!Status::Ok.is_receiver_fault());
    }
}
