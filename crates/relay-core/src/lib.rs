//! # relay-core
//!
//! Shared library for the relay chat system containing the binary wire
//! protocol, the frame transport, and the request admission checks.
//!
//! This crate is used by both the server and client applications. It has no
//! dependencies on UI frameworks or application state; the only I/O it knows
//! about is the async byte-stream traits the transport is generic over.
//!
//! The wire protocol is a fixed-format binary framing: every frame starts
//! with an 8-byte header naming a resource (system, user, channel, message,
//! log), a CRUD-style operation, an ack flag, and the payload length.
//! Requests travel client-to-server and server-to-manager; every reply
//! reuses the same header with the ack flag set and a status byte.

pub mod protocol;
pub mod transport;

pub use protocol::codec::{
    decode_header, decode_payload, encode_frame, encode_header, encode_payload, WireError,
};
pub use protocol::messages::{
    AccountCreatePayload, ChannelReadPayload, ChannelsPayload, FrameHeader, LogPayload,
    LoginLogoutPayload, MessageCreatePayload, MessageReadPayload, Name16, Operation, Payload,
    RegisterPayload, ResourceType, Status, UserReadPayload, HEADER_SIZE, MAX_MESSAGE_SIZE,
    MAX_PAYLOAD, PROTO_VER_MAJOR, PROTO_VER_MINOR, SESSION_LOGIN, SESSION_LOGOUT,
};
pub use protocol::validate::validate_request;
pub use transport::{read_frame, write_frame, TransportError};
