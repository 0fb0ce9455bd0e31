//! Request admission checks run by the worker before any payload is decoded.
//!
//! The checks are ordered and the first failure wins; the caller answers with
//! a header-only ack carrying the returned status and the request's raw
//! resource/operation bits, then keeps the connection open.

use crate::protocol::messages::{
    FrameHeader, Operation, ResourceType, Status, MAX_MESSAGE_SIZE, PROTO_VER_MAJOR,
    PROTO_VER_MINOR,
};

/// The (resource, operation) pairs a worker serves.
///
/// System/Read (get-active-server) belongs to the manager and Log/Create is
/// server-to-manager only, so neither appears here.
const KNOWN_PAIRS: &[(ResourceType, Operation)] = &[
    (ResourceType::User, Operation::Create),
    (ResourceType::User, Operation::Update),
    (ResourceType::User, Operation::Read),
    (ResourceType::Channel, Operation::Read),
    (ResourceType::Channels, Operation::Update),
    (ResourceType::Message, Operation::Create),
    (ResourceType::Message, Operation::Read),
];

/// Validates an inbound request header against the worker's admission rules.
///
/// Check order:
/// 1. protocol version → [`Status::InvalidVersion`]
/// 2. ack bit set on the request path → [`Status::InvalidType`]
/// 3. declared payload larger than `recv_capacity` → [`Status::InvalidSize`]
/// 4. Message resource above [`MAX_MESSAGE_SIZE`] → [`Status::MessageTooLarge`]
/// 5. unknown (resource, operation) pair → [`Status::InvalidType`]
///
/// On success returns the typed pair so the dispatcher never re-parses bits.
pub fn validate_request(
    header: &FrameHeader,
    recv_capacity: usize,
) -> Result<(ResourceType, Operation), Status> {
    if header.version_major != PROTO_VER_MAJOR || header.version_minor != PROTO_VER_MINOR {
        return Err(Status::InvalidVersion);
    }
    if header.is_ack {
        return Err(Status::InvalidType);
    }
    if header.payload_length as usize > recv_capacity {
        return Err(Status::InvalidSize);
    }
    let resource = header.resource_type();
    if resource == Some(ResourceType::Message) && header.payload_length as usize > MAX_MESSAGE_SIZE
    {
        return Err(Status::MessageTooLarge);
    }
    match (resource, header.operation_kind()) {
        (Some(res), Some(op)) if KNOWN_PAIRS.contains(&(res, op)) => Ok((res, op)),
        _ => Err(Status::InvalidType),
    }
}
