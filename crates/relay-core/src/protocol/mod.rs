//! Protocol module containing the frame types, binary codec, and the
//! request admission checks.

pub mod codec;
pub mod messages;
pub mod validate;

pub use codec::{decode_header, decode_payload, encode_frame, encode_header, encode_payload, WireError};
pub use messages::*;
pub use validate::validate_request;
