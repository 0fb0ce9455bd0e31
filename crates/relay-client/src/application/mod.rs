//! Application layer: user-facing session operations.

pub mod session;
