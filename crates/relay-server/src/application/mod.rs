//! Application layer: request handling behind the network plumbing.

pub mod allocator;
pub mod dispatch;
