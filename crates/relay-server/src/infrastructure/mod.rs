//! Infrastructure layer: sockets, the manager link, config, and logging.

pub mod config;
pub mod local_ip;
pub mod logging;
pub mod manager_link;
pub mod network;
pub mod storage;
