//! # relay-client
//!
//! End-user client for the relay chat system. Asks the manager for the
//! active worker, opens a connection to it, and runs session operations
//! (account creation, login, channel reads, messaging) over the binary
//! wire protocol.

pub mod application;
pub mod infrastructure;

pub use application::session::{Session, SessionError};
pub use infrastructure::assignment::{acquire_connection, query_assignment, AssignmentError};
pub use infrastructure::config::{load_config, ClientConfig};
pub use infrastructure::network::{ConnectionError, WorkerConnection};
