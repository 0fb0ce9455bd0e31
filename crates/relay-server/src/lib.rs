//! # relay-server
//!
//! Worker server for the relay chat system. Serves end-user clients over the
//! binary wire protocol and maintains a registration link to the manager:
//! register on startup, adopt the assigned server ID, answer activation, and
//! forward client activity logs.
//!
//! Layout follows the usual split: `application` holds the request handlers
//! and ID allocation, `infrastructure` holds sockets, the manager link,
//! configuration, and logging.

pub mod application;
pub mod infrastructure;

pub use application::allocator::AccountIdAllocator;
pub use application::dispatch::Dispatcher;
pub use infrastructure::config::{load_config, ServerConfig};
pub use infrastructure::logging::{ActivityLog, LogChannel};
pub use infrastructure::manager_link::{LinkState, ManagerLink};
pub use infrastructure::network::ConnectionSupervisor;
pub use infrastructure::storage::{Directory, DirectoryError, NullDirectory};
