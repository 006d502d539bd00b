//! The storage adapter: store, connections, matchers, namespaces

mod config;
mod connection;
mod matcher;
mod namespaces;
mod store;

pub use config::SailConfig;
pub use connection::{ConnectionListener, SailConnection, Statements};
pub use store::SailStore;
