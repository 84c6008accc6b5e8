//! Client management system
//!
//! Handles client sessions, per-connection state, and the connection registry.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::{SessionContext, handle_client};
pub use registry::ClientRegistry;
pub use state::Client;
