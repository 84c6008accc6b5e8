//! Server core functionality
//!
//! The listener, connection admission and the hand-off to client sessions.

pub mod core;

pub use core::Server;
