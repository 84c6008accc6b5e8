//! Error handling
//!
//! Defines error types and handling for the gateway and server.

pub mod handlers;
pub mod types;

pub use types::*;
