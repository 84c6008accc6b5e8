//! Command protocol implementation
//!
//! Handles command parsing, dispatch to the gateway, and response encoding.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{Command, CommandStatus, OperationResult, Payload, StatsReport};
pub use handlers::{error_result, handle_command};
pub use parser::parse_command;
