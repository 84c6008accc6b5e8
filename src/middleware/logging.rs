//! Logging middleware
//!
//! Session-level log lines. Per-operation logging is done by the gateway's
//! `LogObserver`.

use log::{debug, info};
use std::net::SocketAddr;

use crate::client::Client;
use crate::protocol::Command;

/// Log a client connection
pub fn log_connection(client_addr: &SocketAddr, active: usize, capacity: usize) {
    info!(
        "Client connected: {} ({}/{} clients)",
        client_addr, active, capacity
    );
}

/// Log a received command. Payload bytes are never logged.
pub fn log_command(client_addr: &SocketAddr, command: &Command) {
    debug!("Received from {}: {:?}", client_addr, command);
}

/// Log a client disconnect with its session totals
pub fn log_disconnect(client: &Client) {
    info!(
        "Client {} disconnected after {:.1}s ({} commands, {} payload bytes)",
        client.client_addr(),
        client.session_age().as_secs_f64(),
        client.commands_handled(),
        client.bytes_received()
    );
}
