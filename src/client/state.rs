//! Module `state`
//!
//! Per-connection bookkeeping. Sessions carry no file state: every command
//! is independent and goes straight to the gateway.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Represents one connected client.
#[derive(Debug, Clone)]
pub struct Client {
    client_addr: SocketAddr,
    connected_at: Instant,
    commands_handled: u64,
    bytes_received: u64,
}

impl Client {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr,
            connected_at: Instant::now(),
            commands_handled: 0,
            bytes_received: 0,
        }
    }

    /// Count one handled command and the payload bytes that came with it
    pub fn record_command(&mut self, payload_bytes: u64) {
        self.commands_handled += 1;
        self.bytes_received += payload_bytes;
    }

    pub fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    pub fn commands_handled(&self) -> u64 {
        self.commands_handled
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// How long the client has been connected
    pub fn session_age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_command() {
        let mut client = Client::new("127.0.0.1:4000".parse().unwrap());
        client.record_command(0);
        client.record_command(42);
        assert_eq!(client.commands_handled(), 2);
        assert_eq!(client.bytes_received(), 42);
        assert_eq!(client.client_addr().port(), 4000);
    }
}
