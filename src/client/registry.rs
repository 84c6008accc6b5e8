//! Client registry
//!
//! Tracks connected clients so the server can enforce its connection cap.

use crate::client::Client;
use std::collections::HashMap;
use std::net::SocketAddr;

/// Registry for tracking active clients
#[derive(Debug)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, Client>,
    capacity: usize,
}

impl ClientRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            capacity,
        }
    }

    /// Register a client unless the registry is full.
    ///
    /// Returns `false` (and registers nothing) when at capacity.
    pub fn try_insert(&mut self, client: Client) -> bool {
        if self.clients.len() >= self.capacity {
            return false;
        }
        self.clients.insert(client.client_addr(), client);
        true
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Client> {
        self.clients.remove(addr)
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Client> {
        self.clients.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Client> {
        self.clients.get_mut(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
