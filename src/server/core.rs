use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry, SessionContext, handle_client};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::logging::log_connection;
use crate::protocol::responses::{READY, TOO_MANY_CONNECTIONS, format_response};
use crate::storage::{
    FileGateway, LogObserver, ObserverSet, OperationObserver, OperationStats,
};

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    session: Arc<SessionContext>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Open the storage root and bind the listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let gateway = FileGateway::from_config(&config.storage).map_err(|e| {
            error!(
                "Failed to open storage root {}: {}",
                config.storage.storage_root, e
            );
            e
        })?;
        info!("Storage root: {}", gateway.root().path().display());

        let stats = Arc::new(OperationStats::new());
        let observers = ObserverSet::new(vec![
            Arc::new(LogObserver) as Arc<dyn OperationObserver>,
            stats.clone(),
        ]);
        let gateway = gateway.with_observer(Arc::new(observers));

        let socket = config.network.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new(
                config.network.max_clients,
            ))),
            session: Arc::new(SessionContext {
                gateway,
                stats,
                max_command_length: config.network.max_command_length,
            }),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn gateway(&self) -> &FileGateway {
        &self.session.gateway
    }

    pub fn stats(&self) -> &OperationStats {
        &self.session.stats
    }

    pub async fn start(&self) {
        info!(
            "Starting filegate server on {} (max {} clients, {} MiB file limit)",
            self.config.network.listen_socket(),
            self.config.network.max_clients,
            self.config.storage.max_file_size_mb
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let session = Arc::clone(&self.session);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, client_registry, session).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Admits a new client: enforces the connection cap, registers, greets and
/// runs the session.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    session: Arc<SessionContext>,
) -> Result<(), std::io::Error> {
    {
        let mut clients = client_registry.lock().await;

        if !clients.try_insert(Client::new(client_addr)) {
            warn!(
                "Rejecting {}: {} clients already connected",
                client_addr,
                clients.len()
            );
            drop(clients);
            let response = format_response(TOO_MANY_CONNECTIONS, "Too many connections");
            stream.write_all(response.as_bytes()).await?;
            stream.flush().await?;
            return Ok(());
        }

        log_connection(&client_addr, clients.len(), clients.capacity());
    }

    if let Err(e) = send_greeting(&mut stream).await {
        client_registry.lock().await.remove(&client_addr);
        return Err(e);
    }

    handle_client(stream, client_addr, client_registry, session).await;
    Ok(())
}

async fn send_greeting(stream: &mut TcpStream) -> Result<(), std::io::Error> {
    let greeting = format_response(READY, "Filegate ready");
    stream.write_all(greeting.as_bytes()).await?;
    stream.flush().await
}
