//! Filegate Server - Entry Point
//!
//! Sandboxed file gateway: every path is confined to one storage root.

use log::info;

use filegate_server::error::ServerError;
use filegate_server::error::handlers::handle_error;
use filegate_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;

    info!("Launching filegate server...");

    let server = Server::bind(config).await?;
    server.start().await;
    Ok(())
}
