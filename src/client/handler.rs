use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::Mutex;

use crate::client::ClientRegistry;
use crate::error::GatewayError;
use crate::middleware::logging::{log_command, log_disconnect};
use crate::protocol::responses::{
    COMMAND_TOO_LONG, INTERNAL_ERROR, SYNTAX_ERROR, encode_result, format_response,
};
use crate::protocol::{
    Command, CommandStatus, OperationResult, error_result, handle_command, parse_command,
};
use crate::storage::{FileGateway, OperationStats};

/// Everything a session needs besides its socket
pub struct SessionContext {
    pub gateway: FileGateway,
    pub stats: Arc<OperationStats>,
    pub max_command_length: usize,
}

/// Handles one client session using the Tokio async runtime.
///
/// - Reads command lines (bounded by `max_command_length`) and any payload
///   that follows them.
/// - Runs every command on the blocking pool so slow storage never stalls
///   other sessions.
/// - Removes the client from the registry when the session ends.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    clients: Arc<Mutex<ClientRegistry>>,
    ctx: Arc<SessionContext>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line: Vec<u8> = Vec::new();
    let line_limit = ctx.max_command_length as u64 + 2;

    loop {
        line.clear();
        let read = (&mut reader)
            .take(line_limit)
            .read_until(b'\n', &mut line)
            .await;
        match read {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                let terminated = line.last() == Some(&b'\n');
                let trimmed = trim_line_ending(&line);

                // Enforce command length limit, in bytes
                if trimmed.len() > ctx.max_command_length {
                    warn!("Command from {} exceeds {} bytes", client_addr, ctx.max_command_length);
                    if !terminated {
                        match discard_rest_of_line(&mut reader).await {
                            Ok(true) => {}
                            Ok(false) => break,
                            Err(e) => {
                                error!("Failed to read from {}: {}", client_addr, e);
                                break;
                            }
                        }
                    }
                    let response = format_response(COMMAND_TOO_LONG, "Command too long");
                    if write_half.write_all(response.as_bytes()).await.is_err() {
                        break;
                    }
                    continue;
                }

                let Ok(text) = std::str::from_utf8(trimmed) else {
                    warn!("Command from {} is not valid UTF-8", client_addr);
                    let response = format_response(SYNTAX_ERROR, "Command is not valid UTF-8");
                    if write_half.write_all(response.as_bytes()).await.is_err() {
                        break;
                    }
                    continue;
                };

                let command = parse_command(text);
                log_command(&client_addr, &command);

                let payload_len = command.payload_len().unwrap_or(0);
                let result = match receive_payload(&mut reader, &command, &ctx).await {
                    Ok(Some(body)) => run_command(&ctx, command, body).await,
                    Ok(None) => oversized_result(&ctx, command, payload_len).await,
                    Err(e) => {
                        error!("Failed to read payload from {}: {}", client_addr, e);
                        break;
                    }
                };

                if let Some(client) = clients.lock().await.get_mut(&client_addr) {
                    client.record_command(payload_len);
                }

                let bytes = match encode_result(&result) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!("Failed to encode response for {}: {}", client_addr, e);
                        format_response(INTERNAL_ERROR, "Internal server error").into_bytes()
                    }
                };

                if let Err(e) = write_half.write_all(&bytes).await {
                    error!("Failed to write to {}: {}", client_addr, e);
                    break;
                }
                let _ = write_half.flush().await;

                if result.status == CommandStatus::CloseConnection {
                    info!("Client {} requested to quit", client_addr);
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let removed = clients.lock().await.remove(&client_addr);
    match removed {
        Some(client) => log_disconnect(&client),
        None => info!("Client {} disconnected", client_addr),
    }
}

/// The line without its trailing `\r`/`\n` bytes
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |pos| pos + 1);
    &line[..end]
}

/// Skip input up to and including the next newline.
///
/// Returns `false` if the client closed the connection first.
async fn discard_rest_of_line(reader: &mut BufReader<OwnedReadHalf>) -> std::io::Result<bool> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(false);
        }
        let (consumed, found) = match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (buf.len(), false),
        };
        reader.consume(consumed);
        if found {
            return Ok(true);
        }
    }
}

/// Read the payload announced by `command`.
///
/// Returns `Ok(None)` when the announced size is over the limit; those bytes
/// are drained and discarded so the next command line stays in sync.
async fn receive_payload(
    reader: &mut BufReader<OwnedReadHalf>,
    command: &Command,
    ctx: &SessionContext,
) -> std::io::Result<Option<Vec<u8>>> {
    let Some(len) = command.payload_len() else {
        return Ok(Some(Vec::new()));
    };

    if len > ctx.gateway.max_file_size() {
        let drained = tokio::io::copy(&mut (&mut *reader).take(len), &mut tokio::io::sink()).await?;
        if drained < len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "client closed before sending the announced payload",
            ));
        }
        return Ok(None);
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Result for a payload that was too large to accept.
///
/// Uploads still go through the gateway, which rejects them on the declared
/// size alone; writes have no content to hand over.
async fn oversized_result(ctx: &Arc<SessionContext>, command: Command, size: u64) -> OperationResult {
    match command {
        Command::Upload { .. } => run_command(ctx, command, Vec::new()).await,
        _ => error_result(&GatewayError::TooLarge {
            size,
            limit: ctx.gateway.max_file_size(),
        }),
    }
}

async fn run_command(ctx: &Arc<SessionContext>, command: Command, body: Vec<u8>) -> OperationResult {
    let ctx = Arc::clone(ctx);
    let task = tokio::task::spawn_blocking(move || {
        handle_command(&ctx.gateway, &ctx.stats, command, body)
    });

    match task.await {
        Ok(result) => result,
        Err(e) => {
            error!("Command task failed: {}", e);
            OperationResult::failure(INTERNAL_ERROR, "Internal server error")
        }
    }
}
