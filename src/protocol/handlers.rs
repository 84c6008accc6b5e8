//! Command handlers module for the filegate server.
//!
//! Maps each parsed command onto a gateway operation and turns the outcome
//! into an [`OperationResult`]. Handlers are synchronous; the session loop
//! runs them on the blocking pool.

use log::error;
use std::time::Instant;

use crate::error::GatewayError;
use crate::error::handlers::error_to_code;
use crate::protocol::responses::{GOODBYE, OK, SYNTAX_ERROR, UNKNOWN_COMMAND};
use crate::protocol::{Command, OperationResult, Payload, StatsReport};
use crate::storage::{FileGateway, OperationStats};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dispatches a received command to its corresponding handler.
///
/// # Arguments
///
/// * `gateway` - The file operation gateway all storage access goes through.
/// * `stats` - Operation counters reported by `STAT`.
/// * `command` - The parsed command.
/// * `body` - Payload bytes that followed the command line (empty if none).
///
/// # Returns
///
/// * `OperationResult` - Status, code, message, optional payload and duration.
pub fn handle_command(
    gateway: &FileGateway,
    stats: &OperationStats,
    command: Command,
    body: Vec<u8>,
) -> OperationResult {
    let started = Instant::now();

    let result = match command {
        Command::Quit => return OperationResult::close(GOODBYE, "Goodbye"),
        Command::Read { encoding, path } => handle_cmd_read(gateway, &path, &encoding),
        Command::Write {
            create_dirs, path, ..
        } => handle_cmd_write(gateway, &path, body, create_dirs),
        Command::Upload { size, filename } => handle_cmd_upload(gateway, &filename, size, &body),
        Command::Download(path) => handle_cmd_download(gateway, &path),
        Command::List(path) => handle_cmd_list(gateway, &path),
        Command::Meta(path) => handle_cmd_meta(gateway, &path),
        Command::Dele(path) => handle_cmd_dele(gateway, &path),
        Command::Stat => handle_cmd_stat(gateway, stats),
        Command::Invalid(usage) => return OperationResult::failure(SYNTAX_ERROR, usage),
        Command::Unknown => return OperationResult::failure(UNKNOWN_COMMAND, "Unknown command"),
    };

    result.with_duration(started.elapsed().as_secs_f64() * 1000.0)
}

/// Result for an error raised outside the gateway (e.g. an oversized payload
/// rejected before it was read)
pub fn error_result(err: &GatewayError) -> OperationResult {
    OperationResult::failure(error_to_code(err), err.to_string())
}

fn handle_cmd_read(gateway: &FileGateway, path: &str, encoding: &str) -> OperationResult {
    match gateway.read(path, encoding) {
        Ok(read) => OperationResult::success(
            OK,
            format!("Successfully read {} bytes", read.size),
            Some(Payload::Read(read)),
        ),
        Err(e) => error_result(&e),
    }
}

/// The payload must be UTF-8 text; it is stored as UTF-8 whatever encoding
/// later reads ask for.
fn handle_cmd_write(
    gateway: &FileGateway,
    path: &str,
    body: Vec<u8>,
    create_dirs: bool,
) -> OperationResult {
    let content = match String::from_utf8(body) {
        Ok(content) => content,
        Err(e) => {
            return error_result(&GatewayError::InvalidEncoding(format!(
                "write content is not utf-8: {}",
                e.utf8_error()
            )));
        }
    };

    match gateway.write(path, &content, create_dirs) {
        Ok(written) => OperationResult::success(
            OK,
            format!("Successfully wrote {} bytes to {}", written.size, path),
            Some(Payload::Written(written)),
        ),
        Err(e) => error_result(&e),
    }
}

fn handle_cmd_upload(
    gateway: &FileGateway,
    filename: &str,
    declared_size: u64,
    body: &[u8],
) -> OperationResult {
    match gateway.upload(filename, declared_size, body) {
        Ok(uploaded) => OperationResult::success(
            OK,
            "File uploaded successfully",
            Some(Payload::Uploaded(uploaded)),
        ),
        Err(e) => error_result(&e),
    }
}

fn handle_cmd_download(gateway: &FileGateway, path: &str) -> OperationResult {
    match gateway.download(path) {
        Ok(download) => OperationResult::success(
            OK,
            format!("Sending {} ({} bytes)", download.filename, download.data.len()),
            Some(Payload::Download(download)),
        ),
        Err(e) => error_result(&e),
    }
}

fn handle_cmd_list(gateway: &FileGateway, path: &str) -> OperationResult {
    match gateway.list(path) {
        Ok(listing) => OperationResult::success(
            OK,
            format!("Found {} items", listing.entries.len()),
            Some(Payload::Listing(listing)),
        ),
        Err(e) => error_result(&e),
    }
}

fn handle_cmd_meta(gateway: &FileGateway, path: &str) -> OperationResult {
    match gateway.metadata(path) {
        Ok(record) => OperationResult::success(
            OK,
            format!("Metadata for {}", record.path),
            Some(Payload::Record(record)),
        ),
        Err(e) => error_result(&e),
    }
}

fn handle_cmd_dele(gateway: &FileGateway, path: &str) -> OperationResult {
    match gateway.delete(path) {
        Ok(deleted) => OperationResult::success(
            OK,
            format!("Successfully deleted {}", path),
            Some(Payload::Deleted(deleted)),
        ),
        Err(e) => error_result(&e),
    }
}

fn handle_cmd_stat(gateway: &FileGateway, stats: &OperationStats) -> OperationResult {
    match gateway.stats() {
        Ok(statistics) => OperationResult::success(
            OK,
            "operational",
            Some(Payload::Stats(Box::new(StatsReport {
                status: "operational",
                version: SERVICE_VERSION,
                statistics,
                operations: stats.snapshot(),
            }))),
        ),
        Err(e) => {
            error!("Stats scan failed: {}", e);
            error_result(&e)
        }
    }
}
