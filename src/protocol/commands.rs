//! Module `commands`
//!
//! Defines the commands a client can send, the outcome status of executing
//! one, and the result structure handed back to the session loop.

use crate::storage::{
    DeleteResult, DownloadResult, FileRecord, ListResult, ReadResult, StatsSnapshot,
    StorageStats, UploadResult, WriteResult,
};
use serde::Serialize;

/// A command parsed from a client line.
///
/// `Write` and `Upload` announce a payload of `size` bytes that follows the
/// command line on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Read { encoding: String, path: String },
    Write { size: u64, create_dirs: bool, path: String },
    Upload { size: u64, filename: String },
    Download(String),
    List(String),
    Meta(String),
    Dele(String),
    Stat,
    /// Known verb with missing or malformed arguments
    Invalid(String),
    Unknown,
}

impl Command {
    /// Number of payload bytes that follow the command line, if any
    pub fn payload_len(&self) -> Option<u64> {
        match self {
            Command::Write { size, .. } | Command::Upload { size, .. } => Some(*size),
            _ => None,
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Aggregate numbers returned by `STAT`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub status: &'static str,
    pub version: &'static str,
    pub statistics: StorageStats,
    pub operations: StatsSnapshot,
}

/// Data carried back with a successful operation
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Read(ReadResult),
    Written(WriteResult),
    Uploaded(UploadResult),
    Download(DownloadResult),
    Record(FileRecord),
    Listing(ListResult),
    Deleted(DeleteResult),
    Stats(Box<StatsReport>),
}

/// Full result of one command: produced once, written to the client, then
/// dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub status: CommandStatus,
    pub code: u16,
    pub message: String,
    pub payload: Option<Payload>,
    pub duration_ms: Option<f64>,
}

impl OperationResult {
    pub fn success(code: u16, message: impl Into<String>, payload: Option<Payload>) -> Self {
        Self {
            status: CommandStatus::Success,
            code,
            message: message.into(),
            payload,
            duration_ms: None,
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: CommandStatus::Failure(message.clone()),
            code,
            message,
            payload: None,
            duration_ms: None,
        }
    }

    pub fn close(code: u16, message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            code,
            message: message.into(),
            payload: None,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}
