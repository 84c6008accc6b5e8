//! Error types
//!
//! Defines the gateway's operation errors and the server-level error that
//! wraps them.

use serde::Serialize;
use std::fmt;
use std::io;

/// Payload-free discriminant of a [`GatewayError`].
///
/// Observers and callers that only care about the category of a failure
/// match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Forbidden,
    NotFound,
    TooLarge,
    UnsupportedType,
    NotADirectory,
    InvalidEncoding,
    IoFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TooLarge => "too_large",
            ErrorKind::UnsupportedType => "unsupported_type",
            ErrorKind::NotADirectory => "not_a_directory",
            ErrorKind::InvalidEncoding => "invalid_encoding",
            ErrorKind::IoFailure => "io_failure",
        };
        f.write_str(name)
    }
}

/// File operation gateway errors
#[derive(Debug)]
pub enum GatewayError {
    /// Path failed validation or escapes the storage root
    Forbidden(String),
    /// Target does not exist (or is not the kind of entry the operation needs)
    NotFound(String),
    /// Payload or file exceeds the configured maximum
    TooLarge { size: u64, limit: u64 },
    /// Upload extension is not allow-listed
    UnsupportedType(String),
    /// List target is not a directory
    NotADirectory(String),
    /// Unknown encoding label, or content that does not decode
    InvalidEncoding(String),
    /// Underlying storage error
    IoFailure { context: String, source: io::Error },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Forbidden(_) => ErrorKind::Forbidden,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::TooLarge { .. } => ErrorKind::TooLarge,
            GatewayError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            GatewayError::NotADirectory(_) => ErrorKind::NotADirectory,
            GatewayError::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            GatewayError::IoFailure { .. } => ErrorKind::IoFailure,
        }
    }

    /// Wrap an I/O error with the path or action it came from
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        GatewayError::IoFailure {
            context: context.into(),
            source,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Forbidden(p) => write!(f, "Invalid or forbidden path: {}", p),
            GatewayError::NotFound(p) => write!(f, "Not found: {}", p),
            GatewayError::TooLarge { size, limit } => {
                write!(f, "Too large: {} bytes exceeds limit of {} bytes", size, limit)
            }
            GatewayError::UnsupportedType(ext) => write!(f, "File type {} not allowed", ext),
            GatewayError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            GatewayError::InvalidEncoding(msg) => write!(f, "Invalid encoding: {}", msg),
            GatewayError::IoFailure { context, source } => {
                write!(f, "I/O failure on {}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::IoFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Top-level server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
