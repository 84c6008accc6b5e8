//! Error handlers
//!
//! Maps errors to wire status codes and logs server-level failures.

use crate::error::types::{ErrorKind, GatewayError, ServerError};
use log::error;

/// Log a server error
pub fn handle_error(err: &ServerError) {
    error!("Server error: {}", err);
}

/// Convert an error kind to its response status code
pub fn error_kind_to_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Forbidden => 403,
        ErrorKind::NotFound => 404,
        ErrorKind::TooLarge => 413,
        ErrorKind::UnsupportedType => 415,
        ErrorKind::NotADirectory => 400,
        ErrorKind::InvalidEncoding => 422,
        ErrorKind::IoFailure => 500,
    }
}

/// Convert a gateway error to its response status code
pub fn error_to_code(err: &GatewayError) -> u16 {
    error_kind_to_code(err.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_distinct_code() {
        let kinds = [
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::TooLarge,
            ErrorKind::UnsupportedType,
            ErrorKind::NotADirectory,
            ErrorKind::InvalidEncoding,
            ErrorKind::IoFailure,
        ];
        let mut codes: Vec<u16> = kinds.iter().map(|k| error_kind_to_code(*k)).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_gateway_error_codes() {
        assert_eq!(error_to_code(&GatewayError::Forbidden("../x".into())), 403);
        assert_eq!(
            error_to_code(&GatewayError::TooLarge { size: 2, limit: 1 }),
            413
        );
        assert_eq!(
            error_to_code(&GatewayError::io(
                "dir",
                std::io::Error::other("Directory not empty")
            )),
            500
        );
    }
}
