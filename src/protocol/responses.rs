//! Response handling
//!
//! Status codes and wire formatting. A response is one status line,
//! optionally followed by a data block:
//!
//! ```text
//! <code> <message>\r\n
//! DATA <len> [filename]\r\n
//! <len bytes>
//! ```
//!
//! Downloads carry raw file bytes; every other payload is JSON.

use crate::protocol::{OperationResult, Payload};

/// Standard response codes
pub const OK: u16 = 200;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TOO_MANY_CONNECTIONS: u16 = 421;
pub const COMMAND_TOO_LONG: u16 = 414;
pub const INTERNAL_ERROR: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;
pub const UNKNOWN_COMMAND: u16 = 502;

/// Format a status line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}

/// Serialize a full operation result for the wire
pub fn encode_result(result: &OperationResult) -> Result<Vec<u8>, serde_json::Error> {
    let message = match result.duration_ms {
        Some(ms) => format!("{} ({:.2} ms)", result.message, ms),
        None => result.message.clone(),
    };
    let mut out = format_response(result.code, &message).into_bytes();

    let Some(payload) = &result.payload else {
        return Ok(out);
    };

    let (body, filename) = match payload {
        Payload::Download(download) => (download.data.clone(), Some(download.filename.as_str())),
        Payload::Read(read) => (serde_json::to_vec(read)?, None),
        Payload::Written(written) => (serde_json::to_vec(written)?, None),
        Payload::Uploaded(uploaded) => (serde_json::to_vec(uploaded)?, None),
        Payload::Record(record) => (serde_json::to_vec(record)?, None),
        Payload::Listing(listing) => (serde_json::to_vec(listing)?, None),
        Payload::Deleted(deleted) => (serde_json::to_vec(deleted)?, None),
        Payload::Stats(stats) => (serde_json::to_vec(stats.as_ref())?, None),
    };

    let header = match filename {
        Some(name) => format!("DATA {} {}\r\n", body.len(), name),
        None => format!("DATA {}\r\n", body.len()),
    };
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DownloadResult, ReadResult};

    #[test]
    fn test_format_response() {
        assert_eq!(format_response(OK, "Done"), "200 Done\r\n");
        assert_eq!(format_response(403, "Forbidden"), "403 Forbidden\r\n");
    }

    #[test]
    fn test_encode_without_payload() {
        let result = OperationResult::failure(404, "Not found: a.txt");
        assert_eq!(encode_result(&result).unwrap(), b"404 Not found: a.txt\r\n");
    }

    #[test]
    fn test_encode_json_payload() {
        let result = OperationResult::success(
            OK,
            "Successfully read 5 bytes",
            Some(Payload::Read(ReadResult {
                content: "hello".into(),
                size: 5,
            })),
        );
        let encoded = String::from_utf8(encode_result(&result).unwrap()).unwrap();
        let body = r#"{"content":"hello","size":5}"#;
        assert_eq!(
            encoded,
            format!("200 Successfully read 5 bytes\r\nDATA {}\r\n{}", body.len(), body)
        );
    }

    #[test]
    fn test_encode_download_is_raw() {
        let result = OperationResult::success(
            OK,
            "Sending a.bin",
            Some(Payload::Download(DownloadResult {
                filename: "a.bin".into(),
                data: vec![0, 159, 146, 150],
            })),
        )
        .with_duration(1.5);
        let encoded = encode_result(&result).unwrap();
        let mut expected = b"200 Sending a.bin (1.50 ms)\r\nDATA 4 a.bin\r\n".to_vec();
        expected.extend_from_slice(&[0, 159, 146, 150]);
        assert_eq!(encoded, expected);
    }
}
