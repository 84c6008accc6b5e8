//! Text encodings accepted by the read operation

use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

/// Encodings a caller can request when reading a file as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Decode `bytes` into a string.
    ///
    /// A leading UTF-8 byte order mark is kept, matching a plain UTF-8 read.
    pub fn decode(self, bytes: &[u8]) -> Result<String, GatewayError> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| GatewayError::InvalidEncoding(format!("utf-8: {}", e))),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(GatewayError::InvalidEncoding(format!(
                    "ascii: byte 0x{:02x} at offset {} is out of range",
                    bytes[pos], pos
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            // Latin-1 maps every byte straight onto U+0000..U+00FF
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes, "utf-16le"),
            TextEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes, "utf-16be"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        }
    }
}

fn decode_utf16(
    bytes: &[u8],
    to_unit: fn([u8; 2]) -> u16,
    label: &str,
) -> Result<String, GatewayError> {
    if bytes.len() % 2 != 0 {
        return Err(GatewayError::InvalidEncoding(format!(
            "{}: odd number of bytes ({})",
            label,
            bytes.len()
        )));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units).map_err(|e| GatewayError::InvalidEncoding(format!("{}: {}", label, e)))
}

impl FromStr for TextEncoding {
    type Err = GatewayError;

    /// Parse an encoding label. Case, `_` versus `-` and surrounding
    /// whitespace are ignored.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            "utf-16le" | "utf16le" => Ok(TextEncoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(TextEncoding::Utf16Be),
            _ => Err(GatewayError::InvalidEncoding(format!(
                "unknown encoding {:?}",
                label
            ))),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("utf-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("UTF8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!(" utf_8 ".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!(
            "ISO-8859-1".parse::<TextEncoding>().unwrap(),
            TextEncoding::Latin1
        );
        assert_eq!(
            "utf-16le".parse::<TextEncoding>().unwrap(),
            TextEncoding::Utf16Le
        );
        assert!(matches!(
            "klingon".parse::<TextEncoding>(),
            Err(GatewayError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(
            TextEncoding::Utf8.decode("héllo".as_bytes()).unwrap(),
            "héllo"
        );
        assert!(TextEncoding::Utf8.decode(&[0xff, 0xfe, 0x41]).is_err());
    }

    #[test]
    fn test_decode_single_byte() {
        assert_eq!(TextEncoding::Latin1.decode(&[0x68, 0xe9]).unwrap(), "hé");
        assert_eq!(TextEncoding::Ascii.decode(b"plain").unwrap(), "plain");
        assert!(TextEncoding::Ascii.decode(&[0x68, 0xe9]).is_err());
    }

    #[test]
    fn test_decode_utf16() {
        assert_eq!(
            TextEncoding::Utf16Le.decode(&[0x68, 0x00, 0x69, 0x00]).unwrap(),
            "hi"
        );
        assert_eq!(
            TextEncoding::Utf16Be.decode(&[0x00, 0x68, 0x00, 0x69]).unwrap(),
            "hi"
        );
        assert!(TextEncoding::Utf16Le.decode(&[0x68]).is_err());
    }
}
