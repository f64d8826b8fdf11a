//! Encodings shared by saves and the event history: gzip JSON archives and
//! single-line JSON records.
//!
//! Floats go through `serde_json`'s `float_roundtrip` parser so a restored
//! world reads back the exact bits it saved.

use crate::error::{IoError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

pub fn to_json_gz<T: Serialize>(data: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(data)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| IoError::compression(format!("gzip write failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| IoError::compression(format!("gzip finish failed: {e}")))
}

/// Inflates an archive into a JSON value, ready for schema migration.
pub fn json_value_from_gz(bytes: &[u8]) -> Result<serde_json::Value> {
    let mut json = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut json)
        .map_err(|e| IoError::compression(format!("gzip read failed: {e}")))?;
    if json.trim().is_empty() {
        return Err(IoError::validation("Empty archive"));
    }
    Ok(serde_json::from_str(&json)?)
}

/// One record per line: the encoded form never contains a newline.
pub fn to_json_line<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string(data)?)
}

pub fn from_json_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    let line = line.trim();
    if line.is_empty() {
        return Err(IoError::validation("Empty line"));
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_keeps_float_bits() {
        let stocks: Vec<f64> = vec![52.737_797_928_570_444, 0.1 + 0.2, 1.0 / 3.0, 99.999_999_999_999_99];
        let bytes = to_json_gz(&stocks).unwrap();
        let value = json_value_from_gz(&bytes).unwrap();
        let restored: Vec<f64> = serde_json::from_value(value).unwrap();
        for (a, b) in stocks.iter().zip(&restored) {
            assert_eq!(a.to_bits(), b.to_bits(), "{a} came back as {b}");
        }
    }

    #[test]
    fn test_garbage_archive_is_a_compression_error() {
        assert!(matches!(
            json_value_from_gz(b"not gzip at all"),
            Err(IoError::Compression(_))
        ));
    }

    #[test]
    fn test_blank_line_is_rejected() {
        assert!(matches!(
            from_json_line::<Vec<u32>>("   "),
            Err(IoError::Validation(_))
        ));
        assert_eq!(from_json_line::<Vec<u32>>("[1,2]\n").unwrap(), vec![1, 2]);
        assert!(!to_json_line(&"two\nlines").unwrap().contains('\n'));
    }
}
