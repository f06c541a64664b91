//! Offset-checked little-endian readers over byte slices.
//!
//! Every binary structure in the legacy Office formats is little-endian.
//! These helpers bound-check the slice before decoding so callers get a
//! typed error with the offending offset instead of a panic.

use thiserror::Error;
use zerocopy::{FromBytes, LE, U16, U32};

/// Error raised when a read would run past the end of a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    #[error("not enough data for {what} at offset {offset} (buffer is {len} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        len: usize,
    },
}

/// Read a little-endian u16 from a byte slice at the given offset.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16, BinaryError> {
    match data.get(offset..offset + 2) {
        Some(bytes) => Ok(U16::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .unwrap_or(0)),
        None => Err(BinaryError::OutOfBounds {
            what: "u16",
            offset,
            len: data.len(),
        }),
    }
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, BinaryError> {
    match data.get(offset..offset + 4) {
        Some(bytes) => Ok(U32::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .unwrap_or(0)),
        None => Err(BinaryError::OutOfBounds {
            what: "u32",
            offset,
            len: data.len(),
        }),
    }
}

/// Decode a UTF-16LE buffer into a String, stopping at the first NUL.
///
/// Directory entry names are stored as UTF-16LE with a declared byte length
/// that includes the terminator; callers pass the name bytes without it, but
/// malformed files sometimes embed stray NULs which must still terminate.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let even = bytes.len() & !1;
    let (decoded, _, _) = encoding_rs::UTF_16LE.decode(&bytes[..even]);
    match decoded.find('\0') {
        Some(pos) => decoded[..pos].to_string(),
        None => decoded.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
        assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
        assert!(read_u16_le(&data, 3).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let data = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
        assert!(read_u32_le(&data, 1).is_err());
    }

    #[test]
    fn test_decode_utf16le() {
        // "Root Entry" in UTF-16LE
        let bytes: Vec<u8> = "Root Entry"
            .encode_utf16()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        assert_eq!(decode_utf16le(&bytes), "Root Entry");
    }

    #[test]
    fn test_decode_utf16le_embedded_nul() {
        let bytes = [0x41, 0x00, 0x00, 0x00, 0x42, 0x00];
        assert_eq!(decode_utf16le(&bytes), "A");
    }
}
