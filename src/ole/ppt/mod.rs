//! PPT (PowerPoint 97-2003) record framework.
//!
//! The `PowerPoint Document` stream inside a PPT compound file is a flat
//! sequence of self-describing records: an 8-byte header (packed
//! version/instance, type id, payload length) followed by the payload.
//! Container records hold child records in their payload; atoms hold raw
//! bytes. This module provides the generic decode/encode layer; concrete
//! record semantics live with their consumers.

pub mod records;

pub use records::{PptRecord, RecordBody, RecordKind, find_child_records};

use thiserror::Error;

/// Fatal errors in the PPT record stream.
#[derive(Error, Debug)]
pub enum PptError {
    /// A record claiming type 0 with length 0xFFFF at the start of a
    /// stream, the signature of a truncated or damaged file
    #[error(
        "Corrupt record stream: record of type 0 with length 0xFFFF at offset {offset}"
    )]
    CorruptedHeader { offset: usize },

    /// Structural corruption
    #[error("Corrupt record stream: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, PptError>;

/// Recoverable anomalies encountered while scanning a record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PptWarning {
    /// A record's declared length runs past the end of its buffer; the
    /// record is dropped and the scan ends there.
    TruncatedRecord {
        record_type: u16,
        offset: usize,
        declared: usize,
        available: usize,
    },
}

impl std::fmt::Display for PptWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PptWarning::TruncatedRecord {
                record_type,
                offset,
                declared,
                available,
            } => write!(
                f,
                "record type {record_type} at offset {offset} declares {declared} bytes but only {available} remain; record dropped"
            ),
        }
    }
}
