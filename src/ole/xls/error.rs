//! Error and warning types for the BIFF record layer.

use thiserror::Error;

/// Result type alias for XLS operations.
pub type XlsResult<T> = Result<T, XlsError>;

/// Errors raised while decoding or assembling BIFF records.
#[derive(Error, Debug)]
pub enum XlsError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record's payload does not match its sid's expected layout
    #[error("Invalid record 0x{sid:04X}: {message}")]
    InvalidRecord { sid: u16, message: String },

    /// A record header declares more payload than the stream holds
    #[error(
        "Record 0x{sid:04X} declares {declared} payload bytes but only {available} remain"
    )]
    InvalidLength {
        sid: u16,
        declared: usize,
        available: usize,
    },

    /// The stream ended inside a record header
    #[error("Unexpected end of record stream: {0}")]
    UnexpectedEndOfStream(String),

    /// A different record was required at this point in the stream
    #[error("Expected record 0x{expected:04X}, found 0x{found:04X}")]
    UnexpectedRecordType { expected: u16, found: u16 },

    /// An aggregate's header count disagrees with its detail records
    #[error("{aggregate}: header declares {declared} records, found {actual}")]
    AggregateMismatch {
        aggregate: &'static str,
        declared: usize,
        actual: usize,
    },

    /// A singleton record appeared twice within one aggregate block
    #[error("Duplicate record 0x{sid:04X} in {aggregate}")]
    DuplicateRecord { sid: u16, aggregate: &'static str },
}

/// Recoverable anomalies encountered while aggregating records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XlsWarning {
    /// A formula flagged shared whose anchor cell has no shared-formula
    /// definition; the flag is cleared and the embedded expression kept.
    OrphanedSharedFormula { row: u32, col: u16 },

    /// A cell record arrived for a row with no ROW record; the cells are
    /// kept and a default ROW is synthesized when the sheet is written.
    MissingRowRecord { row: u32 },
}

impl std::fmt::Display for XlsWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XlsWarning::OrphanedSharedFormula { row, col } => write!(
                f,
                "formula at ({row}, {col}) is flagged shared but no shared formula covers it; flag cleared"
            ),
            XlsWarning::MissingRowRecord { row } => write!(
                f,
                "cells at row {row} have no ROW record; a default row will be written"
            ),
        }
    }
}
