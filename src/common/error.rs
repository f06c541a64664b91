//! Unified error types for the Longan library.
//!
//! Each format layer has its own error type (`OleError`, `PptError`,
//! `XlsError`); this module provides the unified enum they convert into so
//! applications can handle everything through one `Result` alias.

use thiserror::Error;

/// Main error type for Longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Compound file (OLE2) error
    #[error("OLE error: {0}")]
    Ole(#[from] crate::ole::OleError),

    /// PPT record stream error
    #[error("PPT error: {0}")]
    Ppt(#[from] crate::ole::ppt::PptError),

    /// XLS record stream error
    #[error("XLS error: {0}")]
    Xls(#[from] crate::ole::xls::XlsError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for Longan operations.
pub type Result<T> = std::result::Result<T, Error>;
