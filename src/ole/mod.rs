//! OLE2 (Compound File Binary) format support.
//!
//! An OLE2 file is a filesystem-within-a-file: fixed-size sectors chained
//! through a File Allocation Table, a secondary mini-FAT for small streams,
//! and a directory tree of named streams and storages. This module provides
//! the full read path ([`OleFile`]), the full write path
//! ([`writer::OleWriter`]), and the PPT/XLS record models layered on top.

pub mod consts;
pub mod fat;
pub mod file;
pub mod header;
pub mod minifat;
pub mod ppt;
pub mod sectors;
pub mod writer;
pub mod xls;

pub use fat::AllocationTable;
pub use file::{DirectoryEntry, OleFile, is_ole_file};
pub use header::HeaderBlock;

use thiserror::Error;

/// Errors raised while parsing or writing a compound file.
#[derive(Error, Debug)]
pub enum OleError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not carry the OLE2 magic and matches no known format
    #[error("Not an OLE file")]
    NotOleFile,

    /// The file is a ZIP archive, almost certainly an OOXML document.
    /// Callers should retry with an OOXML (.docx/.xlsx/.pptx) parser.
    #[error("Not an OLE file: this is a ZIP archive (OOXML document?)")]
    OoxmlFile,

    /// The file starts with XML markup rather than a binary container
    #[error("Not an OLE file: this is raw XML")]
    RawXml,

    /// The file is a bare BIFF2-4 worksheet stream without an OLE wrapper
    #[error("Not an OLE file: this is a raw BIFF{0} worksheet stream")]
    LegacyBiff(u8),

    /// The header's sector-shift selector is neither 9 (512) nor 12 (4096)
    #[error("Unsupported sector size: sector shift {0}")]
    UnsupportedSectorSize(u16),

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A sector chain references a sector outside the physical file
    #[error("Corrupted file: sector {sector} is out of range ({available} sectors available)")]
    SectorOutOfRange { sector: u32, available: usize },

    /// A sector chain revisits a sector it already consumed
    #[error("Corrupted file: cyclic sector chain at sector {sector} (chain start {chain_start})")]
    CyclicChain { sector: u32, chain_start: u32 },

    /// A sector chain follows a link into an unused allocation table entry
    #[error("Corrupted file: broken chain at sector {sector} (next index {next})")]
    BrokenChain { sector: u32, next: u32 },

    /// Generic structural corruption
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    /// Stream or storage not found
    #[error("Stream not found")]
    StreamNotFound,
}

impl From<crate::common::binary::BinaryError> for OleError {
    fn from(err: crate::common::binary::BinaryError) -> Self {
        OleError::InvalidData(err.to_string())
    }
}

/// Recoverable anomalies encountered while reading a compound file.
///
/// These correspond to malformed-but-salvageable files seen in the wild.
/// They are collected rather than logged so callers can decide policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OleWarning {
    /// A sector chain ran into the directory stream's start sector; the
    /// chain is treated as ending there.
    ChainReachedDirectoryStart { sector: u32, chain_start: u32 },

    /// An empty chain was terminated with 0 instead of ENDOFCHAIN on its
    /// very first step.
    EmptyChainTerminatedWithZero { chain_start: u32 },
}

impl std::fmt::Display for OleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OleWarning::ChainReachedDirectoryStart {
                sector,
                chain_start,
            } => write!(
                f,
                "chain starting at sector {chain_start} reached the directory start at sector {sector}; treated as end of chain"
            ),
            OleWarning::EmptyChainTerminatedWithZero { chain_start } => write!(
                f,
                "empty chain at sector {chain_start} terminated with 0 instead of ENDOFCHAIN"
            ),
        }
    }
}
