//! Longan - A Rust library for parsing legacy Microsoft Office binary formats
//!
//! This library implements the OLE2 (Object Linking and Embedding) compound
//! file format — the structured-storage container used by .doc, .xls and .ppt
//! files — together with the record stream models layered on top of it by the
//! binary PowerPoint (PPT) and Excel (XLS/BIFF8) formats.
//!
//! # Features
//!
//! - **OLE2 reader**: header validation with format diagnosis, FAT/DIFAT and
//!   MiniFAT chain resolution, directory tree traversal, stream extraction
//! - **OLE2 writer**: buffered stream/storage creation with FAT, DIFAT,
//!   MiniFAT and directory generation, including the fixed-point sizing of
//!   the allocation table's own sectors
//! - **PPT record framework**: container/atom record tree parsing with a
//!   static type registry and byte-exact round-trip of unknown records
//! - **XLS record framework**: BIFF record stream decoding plus the record
//!   aggregates (shared formulas, row blocks, conditional formatting, merged
//!   cells, page settings) required for consistent read-modify-write cycles
//!
//! # Example - Low-level OLE access
//!
//! ```no_run
//! use std::fs::File;
//! use longan::ole::OleFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("document.doc")?;
//! let mut ole = OleFile::open(file)?;
//!
//! for path in ole.list_streams() {
//!     println!("Stream: {}", path.join("/"));
//! }
//!
//! let data = ole.open_stream(&["WordDocument"])?;
//! println!("WordDocument: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Writing a compound file
//!
//! ```no_run
//! use longan::ole::writer::OleWriter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = OleWriter::new();
//! writer.create_stream(&["MyStream"], b"Hello, World!")?;
//! writer.save("output.ole")?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod ole;

pub use common::error::{Error, Result};
