//! BIFF8 record stream and aggregate framework.
//!
//! A worksheet stream is a flat sequence of sized records. This module
//! decodes them into typed records ([`records`]) and groups related runs
//! into aggregates ([`aggregates`]) that can be edited and re-serialized
//! with their internal bookkeeping (counts, offsets) recomputed rather
//! than copied through.

pub mod aggregates;
pub mod error;
pub mod records;

pub use aggregates::{
    ConditionalFormattingAggregate, MergedCellsAggregate, PageSettingsBlock, RecordVisitor,
    RowBlocksAggregate, SerializingVisitor, SharedFormulaResolver,
};
pub use error::{XlsError, XlsResult, XlsWarning};
pub use records::{BiffRecord, CellRange, RawRecord, RecordStream};
