//! Aggregates: multi-record structures edited as one unit.
//!
//! Each aggregate consumes a run of related records from a
//! [`RecordStream`](crate::ole::xls::records::RecordStream), owns them as
//! one editable value, and re-emits them through a [`RecordVisitor`] with
//! every derived field (counts, offsets, chunking) recomputed from the
//! current state. Nothing positional from the source file survives a
//! round trip; it is all rebuilt.

pub mod cond_format;
pub mod merged_cells;
pub mod page_settings;
pub mod row_blocks;
pub mod shared_formula;

pub use cond_format::ConditionalFormattingAggregate;
pub use merged_cells::MergedCellsAggregate;
pub use page_settings::PageSettingsBlock;
pub use row_blocks::RowBlocksAggregate;
pub use shared_formula::SharedFormulaResolver;

use crate::ole::xls::records::BiffRecord;

/// Receives records as an aggregate re-emits itself.
pub trait RecordVisitor {
    fn visit(&mut self, record: &BiffRecord);
}

/// A group of records that serializes by visiting its members in stream
/// order.
pub trait RecordAggregate {
    fn visit_records(&self, visitor: &mut dyn RecordVisitor);
}

/// Visitor that serializes every visited record into a byte buffer.
#[derive(Default)]
pub struct SerializingVisitor {
    out: Vec<u8>,
}

impl SerializingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

impl RecordVisitor for SerializingVisitor {
    fn visit(&mut self, record: &BiffRecord) {
        record.serialize(&mut self.out);
    }
}

/// Serialize an aggregate to bytes.
pub fn serialize_aggregate(aggregate: &dyn RecordAggregate) -> Vec<u8> {
    let mut visitor = SerializingVisitor::new();
    aggregate.visit_records(&mut visitor);
    visitor.into_bytes()
}
