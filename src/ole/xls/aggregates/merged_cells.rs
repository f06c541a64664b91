//! Merged cell regions.
//!
//! A sheet with many merged regions spreads them across consecutive
//! MERGEDCELLS records, each capped at 1027 ranges by the u16 record
//! length. The aggregate flattens every consecutive record into one
//! range list and re-chunks it on write, so how the source file split
//! its ranges never survives a round trip.

use crate::ole::xls::aggregates::{RecordAggregate, RecordVisitor};
use crate::ole::xls::error::XlsResult;
use crate::ole::xls::records::{
    BiffRecord, CellRange, MergedCellsRecord, RecordStream, sid,
};

/// All merged regions of one sheet.
#[derive(Debug, Clone, Default)]
pub struct MergedCellsAggregate {
    ranges: Vec<CellRange>,
}

impl MergedCellsAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume every consecutive MERGEDCELLS record at the stream's
    /// current position.
    pub fn from_stream(stream: &mut RecordStream<'_>) -> XlsResult<Self> {
        let mut aggregate = MergedCellsAggregate::new();
        while stream.peek_sid() == Some(sid::MERGED_CELLS) {
            let raw = stream.next_record()?;
            let record = MergedCellsRecord::parse(raw.data)?;
            aggregate.ranges.extend(record.ranges);
        }
        Ok(aggregate)
    }

    pub fn add(&mut self, range: CellRange) {
        self.ranges.push(range);
    }

    pub fn remove(&mut self, index: usize) -> Option<CellRange> {
        if index < self.ranges.len() {
            Some(self.ranges.remove(index))
        } else {
            None
        }
    }

    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The first region containing (row, col), if any.
    pub fn region_containing(&self, row: u16, col: u16) -> Option<&CellRange> {
        self.ranges.iter().find(|range| range.contains(row, col))
    }
}

impl RecordAggregate for MergedCellsAggregate {
    fn visit_records(&self, visitor: &mut dyn RecordVisitor) {
        for chunk in self.ranges.chunks(MergedCellsRecord::MAX_RANGES) {
            visitor.visit(&BiffRecord::MergedCells(MergedCellsRecord {
                ranges: chunk.to_vec(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::xls::aggregates::serialize_aggregate;

    fn range(row: u16) -> CellRange {
        CellRange {
            first_row: row,
            last_row: row,
            first_col: 0,
            last_col: 4,
        }
    }

    #[test]
    fn test_consecutive_records_flatten() {
        let mut data = Vec::new();
        MergedCellsRecord {
            ranges: vec![range(0), range(1)],
        }
        .serialize(&mut data);
        MergedCellsRecord {
            ranges: vec![range(2)],
        }
        .serialize(&mut data);

        let mut stream = RecordStream::new(&data);
        let aggregate = MergedCellsAggregate::from_stream(&mut stream).unwrap();
        assert_eq!(aggregate.len(), 3);
        assert!(!stream.has_next());
        assert!(aggregate.region_containing(1, 2).is_some());
        assert!(aggregate.region_containing(9, 0).is_none());
    }

    #[test]
    fn test_rechunks_at_record_capacity() {
        let mut aggregate = MergedCellsAggregate::new();
        for i in 0..1500u16 {
            aggregate.add(range(i));
        }

        let bytes = serialize_aggregate(&aggregate);
        let mut stream = RecordStream::new(&bytes);
        let first = MergedCellsRecord::parse(stream.next_record().unwrap().data).unwrap();
        let second = MergedCellsRecord::parse(stream.next_record().unwrap().data).unwrap();
        assert!(!stream.has_next());
        assert_eq!(first.ranges.len(), MergedCellsRecord::MAX_RANGES);
        assert_eq!(second.ranges.len(), 1500 - MergedCellsRecord::MAX_RANGES);
        assert_eq!(first.ranges[0], range(0));
        assert_eq!(second.ranges[0], range(1027));
    }

    #[test]
    fn test_empty_aggregate_emits_nothing() {
        let aggregate = MergedCellsAggregate::new();
        assert!(serialize_aggregate(&aggregate).is_empty());
    }
}
