//! Page settings block.
//!
//! Print-related records (margins, header, footer, page breaks, print
//! setup) appear as one contiguous run in a sheet stream. Every member
//! is a singleton; the same sid appearing twice in one run is treated as
//! corruption. The run's record order is preserved through a round trip.

use crate::ole::xls::aggregates::{RecordAggregate, RecordVisitor};
use crate::ole::xls::error::{XlsError, XlsResult};
use crate::ole::xls::records::{BiffRecord, RecordStream, UnknownRecord, is_page_settings_sid};

/// The contiguous run of page-setting records of one sheet.
#[derive(Debug, Clone, Default)]
pub struct PageSettingsBlock {
    records: Vec<UnknownRecord>,
}

impl PageSettingsBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the run of page-setting records at the stream's current
    /// position, stopping at the first foreign sid.
    pub fn from_stream(stream: &mut RecordStream<'_>) -> XlsResult<Self> {
        let mut block = PageSettingsBlock::new();
        while let Some(next_sid) = stream.peek_sid() {
            if !is_page_settings_sid(next_sid) {
                break;
            }
            if block.contains(next_sid) {
                return Err(XlsError::DuplicateRecord {
                    sid: next_sid,
                    aggregate: "page settings block",
                });
            }
            let raw = stream.next_record()?;
            block.records.push(UnknownRecord {
                sid: raw.sid,
                data: raw.data.to_vec(),
            });
        }
        Ok(block)
    }

    pub fn contains(&self, rec_sid: u16) -> bool {
        self.records.iter().any(|record| record.sid == rec_sid)
    }

    pub fn get(&self, rec_sid: u16) -> Option<&UnknownRecord> {
        self.records.iter().find(|record| record.sid == rec_sid)
    }

    /// Insert or replace the record for a sid. New sids keep arrival
    /// order, matching how the run was read.
    pub fn set(&mut self, record: UnknownRecord) {
        match self.records.iter_mut().find(|r| r.sid == record.sid) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordAggregate for PageSettingsBlock {
    fn visit_records(&self, visitor: &mut dyn RecordVisitor) {
        for record in &self.records {
            visitor.visit(&BiffRecord::Unknown(record.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::xls::aggregates::serialize_aggregate;
    use crate::ole::xls::records::sid;

    fn record(rec_sid: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        UnknownRecord {
            sid: rec_sid,
            data: payload.to_vec(),
        }
        .serialize(&mut out);
        out
    }

    #[test]
    fn test_run_consumed_in_order() {
        let mut data = record(sid::HEADER, b"\x00");
        data.extend(record(sid::FOOTER, b"\x00"));
        data.extend(record(sid::LEFT_MARGIN, &[0u8; 8]));
        data.extend(record(sid::PRINT_SETUP, &[0u8; 34]));
        data.extend(record(sid::EOF, &[])); // not part of the block

        let mut stream = RecordStream::new(&data);
        let block = PageSettingsBlock::from_stream(&mut stream).unwrap();
        assert_eq!(block.len(), 4);
        assert_eq!(stream.peek_sid(), Some(sid::EOF));

        // Order survives the round trip
        let bytes = serialize_aggregate(&block);
        assert_eq!(bytes, data[..data.len() - 4]);
    }

    #[test]
    fn test_duplicate_singleton_is_fatal() {
        let mut data = record(sid::HEADER, b"\x00");
        data.extend(record(sid::HEADER, b"\x00"));

        let mut stream = RecordStream::new(&data);
        assert!(matches!(
            PageSettingsBlock::from_stream(&mut stream),
            Err(XlsError::DuplicateRecord {
                sid: sid::HEADER,
                aggregate: "page settings block",
            })
        ));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut data = record(sid::HEADER, b"\x01");
        data.extend(record(sid::FOOTER, b"\x02"));
        let mut stream = RecordStream::new(&data);
        let mut block = PageSettingsBlock::from_stream(&mut stream).unwrap();

        block.set(UnknownRecord {
            sid: sid::HEADER,
            data: b"\x09".to_vec(),
        });
        assert_eq!(block.len(), 2);
        assert_eq!(block.get(sid::HEADER).unwrap().data, b"\x09");

        // Replacement keeps the original position
        let bytes = serialize_aggregate(&block);
        let mut out = RecordStream::new(&bytes);
        assert_eq!(out.next_record().unwrap().sid, sid::HEADER);
        assert_eq!(out.next_record().unwrap().sid, sid::FOOTER);
    }

    #[test]
    fn test_stops_before_foreign_record() {
        let data = record(sid::ROW, &[0u8; 16]);
        let mut stream = RecordStream::new(&data);
        let block = PageSettingsBlock::from_stream(&mut stream).unwrap();
        assert!(block.is_empty());
        assert_eq!(stream.peek_sid(), Some(sid::ROW));
    }
}
