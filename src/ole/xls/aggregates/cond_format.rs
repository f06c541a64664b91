//! Conditional formatting: a CFHEADER and its CFRULE records.
//!
//! The header's rule count must match the rules that follow it in the
//! stream; a disagreement is treated as corruption at construction time,
//! not patched over. Once owned, rules can be added and removed and the
//! count is derived from the rule list whenever the block is serialized.

use crate::ole::xls::aggregates::{RecordAggregate, RecordVisitor};
use crate::ole::xls::error::{XlsError, XlsResult};
use crate::ole::xls::records::{BiffRecord, CfHeaderRecord, CfRuleRecord, RecordStream, sid};
use smallvec::SmallVec;

/// BIFF8 allows at most three rules per formatting block.
pub const MAX_RULES: usize = 3;

/// One conditional formatting block.
#[derive(Debug, Clone)]
pub struct ConditionalFormattingAggregate {
    header: CfHeaderRecord,
    rules: SmallVec<[CfRuleRecord; MAX_RULES]>,
}

impl ConditionalFormattingAggregate {
    /// Consume a CFHEADER and exactly the rule records it declares.
    pub fn from_stream(stream: &mut RecordStream<'_>) -> XlsResult<Self> {
        let raw = stream.next_record()?;
        if raw.sid != sid::CF_HEADER {
            return Err(XlsError::UnexpectedRecordType {
                expected: sid::CF_HEADER,
                found: raw.sid,
            });
        }
        let header = CfHeaderRecord::parse(raw.data)?;

        let mut rules = SmallVec::new();
        while rules.len() < header.rule_count as usize && stream.peek_sid() == Some(sid::CF_RULE) {
            let rule = stream.next_record()?;
            rules.push(CfRuleRecord {
                data: rule.data.to_vec(),
            });
        }

        if rules.len() != header.rule_count as usize {
            return Err(XlsError::AggregateMismatch {
                aggregate: "conditional formatting",
                declared: header.rule_count as usize,
                actual: rules.len(),
            });
        }

        Ok(ConditionalFormattingAggregate { header, rules })
    }

    /// Start a block with no rules over the header's ranges.
    pub fn new(header: CfHeaderRecord) -> Self {
        ConditionalFormattingAggregate {
            header,
            rules: SmallVec::new(),
        }
    }

    pub fn header(&self) -> &CfHeaderRecord {
        &self.header
    }

    pub fn rules(&self) -> &[CfRuleRecord] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Append a rule; fails once the format's limit is reached.
    pub fn add_rule(&mut self, rule: CfRuleRecord) -> XlsResult<()> {
        if self.rules.len() >= MAX_RULES {
            return Err(XlsError::InvalidRecord {
                sid: sid::CF_RULE,
                message: format!("a formatting block holds at most {MAX_RULES} rules"),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Remove the rule at `index`, or None if out of range.
    pub fn remove_rule(&mut self, index: usize) -> Option<CfRuleRecord> {
        if index < self.rules.len() {
            Some(self.rules.remove(index))
        } else {
            None
        }
    }
}

impl RecordAggregate for ConditionalFormattingAggregate {
    fn visit_records(&self, visitor: &mut dyn RecordVisitor) {
        // The count written is always the live rule list's length
        let mut header = self.header.clone();
        header.rule_count = self.rules.len() as u16;
        visitor.visit(&BiffRecord::CfHeader(header));
        for rule in &self.rules {
            visitor.visit(&BiffRecord::CfRule(rule.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::xls::aggregates::serialize_aggregate;
    use crate::ole::xls::records::CellRange;

    fn header_bytes(rule_count: u16) -> Vec<u8> {
        let header = CfHeaderRecord {
            rule_count,
            need_recalculation: false,
            enclosing_range: CellRange {
                first_row: 0,
                last_row: 9,
                first_col: 0,
                last_col: 3,
            },
            ranges: vec![CellRange {
                first_row: 0,
                last_row: 9,
                first_col: 0,
                last_col: 3,
            }],
        };
        let mut out = Vec::new();
        header.serialize(&mut out);
        out
    }

    fn rule_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        CfRuleRecord {
            data: vec![1, 1, 0, 0],
        }
        .serialize(&mut out);
        out
    }

    #[test]
    fn test_header_and_rules_consumed_together() {
        let mut data = header_bytes(2);
        data.extend(rule_bytes());
        data.extend(rule_bytes());

        let mut stream = RecordStream::new(&data);
        let aggregate = ConditionalFormattingAggregate::from_stream(&mut stream).unwrap();
        assert_eq!(aggregate.rule_count(), 2);
        assert!(!stream.has_next());
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let mut data = header_bytes(3);
        data.extend(rule_bytes()); // only one rule follows

        let mut stream = RecordStream::new(&data);
        assert!(matches!(
            ConditionalFormattingAggregate::from_stream(&mut stream),
            Err(XlsError::AggregateMismatch {
                aggregate: "conditional formatting",
                declared: 3,
                actual: 1,
            })
        ));
    }

    #[test]
    fn test_count_tracks_rule_edits() {
        let mut data = header_bytes(1);
        data.extend(rule_bytes());
        let mut stream = RecordStream::new(&data);
        let mut aggregate = ConditionalFormattingAggregate::from_stream(&mut stream).unwrap();

        aggregate
            .add_rule(CfRuleRecord {
                data: vec![2, 2, 0, 0],
            })
            .unwrap();
        let bytes = serialize_aggregate(&aggregate);
        let mut out_stream = RecordStream::new(&bytes);
        let header = CfHeaderRecord::parse(out_stream.next_record().unwrap().data).unwrap();
        assert_eq!(header.rule_count, 2);

        aggregate.remove_rule(0).unwrap();
        aggregate.remove_rule(0).unwrap();
        let bytes = serialize_aggregate(&aggregate);
        let mut out_stream = RecordStream::new(&bytes);
        let header = CfHeaderRecord::parse(out_stream.next_record().unwrap().data).unwrap();
        assert_eq!(header.rule_count, 0);
        assert!(!out_stream.has_next());
    }

    #[test]
    fn test_rule_limit_enforced() {
        let mut aggregate = ConditionalFormattingAggregate::new(
            CfHeaderRecord::parse(&header_bytes(0)[4..]).unwrap(),
        );
        for _ in 0..MAX_RULES {
            aggregate.add_rule(CfRuleRecord { data: vec![0] }).unwrap();
        }
        assert!(aggregate.add_rule(CfRuleRecord { data: vec![0] }).is_err());
    }
}
