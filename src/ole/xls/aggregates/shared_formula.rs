//! Shared formula resolution.
//!
//! A SHAREDFMLA record holds one expression for a rectangular group of
//! formula cells. Each member FORMULA carries the shared flag and a
//! ptgExp token pointing at the group's anchor cell (the range top-left).
//! The resolver indexes definitions by anchor and links members to them;
//! a member whose anchor has no definition is an orphan and gets its
//! shared flag cleared so the cell's own expression stands alone.

use crate::ole::xls::error::XlsWarning;
use crate::ole::xls::records::{FormulaFlags, FormulaRecord, SharedFormulaRecord};
use std::collections::HashMap;

/// Index of shared formula definitions keyed by anchor cell.
#[derive(Debug, Default)]
pub struct SharedFormulaResolver {
    anchors: HashMap<(u16, u16), SharedFormulaRecord>,
}

impl SharedFormulaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its range's top-left cell.
    pub fn register(&mut self, record: SharedFormulaRecord) {
        self.anchors
            .insert((record.first_row, record.first_col as u16), record);
    }

    /// The definition anchored at (row, col), if any.
    pub fn definition_at(&self, row: u16, col: u16) -> Option<&SharedFormulaRecord> {
        self.anchors.get(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Link a formula to its shared definition. Returns the definition
    /// when the link holds. A formula flagged shared whose ptgExp anchor
    /// has no definition, or that covers no range containing the cell,
    /// has its flag cleared and a warning recorded; the cell keeps its
    /// embedded expression.
    pub fn resolve(
        &self,
        formula: &mut FormulaRecord,
        warnings: &mut Vec<XlsWarning>,
    ) -> Option<&SharedFormulaRecord> {
        if !formula.flags.contains(FormulaFlags::SHARED) {
            return None;
        }

        let linked = formula
            .shared_base_cell()
            .and_then(|(row, col)| self.anchors.get(&(row, col)))
            .filter(|def| def.covers(formula.row, formula.col));

        if linked.is_none() {
            formula.flags.remove(FormulaFlags::SHARED);
            warnings.push(XlsWarning::OrphanedSharedFormula {
                row: formula.row as u32,
                col: formula.col,
            });
        }
        linked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(first_row: u16, last_row: u16, first_col: u8, last_col: u8) -> SharedFormulaRecord {
        SharedFormulaRecord {
            first_row,
            last_row,
            first_col,
            last_col,
            reserved: 0,
            expression: vec![0x1E, 0x2A, 0x00], // ptgInt 42
        }
    }

    fn member(row: u16, col: u16, anchor_row: u16, anchor_col: u16) -> FormulaRecord {
        FormulaRecord {
            row,
            col,
            xf_index: 0,
            cached_result: [0; 8],
            flags: FormulaFlags::SHARED,
            chn: 0,
            expression: vec![
                0x01,
                anchor_row.to_le_bytes()[0],
                anchor_row.to_le_bytes()[1],
                anchor_col.to_le_bytes()[0],
                anchor_col.to_le_bytes()[1],
            ],
        }
    }

    #[test]
    fn test_member_links_to_definition() {
        let mut resolver = SharedFormulaResolver::new();
        resolver.register(definition(2, 5, 1, 1));

        let mut formula = member(4, 1, 2, 1);
        let mut warnings = Vec::new();
        let linked = resolver.resolve(&mut formula, &mut warnings);
        assert!(linked.is_some());
        assert!(warnings.is_empty());
        assert!(formula.flags.contains(FormulaFlags::SHARED));
    }

    #[test]
    fn test_orphan_clears_flag_and_warns() {
        let resolver = SharedFormulaResolver::new();
        let mut formula = member(4, 1, 2, 1);
        let mut warnings = Vec::new();

        assert!(resolver.resolve(&mut formula, &mut warnings).is_none());
        assert!(!formula.flags.contains(FormulaFlags::SHARED));
        assert_eq!(
            warnings,
            vec![XlsWarning::OrphanedSharedFormula { row: 4, col: 1 }]
        );
        // The embedded expression is untouched
        assert_eq!(formula.expression[0], 0x01);
    }

    #[test]
    fn test_definition_not_covering_cell_is_orphan() {
        let mut resolver = SharedFormulaResolver::new();
        resolver.register(definition(2, 5, 1, 1));

        // ptgExp points at the anchor, but the cell sits outside the range
        let mut formula = member(9, 1, 2, 1);
        let mut warnings = Vec::new();
        assert!(resolver.resolve(&mut formula, &mut warnings).is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unshared_formula_untouched() {
        let resolver = SharedFormulaResolver::new();
        let mut formula = member(4, 1, 2, 1);
        formula.flags = FormulaFlags::empty();
        let mut warnings = Vec::new();

        assert!(resolver.resolve(&mut formula, &mut warnings).is_none());
        assert!(warnings.is_empty());
    }
}
