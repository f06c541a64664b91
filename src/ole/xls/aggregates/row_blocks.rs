//! Row blocks: ROW records, their cell records, and DBCELL indexes.
//!
//! On disk a sheet's rows come in blocks of up to 32: first the block's
//! ROW records, then every cell record of those rows, then one DBCELL
//! whose offsets let a reader seek straight to any row's cells. The
//! aggregate owns rows and cells as editable state; DBCELL records read
//! from the file are discarded and rebuilt from scratch on write, so
//! offsets are always consistent with the records actually emitted.

use crate::ole::xls::aggregates::{RecordAggregate, RecordVisitor, SharedFormulaResolver};
use crate::ole::xls::error::{XlsError, XlsResult, XlsWarning};
use crate::ole::xls::records::{
    BiffRecord, CellRecord, DbCellRecord, FormulaRecord, RecordStream, RowFlags, RowRecord,
    SharedFormulaRecord, StringRecord, is_cell_sid, sid,
};
use std::collections::{BTreeMap, BTreeSet};

/// Rows per DBCELL block.
const ROWS_PER_BLOCK: usize = 32;

/// One cell-level entry within a row, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEntry {
    Cell(CellRecord),
    /// A formula cell. The shared definition rides with the group's
    /// first member; a cached string result rides with its formula.
    Formula {
        formula: FormulaRecord,
        shared: Option<SharedFormulaRecord>,
        cached_string: Option<StringRecord>,
    },
}

impl CellEntry {
    fn row(&self) -> u16 {
        match self {
            CellEntry::Cell(cell) => cell.row,
            CellEntry::Formula { formula, .. } => formula.row,
        }
    }

    fn col(&self) -> u16 {
        match self {
            CellEntry::Cell(cell) => cell.col,
            CellEntry::Formula { formula, .. } => formula.col,
        }
    }

    fn encoded_size(&self) -> usize {
        match self {
            CellEntry::Cell(cell) => cell.encoded_size(),
            CellEntry::Formula {
                formula,
                shared,
                cached_string,
            } => {
                formula.encoded_size()
                    + shared.as_ref().map_or(0, SharedFormulaRecord::encoded_size)
                    + cached_string.as_ref().map_or(0, StringRecord::encoded_size)
            },
        }
    }

    fn visit(&self, visitor: &mut dyn RecordVisitor) {
        match self {
            CellEntry::Cell(cell) => visitor.visit(&BiffRecord::Cell(cell.clone())),
            CellEntry::Formula {
                formula,
                shared,
                cached_string,
            } => {
                visitor.visit(&BiffRecord::Formula(formula.clone()));
                if let Some(def) = shared {
                    visitor.visit(&BiffRecord::SharedFormula(def.clone()));
                }
                if let Some(string) = cached_string {
                    visitor.visit(&BiffRecord::String(string.clone()));
                }
            },
        }
    }
}

/// All ROW and cell records of one sheet, re-blocked on write.
#[derive(Debug, Default)]
pub struct RowBlocksAggregate {
    rows: BTreeMap<u16, RowRecord>,
    cells: BTreeMap<u16, Vec<CellEntry>>,
}

impl RowBlocksAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the row block run at the stream's current position: ROW,
    /// cell, FORMULA, SHAREDFMLA, STRING and DBCELL records, in any of
    /// the block arrangements writers produce. Stops at the first sid
    /// outside that set. Shared formula members that cannot be linked to
    /// a definition get their shared flag cleared with a warning.
    pub fn from_stream(
        stream: &mut RecordStream<'_>,
        warnings: &mut Vec<XlsWarning>,
    ) -> XlsResult<Self> {
        let mut aggregate = RowBlocksAggregate::new();
        let mut resolver = SharedFormulaResolver::new();
        // (row, index) of the most recent formula, for SHAREDFMLA/STRING
        let mut last_formula: Option<(u16, usize)> = None;

        while let Some(next_sid) = stream.peek_sid() {
            match next_sid {
                sid::ROW => {
                    let raw = stream.next_record()?;
                    let row = RowRecord::parse(raw.data)?;
                    aggregate.rows.insert(row.row, row);
                },
                sid::FORMULA => {
                    let raw = stream.next_record()?;
                    let formula = FormulaRecord::parse(raw.data)?;
                    let row = formula.row;
                    let entries = aggregate.cells.entry(row).or_default();
                    entries.push(CellEntry::Formula {
                        formula,
                        shared: None,
                        cached_string: None,
                    });
                    last_formula = Some((row, entries.len() - 1));
                },
                sid::SHARED_FORMULA => {
                    let raw = stream.next_record()?;
                    let def = SharedFormulaRecord::parse(raw.data)?;
                    let (row, index) = last_formula.ok_or(XlsError::InvalidRecord {
                        sid: sid::SHARED_FORMULA,
                        message: "SHAREDFMLA with no preceding FORMULA".to_string(),
                    })?;
                    resolver.register(def.clone());
                    if let Some(CellEntry::Formula { shared, .. }) =
                        aggregate.cells.get_mut(&row).and_then(|e| e.get_mut(index))
                    {
                        *shared = Some(def);
                    }
                },
                sid::STRING => {
                    let raw = stream.next_record()?;
                    let (row, index) = last_formula.ok_or(XlsError::InvalidRecord {
                        sid: sid::STRING,
                        message: "STRING with no preceding FORMULA".to_string(),
                    })?;
                    if let Some(CellEntry::Formula { cached_string, .. }) =
                        aggregate.cells.get_mut(&row).and_then(|e| e.get_mut(index))
                    {
                        *cached_string = Some(StringRecord {
                            data: raw.data.to_vec(),
                        });
                    }
                },
                sid::DBCELL => {
                    // Positional index; rebuilt on write
                    let raw = stream.next_record()?;
                    DbCellRecord::parse(raw.data)?;
                },
                s if is_cell_sid(s) => {
                    let raw = stream.next_record()?;
                    let cell = CellRecord::parse(s, raw.data)?;
                    aggregate.cells.entry(cell.row).or_default().push(cell.into());
                },
                _ => break,
            }
        }

        for entries in aggregate.cells.values_mut() {
            for entry in entries.iter_mut() {
                if let CellEntry::Formula { formula, .. } = entry {
                    resolver.resolve(formula, warnings);
                }
            }
        }

        for &row in aggregate.cells.keys() {
            if !aggregate.rows.contains_key(&row) {
                warnings.push(XlsWarning::MissingRowRecord { row: row as u32 });
            }
        }

        Ok(aggregate)
    }

    pub fn insert_row(&mut self, row: RowRecord) {
        self.rows.insert(row.row, row);
    }

    pub fn insert_cell(&mut self, entry: CellEntry) {
        self.cells.entry(entry.row()).or_default().push(entry);
    }

    pub fn row(&self, row: u16) -> Option<&RowRecord> {
        self.rows.get(&row)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cells_in_row(&self, row: u16) -> &[CellEntry] {
        self.cells.get(&row).map_or(&[], Vec::as_slice)
    }

    fn cell_bytes_of_row(&self, row: u16) -> usize {
        self.cells_in_row(row)
            .iter()
            .map(CellEntry::encoded_size)
            .sum()
    }

    /// The ROW record to write for a row index. Rows that only ever saw
    /// cell records get a default-formatted ROW spanning those cells, so
    /// no cell is lost for lack of one.
    fn row_for_output(&self, row: u16) -> RowRecord {
        if let Some(record) = self.rows.get(&row) {
            return record.clone();
        }
        let cols: Vec<u16> = self.cells_in_row(row).iter().map(CellEntry::col).collect();
        let first_col = cols.iter().copied().min().unwrap_or(0);
        let last_col = cols.iter().copied().max().map_or(0, |c| c + 1);
        RowRecord {
            row,
            first_col,
            last_col,
            height: 0x00FF,
            flags: RowFlags::empty(),
            xf_index: 15,
        }
    }

    /// Build the DBCELL for one block of row indices.
    fn db_cell_for_block(&self, block_rows: &[u16]) -> DbCellRecord {
        let row_block_size = block_rows.len() * RowRecord::ENCODED_SIZE;
        let cell_block_size: usize = block_rows
            .iter()
            .map(|&row| self.cell_bytes_of_row(row))
            .sum();

        // Each offset is measured from the second ROW record of the
        // block: the first points past the remaining ROW records, each
        // subsequent one adds the previous row's cell bytes.
        let mut cell_offsets = Vec::with_capacity(block_rows.len());
        let mut offset = row_block_size - RowRecord::ENCODED_SIZE;
        for &row in block_rows {
            cell_offsets.push(offset as u16);
            offset = self.cell_bytes_of_row(row);
        }

        DbCellRecord {
            row_offset: (row_block_size + cell_block_size) as u32,
            cell_offsets,
        }
    }
}

impl RecordAggregate for RowBlocksAggregate {
    fn visit_records(&self, visitor: &mut dyn RecordVisitor) {
        // Every row that has a ROW record or cells gets a slot in a block
        let row_indices: Vec<u16> = self
            .rows
            .keys()
            .chain(self.cells.keys())
            .copied()
            .collect::<BTreeSet<u16>>()
            .into_iter()
            .collect();
        for block_rows in row_indices.chunks(ROWS_PER_BLOCK) {
            for &row in block_rows {
                visitor.visit(&BiffRecord::Row(self.row_for_output(row)));
            }
            for &row in block_rows {
                for entry in self.cells_in_row(row) {
                    entry.visit(visitor);
                }
            }
            visitor.visit(&BiffRecord::DbCell(self.db_cell_for_block(block_rows)));
        }
    }
}

impl From<CellRecord> for CellEntry {
    fn from(cell: CellRecord) -> Self {
        CellEntry::Cell(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::xls::aggregates::serialize_aggregate;
    use crate::ole::xls::records::{FormulaFlags, RowFlags};

    fn row(index: u16) -> RowRecord {
        RowRecord {
            row: index,
            first_col: 0,
            last_col: 2,
            height: 255,
            flags: RowFlags::empty(),
            xf_index: 15,
        }
    }

    fn number_cell(row: u16, col: u16) -> CellRecord {
        CellRecord {
            sid: sid::NUMBER,
            row,
            col,
            rest: vec![0u8; 10], // xf + f64
        }
    }

    fn parse_back(bytes: &[u8]) -> Vec<(u16, usize)> {
        let mut stream = RecordStream::new(bytes);
        let mut out = Vec::new();
        while stream.has_next() {
            let raw = stream.next_record().unwrap();
            out.push((raw.sid, raw.data.len()));
        }
        out
    }

    #[test]
    fn test_single_block_layout_and_dbcell_offsets() {
        let mut aggregate = RowBlocksAggregate::new();
        aggregate.insert_row(row(0));
        aggregate.insert_row(row(1));
        aggregate.insert_cell(number_cell(0, 0).into());
        aggregate.insert_cell(number_cell(0, 1).into());
        aggregate.insert_cell(number_cell(1, 0).into());

        let bytes = serialize_aggregate(&aggregate);
        let sids: Vec<u16> = parse_back(&bytes).iter().map(|&(s, _)| s).collect();
        assert_eq!(
            sids,
            vec![
                sid::ROW,
                sid::ROW,
                sid::NUMBER,
                sid::NUMBER,
                sid::NUMBER,
                sid::DBCELL
            ]
        );

        let mut stream = RecordStream::new(&bytes);
        let mut db_cell = None;
        while stream.has_next() {
            let raw = stream.next_record().unwrap();
            if raw.sid == sid::DBCELL {
                db_cell = Some(DbCellRecord::parse(raw.data).unwrap());
            }
        }
        let db_cell = db_cell.unwrap();
        // 2 ROW records (40) + 3 NUMBER cells (3 * 18)
        assert_eq!(db_cell.row_offset, 40 + 54);
        // First offset skips the second ROW; second is row 0's cell bytes
        assert_eq!(db_cell.cell_offsets, vec![20, 36]);
    }

    #[test]
    fn test_rows_split_into_32_row_blocks() {
        let mut aggregate = RowBlocksAggregate::new();
        for i in 0..40u16 {
            aggregate.insert_row(row(i));
            aggregate.insert_cell(number_cell(i, 0).into());
        }

        let bytes = serialize_aggregate(&aggregate);
        let records = parse_back(&bytes);
        let db_cells: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|&(_, &(s, _))| s == sid::DBCELL)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(db_cells.len(), 2);

        // First block: 32 rows + 32 cells, DBCELL at index 64
        assert_eq!(db_cells[0], 64);
        // Second block: 8 rows + 8 cells after it
        assert_eq!(db_cells[1], 64 + 1 + 16);
    }

    #[test]
    fn test_dbcell_recomputed_not_copied() {
        // Stream with a DBCELL whose offsets are garbage
        let mut data = Vec::new();
        row(0).serialize(&mut data);
        number_cell(0, 0).serialize(&mut data);
        DbCellRecord {
            row_offset: 0xDEAD_BEEF,
            cell_offsets: vec![0xFFFF],
        }
        .serialize(&mut data);

        let mut stream = RecordStream::new(&data);
        let mut warnings = Vec::new();
        let aggregate = RowBlocksAggregate::from_stream(&mut stream, &mut warnings).unwrap();
        assert!(warnings.is_empty());

        let bytes = serialize_aggregate(&aggregate);
        let mut out_stream = RecordStream::new(&bytes);
        let mut db_cell = None;
        while out_stream.has_next() {
            let raw = out_stream.next_record().unwrap();
            if raw.sid == sid::DBCELL {
                db_cell = Some(DbCellRecord::parse(raw.data).unwrap());
            }
        }
        let db_cell = db_cell.unwrap();
        assert_eq!(db_cell.row_offset, 20 + 18);
        assert_eq!(db_cell.cell_offsets, vec![0]);
    }

    #[test]
    fn test_shared_formula_group_round_trips() {
        let shared_def = SharedFormulaRecord {
            first_row: 0,
            last_row: 1,
            first_col: 0,
            last_col: 0,
            reserved: 0,
            expression: vec![0x1E, 0x2A, 0x00],
        };
        let anchor = FormulaRecord {
            row: 0,
            col: 0,
            xf_index: 0,
            cached_result: [0; 8],
            flags: FormulaFlags::SHARED,
            chn: 0,
            expression: vec![0x01, 0, 0, 0, 0],
        };
        let member = FormulaRecord {
            row: 1,
            ..anchor.clone()
        };

        let mut data = Vec::new();
        row(0).serialize(&mut data);
        row(1).serialize(&mut data);
        anchor.serialize(&mut data);
        shared_def.serialize(&mut data);
        member.serialize(&mut data);

        let mut stream = RecordStream::new(&data);
        let mut warnings = Vec::new();
        let aggregate = RowBlocksAggregate::from_stream(&mut stream, &mut warnings).unwrap();
        assert!(warnings.is_empty());

        // Both members keep the shared flag; the definition rides with
        // the anchor and is re-emitted right after it
        let bytes = serialize_aggregate(&aggregate);
        let sids: Vec<u16> = parse_back(&bytes).iter().map(|&(s, _)| s).collect();
        assert_eq!(
            sids,
            vec![
                sid::ROW,
                sid::ROW,
                sid::FORMULA,
                sid::SHARED_FORMULA,
                sid::FORMULA,
                sid::DBCELL
            ]
        );
    }

    #[test]
    fn test_orphaned_shared_formula_degrades() {
        let orphan = FormulaRecord {
            row: 0,
            col: 0,
            xf_index: 0,
            cached_result: [0; 8],
            flags: FormulaFlags::SHARED,
            chn: 0,
            expression: vec![0x01, 5, 0, 5, 0], // anchor (5, 5), never defined
        };

        let mut data = Vec::new();
        row(0).serialize(&mut data);
        orphan.serialize(&mut data);

        let mut stream = RecordStream::new(&data);
        let mut warnings = Vec::new();
        let aggregate = RowBlocksAggregate::from_stream(&mut stream, &mut warnings).unwrap();
        assert_eq!(
            warnings,
            vec![XlsWarning::OrphanedSharedFormula { row: 0, col: 0 }]
        );
        match &aggregate.cells_in_row(0)[0] {
            CellEntry::Formula { formula, .. } => {
                assert!(!formula.flags.contains(FormulaFlags::SHARED));
            },
            other => panic!("expected formula entry, got {other:?}"),
        }
    }

    #[test]
    fn test_cell_without_row_record_survives_round_trip() {
        let mut data = Vec::new();
        row(0).serialize(&mut data);
        row(1).serialize(&mut data);
        // Row 3 has a cell but no ROW record
        number_cell(3, 2).serialize(&mut data);
        DbCellRecord {
            row_offset: 0,
            cell_offsets: vec![],
        }
        .serialize(&mut data);

        let mut stream = RecordStream::new(&data);
        let mut warnings = Vec::new();
        let aggregate = RowBlocksAggregate::from_stream(&mut stream, &mut warnings).unwrap();
        assert_eq!(warnings, vec![XlsWarning::MissingRowRecord { row: 3 }]);

        // The cell is written back under a synthesized ROW record
        let bytes = serialize_aggregate(&aggregate);
        let sids: Vec<u16> = parse_back(&bytes).iter().map(|&(s, _)| s).collect();
        assert_eq!(
            sids,
            vec![sid::ROW, sid::ROW, sid::ROW, sid::NUMBER, sid::DBCELL]
        );

        let mut out = RecordStream::new(&bytes);
        let mut synthesized = None;
        let mut cell = None;
        let mut db_cell = None;
        while out.has_next() {
            let raw = out.next_record().unwrap();
            match raw.sid {
                sid::ROW => {
                    let parsed = RowRecord::parse(raw.data).unwrap();
                    if parsed.row == 3 {
                        synthesized = Some(parsed);
                    }
                },
                sid::NUMBER => cell = Some(CellRecord::parse(raw.sid, raw.data).unwrap()),
                sid::DBCELL => db_cell = Some(DbCellRecord::parse(raw.data).unwrap()),
                _ => {},
            }
        }
        let synthesized = synthesized.expect("row 3 must get a ROW record");
        assert_eq!(synthesized.first_col, 2);
        assert_eq!(synthesized.last_col, 3);
        let cell = cell.expect("the NUMBER cell must survive");
        assert_eq!((cell.row, cell.col), (3, 2));

        // DBCELL covers all three rows; only row 3 carries cell bytes
        let db_cell = db_cell.unwrap();
        assert_eq!(db_cell.row_offset, 3 * 20 + 18);
        assert_eq!(db_cell.cell_offsets, vec![40, 0, 0]);
    }

    #[test]
    fn test_stops_at_foreign_record() {
        let mut data = Vec::new();
        row(0).serialize(&mut data);
        // EOF does not belong to the row block run
        data.extend_from_slice(&sid::EOF.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());

        let mut stream = RecordStream::new(&data);
        let mut warnings = Vec::new();
        let aggregate = RowBlocksAggregate::from_stream(&mut stream, &mut warnings).unwrap();
        assert_eq!(aggregate.row_count(), 1);
        assert_eq!(stream.peek_sid(), Some(sid::EOF));
    }
}
