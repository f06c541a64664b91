//! BIFF record stream and typed leaf records.
//!
//! Every BIFF record is a 4-byte header (u16 sid, u16 payload length,
//! both little-endian) followed by the payload. [`RecordStream`] walks a
//! byte slice record by record; [`BiffRecord`] is the closed set of typed
//! leaves the aggregate layer works with, with an [`UnknownRecord`]
//! fallback that round-trips anything else verbatim.

use crate::common::binary::read_u16_le;
use crate::ole::xls::error::{XlsError, XlsResult};
use bitflags::bitflags;

/// Record sids the framework dispatches on.
pub mod sid {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const ROW: u16 = 0x0208;
    pub const FORMULA: u16 = 0x0006;
    pub const SHARED_FORMULA: u16 = 0x04BC;
    pub const STRING: u16 = 0x0207;
    pub const DBCELL: u16 = 0x00D7;
    pub const CF_HEADER: u16 = 0x01B0;
    pub const CF_RULE: u16 = 0x01B1;
    pub const MERGED_CELLS: u16 = 0x00E5;

    // Cell value records
    pub const BLANK: u16 = 0x0201;
    pub const NUMBER: u16 = 0x0203;
    pub const LABEL: u16 = 0x0204;
    pub const BOOLERR: u16 = 0x0205;
    pub const LABEL_SST: u16 = 0x00FD;
    pub const RK: u16 = 0x027E;
    pub const MUL_RK: u16 = 0x00BD;
    pub const MUL_BLANK: u16 = 0x00BE;

    // Page settings block
    pub const HORIZONTAL_PAGE_BREAKS: u16 = 0x001B;
    pub const VERTICAL_PAGE_BREAKS: u16 = 0x001A;
    pub const HEADER: u16 = 0x0014;
    pub const FOOTER: u16 = 0x0015;
    pub const HCENTER: u16 = 0x0083;
    pub const VCENTER: u16 = 0x0084;
    pub const LEFT_MARGIN: u16 = 0x0026;
    pub const RIGHT_MARGIN: u16 = 0x0027;
    pub const TOP_MARGIN: u16 = 0x0028;
    pub const BOTTOM_MARGIN: u16 = 0x0029;
    pub const PLS: u16 = 0x004D;
    pub const PRINT_SETUP: u16 = 0x00A1;
    pub const BITMAP: u16 = 0x00E9;
}

/// An 8-byte cell range address (first/last row, first/last column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u16,
    pub last_col: u16,
}

impl CellRange {
    pub const ENCODED_SIZE: usize = 8;

    pub fn parse(data: &[u8], offset: usize) -> XlsResult<Self> {
        if offset + Self::ENCODED_SIZE > data.len() {
            return Err(XlsError::UnexpectedEndOfStream(
                "cell range address".to_string(),
            ));
        }
        Ok(CellRange {
            first_row: u16::from_le_bytes([data[offset], data[offset + 1]]),
            last_row: u16::from_le_bytes([data[offset + 2], data[offset + 3]]),
            first_col: u16::from_le_bytes([data[offset + 4], data[offset + 5]]),
            last_col: u16::from_le_bytes([data[offset + 6], data[offset + 7]]),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.first_row.to_le_bytes());
        out.extend_from_slice(&self.last_row.to_le_bytes());
        out.extend_from_slice(&self.first_col.to_le_bytes());
        out.extend_from_slice(&self.last_col.to_le_bytes());
    }

    pub fn contains(&self, row: u16, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

/// A borrowed record as it appears in the stream: sid plus payload.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    pub sid: u16,
    pub data: &'a [u8],
}

/// Bounds-checked cursor over a BIFF record stream.
pub struct RecordStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        RecordStream { data, pos: 0 }
    }

    /// Whether at least a record header remains.
    pub fn has_next(&self) -> bool {
        self.pos + 4 <= self.data.len()
    }

    /// The sid of the next record without consuming it.
    pub fn peek_sid(&self) -> Option<u16> {
        if !self.has_next() {
            return None;
        }
        read_u16_le(self.data, self.pos).ok()
    }

    /// Consume and return the next record.
    pub fn next_record(&mut self) -> XlsResult<RawRecord<'a>> {
        if !self.has_next() {
            return Err(XlsError::UnexpectedEndOfStream(format!(
                "record header at offset {}",
                self.pos
            )));
        }
        let rec_sid = read_u16_le(self.data, self.pos)
            .map_err(|e| XlsError::UnexpectedEndOfStream(e.to_string()))?;
        let len = read_u16_le(self.data, self.pos + 2)
            .map_err(|e| XlsError::UnexpectedEndOfStream(e.to_string()))? as usize;

        let body_start = self.pos + 4;
        if body_start + len > self.data.len() {
            return Err(XlsError::InvalidLength {
                sid: rec_sid,
                declared: len,
                available: self.data.len() - body_start,
            });
        }

        self.pos = body_start + len;
        Ok(RawRecord {
            sid: rec_sid,
            data: &self.data[body_start..body_start + len],
        })
    }

    /// Current byte offset in the stream.
    pub fn pos(&self) -> usize {
        self.pos
    }
}

/// Append a record header plus payload to `out`.
fn write_record(out: &mut Vec<u8>, rec_sid: u16, payload: &[u8]) {
    out.extend_from_slice(&rec_sid.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
}

bitflags! {
    /// ROW record option flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RowFlags: u16 {
        const OUTLINE_LEVEL = 0x0007;
        const COLLAPSED     = 0x0010;
        const HIDDEN        = 0x0020;
        const UNSYNCED      = 0x0040;
        const FORMATTED     = 0x0080;
    }
}

bitflags! {
    /// FORMULA record option flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormulaFlags: u16 {
        const ALWAYS_CALC  = 0x0001;
        const CALC_ON_LOAD = 0x0002;
        const SHARED       = 0x0008;
    }
}

/// ROW record: extent and formatting of one worksheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub row: u16,
    pub first_col: u16,
    /// One past the last defined column
    pub last_col: u16,
    pub height: u16,
    pub flags: RowFlags,
    pub xf_index: u16,
}

impl RowRecord {
    /// Serialized size including the 4-byte header.
    pub const ENCODED_SIZE: usize = 20;

    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 16 {
            return Err(XlsError::InvalidRecord {
                sid: sid::ROW,
                message: format!("payload is {} bytes, expected 16", data.len()),
            });
        }
        Ok(RowRecord {
            row: u16::from_le_bytes([data[0], data[1]]),
            first_col: u16::from_le_bytes([data[2], data[3]]),
            last_col: u16::from_le_bytes([data[4], data[5]]),
            height: u16::from_le_bytes([data[6], data[7]]),
            // bytes 8..12 are reserved
            flags: RowFlags::from_bits_retain(u16::from_le_bytes([data[12], data[13]])),
            xf_index: u16::from_le_bytes([data[14], data[15]]),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(16);
        payload.extend_from_slice(&self.row.to_le_bytes());
        payload.extend_from_slice(&self.first_col.to_le_bytes());
        payload.extend_from_slice(&self.last_col.to_le_bytes());
        payload.extend_from_slice(&self.height.to_le_bytes());
        payload.extend_from_slice(&[0u8; 4]);
        payload.extend_from_slice(&self.flags.bits().to_le_bytes());
        payload.extend_from_slice(&self.xf_index.to_le_bytes());
        write_record(out, sid::ROW, &payload);
    }
}

/// FORMULA record: cached result plus the encoded expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    /// Cached result field, 8 bytes, semantics out of scope here
    pub cached_result: [u8; 8],
    pub flags: FormulaFlags,
    pub chn: u32,
    /// Encoded expression tokens (rgce)
    pub expression: Vec<u8>,
}

impl FormulaRecord {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 22 {
            return Err(XlsError::InvalidRecord {
                sid: sid::FORMULA,
                message: format!("payload is {} bytes, expected at least 22", data.len()),
            });
        }
        let cce = u16::from_le_bytes([data[20], data[21]]) as usize;
        if 22 + cce > data.len() {
            return Err(XlsError::InvalidRecord {
                sid: sid::FORMULA,
                message: format!("expression claims {cce} bytes, {} remain", data.len() - 22),
            });
        }
        let mut cached_result = [0u8; 8];
        cached_result.copy_from_slice(&data[6..14]);
        Ok(FormulaRecord {
            row: u16::from_le_bytes([data[0], data[1]]),
            col: u16::from_le_bytes([data[2], data[3]]),
            xf_index: u16::from_le_bytes([data[4], data[5]]),
            cached_result,
            flags: FormulaFlags::from_bits_retain(u16::from_le_bytes([data[14], data[15]])),
            chn: u32::from_le_bytes([data[16], data[17], data[18], data[19]]),
            expression: data[22..22 + cce].to_vec(),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(22 + self.expression.len());
        payload.extend_from_slice(&self.row.to_le_bytes());
        payload.extend_from_slice(&self.col.to_le_bytes());
        payload.extend_from_slice(&self.xf_index.to_le_bytes());
        payload.extend_from_slice(&self.cached_result);
        payload.extend_from_slice(&self.flags.bits().to_le_bytes());
        payload.extend_from_slice(&self.chn.to_le_bytes());
        payload.extend_from_slice(&(self.expression.len() as u16).to_le_bytes());
        payload.extend_from_slice(&self.expression);
        write_record(out, sid::FORMULA, &payload);
    }

    /// Serialized size including the 4-byte header.
    pub fn encoded_size(&self) -> usize {
        4 + 22 + self.expression.len()
    }

    /// Whether the expression is a single ptgExp token pointing at a
    /// shared formula's anchor cell; returns that (row, col).
    pub fn shared_base_cell(&self) -> Option<(u16, u16)> {
        // ptgExp: token 0x01, row u16, col u16
        if self.expression.len() >= 5 && self.expression[0] == 0x01 {
            let row = u16::from_le_bytes([self.expression[1], self.expression[2]]);
            let col = u16::from_le_bytes([self.expression[3], self.expression[4]]);
            Some((row, col))
        } else {
            None
        }
    }
}

/// SHAREDFMLA record: one expression shared by a range of formula cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFormulaRecord {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u8,
    pub last_col: u8,
    pub reserved: u16,
    pub expression: Vec<u8>,
}

impl SharedFormulaRecord {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 10 {
            return Err(XlsError::InvalidRecord {
                sid: sid::SHARED_FORMULA,
                message: format!("payload is {} bytes, expected at least 10", data.len()),
            });
        }
        let cce = u16::from_le_bytes([data[8], data[9]]) as usize;
        if 10 + cce > data.len() {
            return Err(XlsError::InvalidRecord {
                sid: sid::SHARED_FORMULA,
                message: format!("expression claims {cce} bytes, {} remain", data.len() - 10),
            });
        }
        Ok(SharedFormulaRecord {
            first_row: u16::from_le_bytes([data[0], data[1]]),
            last_row: u16::from_le_bytes([data[2], data[3]]),
            first_col: data[4],
            last_col: data[5],
            reserved: u16::from_le_bytes([data[6], data[7]]),
            expression: data[10..10 + cce].to_vec(),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(10 + self.expression.len());
        payload.extend_from_slice(&self.first_row.to_le_bytes());
        payload.extend_from_slice(&self.last_row.to_le_bytes());
        payload.push(self.first_col);
        payload.push(self.last_col);
        payload.extend_from_slice(&self.reserved.to_le_bytes());
        payload.extend_from_slice(&(self.expression.len() as u16).to_le_bytes());
        payload.extend_from_slice(&self.expression);
        write_record(out, sid::SHARED_FORMULA, &payload);
    }

    /// Serialized size including the 4-byte header.
    pub fn encoded_size(&self) -> usize {
        4 + 10 + self.expression.len()
    }

    /// Whether (row, col) falls inside this shared formula's range.
    pub fn covers(&self, row: u16, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col as u16..=self.last_col as u16).contains(&col)
    }
}

/// STRING record: cached string result of the preceding formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRecord {
    pub data: Vec<u8>,
}

impl StringRecord {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_record(out, sid::STRING, &self.data);
    }

    /// Serialized size including the 4-byte header.
    pub fn encoded_size(&self) -> usize {
        4 + self.data.len()
    }
}

/// DBCELL record: per-block index of row and cell positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCellRecord {
    /// Offset from this record's start back to the block's first ROW
    pub row_offset: u32,
    /// Per-row offsets to each row's first cell record
    pub cell_offsets: Vec<u16>,
}

impl DbCellRecord {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 4 || (data.len() - 4) % 2 != 0 {
            return Err(XlsError::InvalidRecord {
                sid: sid::DBCELL,
                message: format!("payload is {} bytes", data.len()),
            });
        }
        let row_offset = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let cell_offsets = data[4..]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(DbCellRecord {
            row_offset,
            cell_offsets,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(4 + self.cell_offsets.len() * 2);
        payload.extend_from_slice(&self.row_offset.to_le_bytes());
        for offset in &self.cell_offsets {
            payload.extend_from_slice(&offset.to_le_bytes());
        }
        write_record(out, sid::DBCELL, &payload);
    }
}

/// CFHEADER record: conditional formatting block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfHeaderRecord {
    pub rule_count: u16,
    pub need_recalculation: bool,
    /// Bounding box of all ranges below
    pub enclosing_range: CellRange,
    /// The ranges the rules apply to
    pub ranges: Vec<CellRange>,
}

impl CfHeaderRecord {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 14 {
            return Err(XlsError::InvalidRecord {
                sid: sid::CF_HEADER,
                message: format!("payload is {} bytes, expected at least 14", data.len()),
            });
        }
        let rule_count = u16::from_le_bytes([data[0], data[1]]);
        let need_recalculation = u16::from_le_bytes([data[2], data[3]]) & 1 != 0;
        let enclosing_range = CellRange::parse(data, 4)?;
        let range_count = u16::from_le_bytes([data[12], data[13]]) as usize;

        let expected = 14 + range_count * CellRange::ENCODED_SIZE;
        if data.len() < expected {
            return Err(XlsError::AggregateMismatch {
                aggregate: "CFHEADER range list",
                declared: range_count,
                actual: (data.len() - 14) / CellRange::ENCODED_SIZE,
            });
        }
        let mut ranges = Vec::with_capacity(range_count);
        for i in 0..range_count {
            ranges.push(CellRange::parse(data, 14 + i * CellRange::ENCODED_SIZE)?);
        }

        Ok(CfHeaderRecord {
            rule_count,
            need_recalculation,
            enclosing_range,
            ranges,
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(14 + self.ranges.len() * CellRange::ENCODED_SIZE);
        payload.extend_from_slice(&self.rule_count.to_le_bytes());
        payload.extend_from_slice(&(self.need_recalculation as u16).to_le_bytes());
        self.enclosing_range.serialize(&mut payload);
        payload.extend_from_slice(&(self.ranges.len() as u16).to_le_bytes());
        for range in &self.ranges {
            range.serialize(&mut payload);
        }
        write_record(out, sid::CF_HEADER, &payload);
    }
}

/// CFRULE record: one conditional formatting rule, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfRuleRecord {
    pub data: Vec<u8>,
}

impl CfRuleRecord {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_record(out, sid::CF_RULE, &self.data);
    }
}

/// MERGEDCELLS record: a count-prefixed list of merged ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCellsRecord {
    pub ranges: Vec<CellRange>,
}

impl MergedCellsRecord {
    /// Most ranges one record can hold before the u16 length overflows.
    pub const MAX_RANGES: usize = 1027;

    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 2 {
            return Err(XlsError::InvalidRecord {
                sid: sid::MERGED_CELLS,
                message: "payload too short for range count".to_string(),
            });
        }
        let count = u16::from_le_bytes([data[0], data[1]]) as usize;
        let actual = (data.len() - 2) / CellRange::ENCODED_SIZE;
        if count != actual || data.len() != 2 + count * CellRange::ENCODED_SIZE {
            return Err(XlsError::AggregateMismatch {
                aggregate: "MERGEDCELLS",
                declared: count,
                actual,
            });
        }
        let mut ranges = Vec::with_capacity(count);
        for i in 0..count {
            ranges.push(CellRange::parse(data, 2 + i * CellRange::ENCODED_SIZE)?);
        }
        Ok(MergedCellsRecord { ranges })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(2 + self.ranges.len() * CellRange::ENCODED_SIZE);
        payload.extend_from_slice(&(self.ranges.len() as u16).to_le_bytes());
        for range in &self.ranges {
            range.serialize(&mut payload);
        }
        write_record(out, sid::MERGED_CELLS, &payload);
    }
}

/// A generic cell value record. All BIFF cell records share a (row, col)
/// prefix; the remainder stays opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRecord {
    pub sid: u16,
    pub row: u16,
    pub col: u16,
    pub rest: Vec<u8>,
}

impl CellRecord {
    pub fn parse(rec_sid: u16, data: &[u8]) -> XlsResult<Self> {
        if data.len() < 4 {
            return Err(XlsError::InvalidRecord {
                sid: rec_sid,
                message: format!("cell record payload is {} bytes", data.len()),
            });
        }
        Ok(CellRecord {
            sid: rec_sid,
            row: u16::from_le_bytes([data[0], data[1]]),
            col: u16::from_le_bytes([data[2], data[3]]),
            rest: data[4..].to_vec(),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut payload = Vec::with_capacity(4 + self.rest.len());
        payload.extend_from_slice(&self.row.to_le_bytes());
        payload.extend_from_slice(&self.col.to_le_bytes());
        payload.extend_from_slice(&self.rest);
        write_record(out, self.sid, &payload);
    }

    /// Serialized size including the 4-byte header.
    pub fn encoded_size(&self) -> usize {
        4 + 4 + self.rest.len()
    }
}

/// Whether a sid is a cell value record.
pub fn is_cell_sid(rec_sid: u16) -> bool {
    matches!(
        rec_sid,
        sid::BLANK
            | sid::NUMBER
            | sid::LABEL
            | sid::BOOLERR
            | sid::LABEL_SST
            | sid::RK
            | sid::MUL_RK
            | sid::MUL_BLANK
    )
}

/// Whether a sid belongs to the page settings block.
pub fn is_page_settings_sid(rec_sid: u16) -> bool {
    matches!(
        rec_sid,
        sid::HORIZONTAL_PAGE_BREAKS
            | sid::VERTICAL_PAGE_BREAKS
            | sid::HEADER
            | sid::FOOTER
            | sid::HCENTER
            | sid::VCENTER
            | sid::LEFT_MARGIN
            | sid::RIGHT_MARGIN
            | sid::TOP_MARGIN
            | sid::BOTTOM_MARGIN
            | sid::PLS
            | sid::PRINT_SETUP
            | sid::BITMAP
    )
}

/// A record the framework has no typed model for; bytes round-trip
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRecord {
    pub sid: u16,
    pub data: Vec<u8>,
}

impl UnknownRecord {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        write_record(out, self.sid, &self.data);
    }
}

/// The closed set of records the aggregate layer dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiffRecord {
    Row(RowRecord),
    Formula(FormulaRecord),
    SharedFormula(SharedFormulaRecord),
    String(StringRecord),
    DbCell(DbCellRecord),
    CfHeader(CfHeaderRecord),
    CfRule(CfRuleRecord),
    MergedCells(MergedCellsRecord),
    Cell(CellRecord),
    Unknown(UnknownRecord),
}

impl BiffRecord {
    /// Decode one raw record into its typed form.
    pub fn parse(raw: &RawRecord<'_>) -> XlsResult<BiffRecord> {
        Ok(match raw.sid {
            sid::ROW => BiffRecord::Row(RowRecord::parse(raw.data)?),
            sid::FORMULA => BiffRecord::Formula(FormulaRecord::parse(raw.data)?),
            sid::SHARED_FORMULA => {
                BiffRecord::SharedFormula(SharedFormulaRecord::parse(raw.data)?)
            },
            sid::STRING => BiffRecord::String(StringRecord {
                data: raw.data.to_vec(),
            }),
            sid::DBCELL => BiffRecord::DbCell(DbCellRecord::parse(raw.data)?),
            sid::CF_HEADER => BiffRecord::CfHeader(CfHeaderRecord::parse(raw.data)?),
            sid::CF_RULE => BiffRecord::CfRule(CfRuleRecord {
                data: raw.data.to_vec(),
            }),
            sid::MERGED_CELLS => BiffRecord::MergedCells(MergedCellsRecord::parse(raw.data)?),
            s if is_cell_sid(s) => BiffRecord::Cell(CellRecord::parse(s, raw.data)?),
            s => BiffRecord::Unknown(UnknownRecord {
                sid: s,
                data: raw.data.to_vec(),
            }),
        })
    }

    pub fn sid(&self) -> u16 {
        match self {
            BiffRecord::Row(_) => sid::ROW,
            BiffRecord::Formula(_) => sid::FORMULA,
            BiffRecord::SharedFormula(_) => sid::SHARED_FORMULA,
            BiffRecord::String(_) => sid::STRING,
            BiffRecord::DbCell(_) => sid::DBCELL,
            BiffRecord::CfHeader(_) => sid::CF_HEADER,
            BiffRecord::CfRule(_) => sid::CF_RULE,
            BiffRecord::MergedCells(_) => sid::MERGED_CELLS,
            BiffRecord::Cell(cell) => cell.sid,
            BiffRecord::Unknown(unknown) => unknown.sid,
        }
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        match self {
            BiffRecord::Row(r) => r.serialize(out),
            BiffRecord::Formula(r) => r.serialize(out),
            BiffRecord::SharedFormula(r) => r.serialize(out),
            BiffRecord::String(r) => r.serialize(out),
            BiffRecord::DbCell(r) => r.serialize(out),
            BiffRecord::CfHeader(r) => r.serialize(out),
            BiffRecord::CfRule(r) => r.serialize(out),
            BiffRecord::MergedCells(r) => r.serialize(out),
            BiffRecord::Cell(r) => r.serialize(out),
            BiffRecord::Unknown(r) => r.serialize(out),
        }
    }
}
