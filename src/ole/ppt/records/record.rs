//! Generic PPT record parsing and serialization.
//!
//! Every record starts with an 8-byte header: a packed u16 whose low 4
//! bits are the version and high 12 bits the instance, a u16 type id, and
//! a u32 payload length (excluding the header). Containers nest child
//! records inside their payload with no explicit child count; children
//! are discovered by scanning until the payload runs out.

use super::types::{self, RecordKind};
use crate::ole::ppt::{PptError, PptWarning, Result};
use bytes::Bytes;
use zerocopy::{FromBytes, LE, U16, U32};

/// Record header size in bytes.
const HEADER_SIZE: usize = 8;

/// A record's payload: raw bytes for atoms, child records for containers.
#[derive(Debug, Clone)]
pub enum RecordBody {
    Atom(Bytes),
    Container(Vec<PptRecord>),
}

/// One decoded PPT record.
#[derive(Debug, Clone)]
pub struct PptRecord {
    /// Low 4 bits of the packed header field
    pub version: u16,
    /// High 12 bits of the packed header field
    pub instance: u16,
    /// Record type id; unknown ids round-trip verbatim
    pub record_type: u16,
    pub body: RecordBody,
}

impl PptRecord {
    /// Construct an atom from its payload.
    pub fn atom(record_type: u16, version: u16, instance: u16, data: impl Into<Bytes>) -> Self {
        PptRecord {
            version,
            instance,
            record_type,
            body: RecordBody::Atom(data.into()),
        }
    }

    /// Construct a container from its children.
    pub fn container(record_type: u16, instance: u16, children: Vec<PptRecord>) -> Self {
        PptRecord {
            version: 0xF,
            instance,
            record_type,
            body: RecordBody::Container(children),
        }
    }

    /// Registry name of this record's type.
    pub fn type_name(&self) -> &'static str {
        types::name_of(self.record_type)
    }

    /// Child records, or None for atoms.
    pub fn children(&self) -> Option<&[PptRecord]> {
        match &self.body {
            RecordBody::Container(children) => Some(children),
            RecordBody::Atom(_) => None,
        }
    }

    /// Mutable child records, or None for atoms.
    pub fn children_mut(&mut self) -> Option<&mut Vec<PptRecord>> {
        match &mut self.body {
            RecordBody::Container(children) => Some(children),
            RecordBody::Atom(_) => None,
        }
    }

    /// Atom payload, or None for containers.
    pub fn data(&self) -> Option<&Bytes> {
        match &self.body {
            RecordBody::Atom(data) => Some(data),
            RecordBody::Container(_) => None,
        }
    }

    /// First direct child of the given type.
    pub fn find_child(&self, record_type: u16) -> Option<&PptRecord> {
        self.children()?
            .iter()
            .find(|child| child.record_type == record_type)
    }

    /// All direct children of the given type.
    pub fn find_children(&self, record_type: u16) -> Vec<&PptRecord> {
        match self.children() {
            Some(children) => children
                .iter()
                .filter(|child| child.record_type == record_type)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Depth-first search for the first record of the given type,
    /// including this record itself.
    pub fn find_descendant(&self, record_type: u16) -> Option<&PptRecord> {
        if self.record_type == record_type {
            return Some(self);
        }
        self.children()?
            .iter()
            .find_map(|child| child.find_descendant(record_type))
    }

    /// Serialized size including the 8-byte header. Container sizes are
    /// computed from the current children, never from the length the file
    /// declared.
    pub fn serialized_len(&self) -> usize {
        HEADER_SIZE + self.body_len()
    }

    fn body_len(&self) -> usize {
        match &self.body {
            RecordBody::Atom(data) => data.len(),
            RecordBody::Container(children) => {
                children.iter().map(PptRecord::serialized_len).sum()
            },
        }
    }

    /// Serialize this record. Container length fields are recomputed from
    /// the children on every call, so mutated trees stay consistent.
    pub fn write_out(&self, out: &mut Vec<u8>) {
        let ver_inst = (self.version & 0x000F) | (self.instance << 4);
        out.extend_from_slice(&ver_inst.to_le_bytes());
        out.extend_from_slice(&self.record_type.to_le_bytes());
        out.extend_from_slice(&(self.body_len() as u32).to_le_bytes());

        match &self.body {
            RecordBody::Atom(data) => out.extend_from_slice(data),
            RecordBody::Container(children) => {
                for child in children {
                    child.write_out(out);
                }
            },
        }
    }
}

/// Scan a byte range into records.
///
/// Scanning stops when fewer than 8 bytes remain. A record of type 0 with
/// length 0xFFFF at the start of the range is definitive corruption and
/// fails hard; a record whose declared length overruns the buffer is
/// dropped with a warning and ends the scan.
pub fn find_child_records(data: &Bytes, warnings: &mut Vec<PptWarning>) -> Result<Vec<PptRecord>> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset + HEADER_SIZE <= data.len() {
        let ver_inst = read_u16(data, offset)?;
        let record_type = read_u16(data, offset + 2)?;
        let length = read_u32(data, offset + 4)? as usize;

        if offset == 0 && record_type == 0 && length == 0xFFFF {
            return Err(PptError::CorruptedHeader { offset });
        }

        let body_start = offset + HEADER_SIZE;
        let available = data.len() - body_start;
        if length > available {
            warnings.push(PptWarning::TruncatedRecord {
                record_type,
                offset,
                declared: length,
                available,
            });
            break;
        }

        let version = ver_inst & 0x000F;
        let instance = ver_inst >> 4;
        let payload = data.slice(body_start..body_start + length);

        let body = match types::kind_of(record_type, version) {
            RecordKind::Container => RecordBody::Container(find_child_records(&payload, warnings)?),
            RecordKind::Atom => RecordBody::Atom(payload),
        };

        records.push(PptRecord {
            version,
            instance,
            record_type,
            body,
        });
        offset = body_start + length;
    }

    Ok(records)
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| PptError::Corrupted(format!("short read at offset {offset}")))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| PptError::Corrupted(format!("short read at offset {offset}")))
}
