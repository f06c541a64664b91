//! Physical sector arena.
//!
//! The whole file is read into memory once and viewed as an array of
//! fixed-size sectors. As the FAT, directory and stream chains are resolved,
//! each visited sector is marked consumed; a chain that revisits a consumed
//! sector has looped, and a well-formed file leaves no stream sector
//! consumed twice. The consumed set doubles as the cycle detector.

use super::OleError;
use fixedbitset::FixedBitSet;

/// In-memory view of a file as indexed sectors with a consumed bitmap.
///
/// Sector `i` lives at byte offset `(i + 1) * sector_size`; the first
/// `sector_size` bytes of the file belong to the header.
#[derive(Debug)]
pub struct SectorBuffer {
    data: Vec<u8>,
    sector_size: usize,
    consumed: FixedBitSet,
}

impl SectorBuffer {
    /// Wrap a fully-read file. `data` includes the header block.
    pub fn new(data: Vec<u8>, sector_size: usize) -> Self {
        let count = data.len().saturating_sub(sector_size) / sector_size;
        SectorBuffer {
            data,
            sector_size,
            consumed: FixedBitSet::with_capacity(count),
        }
    }

    /// Number of addressable sectors (header excluded).
    pub fn sector_count(&self) -> usize {
        self.consumed.len()
    }

    /// Sector size in bytes.
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Whether the given sector has been consumed by a chain walk.
    pub fn is_consumed(&self, index: u32) -> bool {
        (index as usize) < self.consumed.len() && self.consumed.contains(index as usize)
    }

    /// Borrow a sector without consuming it.
    pub fn get(&self, index: u32) -> Result<&[u8], OleError> {
        let idx = index as usize;
        if idx >= self.sector_count() {
            return Err(OleError::SectorOutOfRange {
                sector: index,
                available: self.sector_count(),
            });
        }
        let start = (idx + 1) * self.sector_size;
        Ok(&self.data[start..start + self.sector_size])
    }

    /// Borrow a sector and mark it consumed.
    ///
    /// Consuming an already-consumed sector is an error; callers walking a
    /// chain should check [`is_consumed`](Self::is_consumed) first to raise
    /// a cycle error with chain context.
    pub fn consume(&mut self, index: u32) -> Result<&[u8], OleError> {
        let idx = index as usize;
        if idx >= self.sector_count() {
            return Err(OleError::SectorOutOfRange {
                sector: index,
                available: self.sector_count(),
            });
        }
        if self.consumed.contains(idx) {
            return Err(OleError::InvalidData(format!(
                "sector {index} consumed twice"
            )));
        }
        self.consumed.insert(idx);
        let start = (idx + 1) * self.sector_size;
        Ok(&self.data[start..start + self.sector_size])
    }
}
