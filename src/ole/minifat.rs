//! Mini-stream (small block) reading.
//!
//! Streams shorter than the mini-stream cutoff are stored as 64-byte mini
//! sectors packed into the ministream — an ordinary big-block chain owned
//! by the root directory entry — and chained through their own allocation
//! table, the MiniFAT. Chains inside the ministream use the same
//! next-index model as the main FAT, just at mini-sector granularity.

use super::consts::*;
use super::fat::AllocationTable;
use super::header::HeaderBlock;
use super::sectors::SectorBuffer;
use super::{OleError, OleWarning};
use crate::common::binary::read_u32_le;
use fixedbitset::FixedBitSet;

/// The materialized ministream plus its MiniFAT.
#[derive(Debug)]
pub struct MiniStream {
    data: Vec<u8>,
    table: AllocationTable,
    mini_sector_size: usize,
}

impl MiniStream {
    /// Resolve the MiniFAT chain and the ministream's backing big blocks.
    ///
    /// `root_start` and `root_size` come from the root directory entry,
    /// which owns the ministream.
    pub fn read(
        header: &HeaderBlock,
        fat: &AllocationTable,
        sectors: &mut SectorBuffer,
        root_start: u32,
        root_size: u64,
        warnings: &mut Vec<OleWarning>,
    ) -> Result<Self, OleError> {
        // The MiniFAT itself is an ordinary big-block chain
        let minifat_bytes = fat.fetch_chain(
            header.first_minifat_sector,
            sectors,
            header.first_dir_sector,
            warnings,
        )?;
        let mut entries = Vec::with_capacity(minifat_bytes.len() / 4);
        for i in 0..minifat_bytes.len() / 4 {
            entries.push(read_u32_le(&minifat_bytes, i * 4)?);
        }

        let mut data = fat.fetch_chain(root_start, sectors, header.first_dir_sector, warnings)?;
        data.truncate(root_size as usize);

        Ok(MiniStream {
            data,
            table: AllocationTable::from_entries(entries),
            mini_sector_size: header.mini_sector_size,
        })
    }

    /// Read a small stream by walking its MiniFAT chain, truncated to the
    /// directory entry's declared size.
    pub fn read_stream(&self, start: u32, size: u64) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::with_capacity(size as usize);
        let mut visited = FixedBitSet::with_capacity(self.table.len());
        let mut current = start;

        while current != ENDOFCHAIN {
            let idx = current as usize;
            if idx >= self.table.len() {
                return Err(OleError::SectorOutOfRange {
                    sector: current,
                    available: self.table.len(),
                });
            }
            if visited.contains(idx) {
                return Err(OleError::CyclicChain {
                    sector: current,
                    chain_start: start,
                });
            }
            visited.insert(idx);

            let offset = idx * self.mini_sector_size;
            let end = offset + self.mini_sector_size;
            if end > self.data.len() {
                return Err(OleError::CorruptedFile(format!(
                    "mini sector {current} lies outside the ministream ({} bytes)",
                    self.data.len()
                )));
            }
            data.extend_from_slice(&self.data[offset..end]);

            current = self.table.next_index(current)?;
        }

        data.truncate(size as usize);
        Ok(data)
    }
}
