//! MiniFAT generation and ministream assembly.
//!
//! Streams below the 4096-byte cutoff are packed into 64-byte mini sectors
//! inside the ministream, an ordinary big-block chain owned by the root
//! entry. The MiniFAT chains mini sectors the same way the FAT chains big
//! sectors. The ministream itself is padded with zero filler so it always
//! occupies a whole number of big sectors.

use super::super::consts::*;

/// Allocates mini sectors and accumulates the ministream contents.
#[derive(Debug)]
pub struct MiniFatBuilder {
    /// MiniFAT table (mini sector ID to next mini sector in chain)
    minifat: Vec<u32>,
    /// Next available mini sector
    next_mini_sector: u32,
    mini_sector_size: usize,
    /// Concatenated small streams, each padded to a mini sector boundary
    ministream_data: Vec<u8>,
}

impl MiniFatBuilder {
    pub fn new(mini_sector_size: usize) -> Self {
        Self {
            minifat: Vec::new(),
            next_mini_sector: 0,
            mini_sector_size,
            ministream_data: Vec::new(),
        }
    }

    /// Append a small stream to the ministream and chain its mini sectors.
    /// Returns the starting mini sector, or ENDOFCHAIN for empty data.
    pub fn allocate_mini_chain(&mut self, data: &[u8]) -> u32 {
        if data.is_empty() {
            return ENDOFCHAIN;
        }

        let num_mini_sectors = data.len().div_ceil(self.mini_sector_size);
        let start_mini_sector = self.next_mini_sector;

        let new_len = start_mini_sector as usize + num_mini_sectors;
        if new_len > self.minifat.len() {
            self.minifat.resize(new_len, FREESECT);
        }

        for i in 0..num_mini_sectors {
            let current = self.next_mini_sector;
            self.next_mini_sector += 1;
            self.minifat[current as usize] = if i < num_mini_sectors - 1 {
                current + 1
            } else {
                ENDOFCHAIN
            };
        }

        // Pad the stream to a mini sector boundary inside the ministream
        let padded = num_mini_sectors * self.mini_sector_size;
        let offset = self.ministream_data.len();
        self.ministream_data.resize(offset + padded, 0);
        self.ministream_data[offset..offset + data.len()].copy_from_slice(data);

        start_mini_sector
    }

    /// Ministream size as recorded in the root directory entry.
    pub fn ministream_size(&self) -> u64 {
        self.ministream_data.len() as u64
    }

    /// The ministream padded with zero filler to a whole number of big
    /// sectors, ready to be allocated a regular FAT chain.
    pub fn padded_ministream_data(&self, sector_size: usize) -> Vec<u8> {
        let mut data = self.ministream_data.clone();
        let big_blocks = data.len().div_ceil(sector_size);
        data.resize(big_blocks * sector_size, 0);
        data
    }

    /// Serialize the MiniFAT into regular sectors, FREESECT-filled in
    /// unused slots.
    pub fn generate_minifat_sectors(&self, sector_size: usize) -> Vec<Vec<u8>> {
        if self.minifat.is_empty() {
            return Vec::new();
        }

        let entries_per_sector = sector_size / 4;
        let num_minifat_sectors = self.minifat.len().div_ceil(entries_per_sector);

        let mut minifat_sectors = Vec::with_capacity(num_minifat_sectors);
        for sector_idx in 0..num_minifat_sectors {
            let mut sector_data = vec![0xFFu8; sector_size];
            let start_entry = sector_idx * entries_per_sector;
            let end_entry = (start_entry + entries_per_sector).min(self.minifat.len());

            for (i, &minifat_value) in self.minifat[start_entry..end_entry].iter().enumerate() {
                let offset = i * 4;
                sector_data[offset..offset + 4].copy_from_slice(&minifat_value.to_le_bytes());
            }
            minifat_sectors.push(sector_data);
        }

        minifat_sectors
    }

    /// Number of mini sectors allocated.
    pub fn mini_sector_count(&self) -> u32 {
        self.next_mini_sector
    }

    /// True when no small stream has been allocated.
    pub fn is_empty(&self) -> bool {
        self.minifat.is_empty()
    }

    /// Get the MiniFAT table.
    pub fn minifat(&self) -> &[u32] {
        &self.minifat
    }
}

impl Default for MiniFatBuilder {
    fn default() -> Self {
        Self::new(MINI_SECTOR_SIZE)
    }
}
