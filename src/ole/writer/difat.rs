//! DIFAT (double-indirect FAT) generation.
//!
//! The header stores only the first 109 FAT sector IDs inline; files whose
//! FAT spans more sectors chain the overflow through DIFAT sectors. Each
//! DIFAT sector holds `sector_size / 4 - 1` FAT sector IDs followed by the
//! index of the next DIFAT sector (ENDOFCHAIN on the last).

use super::super::consts::*;

/// Builds the DIFAT sector chain for the FAT sector IDs beyond the
/// header's inline capacity.
#[derive(Debug)]
pub struct DifatBuilder {
    /// FAT sector IDs beyond the first 109
    overflow_ids: Vec<u32>,
    sector_size: usize,
}

impl DifatBuilder {
    /// Create a builder for the given sector size (512 or 4096).
    pub fn new(sector_size: usize) -> Self {
        assert!(
            sector_size == SECTOR_SIZE_V3 || sector_size == SECTOR_SIZE_V4,
            "Sector size must be 512 or 4096"
        );
        Self {
            overflow_ids: Vec::new(),
            sector_size,
        }
    }

    /// Register the complete FAT sector ID list; the first 109 go in the
    /// header and only the remainder is kept here.
    pub fn set_fat_sectors(&mut self, fat_sectors: &[u32]) {
        self.overflow_ids = fat_sectors
            .get(HEADER_FAT_ENTRIES..)
            .map(<[u32]>::to_vec)
            .unwrap_or_default();
    }

    /// Whether any overflow exists (more than 109 FAT sectors).
    pub fn is_needed(&self) -> bool {
        !self.overflow_ids.is_empty()
    }

    /// Number of DIFAT sectors required for the registered overflow.
    pub fn sector_count(&self) -> u32 {
        if self.overflow_ids.is_empty() {
            return 0;
        }
        let ids_per_sector = self.sector_size / 4 - 1;
        self.overflow_ids.len().div_ceil(ids_per_sector) as u32
    }

    /// Serialize the DIFAT chain, assuming its sectors occupy the
    /// contiguous range starting at `first_difat_sector`.
    pub fn generate_difat_sectors(&self, first_difat_sector: u32) -> Vec<Vec<u8>> {
        if self.overflow_ids.is_empty() {
            return Vec::new();
        }

        let ids_per_sector = self.sector_size / 4 - 1;
        let count = self.sector_count();
        let mut difat_sectors = Vec::with_capacity(count as usize);

        for difat_idx in 0..count {
            let mut sector_data = vec![0xFFu8; self.sector_size]; // FREESECT fill

            let lo = (difat_idx as usize) * ids_per_sector;
            let hi = (lo + ids_per_sector).min(self.overflow_ids.len());
            for (i, &id) in self.overflow_ids[lo..hi].iter().enumerate() {
                sector_data[i * 4..i * 4 + 4].copy_from_slice(&id.to_le_bytes());
            }

            let next = if difat_idx + 1 < count {
                first_difat_sector + difat_idx + 1
            } else {
                ENDOFCHAIN
            };
            let tail = self.sector_size - 4;
            sector_data[tail..].copy_from_slice(&next.to_le_bytes());

            difat_sectors.push(sector_data);
        }

        difat_sectors
    }
}
