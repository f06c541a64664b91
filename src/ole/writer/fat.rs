//! FAT (File Allocation Table) generation.
//!
//! The FAT maps sector numbers to the next sector in a chain. Regular
//! sectors hold chain links, FAT sectors are marked FATSECT, DIFAT sectors
//! DIFSECT, chain ends ENDOFCHAIN and free sectors FREESECT.
//!
//! Sizing the FAT is self-referential: the FAT must describe its own
//! sectors (and any DIFAT sectors), which grow the sector total, which may
//! in turn require another FAT page. [`FatBuilder::create_blocks`] runs
//! that computation as an explicit fixed-point loop.

use super::super::consts::*;

/// Result of the FAT's self-sizing pass: where its own sectors landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatAllocation {
    /// First FAT sector (ENDOFCHAIN when the file holds no sectors at all)
    pub fat_start: u32,
    /// Number of FAT sectors
    pub num_fat_sectors: u32,
    /// First DIFAT sector (ENDOFCHAIN when the inline header array suffices)
    pub difat_start: u32,
    /// Number of DIFAT sectors
    pub num_difat_sectors: u32,
}

/// FAT builder for sector allocation.
///
/// Manages sector allocation and builds the File Allocation Table for a
/// compound document.
#[derive(Debug)]
pub struct FatBuilder {
    /// The FAT table (maps sector ID to next sector in chain)
    fat: Vec<u32>,
    /// Next available sector
    next_sector: u32,
    /// Sector size for this FAT
    sector_size: usize,
}

impl FatBuilder {
    /// Create a new FAT builder.
    ///
    /// # Panics
    ///
    /// Panics if `sector_size` is not 512 or 4096.
    pub fn new_with_size(sector_size: usize) -> Self {
        assert!(
            sector_size == SECTOR_SIZE_V3 || sector_size == SECTOR_SIZE_V4,
            "Sector size must be 512 or 4096"
        );

        Self {
            fat: Vec::new(),
            next_sector: 0,
            sector_size,
        }
    }

    /// Create a new FAT builder with default 512-byte sectors.
    pub fn new() -> Self {
        Self::new_with_size(SECTOR_SIZE_V3)
    }

    /// Allocate a chain of sectors for a stream of `size` bytes.
    ///
    /// Sectors are appended sequentially, linked in order and terminated
    /// with ENDOFCHAIN. Returns the starting sector, or ENDOFCHAIN for an
    /// empty stream.
    pub fn allocate_chain(&mut self, size: usize) -> u32 {
        if size == 0 {
            return ENDOFCHAIN;
        }
        self.allocate_space(size.div_ceil(self.sector_size) as u32)
    }

    /// Allocate `count` sectors as one sequentially-linked chain and
    /// return its start index.
    pub fn allocate_space(&mut self, count: u32) -> u32 {
        if count == 0 {
            return ENDOFCHAIN;
        }

        let start_sector = self.next_sector;
        let new_len = (start_sector + count) as usize;
        if new_len > self.fat.len() {
            self.fat.resize(new_len, FREESECT);
        }

        for i in 0..count {
            let current = start_sector + i;
            self.fat[current as usize] = if i < count - 1 { current + 1 } else { ENDOFCHAIN };
        }
        self.next_sector = start_sector + count;

        start_sector
    }

    /// Allocate a contiguous range of sectors and mark them with a special
    /// value (`FATSECT` for FAT sectors, `DIFSECT` for DIFAT sectors).
    /// Returns the first sector of the range.
    pub fn allocate_special(&mut self, count: u32, marker: u32) -> u32 {
        if count == 0 {
            return ENDOFCHAIN;
        }

        let start = self.next_sector;
        let end = start + count;
        if (end as usize) > self.fat.len() {
            self.fat.resize(end as usize, FREESECT);
        }
        for s in start..end {
            self.fat[s as usize] = marker;
        }
        self.next_sector = end;
        start
    }

    /// Size the FAT's (and DIFAT's) own storage and reserve it.
    ///
    /// Iterates {FAT sectors needed for the current total} → {DIFAT sectors
    /// needed for that FAT count} until both stabilize. Converges within a
    /// few iterations because each step can only grow the totals and the
    /// growth shrinks geometrically; the loop is still explicitly bounded.
    /// Must be called after all stream chains are allocated and before
    /// [`generate_fat_sectors`](Self::generate_fat_sectors).
    pub fn create_blocks(&mut self) -> BatAllocation {
        let entries_per_fat = (self.sector_size / 4) as u32;
        let ids_per_difat = entries_per_fat - 1; // last u32 is the next pointer

        let n_used = self.next_sector;
        let mut n_fat: u32 = 0;
        let mut n_difat: u32 = 0;
        for _ in 0..8 {
            let total = n_used + n_fat + n_difat;
            let new_n_fat = total.div_ceil(entries_per_fat).max(1);
            let new_n_difat = if new_n_fat > HEADER_FAT_ENTRIES as u32 {
                (new_n_fat - HEADER_FAT_ENTRIES as u32).div_ceil(ids_per_difat)
            } else {
                0
            };
            if new_n_fat == n_fat && new_n_difat == n_difat {
                break;
            }
            n_fat = new_n_fat;
            n_difat = new_n_difat;
        }

        // DIFAT sectors first, then FAT sectors
        let difat_start = self.allocate_special(n_difat, DIFSECT);
        let fat_start = self.allocate_special(n_fat, FATSECT);

        BatAllocation {
            fat_start,
            num_fat_sectors: n_fat,
            difat_start,
            num_difat_sectors: n_difat,
        }
    }

    /// Get the FAT table.
    pub fn fat(&self) -> &[u32] {
        &self.fat
    }

    /// Total number of sectors allocated so far.
    pub fn total_sectors(&self) -> u32 {
        self.next_sector
    }

    /// Get sector size.
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Serialize the FAT into sector-sized pages, 0xFF-filled (FREESECT)
    /// in unused slots.
    pub fn generate_fat_sectors(&self) -> Vec<Vec<u8>> {
        let entries_per_sector = self.sector_size / 4;
        let num_fat_sectors = self.fat.len().div_ceil(entries_per_sector);

        let mut fat_sectors = Vec::with_capacity(num_fat_sectors);
        for sector_idx in 0..num_fat_sectors {
            let mut sector_data = vec![0xFFu8; self.sector_size];
            let start_entry = sector_idx * entries_per_sector;
            let end_entry = (start_entry + entries_per_sector).min(self.fat.len());

            for (i, &fat_value) in self.fat[start_entry..end_entry].iter().enumerate() {
                let offset = i * 4;
                sector_data[offset..offset + 4].copy_from_slice(&fat_value.to_le_bytes());
            }
            fat_sectors.push(sector_data);
        }

        fat_sectors
    }

    /// Validate the FAT for consistency: cycles and out-of-range links.
    pub fn validate(&self) -> Result<(), String> {
        use std::collections::HashSet;

        let mut visited = HashSet::new();
        for start_sector in 0..self.fat.len() as u32 {
            let first = self.fat[start_sector as usize];
            if first > MAXREGSECT {
                continue;
            }

            visited.clear();
            let mut current = start_sector;
            while current != ENDOFCHAIN {
                if current >= self.fat.len() as u32 {
                    return Err(format!("invalid sector reference: {current}"));
                }
                if !visited.insert(current) {
                    return Err(format!("circular reference detected at sector {current}"));
                }
                let next = self.fat[current as usize];
                match next {
                    ENDOFCHAIN => break,
                    FREESECT | FATSECT | DIFSECT => break,
                    _ => {
                        if next >= self.fat.len() as u32 {
                            return Err(format!("invalid next sector {next} at sector {current}"));
                        }
                    },
                }
                current = next;
            }
        }

        Ok(())
    }
}

impl Default for FatBuilder {
    fn default() -> Self {
        Self::new()
    }
}
