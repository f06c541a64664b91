//! File Allocation Table resolution and chain traversal.
//!
//! The FAT is a flat array with one entry per sector: `table[i]` is the
//! index of the sector following sector `i` in whatever chain it belongs
//! to, or a terminator/reserved marker. The header carries up to 109 FAT
//! sector IDs inline; larger files continue the list in DIFAT sectors,
//! each holding `sector_size / 4 - 1` IDs plus a pointer to the next DIFAT
//! sector.
//!
//! Based on Apache POI's BlockAllocationTableReader, including its two
//! tolerated chain-termination anomalies for known malformed producers.

use super::consts::*;
use super::header::HeaderBlock;
use super::sectors::SectorBuffer;
use super::{OleError, OleWarning};
use crate::common::binary::read_u32_le;

/// A reconstructed allocation table (main FAT or MiniFAT).
#[derive(Debug, Clone)]
pub struct AllocationTable {
    entries: Vec<u32>,
}

impl AllocationTable {
    /// Reconstruct the main FAT from the header's inline sector list plus
    /// the DIFAT overflow chain, consuming every FAT and DIFAT sector from
    /// the arena.
    pub fn read(header: &HeaderBlock, sectors: &mut SectorBuffer) -> Result<Self, OleError> {
        let mut fat_sector_ids = header.inline_fat_sectors.clone();
        fat_sector_ids.truncate(header.num_fat_sectors as usize);

        // Resolve DIFAT overflow sectors first
        let ids_per_difat = sectors.sector_size() / 4 - 1;
        let mut difat_sector = header.first_difat_sector;
        for _ in 0..header.num_difat_sectors {
            if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                break;
            }
            let data = sectors.consume(difat_sector)?.to_vec();
            for i in 0..ids_per_difat {
                let id = read_u32_le(&data, i * 4)?;
                if id == FREESECT || id == ENDOFCHAIN {
                    break;
                }
                fat_sector_ids.push(id);
            }
            difat_sector = read_u32_le(&data, ids_per_difat * 4)?;
        }

        fat_sector_ids.truncate(header.num_fat_sectors as usize);
        if fat_sector_ids.len() < header.num_fat_sectors as usize {
            return Err(OleError::CorruptedFile(format!(
                "header declares {} FAT sectors but only {} were found",
                header.num_fat_sectors,
                fat_sector_ids.len()
            )));
        }

        // Read each FAT sector into the flat table
        let entries_per_sector = sectors.sector_size() / 4;
        let mut entries = Vec::with_capacity(fat_sector_ids.len() * entries_per_sector);
        for &id in &fat_sector_ids {
            let data = sectors.consume(id)?;
            for i in 0..entries_per_sector {
                entries.push(read_u32_le(data, i * 4)?);
            }
        }

        Ok(AllocationTable { entries })
    }

    /// Build a table from raw entries (used for the MiniFAT, whose entries
    /// arrive as an ordinary stream rather than dedicated sectors).
    pub fn from_entries(entries: Vec<u32>) -> Self {
        AllocationTable { entries }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the given sector has an allocation entry.
    pub fn is_used(&self, index: u32) -> bool {
        matches!(self.entries.get(index as usize), Some(&e) if e != FREESECT)
    }

    /// Index of the sector following `index` in its chain.
    ///
    /// Querying an index with no entry is reported explicitly, never
    /// defaulted.
    pub fn next_index(&self, index: u32) -> Result<u32, OleError> {
        match self.entries.get(index as usize) {
            Some(&FREESECT) | None => Err(OleError::InvalidData(format!(
                "sector index {index} is unused"
            ))),
            Some(&next) => Ok(next),
        }
    }

    /// Walk the chain starting at `start`, consuming each visited sector
    /// and concatenating its payload.
    ///
    /// Two known-bad-but-recoverable terminations are tolerated with a
    /// warning: a chain running into the directory stream's start sector,
    /// and an empty chain whose first link is 0 instead of ENDOFCHAIN.
    /// Every other broken link is a hard failure.
    pub fn fetch_chain(
        &self,
        start: u32,
        sectors: &mut SectorBuffer,
        directory_start: u32,
        warnings: &mut Vec<OleWarning>,
    ) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut current = start;
        let mut first_step = true;

        while current != ENDOFCHAIN {
            let blocked = current as usize >= sectors.sector_count()
                || sectors.is_consumed(current)
                || !self.is_used(current);

            if blocked {
                if current == directory_start && start != directory_start {
                    warnings.push(OleWarning::ChainReachedDirectoryStart {
                        sector: current,
                        chain_start: start,
                    });
                    break;
                }
                if current == 0 && first_step {
                    warnings.push(OleWarning::EmptyChainTerminatedWithZero { chain_start: start });
                    break;
                }
                if sectors.is_consumed(current) {
                    return Err(OleError::CyclicChain {
                        sector: current,
                        chain_start: start,
                    });
                }
                if (current as usize) < sectors.sector_count() {
                    // In range but with no allocation entry
                    return Err(OleError::BrokenChain {
                        sector: current,
                        next: FREESECT,
                    });
                }
                return Err(OleError::SectorOutOfRange {
                    sector: current,
                    available: sectors.sector_count(),
                });
            }

            data.extend_from_slice(sectors.consume(current)?);
            let next = self.next_index(current)?;
            if next != ENDOFCHAIN && next > MAXREGSECT {
                // FATSECT/DIFSECT/FREESECT mid-chain
                return Err(OleError::BrokenChain {
                    sector: current,
                    next,
                });
            }
            current = next;
            first_step = false;
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(sector_count: usize) -> SectorBuffer {
        let mut data = vec![0u8; 512];
        for i in 0..sector_count {
            data.extend(std::iter::repeat_n(i as u8, 512));
        }
        SectorBuffer::new(data, 512)
    }

    #[test]
    fn test_fetch_simple_chain() {
        // 0 -> 1 -> 2 -> end
        let table = AllocationTable::from_entries(vec![1, 2, ENDOFCHAIN, FREESECT]);
        let mut sectors = buffer(4);
        let mut warnings = Vec::new();
        let data = table
            .fetch_chain(0, &mut sectors, NOSTREAM, &mut warnings)
            .unwrap();
        assert_eq!(data.len(), 3 * 512);
        assert_eq!(data[0], 0);
        assert_eq!(data[512], 1);
        assert_eq!(data[1024], 2);
        assert!(warnings.is_empty());
        assert!(sectors.is_consumed(0));
        assert!(sectors.is_consumed(2));
        assert!(!sectors.is_consumed(3));
    }

    #[test]
    fn test_cycle_detection() {
        // 0 -> 1 -> 0: must fail, not loop
        let table = AllocationTable::from_entries(vec![1, 0, ENDOFCHAIN]);
        let mut sectors = buffer(3);
        let mut warnings = Vec::new();
        let err = table
            .fetch_chain(0, &mut sectors, NOSTREAM, &mut warnings)
            .unwrap_err();
        assert!(matches!(
            err,
            OleError::CyclicChain {
                sector: 0,
                chain_start: 0
            }
        ));
    }

    #[test]
    fn test_chain_ends_at_directory_start() {
        // 0 -> 1 -> 2 where 2 is the (already consumed) directory start
        let table = AllocationTable::from_entries(vec![1, 2, ENDOFCHAIN]);
        let mut sectors = buffer(3);
        sectors.consume(2).unwrap();
        let mut warnings = Vec::new();
        let data = table.fetch_chain(0, &mut sectors, 2, &mut warnings).unwrap();
        assert_eq!(data.len(), 2 * 512);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            OleWarning::ChainReachedDirectoryStart {
                sector: 2,
                chain_start: 0
            }
        ));
    }

    #[test]
    fn test_empty_chain_zero_terminated() {
        // Start sector 0, which is consumed (it holds the FAT): tolerated
        let table = AllocationTable::from_entries(vec![FATSECT, ENDOFCHAIN]);
        let mut sectors = buffer(2);
        sectors.consume(0).unwrap();
        let mut warnings = Vec::new();
        let data = table
            .fetch_chain(0, &mut sectors, NOSTREAM, &mut warnings)
            .unwrap();
        assert!(data.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            OleWarning::EmptyChainTerminatedWithZero { chain_start: 0 }
        ));
    }

    #[test]
    fn test_broken_link_is_fatal() {
        // 0 -> 5, but sector 5 has no allocation entry
        let table = AllocationTable::from_entries(vec![5, ENDOFCHAIN, FREESECT, FREESECT, FREESECT, FREESECT]);
        let mut sectors = buffer(6);
        let mut warnings = Vec::new();
        let err = table
            .fetch_chain(0, &mut sectors, NOSTREAM, &mut warnings)
            .unwrap_err();
        assert!(matches!(err, OleError::BrokenChain { sector: 5, .. }));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_is_fatal() {
        let table = AllocationTable::from_entries(vec![40, ENDOFCHAIN]);
        let mut sectors = buffer(2);
        let mut warnings = Vec::new();
        let err = table
            .fetch_chain(0, &mut sectors, NOSTREAM, &mut warnings)
            .unwrap_err();
        assert!(matches!(err, OleError::SectorOutOfRange { sector: 40, .. }));
    }

    #[test]
    fn test_point_queries() {
        let table = AllocationTable::from_entries(vec![1, ENDOFCHAIN, FREESECT]);
        assert!(table.is_used(0));
        assert!(table.is_used(1));
        assert!(!table.is_used(2));
        assert!(!table.is_used(100));
        assert_eq!(table.next_index(0).unwrap(), 1);
        assert_eq!(table.next_index(1).unwrap(), ENDOFCHAIN);
        assert!(table.next_index(2).is_err());
        assert!(table.next_index(100).is_err());
    }
}
