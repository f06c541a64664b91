//! Header block generation.
//!
//! The header data is always 512 bytes; for DLL version 4 files (4096-byte
//! sectors) the emitted block is zero-padded to a full sector so sector 0
//! still begins at offset `sector_size`.

use super::super::consts::*;

/// Assembles the header block once the FAT, MiniFAT, DIFAT and directory
/// locations are known.
pub struct HeaderBuilder {
    sector_size: usize,
    first_dir_sector: u32,
    /// csectDir; written as 0 for 512-byte sector files
    num_dir_sectors: u32,
    first_minifat_sector: u32,
    num_minifat_sectors: u32,
    first_difat_sector: u32,
    num_difat_sectors: u32,
    /// All FAT sector IDs; only the first 109 land in the header
    fat_sectors: Vec<u32>,
}

impl HeaderBuilder {
    pub fn new(sector_size: usize) -> Self {
        Self {
            sector_size,
            first_dir_sector: 0,
            num_dir_sectors: 0,
            first_minifat_sector: ENDOFCHAIN,
            num_minifat_sectors: 0,
            first_difat_sector: ENDOFCHAIN,
            num_difat_sectors: 0,
            fat_sectors: Vec::new(),
        }
    }

    pub fn set_first_dir_sector(&mut self, sector: u32) {
        self.first_dir_sector = sector;
    }

    /// csectDir is only meaningful for 4096-byte sector files; version 3
    /// files always write 0.
    pub fn set_num_dir_sectors(&mut self, num: u32) {
        self.num_dir_sectors = if self.sector_size == SECTOR_SIZE_V3 {
            0
        } else {
            num
        };
    }

    pub fn set_minifat(&mut self, first_sector: u32, num_sectors: u32) {
        self.first_minifat_sector = first_sector;
        self.num_minifat_sectors = num_sectors;
    }

    pub fn set_difat(&mut self, first_sector: u32, num_sectors: u32) {
        self.first_difat_sector = first_sector;
        self.num_difat_sectors = num_sectors;
    }

    pub fn add_fat_sectors(&mut self, sectors: &[u32]) {
        self.fat_sectors.extend_from_slice(sectors);
    }

    /// Emit the header block, `sector_size` bytes long.
    pub fn generate(&self) -> Vec<u8> {
        let mut header = vec![0u8; self.sector_size];

        header[0..8].copy_from_slice(MAGIC);
        // CLSID at 8..24 stays zero

        header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes()); // minor version

        let (dll_version, sector_shift) = if self.sector_size == SECTOR_SIZE_V3 {
            (3u16, 9u16)
        } else {
            (4u16, 12u16)
        };
        header[26..28].copy_from_slice(&dll_version.to_le_bytes());
        header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes()); // little-endian
        header[30..32].copy_from_slice(&sector_shift.to_le_bytes());
        header[32..34].copy_from_slice(&6u16.to_le_bytes()); // mini sector shift: 64 bytes

        // 34..40 reserved
        header[40..44].copy_from_slice(&self.num_dir_sectors.to_le_bytes());
        header[44..48].copy_from_slice(&(self.fat_sectors.len() as u32).to_le_bytes());
        header[48..52].copy_from_slice(&self.first_dir_sector.to_le_bytes());
        // 52..56 transaction signature, zero
        header[56..60].copy_from_slice(&MINI_STREAM_CUTOFF.to_le_bytes());
        header[60..64].copy_from_slice(&self.first_minifat_sector.to_le_bytes());
        header[64..68].copy_from_slice(&self.num_minifat_sectors.to_le_bytes());
        header[68..72].copy_from_slice(&self.first_difat_sector.to_le_bytes());
        header[72..76].copy_from_slice(&self.num_difat_sectors.to_le_bytes());

        // Inline FAT array: first 109 IDs, FREESECT in unused slots
        for i in 0..HEADER_FAT_ENTRIES {
            let value = self.fat_sectors.get(i).copied().unwrap_or(FREESECT);
            let offset = 76 + i * 4;
            header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::header::HeaderBlock;

    #[test]
    fn test_header_generation() {
        let mut builder = HeaderBuilder::new(512);
        builder.set_first_dir_sector(10);
        builder.add_fat_sectors(&[1, 2, 3]);

        let header = builder.generate();
        assert_eq!(header.len(), 512);
        assert_eq!(&header[0..8], MAGIC);
        assert_eq!(&header[28..30], &0xFFFEu16.to_le_bytes());
        // Unused inline slots are FREESECT
        assert_eq!(&header[76 + 3 * 4..76 + 4 * 4], &FREESECT.to_le_bytes());
    }

    #[test]
    fn test_sector_size_fields_cohere() {
        let header = HeaderBuilder::new(512).generate();
        assert_eq!(&header[26..28], &3u16.to_le_bytes());
        assert_eq!(&header[30..32], &9u16.to_le_bytes());

        let header = HeaderBuilder::new(4096).generate();
        assert_eq!(header.len(), 4096);
        assert_eq!(&header[26..28], &4u16.to_le_bytes());
        assert_eq!(&header[30..32], &12u16.to_le_bytes());
    }

    #[test]
    fn test_generated_header_parses_back() {
        let mut builder = HeaderBuilder::new(512);
        builder.set_first_dir_sector(7);
        builder.set_minifat(12, 2);
        builder.set_difat(ENDOFCHAIN, 0);
        builder.add_fat_sectors(&[5, 6]);

        let parsed = HeaderBlock::parse(&builder.generate()).unwrap();
        assert_eq!(parsed.sector_size, 512);
        assert_eq!(parsed.first_dir_sector, 7);
        assert_eq!(parsed.num_fat_sectors, 2);
        assert_eq!(parsed.first_minifat_sector, 12);
        assert_eq!(parsed.num_minifat_sectors, 2);
        assert_eq!(parsed.mini_stream_cutoff, MINI_STREAM_CUTOFF);
        assert_eq!(parsed.inline_fat_sectors, vec![5, 6]);
    }
}
