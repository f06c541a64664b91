//! Compound file header parsing.
//!
//! The first 512 bytes of every OLE2 file hold the bootstrap structure: the
//! magic signature, the sector-size selector, and the start sectors and
//! counts for the FAT, the directory stream, the MiniFAT and the DIFAT.
//! Everything else in the file is located by following pointers that
//! originate here.

use super::OleError;
use super::consts::*;
use crate::common::binary::{read_u16_le, read_u32_le};

/// Parsed compound file header.
///
/// Field offsets are fixed by the MS-CFB specification: FAT sector count at
/// 0x2C, directory start at 0x30, MiniFAT start/count at 0x3C/0x40, DIFAT
/// start/count at 0x44/0x48, and the 109-entry inline FAT sector array at
/// 0x4C.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    /// Sector size in bytes (512 or 4096), from the sector-shift selector
    pub sector_size: usize,
    /// Mini sector size in bytes (64)
    pub mini_sector_size: usize,
    /// Streams below this byte count live in the ministream
    pub mini_stream_cutoff: u32,
    /// Number of FAT sectors the file declares
    pub num_fat_sectors: u32,
    /// First sector of the directory stream
    pub first_dir_sector: u32,
    /// First sector of the MiniFAT chain
    pub first_minifat_sector: u32,
    /// Number of MiniFAT sectors
    pub num_minifat_sectors: u32,
    /// First DIFAT sector (ENDOFCHAIN when the inline array suffices)
    pub first_difat_sector: u32,
    /// Number of DIFAT sectors
    pub num_difat_sectors: u32,
    /// FAT sector IDs stored inline in the header (up to 109)
    pub inline_fat_sectors: Vec<u32>,
}

impl HeaderBlock {
    /// Parse the header from the first 512 bytes of a file.
    ///
    /// A signature mismatch is diagnosed against common misidentifications
    /// (OOXML zip archive, raw XML, bare BIFF2-4 streams) so callers can
    /// route the file to the correct parser instead of reporting a generic
    /// corruption error.
    pub fn parse(data: &[u8]) -> Result<Self, OleError> {
        if data.len() < 512 {
            return Err(diagnose_foreign_format(data));
        }
        if &data[0..8] != MAGIC {
            return Err(diagnose_foreign_format(data));
        }

        let dll_version = read_u16_le(data, 0x1A)?;
        let byte_order = read_u16_le(data, 0x1C)?;
        let sector_shift = read_u16_le(data, 0x1E)?;
        let mini_sector_shift = read_u16_le(data, 0x20)?;
        let num_fat_sectors = read_u32_le(data, 0x2C)?;
        let first_dir_sector = read_u32_le(data, 0x30)?;
        let mini_stream_cutoff = read_u32_le(data, 0x38)?;
        let first_minifat_sector = read_u32_le(data, 0x3C)?;
        let num_minifat_sectors = read_u32_le(data, 0x40)?;
        let first_difat_sector = read_u32_le(data, 0x44)?;
        let num_difat_sectors = read_u32_le(data, 0x48)?;

        if byte_order != 0xFFFE {
            return Err(OleError::InvalidFormat(format!(
                "invalid byte order mark 0x{byte_order:04X}"
            )));
        }

        let sector_size = match sector_shift {
            9 => SECTOR_SIZE_V3,
            12 => SECTOR_SIZE_V4,
            other => return Err(OleError::UnsupportedSectorSize(other)),
        };

        // The DLL version must agree with the sector size
        if (dll_version == 3 && sector_size != SECTOR_SIZE_V3)
            || (dll_version == 4 && sector_size != SECTOR_SIZE_V4)
        {
            return Err(OleError::InvalidFormat(format!(
                "DLL version {dll_version} does not match sector size {sector_size}"
            )));
        }

        let mini_sector_size = 1usize << mini_sector_shift;

        if num_fat_sectors > MAX_FAT_SECTORS {
            return Err(OleError::CorruptedFile(format!(
                "header declares {num_fat_sectors} FAT sectors, above the sanity ceiling of {MAX_FAT_SECTORS}"
            )));
        }

        // Inline FAT sector array at 0x4C: 109 entries, FREESECT-padded
        let mut inline_fat_sectors = Vec::new();
        for i in 0..HEADER_FAT_ENTRIES {
            let sector = read_u32_le(data, 0x4C + i * 4)?;
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            inline_fat_sectors.push(sector);
        }

        Ok(HeaderBlock {
            sector_size,
            mini_sector_size,
            mini_stream_cutoff,
            num_fat_sectors,
            first_dir_sector,
            first_minifat_sector,
            num_minifat_sectors,
            first_difat_sector,
            num_difat_sectors,
            inline_fat_sectors,
        })
    }
}

/// Identify what a non-OLE file actually is, when possible.
fn diagnose_foreign_format(data: &[u8]) -> OleError {
    if data.len() >= 4 && &data[0..4] == ZIP_SIGNATURE {
        return OleError::OoxmlFile;
    }

    // Raw XML: either a direct declaration or a UTF-8 BOM followed by markup
    if data.starts_with(b"<?xml") {
        return OleError::RawXml;
    }
    if data.len() >= 4 && &data[0..3] == b"\xEF\xBB\xBF" && data[3] == b'<' {
        return OleError::RawXml;
    }

    // Bare BIFF2-4 worksheet streams begin with their BOF record: sid
    // 0x0009/0x0209/0x0409 (little-endian) followed by a short length
    if data.len() >= 4 && data[0] == 0x09 {
        let biff = match data[1] {
            0x00 => Some(2),
            0x02 => Some(3),
            0x04 => Some(4),
            _ => None,
        };
        let length = u16::from_le_bytes([data[2], data[3]]);
        if let Some(biff) = biff
            && matches!(length, 4 | 6 | 8 | 16)
        {
            return OleError::LegacyBiff(biff);
        }
    }

    OleError::NotOleFile
}
