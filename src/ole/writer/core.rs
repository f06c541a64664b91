//! Compound file writer.
//!
//! Changes accumulate in memory and the whole file is emitted at once by
//! [`OleWriter::write_to`]. Stream allocation order matters to Office
//! readers (a DOC file's `WordDocument` stream must land at sector 0, so
//! it must be the first large stream created); directory entry order is
//! independent of allocation order and is fixed by the directory builder's
//! comparator.

use super::super::consts::*;
use super::super::OleError;
use super::difat::DifatBuilder;
use super::directory::DirectoryBuilder;
use super::fat::FatBuilder;
use super::header::HeaderBuilder;
use super::minifat::MiniFatBuilder;
use std::collections::HashSet;
use std::io::{Seek, SeekFrom, Write};

/// Buffered OLE2 writer.
///
/// ```rust,no_run
/// use longan::ole::writer::OleWriter;
///
/// let mut writer = OleWriter::new();
/// writer.create_stream(&["WordDocument"], b"...")?;
/// writer.create_storage(&["Macros"])?;
/// writer.create_stream(&["Macros", "dir"], b"...")?;
/// writer.save("output.doc")?;
/// # Ok::<(), longan::ole::OleError>(())
/// ```
pub struct OleWriter {
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    /// Pending streams in insertion order; insertion order is allocation
    /// order for large streams
    streams: Vec<(Vec<String>, Vec<u8>)>,
    /// Explicitly created storages (parents of streams are implied)
    storages: HashSet<Vec<String>>,
    root_clsid: Option<[u8; 16]>,
}

impl OleWriter {
    /// Create a writer with 512-byte sectors.
    pub fn new() -> Self {
        Self::with_sector_size(SECTOR_SIZE_V3)
    }

    /// Create a writer with the given sector size.
    ///
    /// # Panics
    ///
    /// Panics if `sector_size` is not 512 or 4096.
    pub fn with_sector_size(sector_size: usize) -> Self {
        assert!(
            sector_size == SECTOR_SIZE_V3 || sector_size == SECTOR_SIZE_V4,
            "Sector size must be 512 or 4096"
        );
        Self {
            sector_size,
            mini_sector_size: MINI_SECTOR_SIZE,
            mini_stream_cutoff: MINI_STREAM_CUTOFF,
            streams: Vec::new(),
            storages: HashSet::new(),
            root_clsid: None,
        }
    }

    /// Set the root entry's CLSID, which tells Office what application
    /// owns the document.
    pub fn set_root_clsid(&mut self, clsid: [u8; 16]) {
        self.root_clsid = Some(clsid);
    }

    /// Create or overwrite a stream at the given path. Parent storages
    /// are created implicitly.
    pub fn create_stream(&mut self, path: &[&str], data: &[u8]) -> Result<(), OleError> {
        if path.is_empty() {
            return Err(OleError::InvalidData("empty stream path".to_string()));
        }

        let owned_path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        match self.streams.iter().position(|(p, _)| p == &owned_path) {
            Some(pos) => self.streams[pos].1 = data.to_vec(),
            None => self.streams.push((owned_path, data.to_vec())),
        }
        Ok(())
    }

    /// Replace an existing stream's contents. Same semantics as
    /// [`create_stream`](Self::create_stream).
    pub fn update_stream(&mut self, path: &[&str], data: &[u8]) -> Result<(), OleError> {
        self.create_stream(path, data)
    }

    /// Remove a pending stream.
    pub fn delete_stream(&mut self, path: &[&str]) -> Result<(), OleError> {
        let owned_path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        match self.streams.iter().position(|(p, _)| p == &owned_path) {
            Some(pos) => {
                self.streams.remove(pos);
                Ok(())
            },
            None => Err(OleError::StreamNotFound),
        }
    }

    /// Create a storage at the given path, including missing parents.
    pub fn create_storage(&mut self, path: &[&str]) -> Result<(), OleError> {
        if path.is_empty() {
            return Err(OleError::InvalidData("empty storage path".to_string()));
        }
        self.storages
            .insert(path.iter().map(|s| s.to_string()).collect());
        Ok(())
    }

    /// Remove an explicitly created storage. Streams under it must be
    /// deleted separately.
    pub fn delete_storage(&mut self, path: &[&str]) -> Result<(), OleError> {
        let owned_path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        if !self.storages.remove(&owned_path) {
            return Err(OleError::InvalidFormat("storage not found".to_string()));
        }
        Ok(())
    }

    /// Emit the complete compound file.
    ///
    /// Small streams (below the 4096-byte cutoff) go through the MiniFAT;
    /// everything else gets a regular FAT chain in creation order. The
    /// layout is: data sectors, ministream, directory, MiniFAT, DIFAT,
    /// FAT, with the header block first.
    pub fn write_to<W: Write + Seek>(&mut self, writer: &mut W) -> Result<(), OleError> {
        let mut fat = FatBuilder::new_with_size(self.sector_size);
        let mut minifat = MiniFatBuilder::new(self.mini_sector_size);

        // Small streams go to the ministream, large ones get FAT chains in
        // creation order
        let mut small_streams: Vec<(&[String], u32, u64)> = Vec::new();
        let mut large_streams: Vec<(&[String], &[u8], u32)> = Vec::new();
        for (path, data) in &self.streams {
            if data.len() < self.mini_stream_cutoff as usize {
                let start = minifat.allocate_mini_chain(data);
                small_streams.push((path, start, data.len() as u64));
            } else {
                let start = fat.allocate_chain(data.len());
                large_streams.push((path, data, start));
            }
        }

        // The ministream is itself a big-block chain owned by the root
        let ministream_data = minifat.padded_ministream_data(self.sector_size);
        let (ministream_start, ministream_size) = if minifat.is_empty() {
            (ENDOFCHAIN, 0u64)
        } else {
            (
                fat.allocate_chain(ministream_data.len()),
                minifat.ministream_size(),
            )
        };

        let mut directory = DirectoryBuilder::new(ministream_start, ministream_size);
        if let Some(clsid) = self.root_clsid {
            directory.set_root_clsid(clsid);
        }
        for storage_path in &self.storages {
            directory.add_storage_path(storage_path);
        }
        for (path, data, start) in &large_streams {
            directory.add_stream_path(path, *start, data.len() as u64);
        }
        for (path, start, size) in &small_streams {
            directory.add_stream_path(path, *start, *size);
        }

        let dir_stream = directory.generate_directory_stream();
        let dir_sector_count = dir_stream.len().div_ceil(self.sector_size) as u32;
        let dir_start_sector = fat.allocate_chain(dir_stream.len());

        let minifat_sectors = minifat.generate_minifat_sectors(self.sector_size);
        let (minifat_start_sector, num_minifat_sectors) = if minifat_sectors.is_empty() {
            (ENDOFCHAIN, 0)
        } else {
            (
                fat.allocate_chain(minifat_sectors.len() * self.sector_size),
                minifat_sectors.len() as u32,
            )
        };

        // The FAT sizes and reserves its own sectors last
        let bat = fat.create_blocks();
        let fat_sector_ids: Vec<u32> =
            (bat.fat_start..bat.fat_start + bat.num_fat_sectors).collect();

        let mut difat = DifatBuilder::new(self.sector_size);
        difat.set_fat_sectors(&fat_sector_ids);
        let difat_sectors = difat.generate_difat_sectors(bat.difat_start);
        debug_assert_eq!(difat_sectors.len() as u32, bat.num_difat_sectors);

        let fat_sectors_data = fat.generate_fat_sectors();
        fat.validate()
            .map_err(|e| OleError::InvalidData(format!("FAT validation failed: {e}")))?;

        let mut header_builder = HeaderBuilder::new(self.sector_size);
        header_builder.set_first_dir_sector(dir_start_sector);
        header_builder.set_num_dir_sectors(dir_sector_count);
        header_builder.set_minifat(minifat_start_sector, num_minifat_sectors);
        header_builder.add_fat_sectors(&fat_sector_ids);
        if bat.num_difat_sectors > 0 {
            header_builder.set_difat(bat.difat_start, bat.num_difat_sectors);
        }

        writer.write_all(&header_builder.generate())?;

        for (_, data, start) in &large_streams {
            if *start == ENDOFCHAIN {
                continue;
            }
            self.write_region(writer, *start, data)?;
        }
        if ministream_start != ENDOFCHAIN {
            self.write_region(writer, ministream_start, &ministream_data)?;
        }
        self.write_region(writer, dir_start_sector, &dir_stream)?;
        for (i, sector) in minifat_sectors.iter().enumerate() {
            self.write_region(writer, minifat_start_sector + i as u32, sector)?;
        }
        for (i, sector) in difat_sectors.iter().enumerate() {
            self.write_region(writer, bat.difat_start + i as u32, sector)?;
        }
        for (i, sector) in fat_sectors_data.iter().enumerate() {
            self.write_region(writer, bat.fat_start + i as u32, sector)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write `data` at the file position of `start_sector`, zero-padded to
    /// a sector boundary. Sector N starts at byte (N + 1) * sector_size.
    fn write_region<W: Write + Seek>(
        &self,
        writer: &mut W,
        start_sector: u32,
        data: &[u8],
    ) -> Result<(), OleError> {
        let position = (start_sector as u64 + 1) * self.sector_size as u64;
        writer.seek(SeekFrom::Start(position))?;

        let padded_len = data.len().div_ceil(self.sector_size) * self.sector_size;
        writer.write_all(data)?;
        if padded_len > data.len() {
            writer.write_all(&vec![0u8; padded_len - data.len()])?;
        }
        Ok(())
    }

    /// Write the compound file to `path`.
    pub fn save<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<(), OleError> {
        let file = std::fs::File::create(path)?;
        let mut buffered = std::io::BufWriter::new(file);
        self.write_to(&mut buffered)?;
        buffered.flush()?;
        Ok(())
    }
}

impl Default for OleWriter {
    fn default() -> Self {
        Self::new()
    }
}
