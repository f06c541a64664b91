//! Compound file reader.
//!
//! Opening a file eagerly indexes the whole container: header, FAT, the
//! directory tree and (when present) the MiniFAT, in a single bulk read.
//! Streams are then extracted on demand by chain traversal.
//!
//! Based on Apache POI's POIFSFileSystem read path and the OLE2/AAF
//! specifications.

use super::consts::*;
use super::fat::AllocationTable;
use super::header::HeaderBlock;
use super::minifat::MiniStream;
use super::sectors::SectorBuffer;
use super::{OleError, OleWarning};
use crate::common::binary::decode_utf16le;
use std::collections::HashMap;
use std::io::Read;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
///
/// This represents the on-disk format of a directory entry, per the
/// Microsoft OLE2 specification.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    /// Left sibling SID
    sid_left: U32<LE>,
    /// Right sibling SID
    sid_right: U32<LE>,
    /// Child SID
    sid_child: U32<LE>,
    /// CLSID (16 bytes)
    clsid: [u8; 16],
    /// State bits
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    /// Starting sector
    start_sector: U32<LE>,
    /// Stream size
    stream_size: U64<LE>,
}

/// Represents an OLE directory entry (stream or storage)
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name (UTF-16 decoded)
    pub name: String,
    /// Entry type (stream, storage, root, etc.)
    pub entry_type: u8,
    /// Index of left sibling in the red-black tree
    pub sid_left: u32,
    /// Index of right sibling in the red-black tree
    pub sid_right: u32,
    /// Index of child node in the red-black tree
    pub sid_child: u32,
    /// CLSID of this entry
    pub clsid: [u8; 16],
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
    /// Whether this stream lives in the ministream
    pub is_minifat: bool,
}

/// Main OLE file parser structure
///
/// Represents a fully-indexed OLE2 structured storage file and provides
/// access to its streams and storages.
#[derive(Debug)]
pub struct OleFile {
    header: HeaderBlock,
    sectors: SectorBuffer,
    fat: AllocationTable,
    ministream: Option<MiniStream>,
    root: Option<DirectoryEntry>,
    dir_entries: Vec<Option<DirectoryEntry>>,
    /// Big-block streams are consumed from the sector arena on first read,
    /// so re-reads are served from here
    stream_cache: HashMap<u32, Vec<u8>>,
    warnings: Vec<OleWarning>,
}

impl OleFile {
    /// Open and fully index an OLE file from a reader.
    pub fn open<R: Read>(mut reader: R) -> Result<Self, OleError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open and fully index an OLE file already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, OleError> {
        if data.len() < MINIMAL_OLEFILE_SIZE {
            // Still try to diagnose what the file actually is
            return Err(HeaderBlock::parse(&data)
                .err()
                .unwrap_or(OleError::NotOleFile));
        }

        let header = HeaderBlock::parse(&data[..512])?;
        let mut sectors = SectorBuffer::new(data, header.sector_size);
        let mut warnings = Vec::new();

        let fat = AllocationTable::read(&header, &mut sectors)?;

        // Directory stream
        let dir_data = fat.fetch_chain(
            header.first_dir_sector,
            &mut sectors,
            header.first_dir_sector,
            &mut warnings,
        )?;

        let num_entries = dir_data.len() / DIRENTRY_SIZE;
        let mut dir_entries: Vec<Option<DirectoryEntry>> = vec![None; num_entries];
        let mut root = None;

        if num_entries > 0 {
            let parsed = parse_directory_entry(
                &dir_data[0..DIRENTRY_SIZE],
                0,
                header.sector_size,
                header.mini_stream_cutoff,
            )?;
            let root_child = parsed.sid_child;
            root = Some(parsed);
            build_storage_tree(
                root_child,
                &dir_data,
                &mut dir_entries,
                header.sector_size,
                header.mini_stream_cutoff,
            )?;
        }

        // Ministream, owned by the root entry
        let ministream = match &root {
            Some(r) if header.num_minifat_sectors > 0 && r.start_sector != ENDOFCHAIN => {
                Some(MiniStream::read(
                    &header,
                    &fat,
                    &mut sectors,
                    r.start_sector,
                    r.size,
                    &mut warnings,
                )?)
            },
            _ => None,
        };

        Ok(OleFile {
            header,
            sectors,
            fat,
            ministream,
            root,
            dir_entries,
            stream_cache: HashMap::new(),
            warnings,
        })
    }

    /// The parsed header block.
    pub fn header(&self) -> &HeaderBlock {
        &self.header
    }

    /// The reconstructed allocation table.
    pub fn allocation_table(&self) -> &AllocationTable {
        &self.fat
    }

    /// Recoverable anomalies encountered so far.
    pub fn warnings(&self) -> &[OleWarning] {
        &self.warnings
    }

    /// Get the root entry name.
    pub fn root_name(&self) -> Option<&str> {
        self.root.as_ref().map(|r| r.name.as_str())
    }

    /// The root entry's CLSID.
    pub fn root_clsid(&self) -> Option<&[u8; 16]> {
        self.root.as_ref().map(|r| &r.clsid)
    }

    /// Check if a stream or storage exists at the given path.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }

    /// Check if a directory exists at the given path.
    pub fn directory_exists(&self, path: &[&str]) -> bool {
        match self.find_entry(path) {
            Ok(entry) => entry.entry_type == STGTY_STORAGE || entry.entry_type == STGTY_ROOT,
            Err(_) => false,
        }
    }

    /// List all streams as paths of storage/stream names.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        let mut streams = Vec::new();
        if let Some(ref root) = self.root {
            self.collect_streams(root, &[], &mut streams);
        }
        streams
    }

    /// List the entries directly inside a storage (empty path for root).
    pub fn list_directory_entries(&self, path: &[&str]) -> Result<Vec<DirectoryEntry>, OleError> {
        let dir_entry = if path.is_empty() {
            self.root.as_ref().ok_or(OleError::StreamNotFound)?
        } else {
            &self.find_entry(path)?
        };

        if dir_entry.entry_type != STGTY_STORAGE && dir_entry.entry_type != STGTY_ROOT {
            return Err(OleError::InvalidFormat("not a directory".to_string()));
        }

        let mut entries = Vec::new();
        if dir_entry.sid_child != NOSTREAM {
            self.collect_children(dir_entry.sid_child, &mut entries);
        }
        Ok(entries)
    }

    /// Open a stream by path and return its contents.
    pub fn open_stream(&mut self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let entry = self.find_entry(path)?;

        if entry.entry_type != STGTY_STREAM {
            return Err(OleError::InvalidFormat("not a stream".to_string()));
        }

        if entry.start_sector == ENDOFCHAIN {
            return Ok(Vec::new());
        }

        if entry.is_minifat {
            let ministream = self
                .ministream
                .as_ref()
                .ok_or_else(|| OleError::CorruptedFile("file has no ministream".to_string()))?;
            return ministream.read_stream(entry.start_sector, entry.size);
        }

        if let Some(cached) = self.stream_cache.get(&entry.sid) {
            return Ok(cached.clone());
        }

        let mut data = self.fat.fetch_chain(
            entry.start_sector,
            &mut self.sectors,
            self.header.first_dir_sector,
            &mut self.warnings,
        )?;
        data.truncate(entry.size as usize);
        self.stream_cache.insert(entry.sid, data.clone());
        Ok(data)
    }

    /// Find a directory entry by path.
    fn find_entry(&self, path: &[&str]) -> Result<DirectoryEntry, OleError> {
        if path.is_empty() {
            return self.root.clone().ok_or(OleError::StreamNotFound);
        }

        let root = self.root.as_ref().ok_or(OleError::StreamNotFound)?;
        let mut current_sid = root.sid_child;

        for (i, &name) in path.iter().enumerate() {
            let entry = self.find_child_by_name(current_sid, name)?;
            if i == path.len() - 1 {
                return Ok(entry);
            }
            current_sid = entry.sid_child;
        }

        Err(OleError::StreamNotFound)
    }

    /// Find a child entry by name within a sibling red-black tree.
    fn find_child_by_name(&self, sid: u32, name: &str) -> Result<DirectoryEntry, OleError> {
        if sid == NOSTREAM || sid as usize >= self.dir_entries.len() {
            return Err(OleError::StreamNotFound);
        }

        let entry = self.dir_entries[sid as usize]
            .as_ref()
            .ok_or(OleError::StreamNotFound)?;

        // Case-insensitive comparison
        if entry.name.eq_ignore_ascii_case(name) {
            return Ok(entry.clone());
        }

        if entry.sid_left != NOSTREAM
            && let Ok(found) = self.find_child_by_name(entry.sid_left, name)
        {
            return Ok(found);
        }

        if entry.sid_right != NOSTREAM
            && let Ok(found) = self.find_child_by_name(entry.sid_right, name)
        {
            return Ok(found);
        }

        Err(OleError::StreamNotFound)
    }

    fn collect_streams(&self, entry: &DirectoryEntry, path: &[String], streams: &mut Vec<Vec<String>>) {
        let mut current_path = path.to_vec();
        if !entry.name.is_empty() && entry.entry_type != STGTY_ROOT {
            current_path.push(entry.name.clone());
        }

        if entry.entry_type == STGTY_STREAM {
            streams.push(current_path);
            return;
        }

        if (entry.entry_type == STGTY_STORAGE || entry.entry_type == STGTY_ROOT)
            && entry.sid_child != NOSTREAM
        {
            self.traverse_siblings(entry.sid_child, &current_path, streams);
        }
    }

    fn traverse_siblings(&self, sid: u32, path: &[String], streams: &mut Vec<Vec<String>>) {
        if sid == NOSTREAM || sid as usize >= self.dir_entries.len() {
            return;
        }

        if let Some(ref entry) = self.dir_entries[sid as usize] {
            if entry.sid_left != NOSTREAM {
                self.traverse_siblings(entry.sid_left, path, streams);
            }
            self.collect_streams(entry, path, streams);
            if entry.sid_right != NOSTREAM {
                self.traverse_siblings(entry.sid_right, path, streams);
            }
        }
    }

    fn collect_children(&self, sid: u32, entries: &mut Vec<DirectoryEntry>) {
        if sid == NOSTREAM || sid as usize >= self.dir_entries.len() {
            return;
        }

        if let Some(ref entry) = self.dir_entries[sid as usize] {
            if entry.sid_left != NOSTREAM {
                self.collect_children(entry.sid_left, entries);
            }
            entries.push(entry.clone());
            if entry.sid_right != NOSTREAM {
                self.collect_children(entry.sid_right, entries);
            }
        }
    }
}

/// Parse a single directory entry from 128 bytes.
fn parse_directory_entry(
    data: &[u8],
    sid: u32,
    sector_size: usize,
    mini_stream_cutoff: u32,
) -> Result<DirectoryEntry, OleError> {
    let raw = RawDirectoryEntry::read_from_bytes(data)
        .map_err(|_| OleError::InvalidFormat("failed to parse directory entry".to_string()))?;

    let name_len = raw.name_len.get() as usize;
    let name_bytes = &raw.name[0..name_len.saturating_sub(2).min(64)];
    let name = decode_utf16le(name_bytes);

    // 512-byte-sector files only use the low 32 bits of the size field
    let size = if sector_size == SECTOR_SIZE_V3 {
        raw.stream_size.get() & 0xFFFFFFFF
    } else {
        raw.stream_size.get()
    };

    let is_minifat = size < mini_stream_cutoff as u64 && raw.entry_type == STGTY_STREAM;

    Ok(DirectoryEntry {
        sid,
        name,
        entry_type: raw.entry_type,
        sid_left: raw.sid_left.get(),
        sid_right: raw.sid_right.get(),
        sid_child: raw.sid_child.get(),
        clsid: raw.clsid,
        start_sector: raw.start_sector.get(),
        size,
        is_minifat,
    })
}

/// Recursively parse directory entries reachable through the sibling tree.
fn build_storage_tree(
    sid: u32,
    dir_data: &[u8],
    dir_entries: &mut Vec<Option<DirectoryEntry>>,
    sector_size: usize,
    mini_stream_cutoff: u32,
) -> Result<(), OleError> {
    if sid == NOSTREAM {
        return Ok(());
    }

    let idx = sid as usize;
    if idx >= dir_data.len() / DIRENTRY_SIZE {
        return Err(OleError::CorruptedFile(format!(
            "directory entry index {sid} out of range"
        )));
    }

    if dir_entries[idx].is_some() {
        // Already visited: the sibling tree loops
        return Ok(());
    }

    let offset = idx * DIRENTRY_SIZE;
    let entry = parse_directory_entry(
        &dir_data[offset..offset + DIRENTRY_SIZE],
        sid,
        sector_size,
        mini_stream_cutoff,
    )?;
    let (left, right, child) = (entry.sid_left, entry.sid_right, entry.sid_child);
    dir_entries[idx] = Some(entry);

    build_storage_tree(left, dir_data, dir_entries, sector_size, mini_stream_cutoff)?;
    build_storage_tree(right, dir_data, dir_entries, sector_size, mini_stream_cutoff)?;
    build_storage_tree(child, dir_data, dir_entries, sector_size, mini_stream_cutoff)?;

    Ok(())
}

/// Check if a buffer is an OLE file by checking the magic bytes.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}
