//! Directory tree generation.
//!
//! Directory entries are serialized in SID order, 128 bytes each, and the
//! children of every storage are linked into a binary search tree. Sibling
//! ordering follows the comparator Office itself relies on: shorter names
//! sort first, equal-length names compare case-insensitively, the name
//! `_VBA_PROJECT` always sorts last and `__`-prefixed names sort after
//! ordinary ones. The midpoint of the sorted run becomes the parent's
//! child pointer, with the left run chained through `sid_left` and the
//! right run through `sid_right`.

use super::super::consts::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One pending directory entry.
#[derive(Debug, Clone)]
pub struct DirectoryEntryBuilder {
    pub name: String,
    /// STGTY_ROOT, STGTY_STORAGE or STGTY_STREAM
    pub entry_type: u8,
    pub start_sector: u32,
    pub size: u64,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    pub clsid: Option<[u8; 16]>,
}

impl DirectoryEntryBuilder {
    pub fn root(ministream_start: u32, ministream_size: u64) -> Self {
        Self {
            name: "Root Entry".to_string(),
            entry_type: STGTY_ROOT,
            start_sector: ministream_start,
            size: ministream_size,
            sid_left: NOSTREAM,
            sid_right: NOSTREAM,
            sid_child: NOSTREAM,
            clsid: None,
        }
    }

    pub fn stream(name: String, start_sector: u32, size: u64) -> Self {
        Self {
            name,
            entry_type: STGTY_STREAM,
            start_sector,
            size,
            sid_left: NOSTREAM,
            sid_right: NOSTREAM,
            sid_child: NOSTREAM,
            clsid: None,
        }
    }

    pub fn storage(name: String) -> Self {
        Self {
            name,
            entry_type: STGTY_STORAGE,
            start_sector: 0,
            size: 0,
            sid_left: NOSTREAM,
            sid_right: NOSTREAM,
            sid_child: NOSTREAM,
            clsid: None,
        }
    }

    /// Serialize to the 128-byte on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = vec![0u8; DIRENTRY_SIZE];

        // UTF-16LE name, at most 31 code units plus the NUL terminator
        let utf16: Vec<u16> = self.name.encode_utf16().collect();
        let name_len = utf16.len().min(31);
        for (i, &ch) in utf16.iter().take(name_len).enumerate() {
            data[i * 2..i * 2 + 2].copy_from_slice(&ch.to_le_bytes());
        }
        let name_len_bytes = ((name_len + 1) * 2) as u16;
        data[64..66].copy_from_slice(&name_len_bytes.to_le_bytes());

        data[66] = self.entry_type;
        data[67] = 1; // node color: black

        data[68..72].copy_from_slice(&self.sid_left.to_le_bytes());
        data[72..76].copy_from_slice(&self.sid_right.to_le_bytes());
        data[76..80].copy_from_slice(&self.sid_child.to_le_bytes());

        if let Some(clsid) = self.clsid {
            data[80..96].copy_from_slice(&clsid);
        }

        // State bits and timestamps stay zero
        data[116..120].copy_from_slice(&self.start_sector.to_le_bytes());
        data[120..128].copy_from_slice(&self.size.to_le_bytes());

        data
    }
}

/// Sibling ordering for directory entries.
fn compare_entry_names(name1: &str, name2: &str) -> Ordering {
    match name1.len().cmp(&name2.len()) {
        Ordering::Equal => {},
        other => return other,
    }
    if name1 == "_VBA_PROJECT" {
        return Ordering::Greater;
    }
    if name2 == "_VBA_PROJECT" {
        return Ordering::Less;
    }
    match (name1.starts_with("__"), name2.starts_with("__")) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {},
    }
    name1.to_uppercase().cmp(&name2.to_uppercase())
}

/// Accumulates entries and links the directory tree on serialization.
pub struct DirectoryBuilder {
    /// Entries indexed by SID
    entries: Vec<DirectoryEntryBuilder>,
    /// Storage path components to SID
    path_to_sid: HashMap<Vec<String>, u32>,
    /// Children SIDs per parent SID
    children: HashMap<u32, Vec<u32>>,
}

impl DirectoryBuilder {
    /// Create a builder seeded with the root entry, which owns the
    /// ministream chain.
    pub fn new(ministream_start: u32, ministream_size: u64) -> Self {
        let root = DirectoryEntryBuilder::root(ministream_start, ministream_size);
        let mut path_to_sid = HashMap::new();
        path_to_sid.insert(Vec::new(), 0);
        let mut children = HashMap::new();
        children.insert(0, Vec::new());
        Self {
            entries: vec![root],
            path_to_sid,
            children,
        }
    }

    pub fn set_root_clsid(&mut self, clsid: [u8; 16]) {
        self.entries[0].clsid = Some(clsid);
    }

    /// Ensure every storage along `path` exists, creating the missing
    /// ones, and return the SID of the last component.
    pub fn add_storage_path(&mut self, path: &[String]) -> u32 {
        let mut current_path: Vec<String> = Vec::new();
        let mut parent_sid = 0u32;

        for component in path {
            current_path.push(component.clone());
            if let Some(&sid) = self.path_to_sid.get(&current_path) {
                parent_sid = sid;
                continue;
            }

            let sid = self.entries.len() as u32;
            self.entries
                .push(DirectoryEntryBuilder::storage(component.clone()));
            self.path_to_sid.insert(current_path.clone(), sid);
            self.children.entry(parent_sid).or_default().push(sid);
            self.children.entry(sid).or_default();
            parent_sid = sid;
        }

        parent_sid
    }

    /// Add a stream at a full path, creating parent storages as needed.
    pub fn add_stream_path(&mut self, full_path: &[String], start_sector: u32, size: u64) -> u32 {
        assert!(!full_path.is_empty(), "stream path must not be empty");
        let parent_sid = if full_path.len() > 1 {
            self.add_storage_path(&full_path[..full_path.len() - 1])
        } else {
            0
        };

        let name = full_path.last().unwrap().clone();
        let sid = self.entries.len() as u32;
        self.entries
            .push(DirectoryEntryBuilder::stream(name, start_sector, size));
        self.children.entry(parent_sid).or_default().push(sid);
        sid
    }

    /// Add a stream directly under the root.
    pub fn add_stream(&mut self, name: String, start_sector: u32, size: u64) -> u32 {
        self.add_stream_path(&[name], start_sector, size)
    }

    /// Link each storage's children and serialize all entries in SID
    /// order as one byte stream.
    pub fn generate_directory_stream(&mut self) -> Vec<u8> {
        let storage_sids: Vec<u32> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.entry_type == STGTY_ROOT || e.entry_type == STGTY_STORAGE)
            .map(|(sid, _)| sid as u32)
            .collect();

        for parent_sid in storage_sids {
            match self.children.get(&parent_sid).cloned() {
                Some(children) => Self::link_children(parent_sid, &children, &mut self.entries),
                None => self.entries[parent_sid as usize].sid_child = NOSTREAM,
            }
        }

        let mut data = Vec::with_capacity(self.entries.len() * DIRENTRY_SIZE);
        for entry in &self.entries {
            data.extend_from_slice(&entry.to_bytes());
        }
        data
    }

    /// Sort one sibling group and wire it into a midpoint-rooted tree:
    /// the parent's child pointer is the midpoint, entries before it
    /// chain backwards through `sid_left`, entries after it forwards
    /// through `sid_right`.
    fn link_children(parent_sid: u32, child_sids: &[u32], entries: &mut [DirectoryEntryBuilder]) {
        if child_sids.is_empty() {
            entries[parent_sid as usize].sid_child = NOSTREAM;
            return;
        }

        let mut sorted: Vec<u32> = child_sids.to_vec();
        sorted.sort_by(|&a, &b| {
            compare_entry_names(&entries[a as usize].name, &entries[b as usize].name)
        });

        for &sid in &sorted {
            entries[sid as usize].sid_left = NOSTREAM;
            entries[sid as usize].sid_right = NOSTREAM;
        }

        let midpoint = sorted.len() / 2;
        entries[parent_sid as usize].sid_child = sorted[midpoint];

        // Left run chains backwards into the midpoint, right run forwards
        // out of it
        for j in 1..=midpoint {
            entries[sorted[j] as usize].sid_left = sorted[j - 1];
        }
        for j in midpoint..sorted.len() - 1 {
            entries[sorted[j] as usize].sid_right = sorted[j + 1];
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn entry(&self, sid: u32) -> &DirectoryEntryBuilder {
        &self.entries[sid as usize]
    }
}
