//! Record-type registry.
//!
//! Maps the record type ids found in PPT streams to a name and a
//! container/atom classification. The table covers the types the
//! framework needs to recurse into correctly; ids outside the table are
//! classified by their header's version nibble (0xF marks a container)
//! and otherwise treated as opaque atoms.

use phf::phf_map;

/// Whether a record's payload is child records or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Container,
    Atom,
}

/// Registry entry for a known record type.
#[derive(Debug, Clone, Copy)]
pub struct RecordTypeInfo {
    pub name: &'static str,
    pub kind: RecordKind,
}

const fn container(name: &'static str) -> RecordTypeInfo {
    RecordTypeInfo {
        name,
        kind: RecordKind::Container,
    }
}

const fn atom(name: &'static str) -> RecordTypeInfo {
    RecordTypeInfo {
        name,
        kind: RecordKind::Atom,
    }
}

static RECORD_TYPES: phf::Map<u16, RecordTypeInfo> = phf_map! {
    1000u16 => container("Document"),
    1001u16 => atom("DocumentAtom"),
    1002u16 => atom("EndDocument"),
    1006u16 => container("Slide"),
    1007u16 => atom("SlideAtom"),
    1008u16 => container("Notes"),
    1009u16 => atom("NotesAtom"),
    1010u16 => container("Environment"),
    1011u16 => atom("SlidePersistAtom"),
    1016u16 => container("MainMaster"),
    1017u16 => atom("SSSlideInfoAtom"),
    1023u16 => container("VBAInfo"),
    1024u16 => atom("VBAInfoAtom"),
    1025u16 => atom("SSDocInfoAtom"),
    1033u16 => container("ExObjList"),
    1034u16 => atom("ExObjListAtom"),
    1035u16 => container("PPDrawingGroup"),
    1036u16 => container("PPDrawing"),
    1038u16 => container("NamedShows"),
    1039u16 => container("NamedShow"),
    1040u16 => atom("NamedShowSlidesAtom"),
    2000u16 => container("List"),
    2005u16 => container("FontCollection"),
    2020u16 => container("SoundCollection"),
    2021u16 => atom("SoundCollAtom"),
    2022u16 => container("Sound"),
    2023u16 => atom("SoundData"),
    2032u16 => atom("ColorSchemeAtom"),
    3009u16 => atom("ExObjRefAtom"),
    3011u16 => atom("OEPlaceholderAtom"),
    3998u16 => container("OutlineTextRefAtom"),
    3999u16 => atom("TextHeaderAtom"),
    4000u16 => atom("TextCharsAtom"),
    4001u16 => atom("StyleTextPropAtom"),
    4003u16 => atom("TextMasterStyleAtom"),
    4008u16 => atom("TextBytesAtom"),
    4010u16 => atom("TextSpecInfoAtom"),
    4026u16 => atom("CString"),
    4035u16 => atom("ExOleObjAtom"),
    4051u16 => atom("ExHyperlinkAtom"),
    4055u16 => container("ExHyperlink"),
    4057u16 => container("HeadersFooters"),
    4058u16 => atom("HeadersFootersAtom"),
    4078u16 => container("ExControl"),
    4080u16 => container("SlideListWithText"),
    4081u16 => atom("AnimationInfoAtom"),
    4082u16 => container("InteractiveInfo"),
    4083u16 => atom("InteractiveInfoAtom"),
    4085u16 => atom("UserEditAtom"),
    4086u16 => atom("CurrentUserAtom"),
    4100u16 => atom("ExMediaAtom"),
    4101u16 => container("ExVideoContainer"),
    4102u16 => container("ExAviMovie"),
    4103u16 => container("ExMCIMovie"),
    4116u16 => container("AnimationInfo"),
    5000u16 => container("ProgTags"),
    5001u16 => atom("ProgStringTag"),
    5002u16 => container("ProgBinaryTag"),
    5003u16 => atom("BinaryTagData"),
    6002u16 => atom("PersistPtrIncrementalBlock"),
};

/// Look up a record type in the registry.
pub fn lookup(record_type: u16) -> Option<&'static RecordTypeInfo> {
    RECORD_TYPES.get(&record_type)
}

/// Display name for a record type; unknown ids get "Unknown".
pub fn name_of(record_type: u16) -> &'static str {
    lookup(record_type).map_or("Unknown", |info| info.name)
}

/// Classify a record as container or atom. Known ids use the registry;
/// unknown ids are containers exactly when the header's version nibble is
/// 0xF, the convention PowerPoint itself follows.
pub fn kind_of(record_type: u16, version: u16) -> RecordKind {
    match lookup(record_type) {
        Some(info) => info.kind,
        None if version == 0xF => RecordKind::Container,
        None => RecordKind::Atom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert_eq!(name_of(1000), "Document");
        assert_eq!(kind_of(1000, 0xF), RecordKind::Container);
        assert_eq!(name_of(4008), "TextBytesAtom");
        assert_eq!(kind_of(4008, 0), RecordKind::Atom);
    }

    #[test]
    fn test_unknown_types_use_version_nibble() {
        assert_eq!(name_of(0xABCD), "Unknown");
        assert_eq!(kind_of(0xABCD, 0xF), RecordKind::Container);
        assert_eq!(kind_of(0xABCD, 0x0), RecordKind::Atom);
        assert_eq!(kind_of(0xABCD, 0x1), RecordKind::Atom);
    }

    #[test]
    fn test_registry_overrides_version_nibble() {
        // SlideAtom carries version 2 but is an atom regardless
        assert_eq!(kind_of(1007, 0xF), RecordKind::Atom);
    }
}
