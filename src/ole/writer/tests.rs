//! Writer round-trip tests: files produced by [`OleWriter`] must be fully
//! readable back through [`OleFile`].

use super::OleWriter;
use crate::ole::consts::*;
use crate::ole::file::OleFile;
use std::io::Cursor;

fn write_to_bytes(writer: &mut OleWriter) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    writer.write_to(&mut cursor).unwrap();
    cursor.into_inner()
}

#[test]
fn test_empty_file_round_trip() {
    let mut writer = OleWriter::new();
    let bytes = write_to_bytes(&mut writer);

    // Header + directory sector + FAT sector
    assert_eq!(bytes.len(), 1536);

    let file = OleFile::from_bytes(bytes).unwrap();
    assert_eq!(file.root_name(), Some("Root Entry"));
    assert!(file.list_streams().is_empty());
    assert!(file.warnings().is_empty());
}

#[test]
fn test_small_stream_round_trip() {
    let data = (0..200u16).map(|i| i as u8).collect::<Vec<u8>>();
    let mut writer = OleWriter::new();
    writer.create_stream(&["Small"], &data).unwrap();

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    assert_eq!(file.open_stream(&["Small"]).unwrap(), data);
}

#[test]
fn test_large_stream_round_trip() {
    // Above the 4096-byte cutoff, so it goes through the main FAT
    let data = (0..10_000usize).map(|i| (i % 251) as u8).collect::<Vec<u8>>();
    let mut writer = OleWriter::new();
    writer.create_stream(&["Big"], &data).unwrap();

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    let read_back = file.open_stream(&["Big"]).unwrap();
    assert_eq!(read_back.len(), data.len());
    assert_eq!(read_back, data);

    // Cached re-read returns the same bytes
    assert_eq!(file.open_stream(&["Big"]).unwrap(), data);
}

#[test]
fn test_cutoff_boundary() {
    let small = vec![0x5Au8; MINI_STREAM_CUTOFF as usize - 1];
    let large = vec![0xA5u8; MINI_STREAM_CUTOFF as usize];

    let mut writer = OleWriter::new();
    writer.create_stream(&["AlmostBig"], &small).unwrap();
    writer.create_stream(&["JustBig"], &large).unwrap();

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    assert_eq!(file.open_stream(&["AlmostBig"]).unwrap(), small);
    assert_eq!(file.open_stream(&["JustBig"]).unwrap(), large);
}

#[test]
fn test_mixed_streams_and_storages() {
    let mut writer = OleWriter::new();
    writer.create_stream(&["WordDocument"], &[1u8; 8000]).unwrap();
    writer.create_stream(&["1Table"], &[2u8; 5000]).unwrap();
    writer.create_storage(&["Macros"]).unwrap();
    writer.create_stream(&["Macros", "dir"], &[3u8; 100]).unwrap();
    writer
        .create_stream(&["Macros", "VBA", "mod1"], &[4u8; 64])
        .unwrap();

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();

    assert!(file.exists(&["WordDocument"]));
    assert!(file.directory_exists(&["Macros"]));
    assert!(file.directory_exists(&["Macros", "VBA"]));
    assert_eq!(file.open_stream(&["Macros", "dir"]).unwrap(), vec![3u8; 100]);
    assert_eq!(
        file.open_stream(&["Macros", "VBA", "mod1"]).unwrap(),
        vec![4u8; 64]
    );

    let mut streams = file.list_streams();
    streams.sort();
    assert_eq!(
        streams,
        vec![
            vec!["1Table".to_string()],
            vec!["Macros".to_string(), "VBA".to_string(), "mod1".to_string()],
            vec!["Macros".to_string(), "dir".to_string()],
            vec!["WordDocument".to_string()],
        ]
    );
}

#[test]
fn test_first_large_stream_gets_sector_zero() {
    let mut writer = OleWriter::new();
    writer.create_stream(&["WordDocument"], &[7u8; 6000]).unwrap();
    writer.create_stream(&["1Table"], &[8u8; 6000]).unwrap();

    let bytes = write_to_bytes(&mut writer);
    // Sector 0 starts right after the 512-byte header
    assert!(bytes[512..1024].iter().all(|&b| b == 7));
}

#[test]
fn test_empty_stream_round_trip() {
    let mut writer = OleWriter::new();
    writer.create_stream(&["Empty"], &[]).unwrap();
    writer.create_stream(&["Data"], &[9u8; 32]).unwrap();

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    assert_eq!(file.open_stream(&["Empty"]).unwrap(), Vec::<u8>::new());
    assert_eq!(file.open_stream(&["Data"]).unwrap(), vec![9u8; 32]);
}

#[test]
fn test_root_clsid_round_trip() {
    // Word 97-2003 document CLSID
    let clsid = [
        0x06, 0x09, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x46,
    ];
    let mut writer = OleWriter::new();
    writer.set_root_clsid(clsid);
    writer.create_stream(&["WordDocument"], &[0u8; 5000]).unwrap();

    let file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    assert_eq!(file.root_clsid(), Some(&clsid));
}

#[test]
fn test_4096_sector_round_trip() {
    let data = (0..20_000usize).map(|i| (i % 241) as u8).collect::<Vec<u8>>();
    let mut writer = OleWriter::with_sector_size(4096);
    writer.create_stream(&["Contents"], &data).unwrap();
    writer.create_stream(&["Tiny"], &[0x42u8; 50]).unwrap();

    let bytes = write_to_bytes(&mut writer);
    let mut file = OleFile::from_bytes(bytes).unwrap();
    assert_eq!(file.header().sector_size, 4096);
    assert_eq!(file.open_stream(&["Contents"]).unwrap(), data);
    assert_eq!(file.open_stream(&["Tiny"]).unwrap(), vec![0x42u8; 50]);
}

#[test]
fn test_many_small_streams() {
    let mut writer = OleWriter::new();
    let names: Vec<String> = (0..50).map(|i| format!("Stream{i:02}")).collect();
    for (i, name) in names.iter().enumerate() {
        writer
            .create_stream(&[name.as_str()], &vec![i as u8; 70 + i])
            .unwrap();
    }

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    assert_eq!(file.list_streams().len(), 50);
    for (i, name) in names.iter().enumerate() {
        assert_eq!(
            file.open_stream(&[name.as_str()]).unwrap(),
            vec![i as u8; 70 + i],
            "stream {name}"
        );
    }
}

#[test]
fn test_ministream_occupies_whole_big_blocks() {
    let mut writer = OleWriter::new();
    writer.create_stream(&["S"], &[1u8; 100]).unwrap();

    let bytes = write_to_bytes(&mut writer);
    // 512-byte sectors after the header
    assert_eq!(bytes.len() % 512, 0);

    let file = OleFile::from_bytes(bytes).unwrap();
    // Root entry records the real ministream size, 128 bytes (two mini
    // sectors), not the big-block padded size
    let root = file.list_directory_entries(&[]).unwrap();
    assert_eq!(root.len(), 1);
}

#[test]
fn test_difat_overflow_round_trip() {
    // Past 109 FAT sectors the overflow indexes spill into DIFAT sectors:
    // 7.3 MB of 512-byte sectors needs ~112 FAT sectors and one DIFAT.
    let data = (0..7_300_000usize).map(|i| (i % 251) as u8).collect::<Vec<u8>>();
    let mut writer = OleWriter::new();
    writer.create_stream(&["Huge"], &data).unwrap();

    let bytes = write_to_bytes(&mut writer);
    let mut file = OleFile::from_bytes(bytes).unwrap();
    assert!(file.header().num_fat_sectors > HEADER_FAT_ENTRIES as u32);
    assert_eq!(file.header().num_difat_sectors, 1);
    assert!(file.warnings().is_empty());
    assert_eq!(file.open_stream(&["Huge"]).unwrap(), data);
}

#[test]
fn test_overwrite_before_write() {
    let mut writer = OleWriter::new();
    writer.create_stream(&["Doc"], &[1u8; 5000]).unwrap();
    writer.update_stream(&["Doc"], &[2u8; 6000]).unwrap();

    let mut file = OleFile::from_bytes(write_to_bytes(&mut writer)).unwrap();
    assert_eq!(file.open_stream(&["Doc"]).unwrap(), vec![2u8; 6000]);
}

#[test]
fn test_save_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.ole");

    let mut writer = OleWriter::new();
    writer.create_stream(&["PowerPoint Document"], &[5u8; 9000]).unwrap();
    writer.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let mut file = OleFile::from_bytes(bytes).unwrap();
    assert_eq!(
        file.open_stream(&["PowerPoint Document"]).unwrap(),
        vec![5u8; 9000]
    );
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for valid stream names (printable, ≤31 chars, unique-ish)
    fn stream_name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,20}".prop_map(|s| s.trim().to_string())
    }

    /// Strategy for stream contents straddling the mini/big cutoff
    fn stream_data_strategy() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..64),
            prop::collection::vec(any::<u8>(), 4000..4200),
            prop::collection::vec(any::<u8>(), 8000..12000),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_streams_round_trip(
            streams in prop::collection::btree_map(
                stream_name_strategy(),
                stream_data_strategy(),
                1..8,
            )
        ) {
            let mut writer = OleWriter::new();
            for (name, data) in &streams {
                writer.create_stream(&[name.as_str()], data).unwrap();
            }

            let bytes = write_to_bytes(&mut writer);
            prop_assert_eq!(bytes.len() % 512, 0);

            let mut file = OleFile::from_bytes(bytes).unwrap();
            prop_assert!(file.warnings().is_empty());
            prop_assert_eq!(file.list_streams().len(), streams.len());
            for (name, data) in &streams {
                prop_assert_eq!(&file.open_stream(&[name.as_str()]).unwrap(), data);
            }
        }
    }
}
