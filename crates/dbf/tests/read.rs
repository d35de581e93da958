//! Integration tests for reading tables from byte images and files.

use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::NaiveDate;
use dbf::{
    DbfError, DbfFieldType, DbfFileType, DbfReader, DbfReaderOptions, DbfValue, Decimal,
    MemoReader,
};
use encoding_rs::WINDOWS_1251;

/// Build a 32-byte field descriptor.
fn descriptor(name: &str, field_type: u8, length: u8, decimals: u8) -> [u8; 32] {
    let mut buf = [0u8; 32];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf[11] = field_type;
    buf[16] = length;
    buf[17] = decimals;
    buf
}

/// Build a table image: header, descriptors, terminator, records, EOF marker.
fn table(file_type: u8, driver: u8, fields: &[[u8; 32]], records: &[&[u8]]) -> Vec<u8> {
    let record_length: usize = 1 + fields.iter().map(|f| usize::from(f[16])).sum::<usize>();
    let header_length = 32 + 32 * fields.len() + 1;
    let mut bytes = vec![0u8; 32];
    bytes[0] = file_type;
    bytes[1..4].copy_from_slice(&[124, 3, 15]);
    bytes[4..8].copy_from_slice(&(records.len() as u32).to_le_bytes());
    bytes[8..10].copy_from_slice(&(header_length as u16).to_le_bytes());
    bytes[10..12].copy_from_slice(&(record_length as u16).to_le_bytes());
    bytes[29] = driver;
    for field in fields {
        bytes.extend_from_slice(field);
    }
    bytes.push(0x0D);
    for record in records {
        assert_eq!(record.len(), record_length);
        bytes.extend_from_slice(record);
    }
    bytes.push(0x1A);
    bytes
}

/// Build a FoxPro memo image with 64-byte blocks; memos start at block 8.
fn memo_store(memos: &[&[u8]]) -> Vec<u8> {
    let mut bytes = vec![0u8; 512];
    bytes[6..8].copy_from_slice(&64u16.to_be_bytes());
    for memo in memos {
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&(memo.len() as u32).to_be_bytes());
        bytes.extend_from_slice(memo);
        bytes.resize(bytes.len().div_ceil(64) * 64, 0);
    }
    let next = (bytes.len() / 64) as u32;
    bytes[..4].copy_from_slice(&next.to_be_bytes());
    bytes
}

#[test]
fn test_single_character_field() {
    let bytes = table(
        0x03,
        0x00,
        &[descriptor("NAME", b'C', 9, 0)],
        &[b" JOHN     "],
    );
    let mut reader = DbfReader::new(Cursor::new(bytes)).unwrap();

    let metadata = reader.metadata().unwrap();
    assert_eq!(metadata.record_length, 10);
    assert_eq!(metadata.fields().len(), 1);
    assert_eq!(metadata.field("NAME").unwrap().offset(), 1);

    let record = reader.read_record().unwrap().unwrap();
    assert!(!record.is_deleted());
    assert_eq!(record.get_string("NAME").unwrap().as_deref(), Some("JOHN"));
    assert_eq!(record.record_number(), 1);
    assert!(reader.read_record().unwrap().is_none());
}

#[test]
fn test_two_field_table() {
    let bytes = table(
        0x04,
        0x00,
        &[descriptor("ID", b'N', 5, 0), descriptor("NAME", b'C', 20, 0)],
        &[],
    );
    let reader = DbfReader::new(Cursor::new(bytes)).unwrap();
    let metadata = reader.metadata().unwrap();

    let offsets: Vec<usize> = metadata.fields().iter().map(|f| f.offset()).collect();
    assert_eq!(offsets, vec![1, 6]);
    assert_eq!(metadata.file_type, DbfFileType::DBase4);
    assert_eq!(
        metadata.update_date,
        NaiveDate::from_ymd_opt(2024, 3, 15)
    );
    assert_eq!(metadata.fields_string(), "ID,N,5,0|NAME,C,20,0");
}

#[test]
fn test_typed_columns() {
    let fields = [
        descriptor("NAME", b'C', 6, 0),
        descriptor("PRICE", b'N', 7, 2),
        descriptor("BORN", b'D', 8, 0),
        descriptor("ACTIVE", b'L', 1, 0),
        descriptor("QTY", b'I', 4, 0),
    ];
    let first = [
        &b" "[..],
        b"Widget",
        b"  12.50",
        b"20240229",
        b"T",
        &(-3i32).to_le_bytes(),
    ]
    .concat();
    let second = [
        &b"*"[..],
        b"      ",
        b"*******",
        b"        ",
        b"?",
        &[0u8; 4],
    ]
    .concat();

    let bytes = table(0x03, 0x00, &fields, &[&first, &second]);
    let mut reader = DbfReader::new(Cursor::new(bytes)).unwrap();
    let records: Vec<_> = reader.records().collect::<dbf::Result<_>>().unwrap();
    assert_eq!(records.len(), 2);

    let widget = &records[0];
    assert_eq!(widget.get_string("NAME").unwrap().as_deref(), Some("Widget"));
    assert_eq!(widget.get_decimal("PRICE").unwrap(), Some(Decimal::new(1250, 2)));
    assert_eq!(
        widget.get_date("BORN").unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29)
    );
    assert_eq!(widget.get_boolean("ACTIVE").unwrap(), Some(true));
    assert_eq!(widget.get_integer("QTY").unwrap(), -3);

    let blank = &records[1];
    assert!(blank.is_deleted());
    assert_eq!(blank.get_string("NAME").unwrap(), None);
    assert_eq!(blank.get_decimal("PRICE").unwrap(), None);
    assert_eq!(blank.get_date("BORN").unwrap(), None);
    assert_eq!(blank.get_boolean("ACTIVE").unwrap(), None);
    assert_eq!(blank.get_integer("QTY").unwrap(), 0);
    assert_eq!(blank.value("PRICE").unwrap(), DbfValue::Null);
}

#[test]
fn test_booleans() {
    let bytes = table(
        0x03,
        0x00,
        &[descriptor("FLAG", b'L', 1, 0)],
        &[b" T", b" f", b" X"],
    );
    let mut reader = DbfReader::new(Cursor::new(bytes)).unwrap();
    let flags: Vec<Option<bool>> = reader
        .records()
        .map(|r| r.unwrap().get_boolean("FLAG").unwrap())
        .collect();
    assert_eq!(flags, vec![Some(true), Some(false), None]);
}

#[test]
fn test_code_page_and_override() {
    // "Мир" in windows-1251
    let bytes = table(
        0x03,
        0xC9,
        &[descriptor("WORD", b'C', 3, 0)],
        &[&[b' ', 0xcc, 0xe8, 0xf0]],
    );
    let mut reader = DbfReader::new(Cursor::new(bytes.clone())).unwrap();
    assert_eq!(reader.metadata().unwrap().encoding, WINDOWS_1251);
    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(record.get_string("WORD").unwrap().as_deref(), Some("Мир"));

    let options = DbfReaderOptions::new().with_override_encoding(encoding_rs::IBM866);
    let mut reader = DbfReader::with_options(Cursor::new(bytes), None, options).unwrap();
    let record = reader.read_record().unwrap().unwrap();
    assert_ne!(record.get_string("WORD").unwrap().as_deref(), Some("Мир"));
    assert_eq!(
        record.get_string_with("WORD", WINDOWS_1251).unwrap().as_deref(),
        Some("Мир")
    );
}

#[test]
fn test_dos_code_pages() {
    // (driver, stored bytes, text)
    let cases: [(u8, [u8; 3], &str); 4] = [
        (0x01, [0x8E, 0x99, 0x9A], "ÄÖÜ"),
        (0x02, [0x82, 0x87, 0xE1], "éçß"),
        (0x64, [0xA5, 0x88, 0xD8], "ąłě"),
        (0x6B, [0x80, 0xA7, 0x9F], "Çğş"),
    ];
    for (driver, stored, text) in cases {
        let mut record = vec![b' '];
        record.extend_from_slice(&stored);
        let bytes = table(0x03, driver, &[descriptor("WORD", b'C', 3, 0)], &[&record]);
        let mut reader = DbfReader::new(Cursor::new(bytes)).unwrap();
        let record = reader.read_record().unwrap().unwrap();
        assert_eq!(
            record.get_string("WORD").unwrap().as_deref(),
            Some(text),
            "driver 0x{driver:02X}"
        );
    }
}

#[test]
fn test_dos_override_label() {
    let bytes = table(
        0x03,
        0x00,
        &[descriptor("WORD", b'C', 3, 0)],
        &[&[b' ', 0x8E, 0x99, 0x9A]],
    );
    let encoding = DbfReaderOptions::encoding_for_label("cp437").unwrap();
    let options = DbfReaderOptions::new().with_override_encoding(encoding);
    let mut reader = DbfReader::with_options(Cursor::new(bytes), None, options).unwrap();
    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(record.get_string("WORD").unwrap().as_deref(), Some("ÄÖÜ"));
}

#[test]
fn test_duplicate_field_names_are_corruption() {
    let bytes = table(
        0x03,
        0x00,
        &[descriptor("A", b'C', 1, 0), descriptor("A", b'C', 1, 0)],
        &[b" xy"],
    );
    let err = DbfReader::new(Cursor::new(bytes)).err().unwrap();
    assert!(err.is_corruption(), "{err:?}");
}

#[test]
fn test_wide_numeric_field() {
    let digits = "1234567890123456789012345678901234567890";
    let mut record = vec![b' '];
    record.extend_from_slice(digits.as_bytes());
    let bytes = table(0x03, 0x00, &[descriptor("N", b'N', 40, 0)], &[&record]);
    let mut reader = DbfReader::new(Cursor::new(bytes)).unwrap();
    let record = reader.read_record().unwrap().unwrap();
    let value = record.get_decimal("N").unwrap().unwrap();
    assert_eq!(value, digits.parse::<Decimal>().unwrap());
    assert_eq!(record.value("N").unwrap().to_string(), digits);
}

#[test]
fn test_memo_fields() {
    let fields = [
        descriptor("ID", b'N', 2, 0),
        descriptor("NOTES", b'M', 10, 0),
        descriptor("EXTRA", b'M', 4, 0),
    ];
    let first = [&b" "[..], b" 1", b"         8", &9u32.to_le_bytes()].concat();
    let second = [&b" "[..], b" 2", b"          ", &[0u8; 4]].concat();
    let bytes = table(0xF5, 0x03, &fields, &[&first, &second]);

    let memo = MemoReader::new(Cursor::new(memo_store(&[
        b"first note",
        "caf\u{e9}".as_bytes(),
    ])))
    .unwrap();
    let mut reader = DbfReader::with_memo(Cursor::new(bytes), Arc::new(memo)).unwrap();

    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(record.memo_block("NOTES").unwrap(), 8);
    assert_eq!(record.get_memo_string("NOTES").unwrap(), "first note");
    assert_eq!(record.memo_block("EXTRA").unwrap(), 9);
    assert_eq!(
        record.get_memo_string_with("EXTRA", encoding_rs::UTF_8).unwrap(),
        "café"
    );
    assert_eq!(record.get_memo_bytes("EXTRA").unwrap(), "café".as_bytes());

    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(record.memo_block("NOTES").unwrap(), 0);
    assert_eq!(record.get_memo_string("NOTES").unwrap(), "");
    assert!(record.get_memo_bytes("EXTRA").unwrap().is_empty());
    assert!(matches!(
        record.get_memo_string("ID"),
        Err(DbfError::FieldTypeMismatch { .. })
    ));
}

#[test]
fn test_records_shared_across_threads() {
    let bytes = table(
        0x03,
        0x00,
        &[descriptor("NAME", b'C', 4, 0)],
        &[b" ANNA", b" BOB ", b" CY  "],
    );
    let mut reader = DbfReader::new(Cursor::new(bytes)).unwrap();
    let records: Vec<_> = reader.records().map(Result::unwrap).collect();
    reader.close();

    let handles: Vec<_> = records
        .into_iter()
        .map(|record| std::thread::spawn(move || record.get_string("NAME").unwrap()))
        .collect();
    let names: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        names,
        vec![Some("ANNA".into()), Some("BOB".into()), Some("CY".into())]
    );
}

#[test]
fn test_corrupted_images() {
    let mut bad_type = table(0x03, 0x00, &[descriptor("A", b'C', 1, 0)], &[]);
    bad_type[0] = 0x99;
    let err = DbfReader::new(Cursor::new(bad_type)).err().unwrap();
    assert!(matches!(err, DbfError::UnknownFileType { tag: 0x99 }));

    let mut no_terminator = table(0x03, 0x00, &[descriptor("A", b'C', 1, 0)], &[]);
    no_terminator.truncate(64);
    let err = DbfReader::new(Cursor::new(no_terminator)).err().unwrap();
    assert!(matches!(err, DbfError::MissingTerminator { fields: 1 }));

    let err = DbfReader::new(Cursor::new(vec![0x03; 12])).err().unwrap();
    assert!(err.is_corruption());
}

#[test]
fn test_open_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let table_path = dir.path().join("notes.dbf");
    let memo_path = dir.path().join("notes.fpt");

    let mut record = b" ".to_vec();
    record.extend_from_slice(b"         8");
    std::fs::File::create(&table_path)
        .unwrap()
        .write_all(&table(0xF5, 0x00, &[descriptor("NOTE", b'M', 10, 0)], &[&record]))
        .unwrap();
    std::fs::write(&memo_path, memo_store(&[b"hello from disk"])).unwrap();

    let mut reader = DbfReader::open_with_memo(&table_path, &memo_path).unwrap();
    let record = reader.read_record().unwrap().unwrap();
    assert_eq!(record.get_memo_string("NOTE").unwrap(), "hello from disk");

    let (metadata, records) = dbf::read_dbf(&table_path).unwrap();
    assert_eq!(metadata.field("NOTE").unwrap().field_type, DbfFieldType::Memo);
    assert_eq!(records.len(), 1);
    assert!(matches!(
        records[0].get_memo_string("NOTE"),
        Err(DbfError::MemoUnavailable { block: 8, .. })
    ));
}

#[test]
fn test_metadata_display() {
    let bytes = table(
        0x83,
        0x03,
        &[descriptor("ID", b'N', 5, 0), descriptor("NAME", b'C', 20, 0)],
        &[],
    );
    let reader = DbfReader::new(Cursor::new(bytes)).unwrap();
    insta::assert_snapshot!(reader.metadata().unwrap().to_string(), @r"
    DbfMetadata [
      type=FoxBASE+/dBASE III PLUS, with memo (0x83),
      updateDate=2024-03-15,
      recordsQty=0,
      fullHeaderLength=97,
      oneRecordLength=26,
      uncompletedTxFlag=0,
      encryptionFlag=0,
      encoding=windows-1252,
      fields=ID,N,5,0|NAME,C,20,0
    ]
    ");
}
