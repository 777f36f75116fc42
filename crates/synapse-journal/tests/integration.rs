use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use synapse_journal::{has_entry_shape, JournalReader, JournalWriter, ReadMode, RecordJson, WriteOptions};
use tempfile::TempDir;

fn make_entry(index: u64) -> RecordJson {
    json!({
        "index": index,
        "timestamp": "2026-01-01T00:00:00.000Z",
        "event": "DECISION_RECORDED",
        "data": { "decisionId": format!("decision-{}", index) },
        "hash": format!("{:064x}", index + 1),
        "previousHash": format!("{:064x}", index)
    })
}

#[test]
fn test_write_read_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");

    {
        let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
        writer.append_record(&make_entry(0)).unwrap();
        writer.append_record(&make_entry(1)).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    let first = reader.read_json().unwrap().unwrap();
    let second = reader.read_json().unwrap().unwrap();
    assert!(reader.read_json().unwrap().is_none());

    assert_eq!(first["index"], 0);
    assert_eq!(second["data"]["decisionId"], "decision-1");
    assert!(has_entry_shape(&first));
}

#[test]
fn test_reopen_appends_at_end() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");

    for index in 0..3 {
        let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
        writer.append_record(&make_entry(index)).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    let records: Vec<RecordJson> = reader.read_all().unwrap();
    let indexes: Vec<u64> = records.iter().map(|r| r["index"].as_u64().unwrap()).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn test_typed_records() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        index: u64,
        previous_hash: String,
    }

    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");

    let row = Row {
        index: 7,
        previous_hash: "ab".repeat(32),
    };
    {
        let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
        writer.append_record(&row).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    let restored: Row = reader.read_record().unwrap().unwrap();
    assert_eq!(restored, row);
}

#[test]
fn test_sync_option() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");

    let options = WriteOptions {
        sync: true,
        ..WriteOptions::default()
    };
    let mut writer = JournalWriter::open(&journal_path, options).unwrap();
    writer.append_record(&make_entry(0)).unwrap();
    writer.finish().unwrap();

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    assert_eq!(reader.read_json().unwrap().unwrap()["index"], 0);
}

#[test]
fn test_create_false_requires_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("missing.sgl");

    let options = WriteOptions {
        create: false,
        ..WriteOptions::default()
    };
    assert!(JournalWriter::open(&journal_path, options).is_err());
}

#[test]
fn test_empty_file_gets_header() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");
    fs::File::create(&journal_path).unwrap();

    {
        let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
        writer.append_record(&make_entry(0)).unwrap();
        writer.finish().unwrap();
    }

    assert!(fs::metadata(&journal_path).unwrap().len() > 16);
    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    assert!(reader.read_json().unwrap().is_some());
}

#[test]
fn test_invalid_header_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");
    fs::write(&journal_path, b"INVALID HEADER DATA").unwrap();

    assert!(JournalReader::open(&journal_path, ReadMode::Strict).is_err());
    assert!(JournalWriter::open(&journal_path, WriteOptions::default()).is_err());
}

#[test]
fn test_short_file_rejected_by_writer() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("ledger.sgl");
    fs::write(&journal_path, b"SGL").unwrap();

    assert!(matches!(
        JournalWriter::open(&journal_path, WriteOptions::default()),
        Err(synapse_journal::JournalError::FileNotEmpty)
    ));
}
