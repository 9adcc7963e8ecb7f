//! Record Store Tests
//!
//! These tests verify:
//! - Save/load through memory and file storage
//! - Identifier shape and collision retries
//! - Failure modes that must leave storage untouched

use std::collections::VecDeque;

use chrono::{TimeZone, Utc};
use momem::codec::{decode, OffsetIndex};
use momem::storage::{FileStore, MemoryStore, Storage};
use momem::{Config, IdGenerator, MomemError, RandomIds, Record, RecordStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Hands out a fixed sequence of ids, then repeats the last one
struct ScriptedIds {
    ids: VecDeque<String>,
    last: String,
}

impl ScriptedIds {
    fn new(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            last: String::new(),
        }
    }
}

impl IdGenerator for ScriptedIds {
    fn next_id(&mut self) -> String {
        if let Some(id) = self.ids.pop_front() {
            self.last = id;
        }
        self.last.clone()
    }
}

fn sample_record() -> Record {
    Record::from_file("toffu.png", vec![0x89, b'P', b'N', b'G'])
        .with_modified(Utc.with_ymd_and_hms(2023, 2, 25, 19, 29, 0).unwrap())
        .with_description("the cat")
        .with_tag("pets")
        .with_note("camera", "x100")
}

fn seeded_ids(seed: u64) -> RandomIds<StdRng> {
    RandomIds::with_rng(StdRng::seed_from_u64(seed), 15, ".mn")
}

// =============================================================================
// Identifier Tests
// =============================================================================

#[test]
fn test_random_ids_shape() {
    let mut ids = seeded_ids(1);
    for _ in 0..100 {
        let id = ids.next_id();
        let (stem, ext) = id.split_at(15);
        assert_eq!(ext, ".mn");
        assert!(stem.chars().all(|c| c.is_ascii_alphanumeric()), "{}", id);
    }
}

#[test]
fn test_random_ids_are_reproducible_with_a_seed() {
    let mut a = seeded_ids(42);
    let mut b = seeded_ids(42);
    for _ in 0..10 {
        assert_eq!(a.next_id(), b.next_id());
    }
}

#[test]
fn test_random_ids_from_config() {
    let config = Config::builder()
        .id_length(6)
        .id_extension(".rec")
        .build();
    let id = RandomIds::from_config(&config).next_id();

    assert_eq!(id.len(), 10);
    assert!(id.ends_with(".rec"));
}

// =============================================================================
// Save / Load Tests
// =============================================================================

#[test]
fn test_save_and_load() {
    let mut store = RecordStore::new(MemoryStore::new(), seeded_ids(7), 10);
    let record = sample_record();

    let id = store.save(&record).unwrap();
    assert_eq!(store.load(&id).unwrap(), record);
    assert_eq!(store.ids().unwrap(), vec![id]);
}

#[test]
fn test_saved_bytes_are_a_valid_record_buffer() {
    let mut store = RecordStore::new(MemoryStore::new(), seeded_ids(7), 10);
    let id = store.save(&sample_record()).unwrap();

    let raw = store.load_raw(&id).unwrap();
    assert_eq!(&raw[0..2], b"mn");
    assert_eq!(OffsetIndex::of_record(&raw).unwrap().len(), 8);
    assert!(decode(&raw).is_ok());
}

#[test]
fn test_save_as_and_remove() {
    let store = RecordStore::new(MemoryStore::new(), seeded_ids(7), 10);
    let record = sample_record();

    store.save_as("chosen.mn", &record, false).unwrap();
    assert!(matches!(
        store.save_as("chosen.mn", &record, false),
        Err(MomemError::AlreadyExists(_))
    ));
    store.save_as("chosen.mn", &record, true).unwrap();

    store.remove("chosen.mn").unwrap();
    assert!(matches!(
        store.load("chosen.mn"),
        Err(MomemError::NotFound(_))
    ));
}

#[test]
fn test_load_corrupt_buffer() {
    let storage = MemoryStore::new();
    storage.put("bad.mn", b"mn\x00\x00", false).unwrap();
    let store = RecordStore::new(storage, seeded_ids(7), 10);

    assert!(matches!(
        store.load("bad.mn"),
        Err(MomemError::CorruptData { .. })
    ));
}

// =============================================================================
// Collision Tests
// =============================================================================

#[test]
fn test_collision_is_retried_with_new_id() {
    let mut store = RecordStore::new(
        MemoryStore::new(),
        ScriptedIds::new(&["taken.mn", "taken.mn", "fresh.mn"]),
        10,
    );
    store.save_as("taken.mn", &sample_record(), false).unwrap();

    let id = store.save(&sample_record()).unwrap();
    assert_eq!(id, "fresh.mn");
    assert_eq!(store.ids().unwrap(), vec!["fresh.mn", "taken.mn"]);
}

#[test]
fn test_id_exhaustion() {
    let mut store = RecordStore::new(MemoryStore::new(), ScriptedIds::new(&["same.mn"]), 3);

    store.save(&sample_record()).unwrap();
    match store.save(&sample_record()) {
        Err(MomemError::IdExhausted { attempts }) => assert_eq!(attempts, 3),
        other => panic!("expected IdExhausted, got {:?}", other),
    }
    assert_eq!(store.storage().len(), 1);
}

#[test]
fn test_invalid_record_never_reaches_storage() {
    let mut store = RecordStore::new(MemoryStore::new(), seeded_ids(7), 10);
    let record = Record::new("n".repeat(41), "text", vec![]);

    assert!(matches!(
        store.save(&record),
        Err(MomemError::Validation { field: "name", .. })
    ));
    assert!(store.storage().is_empty());
}

#[test]
fn test_non_collision_errors_are_not_retried() {
    let mut store = RecordStore::new(MemoryStore::new(), ScriptedIds::new(&["bad/id"]), 5);

    assert!(matches!(
        store.save(&sample_record()),
        Err(MomemError::InvalidKey(_))
    ));
}

// =============================================================================
// File-Backed Tests
// =============================================================================

#[test]
fn test_file_backed_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let record = sample_record();

    let id = {
        let mut store = RecordStore::new(FileStore::open(dir.path()).unwrap(), seeded_ids(3), 10);
        store.save(&record).unwrap()
    };

    assert!(dir.path().join(&id).is_file());

    let store = RecordStore::new(FileStore::open(dir.path()).unwrap(), seeded_ids(4), 10);
    assert_eq!(store.load(&id).unwrap(), record);
}

#[test]
fn test_many_records_in_one_collection() {
    let dir = TempDir::new().unwrap();
    let mut store = RecordStore::new(FileStore::open(dir.path()).unwrap(), seeded_ids(9), 10);

    let mut ids = Vec::new();
    for i in 0..25u64 {
        // Whole seconds survive the f64 timestamp exactly; `now` may not
        let record = Record::new(format!("file-{}.txt", i), "text", vec![i as u8; i as usize])
            .with_modified(Utc.timestamp_opt(1_600_000_000 + i as i64, 0).unwrap());
        ids.push((store.save(&record).unwrap(), record));
    }

    assert_eq!(store.ids().unwrap().len(), 25);
    for (id, record) in ids {
        assert_eq!(store.load(&id).unwrap(), record);
    }
}
