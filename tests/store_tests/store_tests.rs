//! Tests for Store
//!
//! These tests verify:
//! - Basic get/set/delete operations
//! - The set policy (in place, shrink, grow, append)
//! - Capacity admission at the exact boundary
//! - Strict value length contract of get
//! - Corruption recovery to the empty store
//! - Enumeration in append order
//! - Inverted and windowed placement
//! - Shared access from several threads

use std::thread;

use flatkv::codec::encode_record;
use flatkv::{Config, FlatError, Medium, MemoryMedium, SharedStore, Stats, Store};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store(capacity: usize) -> Store<MemoryMedium> {
    let mut store = Store::new(MemoryMedium::new(capacity)).unwrap();
    store.reset().unwrap();
    store
}

// =============================================================================
// Concrete Scenario
// =============================================================================

#[test]
fn test_twenty_byte_scenario() {
    let mut store = setup_store(20);
    assert_eq!(store.used_bytes().unwrap(), 2);

    store.set("a", "1").unwrap();
    assert_eq!(store.used_bytes().unwrap(), 8);
    assert_eq!(store.num_keys().unwrap(), 1);
    assert_eq!(store.get("a", 1).unwrap(), Some(b"1".to_vec()));

    store.set("a", "22").unwrap();
    assert_eq!(store.used_bytes().unwrap(), 9);
    assert_eq!(store.get("a", 2).unwrap(), Some(b"22".to_vec()));

    assert!(store.delete("a").unwrap());
    assert_eq!(store.used_bytes().unwrap(), 2);
    assert_eq!(store.num_keys().unwrap(), 0);
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_rejects_tiny_medium() {
    let result = Store::new(MemoryMedium::new(1));

    assert!(matches!(result, Err(FlatError::Config(_))));
}

#[test]
fn test_reset_writes_terminator_and_commits() {
    let mut store = Store::new(MemoryMedium::from_bytes(vec![0xAA; 16])).unwrap();

    store.reset().unwrap();

    assert_eq!(&store.medium().as_bytes()[..3], &[0, 0, 0xAA]);
    assert_eq!(store.medium().commit_count(), 1);
    assert_eq!(store.used_bytes().unwrap(), 2);
}

#[test]
fn test_reset_restores_empty_counters() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();
    assert_eq!(store.stats().unwrap().num_keys, 1);

    store.reset().unwrap();

    assert_eq!(store.last_stats(), Stats::empty(32));
}

#[test]
fn test_set_get_round_trip() {
    let mut store = setup_store(128);

    store.set(b"hello".as_slice(), b"world".as_slice()).unwrap();
    store.set("bin", [0u8, 1, 2, 255]).unwrap();

    assert_eq!(store.get("hello", 5).unwrap(), Some(b"world".to_vec()));
    assert_eq!(store.get("bin", 4).unwrap(), Some(vec![0, 1, 2, 255]));
}

#[test]
fn test_get_missing_key() {
    let mut store = setup_store(32);

    assert_eq!(store.get("nope", 3).unwrap(), None);
    assert!(store.find("nope").unwrap().is_none());
}

#[test]
fn test_get_length_mismatch() {
    let mut store = setup_store(32);
    store.set("k", "abc").unwrap();

    let result = store.get("k", 2);
    assert!(matches!(
        result,
        Err(FlatError::LengthMismatch { expected: 2, actual: 3 })
    ));

    let mut buf = [0xEEu8; 4];
    assert!(store.get_into("k", &mut buf).is_err());
    assert_eq!(buf, [0xEE; 4]);
}

#[test]
fn test_get_huge_expected_len_is_mismatch() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();

    assert!(matches!(
        store.get("a", usize::MAX),
        Err(FlatError::LengthMismatch { expected: usize::MAX, actual: 1 })
    ));
    assert!(matches!(
        store.get("a", usize::MAX / 2),
        Err(FlatError::LengthMismatch { actual: 1, .. })
    ));
    assert_eq!(store.get("missing", usize::MAX).unwrap(), None);
}

#[test]
fn test_get_into() {
    let mut store = setup_store(32);
    store.set("k", "abc").unwrap();

    let mut buf = [0u8; 3];
    assert!(store.get_into("k", &mut buf).unwrap());
    assert_eq!(&buf, b"abc");

    assert!(!store.get_into("missing", &mut buf).unwrap());
}

#[test]
fn test_empty_value() {
    let mut store = setup_store(32);

    store.set("k", "").unwrap();

    assert_eq!(store.get("k", 0).unwrap(), Some(Vec::new()));
    assert_eq!(store.find("k").unwrap().unwrap().value_len, 0);
}

#[test]
fn test_empty_key_rejected() {
    let mut store = setup_store(32);

    assert!(matches!(store.set("", "v"), Err(FlatError::EmptyKey)));
    assert!(matches!(store.find(""), Err(FlatError::EmptyKey)));
    assert!(matches!(store.delete(""), Err(FlatError::EmptyKey)));
    assert_eq!(store.used_bytes().unwrap(), 2);
}

#[test]
fn test_oversized_fields_rejected() {
    let mut store = setup_store(32);
    let huge = vec![0u8; 70_000];

    assert!(matches!(
        store.set(&huge, "v"),
        Err(FlatError::KeyTooLong { len: 70_000 })
    ));
    assert!(matches!(
        store.set("k", &huge),
        Err(FlatError::ValueTooLong { len: 70_000 })
    ));
}

#[test]
fn test_delete_missing_key() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();
    let commits = store.medium().commit_count();

    assert!(!store.delete("b").unwrap());

    assert_eq!(store.num_keys().unwrap(), 1);
    assert_eq!(store.medium().commit_count(), commits);
}

// =============================================================================
// Set Policy Tests
// =============================================================================

#[test]
fn test_idempotent_overwrite() {
    let mut store = setup_store(64);
    store.set("k", "value").unwrap();
    let used = store.used_bytes().unwrap();
    let keys = store.num_keys().unwrap();

    store.set("k", "value").unwrap();

    assert_eq!(store.used_bytes().unwrap(), used);
    assert_eq!(store.num_keys().unwrap(), keys);
}

#[test]
fn test_same_length_overwrite_keeps_position() {
    let mut store = setup_store(64);
    store.set("a", "11").unwrap();
    store.set("b", "22").unwrap();

    store.set("a", "99").unwrap();

    assert_eq!(store.keys().unwrap(), vec![b"a".to_vec(), b"b".to_vec()]);
    assert_eq!(store.get("a", 2).unwrap(), Some(b"99".to_vec()));
}

#[test]
fn test_resize_moves_key_to_end() {
    let mut store = setup_store(64);
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();

    store.set("a", "111").unwrap();

    assert_eq!(store.keys().unwrap(), vec![b"b".to_vec(), b"a".to_vec()]);
    assert_eq!(store.num_keys().unwrap(), 2);
}

#[test]
fn test_shrink_then_grow() {
    let mut store = setup_store(40);
    store.set("k", [1u8; 10]).unwrap();
    store.set("k", [2u8; 4]).unwrap();
    assert_eq!(store.used_bytes().unwrap(), 2 + 1 + 2 + 4 + 2);

    store.set("k", [3u8; 10]).unwrap();

    assert_eq!(store.get("k", 10).unwrap(), Some(vec![3u8; 10]));
    assert_eq!(store.num_keys().unwrap(), 1);
}

#[test]
fn test_shrink_always_fits_in_full_store() {
    let mut store = setup_store(20);
    store.set("k", [1u8; 13]).unwrap();
    assert_eq!(store.free_bytes().unwrap(), 0);

    store.set("k", [2u8; 5]).unwrap();

    assert_eq!(store.free_bytes().unwrap(), 8);
}

#[test]
fn test_grow_refused_without_space() {
    let mut store = setup_store(20);
    store.set("a", [1u8; 4]).unwrap();
    store.set("b", [2u8; 4]).unwrap();
    // used = 2 * 9 + 2 = 20
    let before = store.medium().as_bytes().to_vec();

    let result = store.set("a", [1u8; 5]);

    assert!(matches!(
        result,
        Err(FlatError::CapacityExceeded { needed: 1, available: 0 })
    ));
    assert_eq!(store.medium().as_bytes(), before.as_slice());
    assert_eq!(store.get("a", 4).unwrap(), Some(vec![1u8; 4]));
}

#[test]
fn test_grow_by_exactly_free_bytes() {
    let mut store = setup_store(20);
    store.set("a", [1u8; 4]).unwrap();
    store.set("b", [2u8; 2]).unwrap();
    assert_eq!(store.free_bytes().unwrap(), 2);

    store.set("a", [9u8; 6]).unwrap();

    assert_eq!(store.free_bytes().unwrap(), 0);
    assert_eq!(store.get("a", 6).unwrap(), Some(vec![9u8; 6]));
    assert_eq!(store.get("b", 2).unwrap(), Some(vec![2u8; 2]));
}

// =============================================================================
// Capacity Boundary Tests
// =============================================================================

#[test]
fn test_append_exactly_fits() {
    let mut store = setup_store(20);
    store.set("a", "1").unwrap();
    // free = 12; record of key 1 needs 5 + value
    assert_eq!(store.free_bytes().unwrap(), 12);

    store.set("b", [7u8; 7]).unwrap();

    assert_eq!(store.free_bytes().unwrap(), 0);
    assert_eq!(store.num_keys().unwrap(), 2);
    assert!(store.check().unwrap());
    assert_eq!(store.get("b", 7).unwrap(), Some(vec![7u8; 7]));
}

#[test]
fn test_append_one_byte_short_fails_unchanged() {
    let mut store = setup_store(20);
    store.set("a", "1").unwrap();
    let before = store.medium().as_bytes().to_vec();
    let commits = store.medium().commit_count();

    let result = store.set("b", [7u8; 8]);

    assert!(matches!(
        result,
        Err(FlatError::CapacityExceeded { needed: 13, available: 12 })
    ));
    assert_eq!(store.medium().as_bytes(), before.as_slice());
    assert_eq!(store.medium().commit_count(), commits);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_closes_gap() {
    let mut store = setup_store(64);
    store.set("a", "alpha").unwrap();
    store.set("b", "beta").unwrap();
    let used = store.used_bytes().unwrap();

    assert!(store.delete("a").unwrap());

    assert_eq!(store.used_bytes().unwrap(), used - (2 + 1 + 2 + 5));
    assert_eq!(store.find("b").unwrap().unwrap().value_len, 4);
    assert_eq!(store.get("b", 4).unwrap(), Some(b"beta".to_vec()));
}

#[test]
fn test_delete_middle_keeps_order() {
    let mut store = setup_store(64);
    for key in ["a", "b", "c", "d"] {
        store.set(key, key).unwrap();
    }

    store.delete("b").unwrap();

    assert_eq!(
        store.keys().unwrap(),
        vec![b"a".to_vec(), b"c".to_vec(), b"d".to_vec()]
    );
}

// =============================================================================
// Find / Enumerate Tests
// =============================================================================

#[test]
fn test_find_index() {
    let mut store = setup_store(64);
    store.set("a", "1").unwrap();
    store.set("bb", "22").unwrap();

    assert!(store.find_index(0).unwrap().is_none());

    let first = store.find_index(1).unwrap().unwrap();
    assert_eq!((first.key_len, first.value_len), (1, 1));
    assert_eq!(first.key_pos, 2);

    let second = store.find_index(2).unwrap().unwrap();
    assert_eq!((second.key_len, second.value_len), (2, 2));
    assert_eq!(second.key_pos, 8);

    assert!(store.find_index(3).unwrap().is_none());
}

#[test]
fn test_entries_in_append_order() {
    let mut store = setup_store(64);
    store.set("x", "1").unwrap();
    store.set("y", "2").unwrap();

    let entries = store.entries().unwrap();

    assert_eq!(
        entries,
        vec![
            (b"x".to_vec(), b"1".to_vec()),
            (b"y".to_vec(), b"2".to_vec()),
        ]
    );
}

#[test]
fn test_stats() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();

    let stats = store.stats().unwrap();

    assert_eq!(stats.capacity, 32);
    assert_eq!(stats.used_bytes, 8);
    assert_eq!(stats.free_bytes(), 24);
    assert_eq!(stats.num_keys, 1);
    assert_eq!(store.last_stats(), stats);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_corruption_resets_store() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();

    // Claim a key length that overruns the store
    store.medium_mut().as_bytes_mut()[6] = 0xFF;

    let result = store.find("b");
    assert!(matches!(result, Err(FlatError::Corrupted { offset: 6 })));

    assert_eq!(store.used_bytes().unwrap(), 2);
    assert_eq!(store.num_keys().unwrap(), 0);
}

#[test]
fn test_check_reports_corruption() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();
    assert!(store.check().unwrap());

    // value length field of "a"
    store.medium_mut().as_bytes_mut()[3] = 0xF0;

    assert!(!store.check().unwrap());
    assert!(store.check().unwrap());
    assert_eq!(store.num_keys().unwrap(), 0);
}

#[test]
fn test_corruption_during_set_leaves_empty_store() {
    let mut store = setup_store(32);
    store.set("a", "1").unwrap();
    store.medium_mut().as_bytes_mut()[0] = 0xFF;

    assert!(matches!(
        store.set("a", "2"),
        Err(FlatError::Corrupted { .. })
    ));

    assert_eq!(store.used_bytes().unwrap(), 2);
    store.set("a", "2").unwrap();
    assert_eq!(store.get("a", 1).unwrap(), Some(b"2".to_vec()));
}

// =============================================================================
// Placement Tests
// =============================================================================

#[test]
fn test_open_inverted_window() {
    let mut physical = MemoryMedium::from_bytes(vec![0xEE; 16]);
    let config = Config::builder()
        .capacity(8)
        .start_addr(4)
        .invert_storage(true)
        .build();

    {
        let mut store = Store::open(&mut physical, &config).unwrap();
        store.reset().unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k", 1).unwrap(), Some(b"v".to_vec()));
    }

    let bytes = physical.as_bytes();
    // Record runs downward from physical 11: [1, 0, 'k', 1, 0, 'v'], then terminator
    assert_eq!(&bytes[4..12], &[0, 0, b'v', 0, 1, b'k', 0, 1]);
    assert!(bytes[..4].iter().chain(&bytes[12..]).all(|&b| b == 0xEE));
}

#[test]
fn test_two_stores_share_one_region() {
    let mut physical = MemoryMedium::new(32);
    let low = Config::builder().capacity(16).start_addr(0).build();
    let high = Config::builder()
        .capacity(16)
        .start_addr(16)
        .invert_storage(true)
        .build();

    {
        let mut store = Store::open(&mut physical, &low).unwrap();
        store.set("lo", "1").unwrap();
    }
    {
        let mut store = Store::open(&mut physical, &high).unwrap();
        store.set("hi", "2").unwrap();
    }

    let mut store = Store::open(&mut physical, &low).unwrap();
    assert_eq!(store.keys().unwrap(), vec![b"lo".to_vec()]);
    drop(store);

    let mut store = Store::open(&mut physical, &high).unwrap();
    assert_eq!(store.keys().unwrap(), vec![b"hi".to_vec()]);
}

#[test]
fn test_layout_is_bit_exact() {
    let mut store = setup_store(32);
    store.set("ab", "xyz").unwrap();
    store.set("c", "").unwrap();

    let mut expected = encode_record(b"ab", b"xyz");
    expected.extend_from_slice(&encode_record(b"c", b""));
    expected.extend_from_slice(&[0, 0]);

    let medium = store.into_medium();
    assert_eq!(&medium.as_bytes()[..expected.len()], expected.as_slice());
}

#[test]
fn test_mount_existing_image() {
    let mut bytes = encode_record(b"pre", b"seeded");
    bytes.extend_from_slice(&[0, 0]);
    bytes.resize(32, 0xFF);

    let mut store = Store::new(MemoryMedium::from_bytes(bytes)).unwrap();

    assert!(store.check().unwrap());
    assert_eq!(store.get("pre", 6).unwrap(), Some(b"seeded".to_vec()));
}

#[test]
fn test_each_mutation_commits_once() {
    let mut store = setup_store(64);
    let base = store.medium().commit_count();

    store.set("a", "1").unwrap();
    store.set("a", "2").unwrap();
    store.set("a", "33").unwrap();
    store.delete("a").unwrap();

    assert_eq!(store.medium().commit_count(), base + 4);
}

// =============================================================================
// Shared Access Tests
// =============================================================================

#[test]
fn test_shared_store_across_threads() {
    let shared = SharedStore::new(setup_store(1024));

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..10u8 {
                    let key = [b't', t, i];
                    shared.with(|store| store.set(key, [t, i])).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut store = shared.lock();
    assert_eq!(store.num_keys().unwrap(), 40);
    assert_eq!(store.get([b't', 2, 7], 2).unwrap(), Some(vec![2, 7]));
}

#[test]
fn test_medium_trait_object() {
    let medium: Box<dyn Medium> = Box::new(MemoryMedium::new(16));
    let mut store = Store::new(medium).unwrap();

    store.set("k", "v").unwrap();

    assert_eq!(store.num_keys().unwrap(), 1);
}
