//! Codec Tests
//!
//! These tests verify:
//! - Exact byte layout of every value kind
//! - Round-trips, including nesting and precision narrowing
//! - Length integrity of records and lists
//! - Corruption detection (tags, lengths, offsets, truncation)

use momem::codec::{decode, encode, encoded_len, Dict, Encoder, OffsetIndex, Value, MAX_DEPTH};
use momem::MomemError;

// =============================================================================
// Helper Functions
// =============================================================================

/// The `a.txt` record used throughout: 222 bytes once encoded
fn scenario_record() -> Value {
    Value::Record(vec![
        Value::from("a.txt"),
        Value::from("text"),
        Value::Integer(3),
        Value::Timestamp(1_677_353_340.0),
        Value::from("d"),
        Value::Dict(Dict::new()),
        Value::List(vec![Value::from("t")]),
        Value::Bytes(b"abc".to_vec()),
    ])
}

fn round_trip(value: &Value) -> Value {
    let encoded = encode(value).unwrap();
    decode(&encoded).unwrap()
}

fn u64_at(buf: &[u8], at: usize) -> u64 {
    u64::from_be_bytes(buf[at..at + 8].try_into().unwrap())
}

fn assert_corrupt(buf: &[u8]) {
    match decode(buf) {
        Err(MomemError::CorruptData { .. }) => {}
        other => panic!("expected CorruptData, got {:?}", other),
    }
}

fn corrupt_reason(buf: &[u8]) -> String {
    match decode(buf) {
        Err(MomemError::CorruptData { reason, .. }) => reason,
        other => panic!("expected CorruptData, got {:?}", other),
    }
}

// =============================================================================
// Byte Layout Tests
// =============================================================================

#[test]
fn test_integer_layout() {
    let encoded = encode(&Value::Integer(3)).unwrap();

    let mut expected = b"in".to_vec();
    expected.extend_from_slice(&3u64.to_be_bytes());
    assert_eq!(&encoded[..], &expected[..]);
}

#[test]
fn test_float_layout_is_single_precision() {
    let encoded = encode(&Value::Float(1.5)).unwrap();

    let mut expected = b"fl".to_vec();
    expected.extend_from_slice(&1.5f32.to_be_bytes());
    assert_eq!(&encoded[..], &expected[..]);
    assert_eq!(encoded.len(), 6);
}

#[test]
fn test_timestamp_layout_is_double_precision() {
    let encoded = encode(&Value::Timestamp(1_677_353_340.25)).unwrap();

    let mut expected = b"dt".to_vec();
    expected.extend_from_slice(&1_677_353_340.25f64.to_be_bytes());
    assert_eq!(&encoded[..], &expected[..]);
}

#[test]
fn test_string_and_bytes_layout() {
    let encoded = encode(&Value::from("hi")).unwrap();
    let mut expected = b"st".to_vec();
    expected.extend_from_slice(&2u64.to_be_bytes());
    expected.extend_from_slice(b"hi");
    assert_eq!(&encoded[..], &expected[..]);

    let encoded = encode(&Value::Bytes(vec![0x00, 0xff])).unwrap();
    let mut expected = b"by".to_vec();
    expected.extend_from_slice(&2u64.to_be_bytes());
    expected.extend_from_slice(&[0x00, 0xff]);
    assert_eq!(&encoded[..], &expected[..]);
}

#[test]
fn test_empty_list_layout() {
    let encoded = encode(&Value::List(vec![])).unwrap();

    let mut expected = b"li".to_vec();
    expected.extend_from_slice(&0u64.to_be_bytes()); // body length
    expected.extend_from_slice(&0u64.to_be_bytes()); // count
    assert_eq!(&encoded[..], &expected[..]);
}

#[test]
fn test_list_offsets_are_absolute() {
    // [[1]]: outer header (18) + one offset (8) puts the inner list at 26,
    // and the inner list's own header puts its element at 26 + 26 = 52.
    let value = Value::List(vec![Value::List(vec![Value::Integer(1)])]);
    let encoded = encode(&value).unwrap();

    assert_eq!(encoded.len(), 62);
    assert_eq!(u64_at(&encoded, 18), 26);
    assert_eq!(&encoded[26..28], b"li");
    assert_eq!(u64_at(&encoded, 26 + 18), 52);
    assert_eq!(&encoded[52..54], b"in");
}

#[test]
fn test_dict_layout_is_tagged_flat_list() {
    let dict: Dict = [("a", 1u64)].into_iter().collect();
    let encoded = encode(&Value::Dict(dict)).unwrap();

    assert_eq!(encoded.len(), 57);
    assert_eq!(&encoded[0..2], b"di");
    assert_eq!(&encoded[2..4], b"li");
    assert_eq!(u64_at(&encoded, 4), 21); // "st"+len+"a" (11) + "in"+1 (10)
    assert_eq!(u64_at(&encoded, 12), 2); // flattened count
    assert_eq!(u64_at(&encoded, 20), 36);
    assert_eq!(u64_at(&encoded, 28), 47);
}

#[test]
fn test_encoded_len_matches_output() {
    let values = vec![
        Value::Integer(1),
        Value::Float(2.0),
        Value::from("three"),
        Value::List(vec![Value::Integer(1), Value::from("x")]),
        Value::Dict([("k", "v")].into_iter().collect()),
        scenario_record(),
    ];
    for value in values {
        assert_eq!(
            encoded_len(&value).unwrap(),
            encode(&value).unwrap().len(),
            "{:?}",
            value
        );
    }
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_round_trip_scalars() {
    let values = vec![
        Value::Integer(0),
        Value::Integer(3),
        Value::Integer(u64::MAX),
        Value::Timestamp(0.0),
        Value::Timestamp(1_677_353_340.123_456),
        Value::Timestamp(-86_400.5),
        Value::from(""),
        Value::from("héllo wörld ✓"),
        Value::Bytes(vec![]),
        Value::Bytes((0..=255).collect()),
    ];
    for value in values {
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_float_narrows_to_single_precision() {
    for f in [0.1f64, 1.0 / 3.0, 1e30, -2.5, 0.0] {
        let decoded = round_trip(&Value::Float(f));
        assert_eq!(decoded, Value::Float(f64::from(f as f32)));
    }
}

#[test]
fn test_round_trip_nested_depth_five() {
    let leaf = Value::List(vec![
        Value::Integer(42),
        Value::Float(0.5),
        Value::from("leaf"),
        Value::Bytes(vec![1, 2, 3]),
        Value::Timestamp(12.5),
    ]);
    let level4: Dict = [("leaf", leaf.clone())].into_iter().collect();
    let level3 = Value::List(vec![Value::Dict(level4), leaf.clone(), Value::List(vec![])]);
    let mut level2 = Dict::new();
    level2.insert(Value::Integer(7), level3);
    level2.insert("empty", Dict::new());
    let level1 = Value::List(vec![Value::Dict(level2), leaf]);

    assert_eq!(round_trip(&level1), level1);
}

#[test]
fn test_round_trip_dicts_with_zero_one_and_many_entries() {
    let empty = Dict::new();
    let one: Dict = [("only", 1u64)].into_iter().collect();
    let mut many = Dict::new();
    for i in 0..50u64 {
        many.insert(format!("key-{}", i), i * 3);
    }
    many.insert(Value::Integer(99), Value::List(vec![Value::from("nested")]));

    for dict in [empty, one, many] {
        let value = Value::Dict(dict);
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_dict_preserves_insertion_order() {
    let dict: Dict = [("z", 1u64), ("a", 2u64), ("m", 3u64)].into_iter().collect();
    let decoded = round_trip(&Value::Dict(dict));

    let keys: Vec<_> = decoded
        .as_dict()
        .unwrap()
        .iter()
        .map(|(k, _)| k.as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_round_trip_record() {
    let record = scenario_record();
    assert_eq!(round_trip(&record), record);
}

// =============================================================================
// Length Integrity Tests
// =============================================================================

#[test]
fn test_record_declared_length_equals_buffer_length() {
    let encoded = encode(&scenario_record()).unwrap();

    assert_eq!(&encoded[0..2], b"mn");
    assert_eq!(encoded.len(), 222);
    assert_eq!(u64_at(&encoded, 2), 222);
}

#[test]
fn test_list_body_length_equals_element_span() {
    let encoded = encode(&scenario_record()).unwrap();
    let index = OffsetIndex::of_record(&encoded).unwrap();

    // 8 fields: header 18 + table 64 after the list tag at 10
    let (start, end) = index.body_range();
    assert_eq!(start, 92);
    assert_eq!(end, encoded.len());
    assert_eq!(u64_at(&encoded, 12), 130);
}

// =============================================================================
// Corruption Detection Tests
// =============================================================================

/// Positions of every tag in a buffer, found by walking the offset indexes
fn tag_positions(buf: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    if buf.starts_with(b"mn") {
        positions.push(0);
        collect_tags(buf, 10, &mut positions);
    } else {
        collect_tags(buf, 0, &mut positions);
    }
    positions
}

fn collect_tags(buf: &[u8], pos: usize, positions: &mut Vec<usize>) {
    positions.push(pos);
    let list_pos = match [buf[pos], buf[pos + 1]] {
        [b'l', b'i'] => pos,
        [b'd', b'i'] => {
            positions.push(pos + 2);
            pos + 2
        }
        _ => return,
    };
    let index = OffsetIndex::read(buf, list_pos).unwrap();
    for &offset in index.offsets() {
        collect_tags(buf, offset as usize, positions);
    }
}

/// Set each tag byte to every other value and expect `CorruptData` each time
fn assert_every_tag_substitution_detected(encoded: &[u8]) {
    for pos in tag_positions(encoded) {
        for byte in [pos, pos + 1] {
            for replacement in 0..=u8::MAX {
                if replacement == encoded[byte] {
                    continue;
                }
                let mut corrupted = encoded.to_vec();
                corrupted[byte] = replacement;
                assert!(
                    matches!(decode(&corrupted), Err(MomemError::CorruptData { .. })),
                    "byte {} set to {:#04x} was not detected",
                    byte,
                    replacement
                );
            }
        }
    }
}

#[test]
fn test_any_single_tag_byte_change_in_record_is_detected() {
    // No empty strings or zero timestamps: `st`+0 and `dt`+0.0 are the same
    // ten bytes apart from the tag's first letter
    let mut notes = Dict::new();
    notes.insert("k", "v");
    notes.insert("n", 5u64);
    let value = Value::Record(vec![
        Value::from("photo.png"),
        Value::from("image"),
        Value::Integer(4),
        Value::Timestamp(1_677_353_340.0),
        Value::from("desc"),
        Value::Dict(notes),
        Value::List(vec![Value::from("t"), Value::from("u")]),
        Value::Bytes(vec![9, 8, 7, 6]),
    ]);
    let encoded = encode(&value).unwrap();

    let positions = tag_positions(&encoded);
    assert_eq!(positions.len(), 2 + 8 + 1 + 4 + 2);
    assert_every_tag_substitution_detected(&encoded);
}

#[test]
fn test_any_single_tag_byte_change_in_generic_list_is_detected() {
    // `st`<->`dt`, `li`<->`di`, `di`<->`dt` and `in`->`mn` are one byte apart
    let value = Value::List(vec![
        Value::from("text"),
        Value::Timestamp(12.5),
        Value::Integer(9),
        Value::Float(1.5),
        Value::Bytes(vec![1, 2]),
        Value::List(vec![Value::from("x")]),
        Value::Dict([("a", 1u64)].into_iter().collect()),
    ]);
    let encoded = encode(&value).unwrap();

    assert_eq!(tag_positions(&encoded).len(), 1 + 7 + 1 + 1 + 2);
    assert_every_tag_substitution_detected(&encoded);
}

#[test]
fn test_swapping_a_field_tag_for_another_valid_tag_is_detected() {
    let encoded = encode(&scenario_record()).unwrap();

    // name: "st" -> "by" has the same layout but the wrong kind
    let mut corrupted = encoded.to_vec();
    corrupted[92..94].copy_from_slice(b"by");
    let reason = corrupt_reason(&corrupted);
    assert!(reason.contains("name"), "{}", reason);

    // the tag element inside `tags`: "st" -> "by"
    let mut corrupted = encoded.to_vec();
    corrupted[198..200].copy_from_slice(b"by");
    let reason = corrupt_reason(&corrupted);
    assert!(reason.contains("tags"), "{}", reason);
}

#[test]
fn test_every_truncation_is_detected() {
    let encoded = encode(&scenario_record()).unwrap();
    for len in 0..encoded.len() {
        assert_corrupt(&encoded[..len]);
    }
}

#[test]
fn test_declared_length_mismatch_is_detected() {
    let mut extended = encode(&scenario_record()).unwrap().to_vec();
    extended.push(0);
    let reason = corrupt_reason(&extended);
    assert!(reason.contains("declares 222"), "{}", reason);
}

#[test]
fn test_trailing_bytes_after_bare_value() {
    let mut encoded = encode(&Value::Integer(1)).unwrap().to_vec();
    encoded.extend_from_slice(b"in");
    let reason = corrupt_reason(&encoded);
    assert!(reason.contains("trailing"), "{}", reason);
}

#[test]
fn test_unknown_tag() {
    let mut buf = b"zz".to_vec();
    buf.extend_from_slice(&0u64.to_be_bytes());
    let reason = corrupt_reason(&buf);
    assert!(reason.contains("unknown tag"), "{}", reason);
}

#[test]
fn test_odd_length_flattened_dict_is_rejected() {
    // "di" + list of one element: header ends at 20, table at 20..28
    let mut buf = b"dili".to_vec();
    buf.extend_from_slice(&10u64.to_be_bytes());
    buf.extend_from_slice(&1u64.to_be_bytes());
    buf.extend_from_slice(&28u64.to_be_bytes());
    buf.extend_from_slice(b"in");
    buf.extend_from_slice(&1u64.to_be_bytes());

    let reason = corrupt_reason(&buf);
    assert!(reason.contains("odd"), "{}", reason);
}

#[test]
fn test_offset_index_mismatch_is_detected() {
    let value = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
    let mut encoded = encode(&value).unwrap().to_vec();

    // offset[1] lives at 18 + 8; point it one byte late
    let bumped = u64_at(&encoded, 26) + 1;
    encoded[26..34].copy_from_slice(&bumped.to_be_bytes());

    let reason = corrupt_reason(&encoded);
    assert!(reason.contains("offset index"), "{}", reason);
}

#[test]
fn test_body_length_mismatch_is_detected() {
    let value = Value::List(vec![Value::from("abc")]);
    let mut encoded = encode(&value).unwrap().to_vec();
    encoded.extend_from_slice(&[0u8; 4]);

    // Claim the body is 4 bytes longer than the element actually is
    let inflated = u64_at(&encoded, 2) + 4;
    encoded[2..10].copy_from_slice(&inflated.to_be_bytes());

    let reason = corrupt_reason(&encoded);
    assert!(reason.contains("body"), "{}", reason);
}

#[test]
fn test_huge_declared_length_is_rejected_without_allocating() {
    let mut buf = b"st".to_vec();
    buf.extend_from_slice(&u64::MAX.to_be_bytes());
    buf.extend_from_slice(b"abc");
    assert_corrupt(&buf);

    let mut buf = b"li".to_vec();
    buf.extend_from_slice(&0u64.to_be_bytes());
    buf.extend_from_slice(&u64::MAX.to_be_bytes());
    assert_corrupt(&buf);
}

#[test]
fn test_invalid_utf8_string_is_rejected() {
    let mut buf = b"st".to_vec();
    buf.extend_from_slice(&2u64.to_be_bytes());
    buf.extend_from_slice(&[0xc3, 0x28]);
    let reason = corrupt_reason(&buf);
    assert!(reason.contains("UTF-8"), "{}", reason);
}

#[test]
fn test_record_tag_below_root_is_rejected() {
    // A bare list whose only element carries the record tag
    let mut buf = b"li".to_vec();
    buf.extend_from_slice(&10u64.to_be_bytes());
    buf.extend_from_slice(&1u64.to_be_bytes());
    buf.extend_from_slice(&26u64.to_be_bytes());
    buf.extend_from_slice(b"mn");
    buf.extend_from_slice(&0u64.to_be_bytes());
    assert_corrupt(&buf);
}

// =============================================================================
// Nesting Limit Tests
// =============================================================================

/// `depth` single-element lists around `in 7`, written by hand (26 bytes per level)
fn nested_list_bytes(depth: usize) -> Vec<u8> {
    let total = 26 * depth + 10;
    let mut buf = Vec::with_capacity(total);
    for level in 0..depth {
        let body_start = 26 * (level + 1);
        buf.extend_from_slice(b"li");
        buf.extend_from_slice(&((total - body_start) as u64).to_be_bytes());
        buf.extend_from_slice(&1u64.to_be_bytes());
        buf.extend_from_slice(&(body_start as u64).to_be_bytes());
    }
    buf.extend_from_slice(b"in");
    buf.extend_from_slice(&7u64.to_be_bytes());
    buf
}

fn nested_list_value(depth: usize) -> Value {
    (0..depth).fold(Value::Integer(7), |inner, _| Value::List(vec![inner]))
}

#[test]
fn test_hand_built_nesting_matches_encoder() {
    assert_eq!(&encode(&nested_list_value(5)).unwrap()[..], &nested_list_bytes(5)[..]);
}

#[test]
fn test_decode_accepts_nesting_up_to_the_limit() {
    let buf = nested_list_bytes(MAX_DEPTH - 1);
    assert_eq!(decode(&buf).unwrap(), nested_list_value(MAX_DEPTH - 1));
}

#[test]
fn test_decode_rejects_nesting_past_the_limit() {
    let reason = corrupt_reason(&nested_list_bytes(MAX_DEPTH));
    assert!(reason.contains("nesting"), "{}", reason);
}

#[test]
fn test_decode_of_very_deep_buffer_fails_cleanly() {
    // Well-formed at every level; must error rather than exhaust the stack
    for depth in [2_000, 200_000] {
        let reason = corrupt_reason(&nested_list_bytes(depth));
        assert!(reason.contains("nesting"), "{}", reason);
    }
}

#[test]
fn test_encode_rejects_nesting_past_the_limit() {
    let ok = nested_list_value(MAX_DEPTH - 1);
    assert_eq!(round_trip(&ok), ok);

    let too_deep = nested_list_value(MAX_DEPTH);
    assert!(matches!(encode(&too_deep), Err(MomemError::UnsupportedType(_))));
    assert!(matches!(encoded_len(&too_deep), Err(MomemError::UnsupportedType(_))));
    assert!(matches!(
        Encoder::new().encode_value(&too_deep),
        Err(MomemError::UnsupportedType(_))
    ));
}

#[test]
fn test_nesting_limit_applies_inside_record_notes() {
    let mut fields = match scenario_record() {
        Value::Record(fields) => fields,
        _ => unreachable!(),
    };
    let mut notes = Dict::new();
    notes.insert("deep", nested_list_value(MAX_DEPTH));
    fields[5] = Value::Dict(notes);

    assert!(matches!(
        encode(&Value::Record(fields)),
        Err(MomemError::UnsupportedType(_))
    ));
}

// =============================================================================
// Encode Error Tests
// =============================================================================

#[test]
fn test_nested_record_is_unsupported() {
    let value = Value::List(vec![scenario_record()]);
    assert!(matches!(encode(&value), Err(MomemError::UnsupportedType(_))));
}

#[test]
fn test_record_with_wrong_field_kind_is_unsupported() {
    let mut fields = match scenario_record() {
        Value::Record(fields) => fields,
        _ => unreachable!(),
    };
    fields[2] = Value::from("3");
    assert!(matches!(
        encode(&Value::Record(fields.clone())),
        Err(MomemError::UnsupportedType(_))
    ));

    fields.pop();
    assert!(matches!(
        encode(&Value::Record(fields)),
        Err(MomemError::UnsupportedType(_))
    ));
}

#[test]
fn test_record_with_non_string_tag_is_unsupported() {
    let mut fields = match scenario_record() {
        Value::Record(fields) => fields,
        _ => unreachable!(),
    };
    fields[6] = Value::List(vec![Value::Integer(1)]);
    assert!(matches!(
        encode(&Value::Record(fields)),
        Err(MomemError::UnsupportedType(_))
    ));
}

#[test]
fn test_record_field_widths_are_validated_before_encoding() {
    let mut fields = match scenario_record() {
        Value::Record(fields) => fields,
        _ => unreachable!(),
    };
    fields[0] = Value::from("x".repeat(41));

    match encode(&Value::Record(fields)) {
        Err(MomemError::Validation {
            field,
            limit,
            actual,
        }) => {
            assert_eq!(field, "name");
            assert_eq!(limit, 40);
            assert_eq!(actual, 41);
        }
        other => panic!("expected Validation, got {:?}", other),
    }
}
