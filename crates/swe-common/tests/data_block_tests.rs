//! Tests for scalar and composite data blocks and value coercion.

use chrono::{TimeZone, Utc};
use swe_common::{DataBlock, DataError, DataType, ListBlock, MixedBlock, ScalarBlock, Value};
use test_utils::{assert_approx_eq, assert_block_values};

// ============================================================================
// Aliasing and copies
// ============================================================================

#[test]
fn test_alias_shares_mutation() {
    let block = DataBlock::new_scalar(DataType::Double, 3);
    let alias = block.alias();
    alias.set_double(2, 7.25).unwrap();
    assert_eq!(block.get_double(2).unwrap(), 7.25);
    assert!(alias.shares_storage(&block));
}

#[test]
fn test_deep_copy_is_independent() {
    let block = DataBlock::new_scalar(DataType::Int, 2);
    block.set_int(0, 5).unwrap();
    let copy = block.deep_copy();
    copy.set_int(0, 9).unwrap();
    assert_eq!(block.get_int(0).unwrap(), 5);
    assert_eq!(copy.get_int(0).unwrap(), 9);
    assert!(!copy.shares_storage(&block));
}

#[test]
fn test_renew_keeps_layout_with_fresh_storage() {
    let mixed: DataBlock = MixedBlock::new(vec![
        DataBlock::new_scalar(DataType::Int, 1),
        DataBlock::new_scalar(DataType::Utf8String, 2),
    ])
    .into();
    mixed.set_value(0, &Value::Int(4)).unwrap();
    mixed.set_string(2, "abc").unwrap();

    let renewed = mixed.renew();
    assert_eq!(renewed.atom_count(), 3);
    assert_block_values!(
        renewed,
        [Value::Int(0), Value::Text(String::new()), Value::Text(String::new())]
    );
    assert_eq!(mixed.get_string(2), "abc");
}

#[test]
fn test_mixed_alias_shares_leaf_storage() {
    let mixed: DataBlock = MixedBlock::new(vec![
        DataBlock::new_scalar(DataType::Boolean, 1),
        DataBlock::new_scalar(DataType::Float, 2),
    ])
    .into();
    let alias = mixed.alias();
    alias.set_float(2, 1.5).unwrap();
    assert_eq!(mixed.get_float(2).unwrap(), 1.5);

    let copy = mixed.deep_copy();
    copy.set_boolean(0, true).unwrap();
    assert!(!mixed.get_boolean(0).unwrap());
}

#[test]
fn test_window_views_subrange() {
    let block = DataBlock::Long(ScalarBlock::from_vec(vec![10, 20, 30, 40]));
    let window = block.window(1, 2).unwrap();
    assert_eq!(window.start_index(), 1);
    assert_block_values!(window, [Value::Long(20), Value::Long(30)]);
    window.set_long(1, 33).unwrap();
    assert_eq!(block.get_long(2).unwrap(), 33);
}

#[test]
fn test_window_of_composite_fails() {
    let list: DataBlock = ListBlock::new().into();
    assert!(matches!(list.window(0, 0), Err(DataError::BlockMismatch { .. })));
}

// ============================================================================
// Composite dispatch
// ============================================================================

#[test]
fn test_mixed_get_dispatches_to_covering_child() {
    let mixed = MixedBlock::new(vec![
        DataBlock::Int(ScalarBlock::from_vec(vec![3])),
        DataBlock::Double(ScalarBlock::from_vec(vec![1.0, 2.0, 3.5])),
    ]);
    assert_eq!(mixed.atom_count(), 4);
    assert_eq!(mixed.value(0), Value::Int(3));
    assert_eq!(mixed.value(3), Value::Double(3.5));
}

#[test]
fn test_list_add_and_index() {
    let mut list = ListBlock::new();
    for i in 0..5 {
        let element = DataBlock::new_scalar(DataType::Short, 2);
        element.set_short(1, i).unwrap();
        list.add(element);
    }
    assert_eq!(list.size(), 5);
    assert_eq!(list.atom_count(), 10);
    assert_eq!(list.get(3).get_short(1).unwrap(), 3);
    assert_eq!(list.value(9), Value::Short(4));
}

#[test]
fn test_resize_composite_fails() {
    let mut mixed: DataBlock = MixedBlock::default().into();
    assert!(mixed.resize(3).is_err());

    let mut scalar = DataBlock::new_scalar(DataType::Byte, 1);
    scalar.resize(3).unwrap();
    assert_eq!(scalar.atom_count(), 3);
}

// ============================================================================
// Coercion through blocks
// ============================================================================

#[test]
fn test_int_block_accepts_numeric_text() {
    let block = DataBlock::new_scalar(DataType::Int, 1);
    block.set_string(0, "42").unwrap();
    assert_eq!(block.get_int(0).unwrap(), 42);
    assert_eq!(block.get_string(0), "42");
    assert_approx_eq!(block.get_double(0).unwrap(), 42.0, 1e-12);
}

#[test]
fn test_conversion_errors_reach_caller() {
    let block = DataBlock::new_scalar(DataType::Byte, 1);
    let err = block.set_int(0, 300).unwrap_err();
    assert!(err.is_conversion());

    let text = DataBlock::new_scalar(DataType::Utf8String, 1);
    text.set_string(0, "not a number").unwrap();
    assert!(text.get_double(0).unwrap_err().is_conversion());
}

#[test]
fn test_double_instant_round_trip_sub_microsecond() {
    let block = DataBlock::new_scalar(DataType::Double, 1);
    let time = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap()
        + chrono::Duration::microseconds(250);
    block.set_instant(0, time).unwrap();
    let back = block.get_instant(0).unwrap();
    let diff = (back - time).num_nanoseconds().unwrap().abs();
    assert!(diff < 1_000, "round trip drifted by {} ns", diff);
}

#[test]
fn test_instant_block_reads_iso_text() {
    let block = DataBlock::new_scalar(DataType::Instant, 1);
    block.set_string(0, "2024-01-15T12:00:00Z").unwrap();
    assert_eq!(
        block.get_instant(0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    );
    assert_eq!(block.get_long(0).unwrap(), 1_705_320_000_000);
    assert_eq!(block.get_string(0), "2024-01-15T12:00:00Z");
}

#[test]
fn test_int_to_instant_is_rejected() {
    let block = DataBlock::new_scalar(DataType::Instant, 1);
    assert!(block.set_int(0, 12).unwrap_err().is_conversion());
}
