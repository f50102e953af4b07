//! Watch-table behavior against a live child process

mod common;

use common::{plant_value, ChildTarget};
use memedit::core::types::{Address, ReadError, ScanValue, ValueType};
use memedit::memory::table::{read_value, AddressTable, WatchedAddress};
use memedit::process::ProcessHandle;
use pretty_assertions::assert_eq;

fn attach(target: &ChildTarget) -> ProcessHandle {
    ProcessHandle::attach(target.pid()).expect("attach child")
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn promote_refresh_write_cycle() {
    let target = ChildTarget::spawn();
    let handle = attach(&target);
    let planted = plant_value(&handle, ScanValue::Int32(42));

    let mut entry =
        WatchedAddress::promote(&handle, planted, ValueType::Int32).expect("promote");
    assert_eq!(entry.last_value, ScanValue::Int32(42));

    // Target mutates behind our back; refresh catches up
    handle
        .write_bytes(planted, &43i32.to_le_bytes())
        .expect("mutate");
    assert_eq!(entry.refresh(&handle).expect("refresh"), ScanValue::Int32(43));

    // Our own write reflects immediately in the cache
    entry.write(&handle, "99").expect("write");
    assert_eq!(entry.last_value, ScanValue::Int32(99));
    assert_eq!(
        read_value(&handle, planted, ValueType::Int32).expect("read"),
        ScanValue::Int32(99)
    );
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn float32_write_read_within_one_ulp() {
    let target = ChildTarget::spawn();
    let handle = attach(&target);
    let planted = plant_value(&handle, ScanValue::Float32(0.0));

    let mut entry =
        WatchedAddress::promote(&handle, planted, ValueType::Float32).expect("promote");
    entry.write(&handle, "3.14").expect("write");

    match read_value(&handle, planted, ValueType::Float32).expect("read") {
        ScanValue::Float32(v) => {
            let delta = (v - 3.14f32).abs();
            assert!(delta <= f32::EPSILON * 4.0, "delta {delta} too large");
        }
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn float64_round_trip_is_exact() {
    let target = ChildTarget::spawn();
    let handle = attach(&target);
    let planted = plant_value(&handle, ScanValue::Float64(0.0));

    let mut entry =
        WatchedAddress::promote(&handle, planted, ValueType::Float64).expect("promote");
    entry.write(&handle, "-123.456").expect("write");
    assert_eq!(
        read_value(&handle, planted, ValueType::Float64).expect("read"),
        ScanValue::Float64(-123.456)
    );
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn promote_of_unmapped_address_fails_with_read_error() {
    let target = ChildTarget::spawn();
    let handle = attach(&target);

    let result = WatchedAddress::promote(&handle, Address::new(16), ValueType::Int32);
    assert!(matches!(
        result,
        Err(ReadError::InaccessibleMemory { .. }) | Err(ReadError::Incomplete { .. })
    ));
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn table_tracks_multiple_entries() {
    let target = ChildTarget::spawn();
    let handle = attach(&target);
    let first = plant_value(&handle, ScanValue::Byte(7));
    let second = plant_value(&handle, ScanValue::Int16(-5));

    let mut table = AddressTable::new();
    let a = table.promote(&handle, first, ValueType::Byte).expect("promote a");
    let b = table.promote(&handle, second, ValueType::Int16).expect("promote b");
    assert_eq!(table.len(), 2);

    assert_eq!(table.entry(a).unwrap().last_value, ScanValue::Byte(7));
    assert_eq!(table.entry(b).unwrap().last_value, ScanValue::Int16(-5));

    handle.write_bytes(first, &[9]).expect("mutate");
    assert_eq!(table.refresh_all(&handle), 2);
    assert_eq!(table.entry(a).unwrap().last_value, ScanValue::Byte(9));

    table.remove(a);
    assert_eq!(table.len(), 1);
    assert_eq!(table.entry(0).unwrap().address, second);
}
