/*!
 * Table Loading Tests
 * Event, syscall and vendor tables built from disk and built-ins
 */

use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use tracemux::core::GroupAndName;
use tracemux::tables::{EventTable, SyscallTable, VendorEventMap};

#[test]
fn test_malformed_event_ids_are_skipped() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("events/sched/sched_switch");
    let bad = dir.path().join("events/sched/sched_broken");
    fs::create_dir_all(&good).unwrap();
    fs::create_dir_all(&bad).unwrap();
    fs::write(good.join("id"), "316\n").unwrap();
    fs::write(bad.join("id"), "not a number\n").unwrap();

    let table = EventTable::from_tracefs(dir.path()).unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.get(&GroupAndName::new("sched", "sched_broken")).is_none());
    assert!(!table.compact_sched_supported());
}

#[test]
fn test_vendor_file_round_trip_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("atrace_categories.txt");
    fs::write(
        &path,
        "camera\n gpu/gpu_mem_total\n mali/*\n# comment\nvideo\n vcodec/vcodec_start\n",
    )
    .unwrap();

    let map = VendorEventMap::load(&path);
    assert_eq!(map.categories().collect::<Vec<_>>(), vec!["camera", "video"]);
    assert_eq!(
        map.events_for("camera"),
        &[
            GroupAndName::new("gpu", "gpu_mem_total"),
            GroupAndName::new("mali", "*"),
        ][..]
    );
    assert!(VendorEventMap::load(dir.path().join("absent")).is_empty());
}

#[test]
fn test_syscall_tables_per_arch() {
    let x86 = SyscallTable::x86_64();
    let arm = SyscallTable::aarch64();
    assert_eq!(x86.id_by_name("openat"), Some(257));
    assert_eq!(arm.id_by_name("openat"), Some(56));
    assert_eq!(x86.name_by_id(59), Some("execve"));
    if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
        assert!(!SyscallTable::for_current_arch().is_empty());
    }
}
