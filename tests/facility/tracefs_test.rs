/*!
 * TraceFS Integration Tests
 * A muxer driving a tracefs tree laid out on disk
 */

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracemux::facility::{TraceFacility, TraceFs};
use tracemux::muxer::{ConfigMuxer, SetupErrors, TraceRequest};
use tracemux::tables::{EventTable, SyscallTable, VendorEventMap};
use tracemux::FacilityError;

const EVENTS: &[(&str, &str, usize)] = &[
    ("sched", "sched_switch", 316),
    ("sched", "sched_waking", 318),
    ("raw_syscalls", "sys_enter", 21),
    ("raw_syscalls", "sys_exit", 20),
    ("ftrace", "print", 5),
];

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, contents).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap().trim().to_string()
}

fn fake_tracefs() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "tracing_on", "0\n");
    write(root, "buffer_size_kb", "1408\n");
    write(root, "trace_clock", "[local] global counter boot\n");
    write(root, "current_tracer", "nop\n");
    write(root, "trace", "");
    write(root, "events/enable", "0\n");
    write(root, "set_ftrace_filter", "");
    write(root, "set_graph_function", "");
    for (group, name, id) in EVENTS {
        write(root, &format!("events/{}/{}/id", group, name), &format!("{}\n", id));
        if *group != "ftrace" {
            write(root, &format!("events/{}/{}/enable", group, name), "0\n");
        }
        if *group == "raw_syscalls" {
            write(root, &format!("events/{}/{}/filter", group, name), "none\n");
        }
    }
    dir
}

#[test]
fn test_table_from_tracefs_tree() {
    let dir = fake_tracefs();
    let table = EventTable::from_tracefs(dir.path()).unwrap();

    assert_eq!(table.len(), EVENTS.len());
    assert_eq!(table.get_by_name("sched_switch").unwrap().id, 316);
    assert!(table.compact_sched_supported());
}

#[test]
fn test_muxer_over_tracefs() {
    let dir = fake_tracefs();
    let root = dir.path();
    let tracefs = TraceFs::open_at(root).unwrap();
    let table = EventTable::from_tracefs(root).unwrap();
    let mut muxer = ConfigMuxer::new(&tracefs, &table, SyscallTable::x86_64(), VendorEventMap::new());

    let request = TraceRequest {
        syscall_events: vec!["openat".into()],
        buffer_size_kb: 1024,
        ..TraceRequest::with_events(["sched/sched_switch", "raw_syscalls/*"])
    };
    let mut errors = SetupErrors::default();
    let id = muxer.setup_config(&request, Some(&mut errors));
    assert!(id.is_valid(), "{:?}", errors);

    assert_eq!(read(root, "events/sched/sched_switch/enable"), "1");
    assert_eq!(read(root, "events/raw_syscalls/sys_enter/enable"), "1");
    assert_eq!(read(root, "events/raw_syscalls/sys_enter/filter"), "id == 257");
    assert_eq!(read(root, "events/raw_syscalls/sys_exit/filter"), "id == 257");
    assert_eq!(read(root, "buffer_size_kb"), "1024");
    assert_eq!(read(root, "trace_clock"), "boot");

    assert!(muxer.activate_config(id));
    assert_eq!(read(root, "tracing_on"), "1");

    assert!(muxer.remove_config(id));
    assert_eq!(read(root, "tracing_on"), "0");
    assert_eq!(read(root, "events/sched/sched_switch/enable"), "0");
    assert_eq!(read(root, "events/raw_syscalls/sys_enter/filter"), "0");
}

#[test]
fn test_existing_tracing_blocks_setup() {
    let dir = fake_tracefs();
    write(dir.path(), "tracing_on", "1\n");
    let tracefs = TraceFs::open_at(dir.path()).unwrap();
    let table = EventTable::from_tracefs(dir.path()).unwrap();
    let mut muxer = ConfigMuxer::new(&tracefs, &table, SyscallTable::x86_64(), VendorEventMap::new());

    let id = muxer.setup_config(&TraceRequest::with_events(["sched/sched_switch"]), None);
    assert!(!id.is_valid());
    assert_eq!(read(dir.path(), "events/sched/sched_switch/enable"), "0");
}

#[test]
fn test_missing_events_dir_is_reported_on_write() {
    let dir = fake_tracefs();
    let tracefs = TraceFs::open_at(dir.path()).unwrap();
    let err = tracefs.enable_event("block", "block_rq_issue").unwrap_err();
    assert!(matches!(err, FacilityError::WriteFailed { .. }));
}

#[test]
fn test_open_without_tracefs() {
    let dir = TempDir::new().unwrap();
    assert!(TraceFs::open_at(dir.path()).is_err());
}
