/*!
 * Syscall Filter Tests
 * The installed raw_syscalls filter is the join of every session's needs
 */

use crate::support::{muxer, names, strings, table};
use pretty_assertions::assert_eq;
use tracemux::facility::SimulatedFacility;
use tracemux::muxer::{SetupErrors, SyscallFilter, TraceRequest};
use tracemux::{MuxerError, SessionId};

const ENTER_FILTER: &str = "events/raw_syscalls/sys_enter/filter";
const EXIT_FILTER: &str = "events/raw_syscalls/sys_exit/filter";

fn syscalls(names: &[&str]) -> TraceRequest {
    TraceRequest {
        syscall_events: strings(names),
        ..TraceRequest::with_events(["raw_syscalls/sys_enter", "raw_syscalls/sys_exit"])
    }
}

#[test]
fn test_no_raw_syscalls_means_no_filter() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let request = TraceRequest {
        syscall_events: strings(&["read"]),
        ..TraceRequest::with_events(["sched/sched_switch"])
    };
    let id = muxer.setup_config(&request, None);

    assert_eq!(muxer.data_source_config(id).unwrap().syscall_filter, SyscallFilter::None);
    assert!(facility.writes_to(ENTER_FILTER).is_empty());
}

#[test]
fn test_raw_syscalls_without_names_means_all() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let id = muxer.setup_config(&syscalls(&[]), None);

    assert_eq!(muxer.data_source_config(id).unwrap().syscall_filter, SyscallFilter::All);
    assert_eq!(muxer.installed_syscall_filter(), &SyscallFilter::All);
    // Nothing to restrict, so nothing to write
    assert!(facility.writes_to(ENTER_FILTER).is_empty());
}

#[test]
fn test_explicit_names_install_filter() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let id = muxer.setup_config(&syscalls(&["write", "read"]), None);

    assert_eq!(
        muxer.data_source_config(id).unwrap().syscall_filter,
        SyscallFilter::explicit([0, 1])
    );
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 0 || id == 1");
    assert_eq!(facility.value(EXIT_FILTER).unwrap(), "id == 0 || id == 1");
}

#[test]
fn test_numeric_ids_are_accepted() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    muxer.setup_config(&syscalls(&["59"]), None);
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 59");
}

#[test]
fn test_union_grows_and_shrinks() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let a = muxer.setup_config(&syscalls(&["read"]), None);
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 0");

    let b = muxer.setup_config(&syscalls(&["write"]), None);
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 0 || id == 1");

    assert!(muxer.remove_config(b));
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 0");

    assert!(muxer.remove_config(a));
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "0");
    assert_eq!(muxer.installed_syscall_filter(), &SyscallFilter::None);
}

#[test]
fn test_all_absorbs_explicit() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let narrow = muxer.setup_config(&syscalls(&["read"]), None);
    let wide = muxer.setup_config(&syscalls(&[]), None);
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "0");
    assert_eq!(muxer.installed_syscall_filter(), &SyscallFilter::All);

    // Dropping the unrestricted session narrows back down
    assert!(muxer.remove_config(wide));
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 0");
    assert!(muxer.remove_config(narrow));
}

#[test]
fn test_unchanged_filter_is_not_rewritten() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    muxer.setup_config(&syscalls(&["read", "write"]), None);
    muxer.setup_config(&syscalls(&["write"]), None);
    assert_eq!(facility.writes_to(ENTER_FILTER).len(), 1);
}

#[test]
fn test_unknown_syscalls_are_reported() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let mut errors = SetupErrors::default();
    let id = muxer.setup_config(&syscalls(&["read", "frobnicate"]), Some(&mut errors));
    assert_eq!(errors.unknown_syscalls, names(&["frobnicate"]));
    assert_eq!(
        muxer.data_source_config(id).unwrap().syscall_filter,
        SyscallFilter::explicit([0])
    );

    let mut errors = SetupErrors::default();
    let id = muxer.setup_config(&syscalls(&["frobnicate"]), Some(&mut errors));
    assert!(id.is_valid());
    assert_eq!(muxer.data_source_config(id).unwrap().syscall_filter, SyscallFilter::None);
}

#[test]
fn test_filter_write_failure_is_fatal() {
    let facility = SimulatedFacility::new();
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let first = muxer.setup_config(&syscalls(&["read"]), None);
    facility.fail_writes_to(EXIT_FILTER);

    let mut errors = SetupErrors::default();
    let id = muxer.setup_config(&syscalls(&["write"]), Some(&mut errors));
    assert_eq!(id, SessionId::INVALID);
    assert!(matches!(errors.fatal, Some(MuxerError::Facility(_))));
    assert_eq!(muxer.session_count(), 1);
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "id == 0");
    assert_eq!(
        muxer.installed_syscall_filter(),
        &muxer.data_source_config(first).unwrap().syscall_filter
    );
}

#[test]
fn test_failed_setup_rolls_back_filter() {
    let facility = SimulatedFacility::new();
    facility.fail_writes_to(tracemux::core::limits::BUFFER_SIZE_KB);
    let table = table();
    let mut muxer = muxer(&facility, &table);

    let id = muxer.setup_config(&syscalls(&["read"]), None);
    assert_eq!(id, SessionId::INVALID);
    assert_eq!(facility.value(ENTER_FILTER).unwrap(), "0");
    assert_eq!(muxer.installed_syscall_filter(), &SyscallFilter::None);
}
