/*!
 * Shared fixtures for muxer tests
 */

#![allow(dead_code)]

use tracemux::facility::SimulatedFacility;
use tracemux::muxer::ConfigMuxer;
use tracemux::tables::{Event, EventTable, SyscallTable, VendorEventMap};

/// Events known to the fixture kernel, as `(id, group, name)`
pub const EVENTS: &[(usize, &str, &str)] = &[
    (1, "sched", "sched_switch"),
    (2, "sched", "sched_waking"),
    (3, "sched", "sched_wakeup"),
    (4, "raw_syscalls", "sys_enter"),
    (5, "raw_syscalls", "sys_exit"),
    (6, "ftrace", "print"),
    (7, "irq", "irq_handler_entry"),
    (8, "irq", "irq_handler_exit"),
    (9, "power", "cpu_frequency"),
    (10, "power", "cpu_idle"),
    (11, "kmem", "rss_stat"),
    (12, "ipi", "ipi_entry"),
];

pub fn table() -> EventTable {
    EventTable::from_events(
        EVENTS
            .iter()
            .map(|(id, group, name)| Event::new(*id, *group, *name)),
    )
}

pub fn muxer<'a>(
    facility: &'a SimulatedFacility,
    table: &'a EventTable,
) -> ConfigMuxer<'a, SimulatedFacility> {
    ConfigMuxer::new(facility, table, SyscallTable::x86_64(), VendorEventMap::new())
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn names(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `group/name` of every event in a session or central filter
pub fn filter_names(
    table: &EventTable,
    filter: &tracemux::muxer::EventFilter,
) -> std::collections::BTreeSet<String> {
    filter
        .iter()
        .filter_map(|id| table.get_by_id(id))
        .map(|event| event.group_and_name().to_string())
        .collect()
}
