/*!
 * Event Resolution
 * Expands a request into the concrete set of kernel events to enable
 */

use super::request::TraceRequest;
use crate::core::types::GroupAndName;
use crate::tables::{EventTable, VendorEventMap};
use std::collections::BTreeSet;
use tracing::debug;

/// Kernel events behind the well-known userspace annotation categories
///
/// Entries are `group/name`; `group/*` pulls in every event of the group the
/// running kernel has.
const ATRACE_CATEGORY_EVENTS: &[(&str, &[&str])] = &[
    ("gfx", &["mdss/*", "sde/*"]),
    ("ion", &["kmem/ion_alloc_buffer_start"]),
    (
        "sched",
        &[
            "sched/sched_switch",
            "sched/sched_wakeup",
            "sched/sched_waking",
            "sched/sched_blocked_reason",
            "sched/sched_cpu_hotplug",
            "sched/sched_pi_setprio",
            "sched/sched_process_exit",
            "cgroup/*",
            "oom/oom_score_adj_update",
            "task/task_rename",
            "task/task_newtask",
        ],
    ),
    ("irq", &["irq/*", "ipi/*"]),
    ("irqoff", &["preemptirq/irq_enable", "preemptirq/irq_disable"]),
    ("preemptoff", &["preemptirq/preempt_enable", "preemptirq/preempt_disable"]),
    ("i2c", &["i2c/*"]),
    (
        "freq",
        &[
            "power/cpu_frequency",
            "power/gpu_frequency",
            "power/clock_set_rate",
            "power/clock_disable",
            "power/clock_enable",
            "clk/clk_set_rate",
            "clk/clk_disable",
            "clk/clk_enable",
            "power/cpu_frequency_limits",
            "power/suspend_resume",
        ],
    ),
    ("membus", &["memory_bus/*"]),
    ("idle", &["power/cpu_idle"]),
    (
        "disk",
        &[
            "f2fs/f2fs_sync_file_enter",
            "f2fs/f2fs_sync_file_exit",
            "f2fs/f2fs_write_begin",
            "f2fs/f2fs_write_end",
            "ext4/ext4_da_write_begin",
            "ext4/ext4_da_write_end",
            "ext4/ext4_sync_file_enter",
            "ext4/ext4_sync_file_exit",
            "block/block_rq_issue",
            "block/block_rq_complete",
        ],
    ),
    ("mmc", &["mmc/*"]),
    ("load", &["cpufreq_interactive/*"]),
    ("sync", &["sync/*", "fence/*", "dma_fence/*"]),
    ("workq", &["workqueue/*"]),
    (
        "memreclaim",
        &[
            "vmscan/mm_vmscan_direct_reclaim_begin",
            "vmscan/mm_vmscan_direct_reclaim_end",
            "vmscan/mm_vmscan_kswapd_wake",
            "vmscan/mm_vmscan_kswapd_sleep",
            "lowmemorykiller/*",
        ],
    ),
    ("regulators", &["regulator/*"]),
    (
        "binder_driver",
        &[
            "binder/binder_transaction",
            "binder/binder_transaction_received",
            "binder/binder_transaction_alloc_buf",
            "binder/binder_set_priority",
        ],
    ),
    (
        "binder_lock",
        &["binder/binder_lock", "binder/binder_locked", "binder/binder_unlock"],
    ),
    ("pagecache", &["filemap/*"]),
    (
        "memory",
        &[
            "kmem/rss_stat",
            "kmem/ion_heap_grow",
            "kmem/ion_heap_shrink",
            "mm_event/mm_event_record",
        ],
    ),
    ("thermal", &["thermal/thermal_temperature", "thermal/cdev_update"]),
];

/// Event carrying userspace annotations into the ring buffer
pub const ATRACE_PRINT_EVENT: (&str, &str) = ("ftrace", "print");

/// Concrete events a request needs
///
/// Deterministic for a given request, table and vendor map: the output is an
/// ordered set and does not depend on the order of the request's entries.
/// Bare names unknown to the table are dropped. Fully qualified names are
/// kept even when unknown so setup can report them.
pub fn resolve_events(
    request: &TraceRequest,
    table: &EventTable,
    vendor_events: &VendorEventMap,
) -> BTreeSet<GroupAndName> {
    let mut events = BTreeSet::new();

    for entry in &request.ftrace_events {
        add_entry(&GroupAndName::parse(entry), table, &mut events);
    }

    if request.requires_atrace() {
        events.insert(GroupAndName::new(ATRACE_PRINT_EVENT.0, ATRACE_PRINT_EVENT.1));

        for category in &request.atrace_categories {
            if let Some((_, entries)) = ATRACE_CATEGORY_EVENTS
                .iter()
                .find(|(name, _)| name == category)
            {
                for entry in entries.iter() {
                    add_entry(&GroupAndName::parse(entry), table, &mut events);
                }
            }

            for event in vendor_events.events_for(category) {
                add_entry(event, table, &mut events);
            }
        }
    }

    events
}

fn add_entry(entry: &GroupAndName, table: &EventTable, events: &mut BTreeSet<GroupAndName>) {
    if entry.is_wildcard() {
        events.extend(
            table
                .events_in_group(&entry.group)
                .into_iter()
                .map(|event| event.group_and_name()),
        );
    } else if entry.group.is_empty() {
        match table.get_by_name(&entry.name) {
            Some(event) => {
                events.insert(event.group_and_name());
            }
            None => debug!(event = %entry.name, "Event doesn't exist"),
        }
    } else {
        events.insert(entry.clone());
    }
}
