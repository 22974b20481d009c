/*!
 * Facility State
 * What the muxer believes it has written to the control surface
 */

use super::filter::EventFilter;
use super::syscall_filter::SyscallFilter;
use crate::core::types::TraceClock;

/// Mirror of the installed configuration
///
/// External agents can change the real files underneath; this records what
/// the muxer itself wrote so deltas can be computed.
#[derive(Debug, Clone, Default)]
pub(crate) struct FacilityState {
    pub events: EventFilter,
    pub syscall_filter: SyscallFilter,
    /// `function_graph` engaged as current tracer
    pub funcgraph_on: bool,
    /// 0 until the first session pins it
    pub cpu_buffer_size_pages: usize,
    pub clock: Option<TraceClock>,
    pub atrace_on: bool,
    pub atrace_apps: Vec<String>,
    pub atrace_categories: Vec<String>,
}

/// Append entries of `source` missing from `target`, keeping order
pub(crate) fn union_in_place(source: &[String], target: &mut Vec<String>) {
    for item in source {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Keep only entries of `target` also present in `other`
pub(crate) fn intersect_in_place(other: &[String], target: &mut Vec<String>) {
    target.retain(|item| other.contains(item));
}
