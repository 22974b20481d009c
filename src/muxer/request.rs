/*!
 * Trace Request
 * What a single session asks the facility for
 */

use serde::{Deserialize, Serialize};

/// Compact scheduling encoding requested by a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactSchedRequest {
    pub enabled: bool,
}

/// Requested tracing configuration
///
/// Event entries are `group/name`, `group/*` or a bare event name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceRequest {
    pub ftrace_events: Vec<String>,
    /// Syscall names; empty with a raw_syscalls event means every syscall
    pub syscall_events: Vec<String>,
    pub atrace_categories: Vec<String>,
    pub atrace_apps: Vec<String>,
    /// Per-CPU buffer size in KB, 0 for the default
    pub buffer_size_kb: usize,
    pub compact_sched: CompactSchedRequest,
    pub symbolize_ksyms: bool,
    pub use_monotonic_raw_clock: bool,
    pub enable_function_graph: bool,
    pub function_filters: Vec<String>,
    pub function_graph_roots: Vec<String>,
}

impl TraceRequest {
    /// Request for the given events and nothing else
    pub fn with_events<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ftrace_events: events.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Whether userspace annotations are involved
    pub fn requires_atrace(&self) -> bool {
        !self.atrace_categories.is_empty() || !self.atrace_apps.is_empty()
    }
}
