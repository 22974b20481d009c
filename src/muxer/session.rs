/*!
 * Session Configuration
 * Resolved per-session state and the setup error report
 */

use super::filter::EventFilter;
use super::syscall_filter::SyscallFilter;
use crate::core::errors::MuxerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Compact scheduling encoding as granted to a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactSchedConfig {
    /// Requested and supported by the kernel's sched event formats
    pub enabled: bool,
}

/// Resolved configuration of one registered session
///
/// Immutable after setup. Readers use it to decide which records of the
/// shared buffer belong to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub event_filter: EventFilter,
    pub syscall_filter: SyscallFilter,
    pub compact_sched: CompactSchedConfig,
    pub atrace_apps: Vec<String>,
    pub atrace_categories: Vec<String>,
    pub symbolize_ksyms: bool,
    pub function_graph: bool,
}

/// Non-fatal problems found while setting up a session, plus the fatal one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupErrors {
    /// Events the kernel does not know about
    pub unknown_events: BTreeSet<String>,
    /// Events the kernel refused to enable
    pub failed_events: BTreeSet<String>,
    /// Syscall names missing from the syscall table
    pub unknown_syscalls: BTreeSet<String>,
    pub annotation_errors: Vec<String>,
    /// Why setup returned the invalid id
    pub fatal: Option<MuxerError>,
}

impl SetupErrors {
    pub fn is_empty(&self) -> bool {
        self.unknown_events.is_empty()
            && self.failed_events.is_empty()
            && self.unknown_syscalls.is_empty()
            && self.annotation_errors.is_empty()
            && self.fatal.is_none()
    }

    /// Report for shipping back to whoever asked for the session
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
