/*!
 * Facility Traits
 * Platform-agnostic access to the tracefs control surface
 */

use crate::core::errors::FacilityResult;
use crate::core::limits::*;
use std::collections::BTreeSet;

/// Access to the shared kernel tracing control files
///
/// Paths are relative to the tracefs root. Implementors only provide raw
/// file access and the annotation hooks; the typed helpers below are built on
/// top of them so every backend writes the same files the same way.
pub trait TraceFacility: Send + Sync {
    /// Replace the contents of a control file
    fn write_control(&self, path: &str, value: &str) -> FacilityResult<()>;

    /// Append to a control file (filter lists)
    fn append_control(&self, path: &str, value: &str) -> FacilityResult<()>;

    /// Read a control file
    fn read_control(&self, path: &str) -> FacilityResult<String>;

    /// Whether userspace annotations are currently held by someone else
    fn is_external_agent_active(&self) -> bool;

    /// Start userspace annotations for the given apps and categories
    fn start_annotations(&self, apps: &[String], categories: &[String]) -> FacilityResult<()>;

    /// Stop userspace annotations
    fn stop_annotations(&self) -> FacilityResult<()>;

    fn enable_event(&self, group: &str, name: &str) -> FacilityResult<()> {
        self.write_control(&format!("events/{}/{}/enable", group, name), "1")
    }

    fn disable_event(&self, group: &str, name: &str) -> FacilityResult<()> {
        self.write_control(&format!("events/{}/{}/enable", group, name), "0")
    }

    fn disable_all_events(&self) -> FacilityResult<()> {
        self.write_control(EVENTS_ENABLE, "0")
    }

    fn is_tracing_on(&self) -> FacilityResult<bool> {
        Ok(self.read_control(TRACING_ON)?.trim() == "1")
    }

    fn set_tracing_on(&self, on: bool) -> FacilityResult<()> {
        self.write_control(TRACING_ON, if on { "1" } else { "0" })
    }

    fn set_buffer_size_kb(&self, kb: usize) -> FacilityResult<()> {
        self.write_control(BUFFER_SIZE_KB, &kb.to_string())
    }

    /// Empty the ring buffers
    fn clear_trace(&self) -> FacilityResult<()> {
        self.write_control(TRACE, "")
    }

    /// Clock currently selected (the bracketed entry of `trace_clock`)
    fn clock(&self) -> FacilityResult<String> {
        let raw = self.read_control(TRACE_CLOCK)?;
        Ok(parse_clock_list(&raw).0.unwrap_or_default())
    }

    /// Clocks the kernel offers, empty when `trace_clock` cannot be read
    fn available_clocks(&self) -> BTreeSet<String> {
        match self.read_control(TRACE_CLOCK) {
            Ok(raw) => parse_clock_list(&raw).1,
            Err(_) => BTreeSet::new(),
        }
    }

    fn set_clock(&self, clock: &str) -> FacilityResult<()> {
        self.write_control(TRACE_CLOCK, clock)
    }

    fn current_tracer(&self) -> FacilityResult<String> {
        Ok(self.read_control(CURRENT_TRACER)?.trim().to_string())
    }

    fn set_current_tracer(&self, tracer: &str) -> FacilityResult<()> {
        self.write_control(CURRENT_TRACER, tracer)
    }

    fn reset_current_tracer(&self) -> FacilityResult<()> {
        self.set_current_tracer(NOP_TRACER)
    }

    /// Install the same filter expression on raw syscall entry and exit
    fn set_syscall_filter(&self, expression: &str) -> FacilityResult<()> {
        for event in RAW_SYSCALL_EVENTS {
            let path = format!("events/{}/{}/filter", RAW_SYSCALLS_GROUP, event);
            self.write_control(&path, expression)?;
        }
        Ok(())
    }

    fn clear_function_filters(&self) -> FacilityResult<()> {
        self.write_control(FTRACE_FILTER, "")
    }

    fn append_function_filters(&self, filters: &[String]) -> FacilityResult<()> {
        for filter in filters {
            self.append_control(FTRACE_FILTER, filter)?;
        }
        Ok(())
    }

    fn clear_function_graph_filters(&self) -> FacilityResult<()> {
        self.write_control(GRAPH_FILTER, "")
    }

    fn append_function_graph_filters(&self, roots: &[String]) -> FacilityResult<()> {
        for root in roots {
            self.append_control(GRAPH_FILTER, root)?;
        }
        Ok(())
    }
}

/// Split `trace_clock` contents into (current, available)
///
/// The kernel lists every clock on one line and brackets the selected one:
/// `local [global] counter uptime perf mono mono_raw boot`.
pub fn parse_clock_list(raw: &str) -> (Option<String>, BTreeSet<String>) {
    let mut current = None;
    let mut available = BTreeSet::new();
    for token in raw.split_whitespace() {
        let name = match token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(selected) => {
                current = Some(selected.to_string());
                selected
            }
            None => token,
        };
        available.insert(name.to_string());
    }
    (current, available)
}
