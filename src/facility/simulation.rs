/*!
 * Simulated Facility
 * In-memory control files for testing and hosts without tracefs
 */

use super::traits::TraceFacility;
use crate::core::errors::{FacilityError, FacilityResult};
use crate::core::limits::*;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const DEFAULT_CLOCKS: &str = "[local] global counter uptime perf mono mono_raw boot";

/// Userspace annotation session started through the simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSession {
    pub apps: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Default)]
struct SimulationInner {
    files: BTreeMap<String, String>,
    write_log: Vec<(String, String)>,
    failing_writes: BTreeSet<String>,
    failing_reads: BTreeSet<String>,
    external_agent: bool,
    annotations: Option<AnnotationSession>,
    annotation_starts: usize,
    annotation_failure: Option<String>,
}

/// Simulation-based facility
///
/// Cloning shares the same files, so a test can keep a handle while the muxer
/// borrows another.
#[derive(Clone)]
pub struct SimulatedFacility {
    inner: Arc<RwLock<SimulationInner>>,
}

impl SimulatedFacility {
    /// Idle facility: tracing off, `nop` tracer, kernel default clock list
    pub fn new() -> Self {
        let mut files = BTreeMap::new();
        files.insert(TRACING_ON.to_string(), "0".to_string());
        files.insert(CURRENT_TRACER.to_string(), NOP_TRACER.to_string());
        files.insert(TRACE_CLOCK.to_string(), DEFAULT_CLOCKS.to_string());
        files.insert(BUFFER_SIZE_KB.to_string(), "1408".to_string());
        files.insert(TRACE.to_string(), String::new());
        files.insert(FTRACE_FILTER.to_string(), String::new());
        files.insert(GRAPH_FILTER.to_string(), String::new());
        Self {
            inner: Arc::new(RwLock::new(SimulationInner {
                files,
                ..Default::default()
            })),
        }
    }

    /// Replace the `trace_clock` listing, e.g. `"local [global]"`
    pub fn with_clocks(self, listing: &str) -> Self {
        self.poke(TRACE_CLOCK, listing);
        self
    }

    /// Write a control file as an outside agent would (not logged)
    pub fn poke(&self, path: &str, value: &str) {
        self.inner
            .write()
            .files
            .insert(path.to_string(), value.to_string());
    }

    /// Raw contents of a control file
    pub fn value(&self, path: &str) -> Option<String> {
        self.inner.read().files.get(path).cloned()
    }

    pub fn is_event_enabled(&self, group: &str, name: &str) -> bool {
        self.value(&format!("events/{}/{}/enable", group, name))
            .map(|v| v == "1")
            .unwrap_or(false)
    }

    /// Every event whose enable file reads `1`, as `group/name`
    pub fn enabled_events(&self) -> BTreeSet<String> {
        self.inner
            .read()
            .files
            .iter()
            .filter(|(path, value)| path.ends_with("/enable") && value.as_str() == "1")
            .filter_map(|(path, _)| {
                path.strip_prefix("events/")
                    .and_then(|p| p.strip_suffix("/enable"))
                    .map(str::to_string)
            })
            .collect()
    }

    pub fn tracing_on(&self) -> bool {
        self.value(TRACING_ON).as_deref() == Some("1")
    }

    /// Every successful write, in order
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner.read().write_log.clone()
    }

    /// Successful writes to one path, in order
    pub fn writes_to(&self, path: &str) -> Vec<String> {
        self.inner
            .read()
            .write_log
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn clear_log(&self) {
        self.inner.write().write_log.clear();
    }

    /// Make writes to `path` fail until [`clear_failures`](Self::clear_failures)
    pub fn fail_writes_to(&self, path: &str) {
        self.inner.write().failing_writes.insert(path.to_string());
    }

    /// Make reads of `path` fail until [`clear_failures`](Self::clear_failures)
    pub fn fail_reads_of(&self, path: &str) {
        self.inner.write().failing_reads.insert(path.to_string());
    }

    /// Make the next annotation starts fail with `reason`
    pub fn fail_annotations(&self, reason: &str) {
        self.inner.write().annotation_failure = Some(reason.to_string());
    }

    pub fn clear_failures(&self) {
        let mut inner = self.inner.write();
        inner.failing_writes.clear();
        inner.failing_reads.clear();
        inner.annotation_failure = None;
    }

    /// Pretend another tool holds userspace annotations
    pub fn set_external_agent_active(&self, active: bool) {
        self.inner.write().external_agent = active;
    }

    /// Annotation session currently running, if any
    pub fn annotations(&self) -> Option<AnnotationSession> {
        self.inner.read().annotations.clone()
    }

    /// How many times annotations were (re)started
    pub fn annotation_starts(&self) -> usize {
        self.inner.read().annotation_starts
    }
}

impl Default for SimulatedFacility {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceFacility for SimulatedFacility {
    fn write_control(&self, path: &str, value: &str) -> FacilityResult<()> {
        let mut inner = self.inner.write();
        if inner.failing_writes.contains(path) {
            return Err(FacilityError::WriteFailed {
                path: path.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        match path {
            EVENTS_ENABLE => {
                for (file, current) in inner.files.iter_mut() {
                    if file.starts_with("events/") && file.ends_with("/enable") {
                        *current = value.to_string();
                    }
                }
            }
            TRACE_CLOCK => {
                let listing = inner.files.get(TRACE_CLOCK).cloned().unwrap_or_default();
                let (_, available) = super::traits::parse_clock_list(&listing);
                if !available.contains(value) {
                    return Err(FacilityError::WriteFailed {
                        path: path.to_string(),
                        reason: format!("clock {} not available", value),
                    });
                }
                let relisted = listing
                    .split_whitespace()
                    .map(|token| {
                        let name = token.trim_start_matches('[').trim_end_matches(']');
                        if name == value {
                            format!("[{}]", name)
                        } else {
                            name.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                inner.files.insert(TRACE_CLOCK.to_string(), relisted);
            }
            _ => {
                inner.files.insert(path.to_string(), value.to_string());
            }
        }

        inner.write_log.push((path.to_string(), value.to_string()));
        Ok(())
    }

    fn append_control(&self, path: &str, value: &str) -> FacilityResult<()> {
        let mut inner = self.inner.write();
        if inner.failing_writes.contains(path) {
            return Err(FacilityError::WriteFailed {
                path: path.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        let entry = inner.files.entry(path.to_string()).or_default();
        if !entry.is_empty() {
            entry.push('\n');
        }
        entry.push_str(value);
        inner.write_log.push((path.to_string(), value.to_string()));
        Ok(())
    }

    fn read_control(&self, path: &str) -> FacilityResult<String> {
        let inner = self.inner.read();
        if inner.failing_reads.contains(path) {
            return Err(FacilityError::ReadFailed {
                path: path.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FacilityError::ReadFailed {
                path: path.to_string(),
                reason: "no such file".to_string(),
            })
    }

    fn is_external_agent_active(&self) -> bool {
        self.inner.read().external_agent
    }

    fn start_annotations(&self, apps: &[String], categories: &[String]) -> FacilityResult<()> {
        let mut inner = self.inner.write();
        if let Some(reason) = inner.annotation_failure.clone() {
            return Err(FacilityError::Unsupported { operation: reason });
        }
        inner.annotations = Some(AnnotationSession {
            apps: apps.to_vec(),
            categories: categories.to_vec(),
        });
        inner.annotation_starts += 1;
        Ok(())
    }

    fn stop_annotations(&self) -> FacilityResult<()> {
        self.inner.write().annotations = None;
        Ok(())
    }
}
