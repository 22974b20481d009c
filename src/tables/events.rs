/*!
 * Event Table
 * Translation between event names and the numeric ids the kernel assigns
 */

use crate::core::errors::{TableError, TableResult};
use crate::core::types::{EventId, GroupAndName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Kernel trace event known to the running kernel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub group: String,
    pub name: String,
}

impl Event {
    pub fn new(id: EventId, group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn group_and_name(&self) -> GroupAndName {
        GroupAndName::new(self.group.clone(), self.name.clone())
    }
}

/// Events available on the running kernel
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    by_id: BTreeMap<EventId, Event>,
    by_group: BTreeMap<String, BTreeMap<String, EventId>>,
    by_name: BTreeMap<String, EventId>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut table = Self::new();
        for event in events {
            table.insert(event);
        }
        table
    }

    /// Scan `<root>/events/<group>/<event>/id`
    ///
    /// Entries without a readable id are skipped.
    pub fn from_tracefs(root: impl AsRef<Path>) -> TableResult<Self> {
        let events_dir = root.as_ref().join("events");
        let mut table = Self::new();

        for group_dir in sorted_dirs(&events_dir)? {
            let group = file_name(&group_dir);
            for event_dir in sorted_dirs(&group_dir)? {
                let id_path = event_dir.join("id");
                if !id_path.is_file() {
                    continue;
                }
                match read_id(&id_path) {
                    Ok(id) => table.insert(Event::new(id, group.clone(), file_name(&event_dir))),
                    Err(e) => warn!(error = %e, "Skipping event"),
                }
            }
        }

        info!(events = table.len(), root = %root.as_ref().display(), "Event table loaded");
        Ok(table)
    }

    /// Add an event; the first event registered under a bare name owns it
    pub fn insert(&mut self, event: Event) {
        self.by_group
            .entry(event.group.clone())
            .or_default()
            .insert(event.name.clone(), event.id);
        self.by_name.entry(event.name.clone()).or_insert(event.id);
        self.by_id.insert(event.id, event);
    }

    pub fn get(&self, event: &GroupAndName) -> Option<&Event> {
        let id = self.by_group.get(&event.group)?.get(&event.name)?;
        self.by_id.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Event> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    pub fn get_by_id(&self, id: EventId) -> Option<&Event> {
        self.by_id.get(&id)
    }

    /// Events of `group`, ordered by name
    pub fn events_in_group(&self, group: &str) -> Vec<&Event> {
        self.by_group
            .get(group)
            .map(|events| events.values().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Whether the scheduling events needed for compact encoding exist
    pub fn compact_sched_supported(&self) -> bool {
        ["sched_switch", "sched_waking"]
            .iter()
            .all(|name| self.get(&GroupAndName::new("sched", *name)).is_some())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

fn sorted_dirs(dir: &Path) -> TableResult<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| TableError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut dirs: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_id(path: &Path) -> TableResult<EventId> {
    let raw = fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let id = raw.trim().parse::<EventId>().map_err(|_| TableError::MalformedId {
        path: path.display().to_string(),
        value: raw.trim().to_string(),
    })?;
    debug!(path = %path.display(), id, "Read event id");
    Ok(id)
}
