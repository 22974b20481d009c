/*!
 * Event Filter
 * Set of enabled event ids
 */

use crate::core::types::EventId;
use crate::tables::EventTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which trace events are enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    enabled: BTreeSet<EventId>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: EventId) {
        self.enabled.insert(id);
    }

    pub fn remove(&mut self, id: EventId) {
        self.enabled.remove(&id);
    }

    pub fn is_enabled(&self, id: EventId) -> bool {
        self.enabled.contains(&id)
    }

    /// Enable every event enabled in `other`
    pub fn union_with(&mut self, other: &EventFilter) {
        self.enabled.extend(other.enabled.iter().copied());
    }

    /// Whether at least one enabled event belongs to `group`
    pub fn has_group(&self, group: &str, table: &EventTable) -> bool {
        self.enabled
            .iter()
            .filter_map(|id| table.get_by_id(*id))
            .any(|event| event.group == group)
    }

    /// Whether every event enabled here is also enabled in `other`
    pub fn is_subset(&self, other: &EventFilter) -> bool {
        self.enabled.is_subset(&other.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = EventId> + '_ {
        self.enabled.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

impl FromIterator<EventId> for EventFilter {
    fn from_iter<I: IntoIterator<Item = EventId>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}
