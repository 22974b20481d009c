/*!
 * Vendor Event Map
 * Vendor-defined annotation categories and the kernel events behind them
 */

use crate::core::types::GroupAndName;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Category name to `group/name` events, static for a muxer's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorEventMap {
    categories: BTreeMap<String, Vec<GroupAndName>>,
}

impl VendorEventMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: impl Into<String>, events: Vec<GroupAndName>) {
        self.categories.entry(category.into()).or_default().extend(events);
    }

    pub fn events_for(&self, category: &str) -> &[GroupAndName] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Parse the vendor category listing
    ///
    /// A category starts on an unindented line; its events follow on
    /// indented `group/name` lines. Blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();
        let mut current: Option<String> = None;

        for (lineno, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if !line.starts_with(char::is_whitespace) {
                map.categories.entry(trimmed.to_string()).or_default();
                current = Some(trimmed.to_string());
                continue;
            }

            match (&current, trimmed.split_once('/')) {
                (Some(category), Some((group, name))) if !group.is_empty() && !name.is_empty() => {
                    map.insert(category.clone(), vec![GroupAndName::new(group, name)]);
                }
                _ => warn!(line = lineno + 1, entry = trimmed, "Ignoring vendor event entry"),
            }
        }

        map
    }

    /// Load the listing at `path`; a missing file yields an empty map
    pub fn load(path: impl AsRef<Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => {
                let map = Self::parse(&text);
                info!(
                    path = %path.as_ref().display(),
                    categories = map.categories.len(),
                    "Vendor categories loaded"
                );
                map
            }
            Err(e) => {
                info!(path = %path.as_ref().display(), error = %e, "No vendor categories");
                Self::new()
            }
        }
    }
}

impl FromIterator<(String, Vec<GroupAndName>)> for VendorEventMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<GroupAndName>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (category, events) in iter {
            map.insert(category, events);
        }
        map
    }
}
