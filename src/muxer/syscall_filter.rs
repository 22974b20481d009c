/*!
 * Syscall Filter
 * Three-state syscall selection with join semantics
 */

use crate::core::limits::CLEAR_FILTER;
use crate::core::types::SyscallId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Syscalls a session (or the union of sessions) wants traced
///
/// `None` is the bottom of the join and `All` the top; explicit sets union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ids")]
pub enum SyscallFilter {
    /// No raw syscall events requested
    #[default]
    None,
    /// Only these syscalls
    Explicit(BTreeSet<SyscallId>),
    /// Every syscall
    All,
}

impl SyscallFilter {
    /// Explicit filter; an empty set collapses to `None`
    pub fn explicit(ids: impl IntoIterator<Item = SyscallId>) -> Self {
        let ids: BTreeSet<_> = ids.into_iter().collect();
        if ids.is_empty() {
            SyscallFilter::None
        } else {
            SyscallFilter::Explicit(ids)
        }
    }

    /// Least filter admitting everything either side admits
    pub fn union(&self, other: &SyscallFilter) -> SyscallFilter {
        match (self, other) {
            (SyscallFilter::All, _) | (_, SyscallFilter::All) => SyscallFilter::All,
            (SyscallFilter::None, x) | (x, SyscallFilter::None) => x.clone(),
            (SyscallFilter::Explicit(a), SyscallFilter::Explicit(b)) => {
                SyscallFilter::Explicit(a.union(b).copied().collect())
            }
        }
    }

    pub fn union_with(&mut self, other: &SyscallFilter) {
        *self = self.union(other);
    }

    /// Ids the kernel filter must restrict to; `None` means "no restriction"
    pub fn restriction(&self) -> Option<&BTreeSet<SyscallId>> {
        match self {
            SyscallFilter::Explicit(ids) if !ids.is_empty() => Some(ids),
            _ => None,
        }
    }

    /// Filter expression for `events/raw_syscalls/*/filter`
    pub fn expression(&self) -> String {
        match self.restriction() {
            Some(ids) => ids
                .iter()
                .map(|id| format!("id == {}", id))
                .collect::<Vec<_>>()
                .join(" || "),
            None => CLEAR_FILTER.to_string(),
        }
    }
}
