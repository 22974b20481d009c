/*!
 * Core Types
 * Identifiers shared by the muxer, the facility adapters and the lookup tables
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric id of a kernel trace event (the `id` file under `events/<group>/<name>`)
pub type EventId = usize;

/// Architecture specific syscall number
pub type SyscallId = usize;

/// Handle for a registered trace session
///
/// Ids are handed out by the muxer in strictly increasing order and are never
/// reused. `SessionId::INVALID` is returned when setup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Sentinel for "no session"
    pub const INVALID: SessionId = SessionId(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Id following this one, `None` once the counter is exhausted
    pub(crate) fn next(self) -> Option<SessionId> {
        self.0.checked_add(1).map(SessionId)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully qualified event name, e.g. `sched/sched_switch`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupAndName {
    pub group: String,
    pub name: String,
}

impl GroupAndName {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Split `group/name`; a bare `name` yields an empty group
    pub fn parse(value: &str) -> Self {
        match value.split_once('/') {
            Some((group, name)) => Self::new(group, name),
            None => Self::new("", value),
        }
    }

    /// True for `group/*`
    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

impl fmt::Display for GroupAndName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Clock the facility stamps its records with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceClock {
    Boot,
    Global,
    Local,
    MonoRaw,
    /// Some clock we do not model (`perf`, `x86-tsc`, ...)
    Unknown,
}

impl TraceClock {
    pub fn from_name(name: &str) -> Self {
        match name {
            "boot" => TraceClock::Boot,
            "global" => TraceClock::Global,
            "local" => TraceClock::Local,
            "mono_raw" => TraceClock::MonoRaw,
            _ => TraceClock::Unknown,
        }
    }
}
