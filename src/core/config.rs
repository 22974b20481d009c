/*!
 * Muxer Settings
 * Sizing and clock policy, with defaults from limits and environment overrides
 */

use crate::core::limits::{
    CLOCK_PRIORITY, DEFAULT_PAGE_SIZE_KB, DEFAULT_PER_CPU_BUFFER_KB, MAX_PER_CPU_BUFFER_PAGES,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding the ring buffer page size (KB)
pub const ENV_PAGE_SIZE_KB: &str = "TRACEMUX_PAGE_SIZE_KB";
/// Environment variable overriding the default per-CPU buffer (KB)
pub const ENV_DEFAULT_BUFFER_KB: &str = "TRACEMUX_DEFAULT_BUFFER_KB";
/// Environment variable overriding the per-CPU buffer cap (pages)
pub const ENV_MAX_BUFFER_PAGES: &str = "TRACEMUX_MAX_BUFFER_PAGES";
/// Environment variable pinning the tracefs root
pub const ENV_TRACEFS_ROOT: &str = "TRACEMUX_TRACEFS_ROOT";
/// Environment variable naming the annotation tag mask file
pub const ENV_ANNOTATION_FLAGS: &str = "TRACEMUX_ANNOTATION_FLAGS";

/// Policy knobs for a [`ConfigMuxer`](crate::muxer::ConfigMuxer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxerSettings {
    pub page_size_kb: usize,
    pub default_buffer_kb: usize,
    pub max_buffer_pages: usize,
    pub clock_priority: Vec<String>,
}

impl Default for MuxerSettings {
    fn default() -> Self {
        Self {
            page_size_kb: DEFAULT_PAGE_SIZE_KB,
            default_buffer_kb: DEFAULT_PER_CPU_BUFFER_KB,
            max_buffer_pages: MAX_PER_CPU_BUFFER_PAGES,
            clock_priority: CLOCK_PRIORITY.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl MuxerSettings {
    /// Defaults, overridden by `TRACEMUX_*` variables that parse as positive integers
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(v) = env_usize(ENV_PAGE_SIZE_KB) {
            settings.page_size_kb = v;
        }
        if let Some(v) = env_usize(ENV_DEFAULT_BUFFER_KB) {
            settings.default_buffer_kb = v;
        }
        if let Some(v) = env_usize(ENV_MAX_BUFFER_PAGES) {
            settings.max_buffer_pages = v;
        }
        settings
    }

    /// Translate a requested per-CPU size into ring buffer pages
    ///
    /// `0` selects the default size. The page count rounds up to the page
    /// granularity and is clamped to `[1, max_buffer_pages]`.
    pub fn buffer_pages_for(&self, requested_kb: usize) -> usize {
        let kb = if requested_kb == 0 {
            self.default_buffer_kb
        } else {
            requested_kb
        };
        let page_kb = self.page_size_kb.max(1);
        let pages = kb.div_ceil(page_kb);
        pages.clamp(1, self.max_buffer_pages.max(1))
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            warn!(key, value = %raw, "Ignoring invalid setting");
            None
        }
    }
}
