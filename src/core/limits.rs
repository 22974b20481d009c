/*!
 * System Limits and Constants
 *
 * Centralized location for tracefs paths, sizing limits and clock preferences.
 */

// =============================================================================
// BUFFER SIZING
// =============================================================================

/// Granularity of the per-CPU ring buffer (4KB)
/// [LINUX-COMPAT] Matches the kernel page size on the common architectures
pub const DEFAULT_PAGE_SIZE_KB: usize = 4;

/// Buffer size used when a request leaves it unset (2MB per CPU)
pub const DEFAULT_PER_CPU_BUFFER_KB: usize = 2 * 1024;

/// Upper bound for the per-CPU buffer (8192 pages = 32MB with 4KB pages)
pub const MAX_PER_CPU_BUFFER_PAGES: usize = 8192;

// =============================================================================
// CLOCKS
// =============================================================================

/// Clocks we are willing to install, most preferred first
/// `boot` keeps counting across suspend, `global` is monotonic across CPUs
pub const CLOCK_PRIORITY: &[&str] = &["boot", "global", "local"];

/// Raw monotonic clock, only chosen when a request asks for it
pub const MONO_RAW_CLOCK: &str = "mono_raw";

// =============================================================================
// TRACEFS LAYOUT
// =============================================================================

/// Mount points probed when no explicit root is configured
pub const TRACEFS_MOUNT_CANDIDATES: &[&str] = &["/sys/kernel/tracing", "/sys/kernel/debug/tracing"];

pub const TRACING_ON: &str = "tracing_on";
pub const BUFFER_SIZE_KB: &str = "buffer_size_kb";
pub const TRACE_CLOCK: &str = "trace_clock";
pub const CURRENT_TRACER: &str = "current_tracer";
pub const TRACE: &str = "trace";
pub const EVENTS_ENABLE: &str = "events/enable";
pub const FTRACE_FILTER: &str = "set_ftrace_filter";
pub const GRAPH_FILTER: &str = "set_graph_function";

/// Tracer the facility idles in
pub const NOP_TRACER: &str = "nop";

/// Tracer engaged for function graph sessions
pub const FUNCTION_GRAPH_TRACER: &str = "function_graph";

/// Event group carrying raw syscall entry/exit events
pub const RAW_SYSCALLS_GROUP: &str = "raw_syscalls";

/// Events inside the raw syscall group that carry a filter file
pub const RAW_SYSCALL_EVENTS: &[&str] = &["sys_enter", "sys_exit"];

/// Group of always-on events (`ftrace/print`, ...), they have no enable file
pub const FTRACE_GROUP: &str = "ftrace";

/// Filter expression that clears a syscall filter
pub const CLEAR_FILTER: &str = "0";

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// Default userspace annotation helper
pub const ATRACE_BINARY: &str = "/system/bin/atrace";
