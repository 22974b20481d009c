/*!
 * Muxer Module
 * Session registry and the arbitration of the shared facility
 */

mod clock;
mod filter;
mod manager;
mod request;
mod resolve;
mod session;
mod state;
mod syscall_filter;

pub use filter::EventFilter;
pub use manager::ConfigMuxer;
pub use request::{CompactSchedRequest, TraceRequest};
pub use resolve::{resolve_events, ATRACE_PRINT_EVENT};
pub use session::{CompactSchedConfig, SessionConfig, SetupErrors};
pub use syscall_filter::SyscallFilter;
