/*!
 * tracemux
 * Multiplexes concurrent tracing sessions onto the single kernel tracefs
 */

pub mod core;
pub mod facility;
pub mod monitoring;
pub mod muxer;
pub mod tables;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::{GroupAndName, MuxerSettings, SessionId, TraceClock};
pub use facility::{SimulatedFacility, TraceFacility, TraceFs};
pub use monitoring::init_tracing;
pub use muxer::{ConfigMuxer, SessionConfig, SetupErrors, SyscallFilter, TraceRequest};
pub use tables::{EventTable, SyscallTable, VendorEventMap};
