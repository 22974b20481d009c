/*!
 * Tables Module
 * Lookups the muxer consults: kernel events, syscalls and vendor categories
 */

mod events;
mod syscalls;
mod vendor;

pub use events::{Event, EventTable};
pub use syscalls::SyscallTable;
pub use vendor::VendorEventMap;
