/*!
 * Facility Module
 * The shared tracefs control surface and its backends
 */

mod simulation;
mod traits;
mod tracefs;

pub use simulation::{AnnotationSession, SimulatedFacility};
pub use traits::{parse_clock_list, TraceFacility};
pub use tracefs::TraceFs;
