/*!
 * Clock Selection
 */

use crate::core::limits::MONO_RAW_CLOCK;
use std::collections::BTreeSet;

/// Pick the clock to run the facility on
///
/// `mono_raw` when asked for and available, otherwise the first entry of
/// `priority` the kernel offers. `None` leaves the current clock alone.
pub(crate) fn choose_clock(
    available: &BTreeSet<String>,
    priority: &[String],
    want_mono_raw: bool,
) -> Option<String> {
    if want_mono_raw && available.contains(MONO_RAW_CLOCK) {
        return Some(MONO_RAW_CLOCK.to_string());
    }
    priority.iter().find(|clock| available.contains(*clock)).cloned()
}
