//! Batch-mode post filter.
//!
//! Holds ready output back when waiting a little longer would let more
//! samples of the same scene be delivered together.

use contracts::{TimeDelta, TimePoint};

use crate::entry::TimedEntry;

/// Decide whether the ready slots should be released now or deferred.
///
/// `ready` holds queue indices in ascending order. When any reservation
/// within `max_delta` of the first ready measurement can still be fulfilled
/// (its latest reception time lies beyond `horizon`), everything is
/// deferred; otherwise `ready` passes through unchanged.
pub(crate) fn run_batching<I, P>(
    queue: &[TimedEntry<I, P>],
    ready: Vec<usize>,
    horizon: TimePoint,
    max_delta: TimeDelta,
) -> Vec<usize> {
    let (Some(&first), Some(&last)) = (ready.first(), ready.last()) else {
        return ready;
    };
    let batch_start = queue[first].meas_time;

    let worth_waiting = queue[last..].iter().any(|slot| {
        slot.is_placeholder()
            && slot.earliest_estimated_meas_time - batch_start < max_delta
            && slot.latest_receipt_time > horizon
    });

    if worth_waiting {
        // prevent output of the ready slots for now
        return Vec::new();
    }
    ready
}
