//! Match-mode post filter.
//!
//! Delivers exactly one tuple of nearest-in-time samples around the oldest
//! ready sample of a designated reference stream, or nothing.

use std::collections::HashMap;
use std::hash::Hash;

use contracts::{TimeDelta, TimePoint};

use crate::entry::TimedEntry;

/// Best sample of one stream for the current reference, with its absolute
/// acquisition-time difference in seconds.
struct Candidate {
    idx: usize,
    tau: f64,
}

/// Outcome of a matching attempt.
#[derive(Debug, Default)]
pub(crate) struct MatchOutcome {
    /// Queue indices forming the tuple, ascending. Empty when no tuple can
    /// be emitted yet.
    pub tuple: Vec<usize>,
    /// Queue indices that must be dropped so matching can progress.
    pub dropped: Vec<usize>,
}

/// Try to form a tuple from the ready slots.
///
/// `ready` holds queue indices in ascending order. `reference_period` is the
/// estimated period of the reference stream, if an estimator exists for it.
/// `num_streams` is the number of streams a full tuple must cover.
pub(crate) fn run_matching<I, P>(
    queue: &[TimedEntry<I, P>],
    ready: &[usize],
    reference_stream: &I,
    reference_period: Option<TimeDelta>,
    num_streams: usize,
) -> MatchOutcome
where
    I: Eq + Hash + Clone,
{
    // The oldest ready reference sample anchors the tuple; the one after it
    // decides which side a sample belongs to.
    let mut ref_idx = None;
    let mut next_ref_time = None;
    for &idx in ready {
        if queue[idx].id != *reference_stream {
            continue;
        }
        if ref_idx.is_none() {
            ref_idx = Some(idx);
        } else {
            next_ref_time = Some(queue[idx].meas_time);
            break;
        }
    }
    let Some(ref_idx) = ref_idx else {
        return MatchOutcome::default();
    };
    let ref_time = queue[ref_idx].meas_time;
    let next_ref_time = next_ref_time.unwrap_or(match reference_period {
        Some(period) => ref_time + period,
        // without stream characteristics the next reference cannot be
        // anticipated
        None => TimePoint::EPOCH,
    });

    let mut candidates: HashMap<I, Candidate> = HashMap::new();
    candidates.insert(
        reference_stream.clone(),
        Candidate {
            idx: ref_idx,
            tau: 0.0,
        },
    );

    // Remember the highest visited queue index; the queue is sorted, so the
    // look-ahead below can start right after it.
    let mut last_visited = 0;
    for &idx in ready {
        last_visited = idx;
        let slot = &queue[idx];
        if slot.id == *reference_stream {
            // only the oldest reference may be considered
            continue;
        }

        let current_diff = (slot.meas_time - ref_time).abs();
        let next_diff = (slot.meas_time - next_ref_time).abs();
        if next_diff < current_diff {
            // indices are sorted, no later sample fits the current reference
            break;
        }

        let tau = current_diff.as_secs_f64();
        let candidate = candidates.entry(slot.id.clone()).or_insert(Candidate {
            idx,
            tau: f64::MAX,
        });
        if tau < candidate.tau {
            candidate.idx = idx;
            candidate.tau = tau;
        }
    }

    // Everything past the ready prefix is not available yet, placeholder or
    // not; if any of it would fit the current reference better, waiting
    // beats emitting a worse tuple now.
    let mut found_better = false;
    for (idx, slot) in queue.iter().enumerate().skip(last_visited + 1) {
        if slot.id == *reference_stream {
            continue;
        }

        let current_diff = (slot.meas_time - ref_time).abs();
        let next_diff = (slot.meas_time - next_ref_time).abs();
        if next_diff < current_diff {
            break;
        }

        // creating entries for unseen streams is intended here: a stream
        // whose first sample is still pending counts towards the tuple
        let candidate = candidates.entry(slot.id.clone()).or_insert(Candidate {
            idx,
            tau: f64::MAX,
        });
        if current_diff.as_secs_f64() < candidate.tau {
            found_better = true;
            break;
        }
    }

    if candidates.len() != num_streams {
        // No full tuple is possible, not even an anticipated one. Dropping
        // the reference lets matching progress next time; everything else
        // ages out on its own once the buffer time advances.
        return MatchOutcome {
            tuple: Vec::new(),
            dropped: vec![ref_idx],
        };
    }

    if found_better {
        return MatchOutcome::default();
    }

    let mut tuple: Vec<usize> = candidates.values().map(|candidate| candidate.idx).collect();
    tuple.sort_unstable();
    MatchOutcome {
        tuple,
        dropped: Vec::new(),
    }
}
