//! Reservation of future queue slots from per-stream statistics.
//!
//! Placeholders make the queue aware of samples that are statistically
//! expected but not received yet, so a low-latency stream cannot overtake a
//! high-latency one just because its data arrives first.

use contracts::{BufferParams, TimeDelta, TimePoint};

use crate::entry::TimedEntry;
use crate::estimator::StreamCharacteristicsEstimator;
use crate::normal;

/// Upper bound of follow-up placeholders generated from a single slot.
/// Reaching it indicates badly converged estimates, not an error.
pub(crate) const MAX_SPAWNED_PLACEHOLDERS: usize = 10;

/// Generate the reservations that follow `slot` in its stream.
///
/// Followers are produced for one expected period after another until the
/// first one whose earliest estimated measurement time lies beyond
/// `buffer_time`; only that frontier follower keeps the right to spawn
/// further reservations later, everything before it is already covered.
///
/// Slots of uninitialized streams and slots that spawned before produce
/// nothing.
pub(crate) fn spawn_followers<I, P, R>(
    slot: &mut TimedEntry<I, P>,
    estimator: Option<&StreamCharacteristicsEstimator>,
    params: &BufferParams<R>,
    buffer_time: TimePoint,
) -> Vec<TimedEntry<I, P>>
where
    I: Clone,
{
    let Some(estimator) = estimator else {
        return Vec::new();
    };
    if !estimator.is_initialized() || slot.spawned_placeholders {
        return Vec::new();
    }
    slot.spawned_placeholders = true;

    let mut followers = Vec::new();
    for index in 1..=MAX_SPAWNED_PLACEHOLDERS {
        let mut follower = nth_follower(slot.id.clone(), estimator, slot.meas_time, index, params);
        let frontier = follower.earliest_estimated_meas_time > buffer_time;
        follower.spawned_placeholders = !frontier;
        followers.push(follower);
        if frontier {
            break;
        }
    }
    followers
}

/// Build the reservation for the `index`-th expected future arrival of a
/// stream, starting from the measurement time of its latest sample.
fn nth_follower<I, P, R>(
    id: I,
    estimator: &StreamCharacteristicsEstimator,
    base_meas_time: TimePoint,
    index: usize,
    params: &BufferParams<R>,
) -> TimedEntry<I, P> {
    let period_offset = estimator.period() * index as i64;
    let period_variance = (estimator.period_stddev().as_nanos() as f64).powi(2);
    let period_spread = (index as f64 * period_variance).sqrt();

    // The reservation is placed at its worst-case expected time (left jitter
    // boundary). Evaluated without a mean, so the magnitude is valid in both
    // directions.
    let mut meas_jitter = TimeDelta::ZERO;
    if period_spread > 0.0 {
        let lower_tail = (1.0 - params.measurement_confidence_quantile) / 2.0;
        let value = normal::quantile(0.0, period_spread, lower_tail);
        meas_jitter = TimeDelta::from_nanos(value as i64).clamp(
            -params.max_abs_measurement_jitter,
            params.max_abs_measurement_jitter,
        );
    }

    let mut wait_jitter = TimeDelta::ZERO;
    let latency_spread = estimator.latency_stddev().as_nanos() as f64;
    if latency_spread > 0.0 {
        let upper_tail = 1.0 - (1.0 - params.wait_confidence_quantile) / 2.0;
        let wait_spread = period_spread.hypot(latency_spread);
        let value = normal::quantile(0.0, wait_spread, upper_tail);
        wait_jitter = TimeDelta::from_nanos(value as i64)
            .clamp(-params.max_abs_wait_jitter, params.max_abs_wait_jitter);
    }

    let earliest_meas_time = base_meas_time + period_offset + meas_jitter;
    let latest_receipt_time = base_meas_time
        + period_offset
        + (estimator.latency() + wait_jitter).min(params.max_total_wait_time);

    TimedEntry {
        id,
        meas_time: earliest_meas_time,
        receipt_time: latest_receipt_time,
        earliest_estimated_meas_time: earliest_meas_time,
        latest_receipt_time,
        payload: None,
        spawned_placeholders: false,
    }
}
