//! The reordering buffer core.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use contracts::{
    BufferMode, BufferParams, PopResult, PushOutcome, StreamId, TimeDelta, TimePoint,
};
use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::batch;
use crate::entry::TimedEntry;
use crate::estimator::StreamCharacteristicsEstimator;
use crate::matching;
use crate::placeholder;

/// Reordering buffer ensuring in-sequence processing of incoming samples
/// across independent source streams.
///
/// Assumptions:
/// - update period and latency change slowly relative to the measurement
///   frequency
/// - every stream delivers samples with increasing measurement time stamps
/// - a single caller serializes `push` and `pop`
///
/// Jumps in update period or latency are tolerated but may lead to
/// suboptimal delivery delay until the estimates have converged again.
pub struct ReorderBuffer<P, I = StreamId> {
    params: BufferParams<I>,
    /// Global queue of samples and placeholders, sorted by measurement time.
    queue: Vec<TimedEntry<I, P>>,
    /// Per-stream timing estimators.
    estimators: HashMap<I, StreamCharacteristicsEstimator>,
    /// Measurement time of the last delivered sample; lower bound for every
    /// future delivery.
    buffer_time: TimePoint,
    /// Maximum receipt time seen so far, used to detect clock regressions.
    current_time: TimePoint,
}

impl<P, I> ReorderBuffer<P, I>
where
    I: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty buffer with the given parameters.
    pub fn new(params: BufferParams<I>) -> Self {
        Self {
            params,
            queue: Vec::new(),
            estimators: HashMap::new(),
            buffer_time: TimePoint::EPOCH,
            current_time: TimePoint::EPOCH,
        }
    }

    /// Hand a sample of stream `id` over to the buffer.
    ///
    /// Returns [`PushOutcome::Reset`] when the receipt time jumped backwards
    /// past the configured threshold, in which case the whole buffer state
    /// was discarded along with the sample.
    #[instrument(
        level = "trace",
        name = "reorder_buffer_push",
        skip(self, payload),
        fields(stream = ?id, meas_time = ?meas_time, receipt_time = ?receipt_time)
    )]
    pub fn push(
        &mut self,
        id: I,
        receipt_time: TimePoint,
        meas_time: TimePoint,
        payload: P,
    ) -> PushOutcome {
        debug_assert!(self.queue_is_sorted(), "queue not sorted by meas_time");

        // Samples should arrive in consecutive receipt-time order. Looped
        // recordings violate that assumption wholesale, so a large jump into
        // the past restarts the buffer instead of poisoning the estimates.
        if self.current_time - receipt_time > self.params.reset_threshold {
            warn!(
                receipt_time = ?receipt_time,
                current_time = ?self.current_time,
                "receipt time regressed past the reset threshold, resetting"
            );
            counter!("reorder_buffer_resets_total").increment(1);
            self.reset();
            return PushOutcome::Reset;
        }
        self.current_time = self.current_time.max(receipt_time);

        let Some(half_period) = self.estimators.get(&id).map(|e| e.period() / 2) else {
            // First contact with this stream. Latency is usable immediately,
            // the period needs a second sample, so no reservations yet.
            self.estimators.insert(
                id.clone(),
                StreamCharacteristicsEstimator::new(
                    receipt_time,
                    meas_time,
                    self.params.estimator_alpha,
                ),
            );
            self.queue
                .push(TimedEntry::measurement(id, meas_time, receipt_time, payload));
            self.sort_queue();
            return PushOutcome::Accepted;
        };

        // Search the reservation closest to this measurement. Anything at
        // least half a period away is either a new slot or a gross estimate,
        // so it does not count as a match.
        let mut min_distance = half_period;
        let mut best: Option<usize> = None;
        let mut num_missed = 0usize;
        for (idx, slot) in self.queue.iter().enumerate() {
            if slot.id != id || !slot.is_placeholder() {
                continue;
            }
            // every reservation older than the sample counts as missed, the
            // best fit is subtracted again below
            if slot.meas_time < meas_time {
                num_missed += 1;
            }
            let distance = (slot.meas_time - meas_time).abs();
            if distance < min_distance {
                min_distance = distance;
                best = Some(idx);
            }
        }

        match best {
            Some(idx) => {
                if num_missed > 0 && meas_time > self.queue[idx].meas_time {
                    // the best fit itself was counted as missed
                    num_missed -= 1;
                }

                // fulfill the reservation with the received measurement
                let estimator = self.estimators.get(&id);
                let slot = &mut self.queue[idx];
                slot.payload = Some(payload);
                slot.meas_time = meas_time;
                slot.receipt_time = receipt_time;
                let followers =
                    placeholder::spawn_followers(slot, estimator, &self.params, self.buffer_time);
                self.queue.extend(followers);
            }
            None => {
                let mut slot = TimedEntry::measurement(id.clone(), meas_time, receipt_time, payload);
                let followers = placeholder::spawn_followers(
                    &mut slot,
                    self.estimators.get(&id),
                    &self.params,
                    self.buffer_time,
                );
                self.queue.extend(followers);
                self.queue.push(slot);
            }
        }

        let matched = best.is_some();
        let update_result = match self.estimators.get_mut(&id) {
            Some(estimator) if !estimator.is_initialized() => {
                // the missed count is meaningless before reservations exist
                estimator.update(receipt_time, meas_time, 0)
            }
            Some(estimator) if matched => estimator.update(receipt_time, meas_time, num_missed),
            Some(estimator) => {
                // without a matching reservation the missed count is
                // unreliable, only the latency sample is trustworthy
                estimator.update_latency_only(receipt_time, meas_time);
                Ok(())
            }
            None => Ok(()),
        };
        if let Err(error) = update_result {
            warn!(%error, "skipping estimator update, keeping previous stream statistics");
            counter!("reorder_buffer_estimator_skips_total").increment(1);
        }

        // reservations this measurement has overtaken are no longer needed
        self.queue
            .retain(|slot| !(slot.is_placeholder() && slot.id == id && slot.meas_time < meas_time));

        self.sort_queue();
        PushOutcome::Accepted
    }

    /// Release every sample that can be delivered at time `now` without
    /// risking an out-of-sequence delivery later.
    #[instrument(level = "trace", name = "reorder_buffer_pop", skip(self), fields(now = ?now))]
    pub fn pop(&mut self, now: TimePoint) -> PopResult<I, P> {
        debug_assert!(self.queue_is_sorted(), "queue not sorted by meas_time");

        // push or pop already saw a later clock value; the caller's clock
        // regressed and nothing can be released safely
        if now < self.current_time {
            debug!(
                now = ?now,
                current_time = ?self.current_time,
                "pop with regressed clock"
            );
            return PopResult {
                buffer_time: self.buffer_time,
                delivered: Vec::new(),
                discarded: Vec::new(),
            };
        }

        let mut horizon = now;
        let mut output: Vec<usize> = Vec::new();
        let mut discard: Vec<usize> = Vec::new();
        let mut delete: Vec<usize> = Vec::new();
        let mut spawned: Vec<TimedEntry<I, P>> = Vec::new();

        let mut idx = 0;
        while idx < self.queue.len() {
            let slot = &self.queue[idx];
            if slot.meas_time < self.buffer_time {
                // Older than our last output, e.g. we stopped waiting for a
                // stream and its data arrived a little later. Delivering it
                // would break the in-sequence guarantee. Stale placeholders
                // are cleaned up during push and simply pass through here.
                if !slot.is_placeholder() {
                    discard.push(idx);
                    delete.push(idx);
                }
            } else if slot.is_placeholder() {
                if slot.latest_receipt_time >= horizon {
                    // the reserved sample can still arrive in time
                    break;
                }
                // reservation timed out, release whatever follows it
            } else if slot.meas_time > horizon {
                break;
            } else {
                output.push(idx);
            }

            // Walked slots may reserve their own follow-up slots. Clamping
            // the horizon keeps the walk from overtaking a reservation that
            // was created just now.
            let id = self.queue[idx].id.clone();
            let estimator = self.estimators.get(&id);
            let followers = placeholder::spawn_followers(
                &mut self.queue[idx],
                estimator,
                &self.params,
                self.buffer_time,
            );
            if let Some(last) = followers.last() {
                horizon = horizon.min(last.meas_time);
            }
            spawned.extend(followers);
            idx += 1;
        }

        if !output.is_empty() {
            match self.params.mode {
                BufferMode::Single => {}
                BufferMode::Batch => {
                    output =
                        batch::run_batching(&self.queue, output, horizon, self.params.batch.max_delta);
                }
                BufferMode::Match => {
                    let decision = match self.params.matching.reference_stream.as_ref() {
                        Some(reference) => {
                            let num_streams = self
                                .params
                                .matching
                                .num_streams
                                .unwrap_or(self.estimators.len());
                            let reference_period =
                                self.estimators.get(reference).map(|e| e.period());
                            matching::run_matching(
                                &self.queue,
                                &output,
                                reference,
                                reference_period,
                                num_streams,
                            )
                        }
                        None => matching::MatchOutcome::default(),
                    };
                    output = decision.tuple;
                    for idx in decision.dropped {
                        delete.push(idx);
                        discard.push(idx);
                    }
                }
            }
        }

        // materialize in queue order so deliveries stay sorted by meas_time
        let mut delivered = Vec::with_capacity(output.len());
        for &idx in &output {
            delivered.extend(self.queue[idx].take_sample());
        }
        let mut discarded = Vec::with_capacity(discard.len());
        for &idx in &discard {
            discarded.extend(self.queue[idx].take_sample());
        }

        delete.extend(output.iter().copied());
        remove_indices(&mut self.queue, &mut delete);
        self.queue.append(&mut spawned);
        self.sort_queue();

        // Advance the buffer time to the newest delivered measurement; any
        // later arrival with an older stamp must be discarded or we would
        // forward an out-of-sequence measurement.
        if let Some(last) = delivered.last() {
            self.buffer_time = last.meas_time;
        }

        if !delivered.is_empty() {
            counter!("reorder_buffer_delivered_total").increment(delivered.len() as u64);
        }
        if !discarded.is_empty() {
            counter!("reorder_buffer_discarded_total").increment(discarded.len() as u64);
        }

        PopResult {
            buffer_time: self.buffer_time,
            delivered,
            discarded,
        }
    }

    /// Number of real samples currently held back (placeholders excluded).
    pub fn num_queued_samples(&self) -> usize {
        self.queue
            .iter()
            .filter(|slot| !slot.is_placeholder())
            .count()
    }

    /// Measurement time of the latest delivered sample.
    pub fn buffer_time(&self) -> TimePoint {
        self.buffer_time
    }

    /// Next expected measurement time stamp.
    ///
    /// With the configured confidence, no measurement older than the
    /// returned time will be received in the future (new streams excluded).
    pub fn estimated_buffer_time(&self) -> TimePoint {
        self.queue
            .first()
            .map(|slot| slot.meas_time)
            .unwrap_or(self.buffer_time)
    }

    /// Oldest reception time across all samples currently held back, or
    /// `None` when no real sample is queued.
    pub fn earliest_hold_back_reception_time(&self) -> Option<TimePoint> {
        self.queue
            .iter()
            .filter(|slot| !slot.is_placeholder())
            .map(|slot| slot.receipt_time)
            .min()
    }

    /// Estimated mean latency of a stream, zero for unknown streams.
    pub fn latency(&self, id: &I) -> TimeDelta {
        self.estimators
            .get(id)
            .map(|e| e.latency())
            .unwrap_or(TimeDelta::ZERO)
    }

    /// Estimated latency standard deviation, zero for unknown streams.
    pub fn latency_stddev(&self, id: &I) -> TimeDelta {
        self.estimators
            .get(id)
            .map(|e| e.latency_stddev())
            .unwrap_or(TimeDelta::ZERO)
    }

    /// Latency quantile of a stream, zero for unknown streams.
    pub fn latency_quantile(&self, id: &I, quantile: f64) -> TimeDelta {
        self.estimators
            .get(id)
            .map(|e| e.latency_quantile(quantile))
            .unwrap_or(TimeDelta::ZERO)
    }

    /// Estimated mean update period of a stream, zero for unknown streams.
    pub fn period(&self, id: &I) -> TimeDelta {
        self.estimators
            .get(id)
            .map(|e| e.period())
            .unwrap_or(TimeDelta::ZERO)
    }

    /// Estimated period standard deviation, zero for unknown streams.
    pub fn period_stddev(&self, id: &I) -> TimeDelta {
        self.estimators
            .get(id)
            .map(|e| e.period_stddev())
            .unwrap_or(TimeDelta::ZERO)
    }

    /// Period quantile of a stream, zero for unknown streams.
    pub fn period_quantile(&self, id: &I, quantile: f64) -> TimeDelta {
        self.estimators
            .get(id)
            .map(|e| e.period_quantile(quantile))
            .unwrap_or(TimeDelta::ZERO)
    }

    /// Drop all queued data and learned stream statistics.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.estimators.clear();
        self.buffer_time = TimePoint::EPOCH;
        self.current_time = TimePoint::EPOCH;
    }

    fn sort_queue(&mut self) {
        // stable: equal measurement times keep their insertion order
        self.queue.sort_by_key(|slot| slot.meas_time);
    }

    fn queue_is_sorted(&self) -> bool {
        self.queue
            .windows(2)
            .all(|pair| pair[0].meas_time <= pair[1].meas_time)
    }
}

/// Remove the elements at the given positions, preserving the order of the
/// rest. Indices may be unsorted and may contain duplicates.
fn remove_indices<T>(items: &mut Vec<T>, indices: &mut Vec<usize>) {
    if indices.is_empty() {
        return;
    }
    indices.sort_unstable();
    indices.dedup();

    let mut pending = indices.iter().copied().peekable();
    let mut position = 0usize;
    items.retain(|_| {
        let remove = pending.peek() == Some(&position);
        if remove {
            pending.next();
        }
        position += 1;
        !remove
    });
}
