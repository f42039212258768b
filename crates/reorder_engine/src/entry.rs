//! The slot type of the global reorder queue.

use contracts::{Sample, TimePoint};

/// One slot of the time-ordered queue: either a received sample or a
/// placeholder reserving the expected slot of a sample that has not
/// arrived yet.
///
/// For placeholders `meas_time` is set to the earliest estimated
/// measurement time and `receipt_time` to the latest expected reception
/// time, so the same ordering and walk logic covers both kinds.
#[derive(Debug, Clone)]
pub(crate) struct TimedEntry<I, P> {
    pub id: I,
    pub meas_time: TimePoint,
    pub receipt_time: TimePoint,
    /// Untouched when a placeholder is fulfilled, kept for diagnostics.
    pub earliest_estimated_meas_time: TimePoint,
    /// Soft timeout: after this instant the slot no longer holds data back.
    pub latest_receipt_time: TimePoint,
    /// `None` marks a placeholder.
    pub payload: Option<P>,
    /// Set once follow-up placeholders were generated from this slot,
    /// suppressing duplicate reservations.
    pub spawned_placeholders: bool,
}

impl<I, P> TimedEntry<I, P> {
    /// Slot for a real measurement.
    pub fn measurement(id: I, meas_time: TimePoint, receipt_time: TimePoint, payload: P) -> Self {
        Self {
            id,
            meas_time,
            receipt_time,
            earliest_estimated_meas_time: meas_time,
            latest_receipt_time: receipt_time,
            payload: Some(payload),
            spawned_placeholders: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.payload.is_none()
    }
}

impl<I: Clone, P> TimedEntry<I, P> {
    /// Move the payload out as a [`Sample`], leaving a husk behind that the
    /// caller is expected to drop. Returns `None` for placeholders.
    pub fn take_sample(&mut self) -> Option<Sample<I, P>> {
        self.payload.take().map(|payload| Sample {
            id: self.id.clone(),
            meas_time: self.meas_time,
            receipt_time: self.receipt_time,
            payload,
        })
    }
}
