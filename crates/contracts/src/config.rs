//! Buffer parameter contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::{StreamId, TimeDelta};

/// Delivery discipline of the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Deliver data with increasing time stamps as soon as possible.
    #[default]
    Single,
    /// Batch data that belongs to the same scene, possibly waiting longer.
    Batch,
    /// Deliver one tuple of nearest-in-time samples around a reference
    /// stream, or nothing.
    Match,
}

/// Batch mode parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchParams {
    /// Maximum measurement-time spread of a batch.
    #[serde(default = "default_batch_max_delta")]
    pub max_delta: TimeDelta,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            max_delta: default_batch_max_delta(),
        }
    }
}

fn default_batch_max_delta() -> TimeDelta {
    TimeDelta::from_millis(10)
}

/// Match mode parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "I: Deserialize<'de>"))]
pub struct MatchParams<I = StreamId> {
    /// The stream whose samples define the target times of a tuple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_stream: Option<I>,
    /// Total number of streams a full tuple must cover. When absent, the
    /// buffer infers the count from the streams it has seen so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_streams: Option<usize>,
}

impl<I> Default for MatchParams<I> {
    fn default() -> Self {
        Self {
            reference_stream: None,
            num_streams: None,
        }
    }
}

/// Buffer configuration.
///
/// All fields carry defaults so configuration files only need to name what
/// they change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferParams<I = StreamId> {
    /// Delivery discipline.
    pub mode: BufferMode,

    /// If the receipt time jumps further into the past than this threshold,
    /// the whole buffer is reset.
    pub reset_threshold: TimeDelta,

    /// Confidence used to evaluate the estimated measurement-period
    /// distribution when placing reservations.
    pub measurement_confidence_quantile: f64,

    /// Hard limit on the absolute measurement jitter.
    pub max_abs_measurement_jitter: TimeDelta,

    /// Confidence used to evaluate the estimated wait-time distribution
    /// (period variance + latency variance).
    pub wait_confidence_quantile: f64,

    /// Hard limit on the absolute waiting jitter.
    pub max_abs_wait_jitter: TimeDelta,

    /// Hard limit on the total time the buffer waits for a single sample.
    pub max_total_wait_time: TimeDelta,

    /// Smoothing factor of the per-stream period/latency estimators.
    pub estimator_alpha: f64,

    /// Batch mode settings.
    pub batch: BatchParams,

    /// Match mode settings.
    #[serde(rename = "match")]
    pub matching: MatchParams<I>,
}

impl<I> Default for BufferParams<I> {
    fn default() -> Self {
        Self {
            mode: BufferMode::Single,
            reset_threshold: TimeDelta::from_secs(1),
            measurement_confidence_quantile: 0.99,
            max_abs_measurement_jitter: TimeDelta::from_secs(100),
            wait_confidence_quantile: 0.99,
            max_abs_wait_jitter: TimeDelta::from_secs(100),
            max_total_wait_time: TimeDelta::from_secs(1000),
            estimator_alpha: 0.05,
            batch: BatchParams::default(),
            matching: MatchParams::default(),
        }
    }
}
