//! # Reorder Engine
//!
//! Multi-stream, time-ordered reordering buffer for sensor-fusion
//! pipelines.
//!
//! Independent sources each emit samples with increasing measurement time
//! stamps; every sample arrives delayed by a source-specific latency. The
//! buffer delivers samples to the caller in globally increasing
//! measurement-time order while adding the minimum extra delay consistent
//! with a configurable probability of data loss: it learns each stream's
//! period and latency online and reserves queue slots for samples it
//! expects but has not received yet.
//!
//! ## Usage example
//!
//! ```ignore
//! use reorder_engine::{BufferParams, ReorderBuffer, StreamId, TimePoint};
//!
//! let mut buffer: ReorderBuffer<Vec<u8>> = ReorderBuffer::new(BufferParams::default());
//!
//! // Push samples as they arrive
//! buffer.push(StreamId::new("front_camera"), receipt_time, meas_time, payload);
//!
//! // Periodically drain everything that is safe to deliver
//! let result = buffer.pop(now);
//! for sample in result.delivered {
//!     // samples are in increasing meas_time order across all streams
//! }
//! ```

mod batch;
mod engine;
mod entry;
mod estimator;
mod matching;
mod normal;
mod placeholder;

pub use engine::ReorderBuffer;
pub use estimator::StreamCharacteristicsEstimator;

// Re-export contracts types
pub use contracts::{
    BatchParams, BufferError, BufferMode, BufferParams, MatchParams, PopResult, PushOutcome,
    Sample, StreamId, TimeDelta, TimePoint,
};
