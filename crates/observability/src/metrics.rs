//! Metric collection helpers for the reorder buffer.
//!
//! The engine emits its own counters; the helpers here are for embedders
//! that want per-stream labels or an in-process summary without scraping
//! the exporter.

use contracts::{PopResult, TimePoint};
use metrics::{counter, gauge, histogram};

/// Record a pushed sample.
pub fn record_push(stream: &str) {
    counter!(
        "reorder_samples_pushed_total",
        "stream" => stream.to_string()
    )
    .increment(1);
}

/// Record the outcome of one pop call.
pub fn record_pop<I, P>(result: &PopResult<I, P>) {
    histogram!("reorder_delivered_per_pop").record(result.delivered.len() as f64);

    if !result.discarded.is_empty() {
        counter!("reorder_samples_discarded_observed_total")
            .increment(result.discarded.len() as u64);
    }

    gauge!("reorder_buffer_time_seconds").set(result.buffer_time.as_secs_f64());
}

/// Record a buffer reset observed by the embedder.
pub fn record_reset() {
    counter!("reorder_buffer_resets_observed_total").increment(1);
}

/// Record the current queue depth.
pub fn record_queue_depth(depth: usize) {
    gauge!("reorder_queue_depth").set(depth as f64);
}

/// Streaming mean/min/max/stddev over f64 observations (Welford).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Absorb one observation.
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn stddev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }

    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }
}

/// In-process aggregation of delivery behavior across pop calls.
#[derive(Debug, Clone, Default)]
pub struct ReorderMetricsAggregator {
    /// Total pop calls observed.
    pub total_pops: u64,
    /// Total delivered samples.
    pub total_delivered: u64,
    /// Total discarded samples.
    pub total_discarded: u64,
    /// Delivered samples per pop.
    pub delivered_per_pop: RunningStats,
    /// Age of a sample at delivery (pop time minus measurement time),
    /// in seconds; the extra delay the buffer added is part of this.
    pub delivery_age: RunningStats,
}

impl ReorderMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb the outcome of one pop call issued at `now`.
    pub fn record_pop<I, P>(&mut self, result: &PopResult<I, P>, now: TimePoint) {
        self.total_pops += 1;
        self.total_delivered += result.delivered.len() as u64;
        self.total_discarded += result.discarded.len() as u64;
        self.delivered_per_pop.record(result.delivered.len() as f64);

        for sample in &result.delivered {
            self.delivery_age.record((now - sample.meas_time).as_secs_f64());
        }
    }

    /// Snapshot of the aggregated values.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_pops: self.total_pops,
            total_delivered: self.total_delivered,
            total_discarded: self.total_discarded,
            mean_delivered_per_pop: self.delivered_per_pop.mean(),
            mean_delivery_age_s: self.delivery_age.mean(),
            max_delivery_age_s: self.delivery_age.max(),
        }
    }
}

/// Aggregated delivery statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub total_pops: u64,
    pub total_delivered: u64,
    pub total_discarded: u64,
    pub mean_delivered_per_pop: f64,
    pub mean_delivery_age_s: f64,
    pub max_delivery_age_s: f64,
}
