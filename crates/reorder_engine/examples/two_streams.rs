//! Two simulated sensor streams pushed through the reordering buffer.
//!
//! A camera (50ms period, low latency) and a lidar (100ms period, high
//! latency) emit samples with deterministic jitter. The buffer delivers
//! them in measurement-time order; the summary at the end shows how much
//! delay that cost.
//!
//! Run with: `cargo run --example two_streams -p reorder_engine`

use bytes::Bytes;
use observability::{LogFormat, ObservabilityConfig, ReorderMetricsAggregator};
use reorder_engine::{BufferParams, ReorderBuffer, StreamId, TimeDelta, TimePoint};

struct StreamSpec {
    id: StreamId,
    period_ms: i64,
    /// Phase shift of the measurement grid, keeps the two grids disjoint.
    offset_ms: i64,
    latency_ms: i64,
}

fn main() -> anyhow::Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        metrics_port: None,
        default_log_level: "info".to_string(),
    })?;

    let streams = [
        StreamSpec {
            id: StreamId::new("front_camera"),
            period_ms: 50,
            offset_ms: 0,
            latency_ms: 10,
        },
        StreamSpec {
            id: StreamId::new("roof_lidar"),
            period_ms: 100,
            offset_ms: 35,
            latency_ms: 60,
        },
    ];

    // Build the arrival schedule up front: measurement times on the stream
    // grid, receipt times with a few milliseconds of deterministic jitter.
    let mut arrivals: Vec<(TimePoint, StreamId, TimePoint)> = Vec::new();
    for spec in &streams {
        for cycle in 1..=100i64 {
            let meas_ms = cycle * spec.period_ms + spec.offset_ms;
            let jitter_ms = (cycle * 7919) % 4;
            let receipt_ms = meas_ms + spec.latency_ms + jitter_ms;
            arrivals.push((
                TimePoint::from_millis(receipt_ms),
                spec.id.clone(),
                TimePoint::from_millis(meas_ms),
            ));
        }
    }
    arrivals.sort_by_key(|(receipt, _, _)| *receipt);

    let params = BufferParams {
        max_total_wait_time: TimeDelta::from_millis(200),
        ..BufferParams::default()
    };
    let mut buffer: ReorderBuffer<Bytes, StreamId> = ReorderBuffer::new(params);
    let mut aggregator = ReorderMetricsAggregator::new();
    let mut last_meas = TimePoint::EPOCH;

    for (receipt_time, id, meas_time) in arrivals {
        observability::record_push(id.as_str());
        buffer.push(id, receipt_time, meas_time, Bytes::from_static(b"frame"));

        let result = buffer.pop(receipt_time);
        observability::record_pop(&result);
        observability::record_queue_depth(buffer.num_queued_samples());
        aggregator.record_pop(&result, receipt_time);

        for sample in &result.delivered {
            assert!(sample.meas_time > last_meas, "out-of-sequence delivery");
            last_meas = sample.meas_time;
            tracing::debug!(
                stream = %sample.id,
                meas_time = ?sample.meas_time,
                age = ?(receipt_time - sample.meas_time),
                "delivered"
            );
        }
        for sample in &result.discarded {
            tracing::warn!(stream = %sample.id, meas_time = ?sample.meas_time, "discarded");
        }
    }

    let summary = aggregator.summary();
    tracing::info!(
        total_delivered = summary.total_delivered,
        total_discarded = summary.total_discarded,
        mean_delivery_age_s = format!("{:.4}", summary.mean_delivery_age_s),
        max_delivery_age_s = format!("{:.4}", summary.max_delivery_age_s),
        "replay finished"
    );

    Ok(())
}
