//! # Integration Tests
//!
//! End-to-end scenarios against the public buffer API.
//!
//! Responsibilities:
//! - multi-stream delivery order scenarios
//! - mode-specific behavior (batch, match)
//! - cross-operation invariants (accounting, ordering, idempotence)

#[cfg(test)]
mod helpers {
    use bytes::Bytes;
    use contracts::{PopResult, PushOutcome, TimePoint};
    use reorder_engine::{BufferParams, ReorderBuffer, TimeDelta};

    pub type TestBuffer = ReorderBuffer<Bytes, u32>;

    /// Shared parametrization of the scenario tests: the buffer gives up on
    /// a sample after 100ms and batches within 10ms.
    pub fn test_params() -> BufferParams<u32> {
        BufferParams {
            max_total_wait_time: TimeDelta::from_millis(100),
            ..BufferParams::default()
        }
    }

    pub fn push_ok(buffer: &mut TestBuffer, id: u32, receipt_ms: i64, meas_ms: i64) {
        let outcome = buffer.push(
            id,
            TimePoint::from_millis(receipt_ms),
            TimePoint::from_millis(meas_ms),
            Bytes::from_static(b"sample"),
        );
        assert_eq!(
            outcome,
            PushOutcome::Accepted,
            "push of stream {id} at {receipt_ms}ms was not accepted"
        );
    }

    /// Pop at `now_ms` and assert the delivered/discarded counts.
    pub fn pop_expect(
        buffer: &mut TestBuffer,
        now_ms: i64,
        delivered: usize,
        discarded: usize,
    ) -> PopResult<u32, Bytes> {
        let result = buffer.pop(TimePoint::from_millis(now_ms));
        assert_eq!(
            result.delivered.len(),
            delivered,
            "delivered count mismatch at {now_ms}ms: {:?}",
            result.delivered
        );
        assert_eq!(
            result.discarded.len(),
            discarded,
            "discarded count mismatch at {now_ms}ms: {:?}",
            result.discarded
        );
        result
    }

    pub fn meas_times(result: &PopResult<u32, Bytes>) -> Vec<i64> {
        result
            .delivered
            .iter()
            .map(|s| s.meas_time.as_nanos() / 1_000_000)
            .collect()
    }
}

#[cfg(test)]
mod two_streams {
    use super::helpers::*;
    use contracts::TimePoint;
    use reorder_engine::ReorderBuffer;

    // period: 50ms, latency: 10ms
    const STREAM_A: u32 = 50;
    // period: 50ms, latency: 60ms
    const STREAM_B: u32 = 100;

    #[test]
    fn test_late_joining_stream_with_higher_latency() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        // two cycles with solely the first stream
        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_A, 60, 50);
        let result = pop_expect(&mut buffer, 60, 1, 0);
        assert_eq!(meas_times(&result), vec![50]);

        // requesting data again with the same time delivers nothing new
        pop_expect(&mut buffer, 60, 0, 0);
        pop_expect(&mut buffer, 61, 0, 0);

        push_ok(&mut buffer, STREAM_A, 110, 100);
        pop_expect(&mut buffer, 110, 1, 0);

        // the second stream has a higher latency and delivers a measurement
        // older than the current buffer time, which has to be rejected
        push_ok(&mut buffer, STREAM_B, 150, 90);
        let result = pop_expect(&mut buffer, 150, 0, 1);
        assert_eq!(result.discarded[0].id, STREAM_B);

        pop_expect(&mut buffer, 151, 0, 0);

        // a single sample of stream B cannot initialize its period estimate,
        // so B is ignored for in-sequence constraints for now
        push_ok(&mut buffer, STREAM_A, 160, 150);
        pop_expect(&mut buffer, 160, 1, 0);

        // still too late, estimates for B are not fully initialized yet
        push_ok(&mut buffer, STREAM_B, 200, 140);
        pop_expect(&mut buffer, 200, 0, 1);

        push_ok(&mut buffer, STREAM_A, 210, 200);
        pop_expect(&mut buffer, 210, 1, 0);
        push_ok(&mut buffer, STREAM_B, 250, 190);
        pop_expect(&mut buffer, 250, 0, 1);

        // B is initialized now: its reservation holds A's sample back
        push_ok(&mut buffer, STREAM_A, 260, 250);
        pop_expect(&mut buffer, 260, 0, 0);
        push_ok(&mut buffer, STREAM_B, 300, 240);
        let result = pop_expect(&mut buffer, 300, 2, 0);
        assert_eq!(meas_times(&result), vec![240, 250]);
    }

    #[test]
    fn test_late_joining_stream_with_lower_latency() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        // roles switched: the high-latency stream B warms up first
        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_B, 110, 50);
        pop_expect(&mut buffer, 110, 1, 0);
        pop_expect(&mut buffer, 111, 0, 0);

        push_ok(&mut buffer, STREAM_B, 160, 100);
        pop_expect(&mut buffer, 160, 1, 0);
        push_ok(&mut buffer, STREAM_B, 210, 150);
        pop_expect(&mut buffer, 210, 1, 0);

        // estimates for B are now fully initialized: the newer, low-latency
        // sample of A must wait until B's reserved slot is resolved
        push_ok(&mut buffer, STREAM_A, 220, 210);
        pop_expect(&mut buffer, 220, 0, 0);
        push_ok(&mut buffer, STREAM_B, 260, 200);
        let result = pop_expect(&mut buffer, 260, 2, 0);
        assert_eq!(meas_times(&result), vec![200, 210]);

        push_ok(&mut buffer, STREAM_A, 270, 260);
        pop_expect(&mut buffer, 270, 0, 0);
        push_ok(&mut buffer, STREAM_B, 310, 250);
        let result = pop_expect(&mut buffer, 310, 2, 0);
        assert_eq!(meas_times(&result), vec![250, 260]);
    }

    #[test]
    fn test_simultaneous_stream_start() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_A, 60, 50);
        pop_expect(&mut buffer, 60, 1, 0);
        push_ok(&mut buffer, STREAM_B, 70, 10);
        pop_expect(&mut buffer, 70, 0, 1);
        push_ok(&mut buffer, STREAM_A, 110, 100);
        pop_expect(&mut buffer, 110, 1, 0);
        push_ok(&mut buffer, STREAM_B, 120, 60);
        pop_expect(&mut buffer, 120, 0, 1);
        push_ok(&mut buffer, STREAM_A, 160, 150);
        pop_expect(&mut buffer, 160, 1, 0);
        push_ok(&mut buffer, STREAM_B, 170, 110);
        pop_expect(&mut buffer, 170, 0, 1);

        // both initialized, normal behaviour from here on
        push_ok(&mut buffer, STREAM_A, 210, 200);
        pop_expect(&mut buffer, 210, 0, 0);
        push_ok(&mut buffer, STREAM_B, 220, 160);
        let result = pop_expect(&mut buffer, 220, 2, 0);
        assert_eq!(meas_times(&result), vec![160, 200]);

        push_ok(&mut buffer, STREAM_A, 260, 250);
        pop_expect(&mut buffer, 260, 0, 0);
        push_ok(&mut buffer, STREAM_B, 270, 210);
        let result = pop_expect(&mut buffer, 270, 2, 0);
        assert_eq!(meas_times(&result), vec![210, 250]);
    }

    #[test]
    fn test_different_stream_frequencies() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        // A: period 50ms latency 10ms, B: period 100ms latency 60ms
        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_A, 50, 40);
        pop_expect(&mut buffer, 50, 1, 0);
        push_ok(&mut buffer, STREAM_A, 100, 90);
        pop_expect(&mut buffer, 100, 1, 0);

        push_ok(&mut buffer, STREAM_B, 110, 50);
        pop_expect(&mut buffer, 110, 0, 1);

        push_ok(&mut buffer, STREAM_A, 150, 140);
        pop_expect(&mut buffer, 150, 1, 0);
        push_ok(&mut buffer, STREAM_A, 200, 190);
        pop_expect(&mut buffer, 200, 1, 0);

        push_ok(&mut buffer, STREAM_B, 210, 150);
        pop_expect(&mut buffer, 210, 0, 1);

        push_ok(&mut buffer, STREAM_A, 250, 240);
        pop_expect(&mut buffer, 250, 1, 0);
        push_ok(&mut buffer, STREAM_A, 300, 290);
        pop_expect(&mut buffer, 300, 1, 0);

        push_ok(&mut buffer, STREAM_B, 310, 250);
        pop_expect(&mut buffer, 310, 0, 1);

        push_ok(&mut buffer, STREAM_A, 350, 340);
        pop_expect(&mut buffer, 350, 1, 0);
        push_ok(&mut buffer, STREAM_A, 400, 390);
        pop_expect(&mut buffer, 400, 0, 0);

        // first time the estimates of B are fully initialized and its
        // reservation can hold A's sample back
        push_ok(&mut buffer, STREAM_B, 410, 350);
        let result = pop_expect(&mut buffer, 410, 2, 0);
        assert_eq!(meas_times(&result), vec![350, 390]);

        push_ok(&mut buffer, STREAM_A, 450, 440);
        pop_expect(&mut buffer, 450, 1, 0);
        push_ok(&mut buffer, STREAM_A, 500, 490);
        pop_expect(&mut buffer, 500, 0, 0);

        push_ok(&mut buffer, STREAM_B, 510, 450);
        let result = pop_expect(&mut buffer, 510, 2, 0);
        assert_eq!(meas_times(&result), vec![450, 490]);
    }

    #[test]
    fn test_missing_measurement_stalls_delivery() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_A, 50, 40);
        pop_expect(&mut buffer, 50, 1, 0);
        push_ok(&mut buffer, STREAM_A, 100, 90);
        pop_expect(&mut buffer, 100, 1, 0);

        push_ok(&mut buffer, STREAM_B, 110, 50);
        pop_expect(&mut buffer, 110, 0, 1);

        push_ok(&mut buffer, STREAM_A, 150, 140);
        pop_expect(&mut buffer, 150, 1, 0);
        push_ok(&mut buffer, STREAM_A, 200, 190);
        pop_expect(&mut buffer, 200, 1, 0);

        push_ok(&mut buffer, STREAM_B, 210, 150);
        pop_expect(&mut buffer, 210, 0, 1);

        push_ok(&mut buffer, STREAM_A, 250, 240);
        pop_expect(&mut buffer, 250, 1, 0);

        // the measurement of A at meas 290ms / receipt 300ms never arrives
        pop_expect(&mut buffer, 300, 0, 0);
        // the buffer time stays at the last delivered measurement
        assert_eq!(buffer.buffer_time(), TimePoint::from_millis(240));

        push_ok(&mut buffer, STREAM_B, 310, 250);
        pop_expect(&mut buffer, 310, 1, 0);

        push_ok(&mut buffer, STREAM_A, 350, 340);
        pop_expect(&mut buffer, 350, 1, 0);
        push_ok(&mut buffer, STREAM_A, 400, 390);
        pop_expect(&mut buffer, 400, 0, 0);

        push_ok(&mut buffer, STREAM_B, 410, 350);
        pop_expect(&mut buffer, 410, 2, 0);
    }

    #[test]
    fn test_zero_latency_streams() {
        // dataset playback: only a single time stamp per sample exists, so
        // the latency seen by the buffer is zero
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_A, 60, 60);
        pop_expect(&mut buffer, 60, 1, 0);
        push_ok(&mut buffer, STREAM_B, 60, 60);
        pop_expect(&mut buffer, 60, 1, 0);
        push_ok(&mut buffer, STREAM_A, 110, 110);
        pop_expect(&mut buffer, 110, 1, 0);
        push_ok(&mut buffer, STREAM_B, 110, 110);
        pop_expect(&mut buffer, 110, 1, 0);
        push_ok(&mut buffer, STREAM_A, 160, 160);
        pop_expect(&mut buffer, 160, 1, 0);
        push_ok(&mut buffer, STREAM_B, 160, 160);
        pop_expect(&mut buffer, 160, 1, 0);

        // both initialized: zero-latency data keeps flowing immediately
        push_ok(&mut buffer, STREAM_A, 210, 210);
        pop_expect(&mut buffer, 210, 1, 0);
        push_ok(&mut buffer, STREAM_B, 210, 210);
        pop_expect(&mut buffer, 210, 1, 0);

        push_ok(&mut buffer, STREAM_A, 260, 260);
        // skipping the intermediate pop
        push_ok(&mut buffer, STREAM_B, 260, 260);
        pop_expect(&mut buffer, 260, 2, 0);
    }
}

#[cfg(test)]
mod batch_mode {
    use super::helpers::*;
    use contracts::BufferMode;
    use reorder_engine::ReorderBuffer;

    // period: 50ms, latency: 10ms, offset: 0ms
    const STREAM_A: u32 = 50;
    // period: 50ms, latency: 20ms, offset: 5ms
    const STREAM_B: u32 = 100;

    fn batch_buffer() -> TestBuffer {
        let mut params = test_params();
        params.mode = BufferMode::Batch;
        ReorderBuffer::new(params)
    }

    #[test]
    fn test_synchronized_streams_are_batched() {
        let mut buffer = batch_buffer();

        pop_expect(&mut buffer, 10, 0, 0);
        push_ok(&mut buffer, STREAM_A, 60, 50);
        pop_expect(&mut buffer, 60, 1, 0);
        push_ok(&mut buffer, STREAM_B, 75, 55);
        pop_expect(&mut buffer, 75, 1, 0);

        push_ok(&mut buffer, STREAM_A, 110, 100);
        pop_expect(&mut buffer, 110, 1, 0);
        push_ok(&mut buffer, STREAM_B, 125, 105);
        pop_expect(&mut buffer, 125, 1, 0);

        push_ok(&mut buffer, STREAM_A, 160, 150);
        pop_expect(&mut buffer, 160, 1, 0);
        push_ok(&mut buffer, STREAM_B, 175, 155);
        pop_expect(&mut buffer, 175, 1, 0);

        // estimates fully initialized, batching decisions start here: A's
        // sample waits for the B sample expected 5ms later
        push_ok(&mut buffer, STREAM_A, 210, 200);
        pop_expect(&mut buffer, 210, 0, 0);
        push_ok(&mut buffer, STREAM_B, 225, 205);
        let result = pop_expect(&mut buffer, 225, 2, 0);
        assert_eq!(meas_times(&result), vec![200, 205]);

        push_ok(&mut buffer, STREAM_A, 260, 250);
        pop_expect(&mut buffer, 260, 0, 0);
        push_ok(&mut buffer, STREAM_B, 275, 255);
        pop_expect(&mut buffer, 275, 2, 0);

        // the message of B (receipt 325ms, meas 305ms) goes missing
        push_ok(&mut buffer, STREAM_A, 310, 300);
        pop_expect(&mut buffer, 310, 0, 0);
        pop_expect(&mut buffer, 320, 0, 0);

        // A's sample is released once the latest expected receipt time of
        // the missing B input is reached
        pop_expect(&mut buffer, 325, 1, 0);
        pop_expect(&mut buffer, 330, 0, 0);

        push_ok(&mut buffer, STREAM_A, 360, 350);
        pop_expect(&mut buffer, 360, 0, 0);
        push_ok(&mut buffer, STREAM_B, 375, 355);
        pop_expect(&mut buffer, 375, 2, 0);
    }
}

#[cfg(test)]
mod match_mode {
    use super::helpers::*;
    use contracts::{BufferMode, MatchParams};
    use reorder_engine::ReorderBuffer;

    // reference stream: period 50ms, latency 10ms
    const STREAM_A: u32 = 50;
    // period 50ms, latency 60ms
    const STREAM_B: u32 = 100;

    fn match_buffer() -> TestBuffer {
        let mut params = test_params();
        params.mode = BufferMode::Match;
        params.matching = MatchParams {
            reference_stream: Some(STREAM_A),
            num_streams: None,
        };
        ReorderBuffer::new(params)
    }

    /// Warm both streams up. Ends with both estimators initialized, a tuple
    /// {B@160, A@150} already delivered and buffer_time at 150ms.
    fn warmed_up_buffer() -> TestBuffer {
        let mut buffer = match_buffer();

        // While only A is known, every A sample forms a complete "tuple" on
        // its own.
        push_ok(&mut buffer, STREAM_A, 60, 50);
        pop_expect(&mut buffer, 60, 1, 0);

        // B joins too late, its first sample is behind the delivery front
        push_ok(&mut buffer, STREAM_B, 70, 10);
        pop_expect(&mut buffer, 70, 0, 1);

        // now a tuple around A's sample is impossible (B is known but has
        // nothing queued or anticipated), so the reference is dropped
        push_ok(&mut buffer, STREAM_A, 110, 100);
        pop_expect(&mut buffer, 110, 0, 1);

        // B's sample alone cannot form a tuple without a reference
        push_ok(&mut buffer, STREAM_B, 120, 60);
        pop_expect(&mut buffer, 120, 0, 0);

        // A initialized: the held B sample and the fresh A sample pair up
        push_ok(&mut buffer, STREAM_A, 160, 150);
        let result = pop_expect(&mut buffer, 160, 2, 0);
        assert_eq!(meas_times(&result), vec![60, 150]);

        // B initialized with this push; its stale sample ages out
        push_ok(&mut buffer, STREAM_B, 170, 110);
        pop_expect(&mut buffer, 170, 0, 1);

        buffer
    }

    #[test]
    fn test_tuple_formation_waits_for_better_samples() {
        let mut buffer = warmed_up_buffer();

        // A's next sample is held back by B's reservation
        push_ok(&mut buffer, STREAM_A, 210, 200);
        pop_expect(&mut buffer, 210, 0, 0);

        // B@160 is ready but its reserved successor at ~210 would match the
        // reference at 200 better, so matching waits
        push_ok(&mut buffer, STREAM_B, 220, 160);
        pop_expect(&mut buffer, 220, 0, 0);

        // the better sample arrives and completes the tuple
        push_ok(&mut buffer, STREAM_B, 270, 210);
        let result = pop_expect(&mut buffer, 270, 2, 0);
        assert_eq!(meas_times(&result), vec![200, 210]);
        assert_eq!(result.delivered[0].id, STREAM_A);
        assert_eq!(result.delivered[1].id, STREAM_B);

        // the superseded B@160 ages out with the next pop
        pop_expect(&mut buffer, 271, 0, 1);
    }

    #[test]
    fn test_reference_dropped_when_partner_stream_dies() {
        let mut buffer = warmed_up_buffer();

        push_ok(&mut buffer, STREAM_A, 210, 200);
        pop_expect(&mut buffer, 210, 0, 0);
        push_ok(&mut buffer, STREAM_B, 220, 160);
        pop_expect(&mut buffer, 220, 0, 0);
        push_ok(&mut buffer, STREAM_B, 270, 210);
        pop_expect(&mut buffer, 270, 2, 0);

        // B falls silent; A keeps going
        push_ok(&mut buffer, STREAM_A, 310, 300);
        pop_expect(&mut buffer, 310, 0, 1); // superseded B@160 ages out

        // B's reservations keep the reference waiting while they are alive,
        // but the dead stream can never complete a tuple: once the next
        // anticipated B slot fits a newer reference better, the stale
        // reference is dropped so matching can progress
        let mut dropped_reference = false;
        for now_ms in (320..520).step_by(10) {
            let result = pop_expect_any(&mut buffer, now_ms);
            assert!(result.delivered.is_empty());
            if result
                .discarded
                .iter()
                .any(|sample| sample.id == STREAM_A)
            {
                dropped_reference = true;
                break;
            }
        }
        assert!(dropped_reference, "stale reference was never dropped");
    }

    fn pop_expect_any(
        buffer: &mut TestBuffer,
        now_ms: i64,
    ) -> contracts::PopResult<u32, bytes::Bytes> {
        buffer.pop(contracts::TimePoint::from_millis(now_ms))
    }

    /// With `num_streams` configured explicitly, the buffer knows the tuple
    /// size before it has ever seen the second stream.
    #[test]
    fn test_explicit_stream_count_holds_back_lone_reference() {
        let mut params = test_params();
        params.mode = BufferMode::Match;
        params.matching = MatchParams {
            reference_stream: Some(STREAM_A),
            num_streams: Some(2),
        };
        let mut buffer: TestBuffer = ReorderBuffer::new(params);

        // the very first reference sample is not delivered on its own: a
        // two-stream tuple around it is impossible, so it is dropped and
        // the buffer time stays untouched
        push_ok(&mut buffer, STREAM_A, 60, 50);
        let result = pop_expect(&mut buffer, 60, 0, 1);
        assert!(result.delivered.is_empty());
        assert_eq!(result.discarded[0].id, STREAM_A);

        // the second stream joins; without a ready reference nothing moves,
        // and since nothing was delivered yet the early B sample survives
        push_ok(&mut buffer, STREAM_B, 70, 10);
        pop_expect(&mut buffer, 70, 0, 0);

        // the next reference completes the first full tuple
        push_ok(&mut buffer, STREAM_A, 110, 100);
        let result = pop_expect(&mut buffer, 110, 2, 0);
        assert_eq!(meas_times(&result), vec![10, 100]);

        // warm-up continues: stale B data ages out, a lone reference with
        // nothing of B queued or anticipated is dropped again
        push_ok(&mut buffer, STREAM_B, 120, 60);
        pop_expect(&mut buffer, 120, 0, 1);
        push_ok(&mut buffer, STREAM_A, 160, 150);
        let result = pop_expect(&mut buffer, 160, 0, 1);
        assert_eq!(result.discarded[0].id, STREAM_A);
        push_ok(&mut buffer, STREAM_B, 170, 110);
        pop_expect(&mut buffer, 170, 0, 0);

        // both estimators initialized: reservations now hold the reference
        // until the best-fitting B sample has arrived
        push_ok(&mut buffer, STREAM_A, 210, 200);
        pop_expect(&mut buffer, 210, 0, 0);
        push_ok(&mut buffer, STREAM_B, 220, 160);
        pop_expect(&mut buffer, 220, 0, 0);
        push_ok(&mut buffer, STREAM_B, 270, 210);
        let result = pop_expect(&mut buffer, 270, 2, 0);
        assert_eq!(meas_times(&result), vec![200, 210]);

        // superseded B samples age out with the next pop
        pop_expect(&mut buffer, 271, 0, 2);
    }
}

#[cfg(test)]
mod invariants {
    use super::helpers::*;
    use contracts::{PushOutcome, TimePoint};
    use reorder_engine::ReorderBuffer;

    const STREAM_A: u32 = 50;
    const STREAM_B: u32 = 100;

    #[test]
    fn test_receipt_clock_jump_resets() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        push_ok(&mut buffer, STREAM_A, 5000, 4990);
        push_ok(&mut buffer, STREAM_A, 5050, 5040);

        // a receipt time more than reset_threshold in the past wipes
        // everything
        let outcome = buffer.push(
            STREAM_A,
            TimePoint::from_millis(3000),
            TimePoint::from_millis(2990),
            bytes::Bytes::from_static(b"sample"),
        );
        assert_eq!(outcome, PushOutcome::Reset);
        assert_eq!(buffer.num_queued_samples(), 0);
        assert_eq!(buffer.buffer_time(), TimePoint::EPOCH);

        // the buffer starts over cleanly
        push_ok(&mut buffer, STREAM_A, 60, 50);
        pop_expect(&mut buffer, 60, 1, 0);
    }

    #[test]
    fn test_every_sample_is_accounted_for() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        let schedule: &[(u32, i64, i64)] = &[
            (STREAM_A, 60, 50),
            (STREAM_B, 150, 90),
            (STREAM_A, 110, 100),
            (STREAM_A, 160, 150),
            (STREAM_B, 200, 140),
            (STREAM_A, 210, 200),
            (STREAM_B, 250, 190),
            (STREAM_A, 260, 250),
            (STREAM_B, 300, 240),
            (STREAM_A, 310, 300),
        ];

        let mut pushed = Vec::new();
        let mut delivered = Vec::new();
        let mut discarded = Vec::new();
        let mut last_delivered_meas: Option<TimePoint> = None;

        let mut sorted = schedule.to_vec();
        sorted.sort_by_key(|(_, receipt, _)| *receipt);
        for (id, receipt_ms, meas_ms) in sorted {
            push_ok(&mut buffer, id, receipt_ms, meas_ms);
            pushed.push((id, meas_ms));

            let result = buffer.pop(TimePoint::from_millis(receipt_ms));
            for sample in &result.delivered {
                // deliveries are globally ordered by measurement time
                assert!(last_delivered_meas.is_none_or(|last| sample.meas_time > last));
                last_delivered_meas = Some(sample.meas_time);
            }
            delivered.extend(result.delivered.into_iter().map(|s| (s.id, s.meas_time)));
            discarded.extend(result.discarded.into_iter().map(|s| (s.id, s.meas_time)));
        }

        // a final pop far in the future drains whatever can still be
        // delivered
        let result = buffer.pop(TimePoint::from_millis(10_000));
        delivered.extend(result.delivered.into_iter().map(|s| (s.id, s.meas_time)));
        discarded.extend(result.discarded.into_iter().map(|s| (s.id, s.meas_time)));

        // every pushed payload is delivered, discarded or still resident
        assert_eq!(
            pushed.len(),
            delivered.len() + discarded.len() + buffer.num_queued_samples()
        );
    }

    #[test]
    fn test_buffer_time_is_monotonic() {
        let mut buffer: TestBuffer = ReorderBuffer::new(test_params());

        let mut previous = buffer.buffer_time();
        for cycle in 1..20i64 {
            let meas = cycle * 50;
            push_ok(&mut buffer, STREAM_A, meas + 10, meas);
            let result = buffer.pop(TimePoint::from_millis(meas + 10));
            assert!(result.buffer_time >= previous);
            previous = result.buffer_time;
        }
    }

    #[test]
    fn test_config_file_drives_buffer_construction() {
        let params = config_loader::ConfigLoader::load_from_str(
            r#"
mode = "batch"
max_total_wait_time = 0.1

[batch]
max_delta = 0.01
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        // config produces string stream ids; drive the generic engine with
        // them end to end
        let mut buffer: ReorderBuffer<bytes::Bytes> = ReorderBuffer::new(params);
        let camera = contracts::StreamId::new("front_camera");
        buffer.push(
            camera.clone(),
            TimePoint::from_millis(60),
            TimePoint::from_millis(50),
            bytes::Bytes::from_static(b"frame"),
        );
        let result = buffer.pop(TimePoint::from_millis(60));
        assert_eq!(result.delivered.len(), 1);
        assert_eq!(result.delivered[0].id, camera);
    }
}
