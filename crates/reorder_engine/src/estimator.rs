//! Online estimation of per-stream timing characteristics.
//!
//! Tracks first and second moments of a stream's update period and
//! end-to-end latency with exponentially weighted moving averages, robust
//! against occasional missing samples.

use contracts::{BufferError, TimeDelta, TimePoint};

use crate::normal;

/// Mean/variance pair of one tracked quantity, in f64 nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
struct MomentEstimate {
    mean: f64,
    variance: f64,
}

/// Per-stream estimator of update period and latency.
///
/// Latency can be initialized from the very first sample; the period needs a
/// second sample for its mean and a third for its variance, so the estimator
/// only reports [`is_initialized`](Self::is_initialized) after two full
/// updates.
#[derive(Debug, Clone)]
pub struct StreamCharacteristicsEstimator {
    num_updates: usize,
    last_meas_time: TimePoint,
    last_receipt_time: TimePoint,
    alpha: f64,
    period: MomentEstimate,
    latency: MomentEstimate,
}

impl StreamCharacteristicsEstimator {
    /// Create an estimator from the first sample of a stream.
    pub fn new(receipt_time: TimePoint, meas_time: TimePoint, alpha: f64) -> Self {
        // latency can be initialized from the first sample directly, the
        // period has to wait for a second one
        let latency = MomentEstimate {
            mean: (receipt_time - meas_time).as_nanos() as f64,
            variance: 0.0,
        };

        Self {
            num_updates: 0,
            last_meas_time: meas_time,
            last_receipt_time: receipt_time,
            alpha,
            period: MomentEstimate::default(),
            latency,
        }
    }

    /// Feed the next sample of the stream.
    ///
    /// `num_missing` is the number of samples of this stream that were
    /// expected but never arrived since the last update; the period sample
    /// is corrected by that many mean periods before entering the average.
    ///
    /// # Errors
    /// [`BufferError::EstimatorCorruption`] when the corrected period is
    /// negative and the estimator has seen enough samples that the missing
    /// count must be structurally wrong. The estimator state is untouched
    /// in that case.
    pub fn update(
        &mut self,
        receipt_time: TimePoint,
        meas_time: TimePoint,
        num_missing: usize,
    ) -> Result<(), BufferError> {
        let latency_sample = (receipt_time - meas_time).as_nanos() as f64;
        let period_sample = (meas_time - self.last_meas_time).as_nanos() as f64;

        self.update_period(period_sample, num_missing)?;
        self.update_latency(latency_sample);

        self.last_meas_time = meas_time;
        self.last_receipt_time = receipt_time;
        self.num_updates += 1;
        Ok(())
    }

    /// Feed a sample into the latency average only.
    ///
    /// Used when the period sample would be unreliable (no matching
    /// reservation existed for the measurement). Does not count as a full
    /// update.
    pub fn update_latency_only(&mut self, receipt_time: TimePoint, meas_time: TimePoint) {
        let latency_sample = (receipt_time - meas_time).as_nanos() as f64;
        self.update_latency(latency_sample);

        self.last_meas_time = meas_time;
        self.last_receipt_time = receipt_time;
    }

    /// Estimated mean update period.
    pub fn period(&self) -> TimeDelta {
        TimeDelta::from_nanos(self.period.mean as i64)
    }

    /// Standard deviation of the update period.
    pub fn period_stddev(&self) -> TimeDelta {
        TimeDelta::from_nanos(self.period.variance.sqrt() as i64)
    }

    /// Quantile of the estimated period distribution.
    pub fn period_quantile(&self, quantile: f64) -> TimeDelta {
        if self.period.variance == 0.0 {
            // without spread every quantile sits on the mean
            return self.period();
        }
        let value = normal::quantile(self.period.mean, self.period.variance.sqrt(), quantile);
        TimeDelta::from_nanos(value as i64)
    }

    /// Estimated mean end-to-end latency.
    pub fn latency(&self) -> TimeDelta {
        TimeDelta::from_nanos(self.latency.mean as i64)
    }

    /// Standard deviation of the latency.
    pub fn latency_stddev(&self) -> TimeDelta {
        TimeDelta::from_nanos(self.latency.variance.sqrt() as i64)
    }

    /// Quantile of the estimated latency distribution.
    pub fn latency_quantile(&self, quantile: f64) -> TimeDelta {
        if self.latency.variance == 0.0 {
            return self.latency();
        }
        let value = normal::quantile(self.latency.mean, self.latency.variance.sqrt(), quantile);
        TimeDelta::from_nanos(value as i64)
    }

    /// Number of full updates the estimator has absorbed.
    pub fn num_updates(&self) -> usize {
        self.num_updates
    }

    /// Whether both period and latency carry usable mean and variance.
    pub fn is_initialized(&self) -> bool {
        self.num_updates >= 2
    }

    fn ewma_step(&self, state: MomentEstimate, sample: f64, update_variance: bool) -> MomentEstimate {
        let diff = sample - state.mean;
        let increment = self.alpha * diff;
        let mean = state.mean + increment;
        let variance = if update_variance {
            (1.0 - self.alpha) * (state.variance + diff * increment)
        } else {
            state.variance
        };
        MomentEstimate { mean, variance }
    }

    fn update_period(&mut self, sample: f64, num_missing: usize) -> Result<(), BufferError> {
        // The period needs three data points in total: two differences are
        // required before the variance can be initialized.
        if self.num_updates == 0 {
            self.period.mean = sample;
            return Ok(());
        }
        if self.num_updates == 1 {
            let first_sample = self.period.mean;

            // update only the mean, the variance is not yet initialized
            self.period = self.ewma_step(self.period, sample, false);

            self.period.variance = (first_sample - self.period.mean).powi(2)
                + (sample - self.period.mean).powi(2);
            return Ok(());
        }

        let corrected = sample - num_missing as f64 * self.period.mean;
        if corrected < 0.0 {
            if self.num_updates > 10 {
                return Err(BufferError::EstimatorCorruption {
                    missing: num_missing,
                    period_sample_ns: sample,
                    period_mean_ns: self.period.mean,
                    corrected_ns: corrected,
                    updates: self.num_updates,
                });
            }
            // early on the missing count is frequently off by one; drop the
            // period sample and keep going
            return Ok(());
        }

        self.period = self.ewma_step(self.period, corrected, true);
        Ok(())
    }

    fn update_latency(&mut self, sample: f64) {
        if self.num_updates == 0 {
            // the first latency estimate was absorbed in the constructor, so
            // the variance can already be initialized here
            self.latency = self.ewma_step(self.latency, sample, false);

            let first_sample = (self.last_receipt_time - self.last_meas_time).as_nanos() as f64;
            self.latency.variance = (first_sample - self.latency.mean).powi(2)
                + (sample - self.latency.mean).powi(2);
            return;
        }

        self.latency = self.ewma_step(self.latency, sample, true);
    }
}
