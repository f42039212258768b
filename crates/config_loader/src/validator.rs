//! Parameter validation.
//!
//! Rules:
//! - confidence quantiles and the estimator smoothing factor lie strictly
//!   inside (0, 1)
//! - every duration limit is non-negative
//! - match mode names a reference stream
//! - num_streams, when given, covers at least the reference itself

use contracts::{BufferError, BufferMode, BufferParams, TimeDelta};

/// Validate a full parameter set.
///
/// Returns the first violation found, or `Ok(())`.
pub fn validate(params: &BufferParams) -> Result<(), BufferError> {
    validate_unit_interval(
        "measurement_confidence_quantile",
        params.measurement_confidence_quantile,
    )?;
    validate_unit_interval("wait_confidence_quantile", params.wait_confidence_quantile)?;
    validate_unit_interval("estimator_alpha", params.estimator_alpha)?;

    validate_non_negative("reset_threshold", params.reset_threshold)?;
    validate_non_negative("max_abs_measurement_jitter", params.max_abs_measurement_jitter)?;
    validate_non_negative("max_abs_wait_jitter", params.max_abs_wait_jitter)?;
    validate_non_negative("max_total_wait_time", params.max_total_wait_time)?;
    validate_non_negative("batch.max_delta", params.batch.max_delta)?;

    validate_matching(params)?;
    Ok(())
}

fn validate_unit_interval(field: &str, value: f64) -> Result<(), BufferError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(BufferError::config_validation(
            field,
            format!("must lie strictly between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: TimeDelta) -> Result<(), BufferError> {
    if value.is_negative() {
        return Err(BufferError::config_validation(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

fn validate_matching(params: &BufferParams) -> Result<(), BufferError> {
    if params.mode != BufferMode::Match {
        return Ok(());
    }

    match params.matching.reference_stream.as_deref() {
        None => {
            return Err(BufferError::config_validation(
                "match.reference_stream",
                "match mode requires a reference stream",
            ));
        }
        Some("") => {
            return Err(BufferError::config_validation(
                "match.reference_stream",
                "reference stream id cannot be empty",
            ));
        }
        Some(_) => {}
    }

    if params.matching.num_streams == Some(0) {
        return Err(BufferError::config_validation(
            "match.num_streams",
            "a tuple covers at least the reference stream itself",
        ));
    }

    Ok(())
}
