//! Normal-distribution quantile evaluation.
//!
//! The buffer only ever needs the inverse CDF of a single-variate normal
//! distribution, so a rational approximation beats pulling in a full
//! statistics dependency.

/// Quantile (inverse CDF) of a normal distribution with the given moments.
pub(crate) fn quantile(mean: f64, stddev: f64, p: f64) -> f64 {
    mean + stddev * probit(p)
}

/// Inverse standard-normal CDF (probit function).
///
/// Computes Φ⁻¹(p) using the Abramowitz & Stegun approximation (26.2.23).
/// Accurate to ~4.5×10⁻⁴ for p ∈ (0, 1).
fn probit(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    // Use symmetry: for p < 0.5, compute -probit(1-p)
    let (sign, q) = if p < 0.5 { (-1.0, 1.0 - p) } else { (1.0, p) };

    // Rational approximation constants (Abramowitz & Stegun 26.2.23)
    const C0: f64 = 2.515517;
    const C1: f64 = 0.802853;
    const C2: f64 = 0.010328;
    const D1: f64 = 1.432788;
    const D2: f64 = 0.189269;
    const D3: f64 = 0.001308;

    let t = (-2.0 * (1.0 - q).ln()).sqrt();
    let z = t - (C0 + C1 * t + C2 * t * t) / (1.0 + D1 * t + D2 * t * t + D3 * t * t * t);

    sign * z
}
