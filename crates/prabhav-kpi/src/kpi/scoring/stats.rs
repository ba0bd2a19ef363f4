use super::EPSILON;

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance: mean of squared deviations.
pub(crate) fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Mean absolute standardized deviation. A zero standard deviation is replaced by `EPSILON`.
pub(crate) fn abs_z_score_mean(values: &[f64]) -> f64 {
    let m = mean(values);
    let sd = or_epsilon(variance(values).sqrt());
    values.iter().map(|x| ((x - m) / sd).abs()).sum::<f64>() / values.len() as f64
}

/// Substitutes `EPSILON` for a zero (or NaN) divisor.
pub(crate) fn or_epsilon(value: f64) -> f64 {
    if value == 0.0 || value.is_nan() {
        EPSILON
    } else {
        value
    }
}
