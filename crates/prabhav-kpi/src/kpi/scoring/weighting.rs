use super::stats::or_epsilon;

/// Min-max rescale into `[0, 1]`. A zero range is replaced by `EPSILON`, so equal scores all
/// map to zero.
pub(crate) fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = or_epsilon(max - min);
    scores.iter().map(|score| (score - min) / range).collect()
}

/// Normalized Shannon entropy of the proportions of `normalized`, scaled by `1 / ln(n)`.
///
/// Reported as a diagnostic only. Final weights stay uniform.
pub(crate) fn normalized_entropy(normalized: &[f64]) -> f64 {
    let total = or_epsilon(normalized.iter().sum::<f64>());
    let k = 1.0 / (normalized.len() as f64).ln();
    let sum = normalized
        .iter()
        .map(|value| value / total)
        .filter(|p| *p > 0.0)
        .fold(0.0, |acc, p| acc + p * p.ln());
    -k * sum
}

pub(crate) fn uniform_weights(count: usize) -> Vec<f64> {
    vec![1.0 / count as f64; count]
}
