//! Variability-Adjusted Stability Analysis (VASA).
//!
//! A parameter scores highly when its measurements sit far from their own mean in
//! standard-deviation units while staying tightly clustered. Per-parameter scores are
//! min-max normalized across the set and averaged with uniform weights, giving a value in
//! `[0, 100]`.
//!
//! An entropy over the normalized scores is computed and reported in [`ScoreBreakdown`], but it
//! never feeds the weights. Historical scores were produced with uniform weights and must stay
//! reproducible.

mod stats;
mod weighting;

use serde::Serialize;

use super::parameters::ParameterSet;

/// Divisor substituted for zero variance, zero standard deviation and zero range.
pub const EPSILON: f64 = 1e-9;

/// Fewest parameters a set may carry; range and entropy degenerate below this.
pub const MIN_PARAMETERS: usize = 2;

/// Fewest values per series; variance is meaningless below this.
pub const MIN_SERIES_LEN: usize = 2;

/// Structural problems that prevent scoring a parameter set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("at least 2 parameters are required, got {found}")]
    TooFewParameters { found: usize },
    #[error("parameter '{parameter}' needs at least 2 values, got {len}")]
    SeriesTooShort { parameter: String, len: usize },
    #[error("parameter '{parameter}' has {found} values, expected {expected} like the first parameter")]
    UnequalLengths {
        parameter: String,
        expected: usize,
        found: usize,
    },
    #[error("parameter '{parameter}' has a non-finite value at index {index}")]
    NonFinite { parameter: String, index: usize },
    #[error("parameter '{parameter}' overflows while computing its statistics")]
    Overflow { parameter: String },
}

/// Per-parameter intermediate values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterScore {
    pub name: String,
    pub mean: f64,
    pub variance: f64,
    pub stability: f64,
    pub abs_z_mean: f64,
    pub raw_score: f64,
    pub normalized: f64,
    pub weight: f64,
}

/// Score plus the intermediate values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    /// Normalized entropy of the normalized scores. Not applied to the weights.
    pub entropy: f64,
    pub parameters: Vec<ParameterScore>,
}

/// Compute the VASA score of a parameter set.
pub fn compute_score(parameters: &ParameterSet) -> Result<f64, InvalidInput> {
    score_breakdown(parameters).map(|breakdown| breakdown.score)
}

pub fn score_breakdown(parameters: &ParameterSet) -> Result<ScoreBreakdown, InvalidInput> {
    validate(parameters)?;

    let mut parameters: Vec<ParameterScore> = parameters
        .iter()
        .map(|series| {
            let values = series.values.as_slice();
            let mean = stats::mean(values);
            let variance = stats::variance(values);
            let stability = 1.0 / (variance + EPSILON);
            let abs_z_mean = stats::abs_z_score_mean(values);
            let raw_score = abs_z_mean * stability.sqrt();
            if !(mean.is_finite() && variance.is_finite() && raw_score.is_finite()) {
                return Err(InvalidInput::Overflow {
                    parameter: series.name.clone(),
                });
            }
            Ok(ParameterScore {
                name: series.name.clone(),
                mean,
                variance,
                stability,
                abs_z_mean,
                raw_score,
                normalized: 0.0,
                weight: 0.0,
            })
        })
        .collect::<Result<_, _>>()?;

    let raw_scores: Vec<f64> = parameters.iter().map(|entry| entry.raw_score).collect();
    let normalized = weighting::min_max_normalize(&raw_scores);
    let entropy = weighting::normalized_entropy(&normalized);
    let weights = weighting::uniform_weights(normalized.len());

    let mut weighted_sum = 0.0;
    for ((entry, value), weight) in parameters.iter_mut().zip(&normalized).zip(&weights) {
        entry.normalized = *value;
        entry.weight = *weight;
        weighted_sum += weight * value;
    }

    Ok(ScoreBreakdown {
        score: weighted_sum * 100.0,
        entropy,
        parameters,
    })
}

fn validate(parameters: &ParameterSet) -> Result<(), InvalidInput> {
    if parameters.len() < MIN_PARAMETERS {
        return Err(InvalidInput::TooFewParameters {
            found: parameters.len(),
        });
    }

    let mut expected_len = None;
    for series in parameters {
        let len = series.values.len();
        if len < MIN_SERIES_LEN {
            return Err(InvalidInput::SeriesTooShort {
                parameter: series.name.clone(),
                len,
            });
        }
        if let Some(index) = series.values.iter().position(|value| !value.is_finite()) {
            return Err(InvalidInput::NonFinite {
                parameter: series.name.clone(),
                index,
            });
        }
        match expected_len {
            None => expected_len = Some(len),
            Some(expected) if expected != len => {
                return Err(InvalidInput::UnequalLengths {
                    parameter: series.name.clone(),
                    expected,
                    found: len,
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Round to two decimals for presentation.
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_sample() -> ParameterSet {
        ParameterSet::new()
            .with_series("parameter1", vec![75.0, 78.0, 76.0, 74.0, 77.0])
            .with_series("parameter2", vec![15.0, 12.0, 10.0, 18.0, 13.0])
            .with_series("parameter3", vec![88.0, 90.0, 85.0, 91.0, 87.0])
            .with_series("parameter4", vec![3.0, 4.0, 2.0, 5.0, 3.0])
            .with_series("parameter5", vec![60.0, 62.0, 61.0, 59.0, 63.0])
    }

    #[test]
    fn field_sample_matches_reference_run() {
        let score = compute_score(&field_sample()).expect("valid input");
        assert!((score - 45.004399551275256).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn breakdown_exposes_intermediates() {
        let breakdown = score_breakdown(&field_sample()).expect("valid input");

        assert_eq!(breakdown.parameters.len(), 5);
        let second = &breakdown.parameters[1];
        assert_eq!(second.name, "parameter2");
        assert_eq!(second.mean, 13.6);
        assert_eq!(second.normalized, 0.0);
        let fourth = &breakdown.parameters[3];
        assert_eq!(fourth.normalized, 1.0);
        assert!(breakdown
            .parameters
            .iter()
            .all(|parameter| parameter.weight == 0.2));
        assert!(breakdown.entropy > 0.0 && breakdown.entropy <= 1.0);
    }

    #[test]
    fn two_parameters_split_evenly() {
        let set = ParameterSet::new()
            .with_series("a", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .with_series("b", vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        let score = compute_score(&set).expect("valid input");
        assert!((score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn constant_series_scores_zero_before_normalization() {
        let set = ParameterSet::new()
            .with_series("flat", vec![7.0; 5])
            .with_series("steady", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .with_series("wide", vec![10.0, 20.0, 30.0, 40.0, 50.0]);

        let breakdown = score_breakdown(&set).expect("valid input");

        assert_eq!(breakdown.parameters[0].raw_score, 0.0);
        assert_eq!(breakdown.parameters[0].stability, 1.0 / EPSILON);
        assert!((breakdown.score - 36.66666666749167).abs() < 1e-9);
    }

    #[test]
    fn identical_series_produce_finite_zero() {
        let set: ParameterSet = (1..=5)
            .map(|i| (format!("parameter{i}"), vec![50.0; 5]))
            .collect();
        let score = compute_score(&set).expect("valid input");
        assert!(score.is_finite());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn rejects_single_parameter() {
        let set = ParameterSet::new().with_series("only", vec![1.0, 2.0]);
        assert_eq!(
            compute_score(&set),
            Err(InvalidInput::TooFewParameters { found: 1 })
        );
    }

    #[test]
    fn rejects_empty_series() {
        let set = ParameterSet::new()
            .with_series("p1", vec![1.0, 2.0])
            .with_series("p2", Vec::new());
        assert_eq!(
            compute_score(&set),
            Err(InvalidInput::SeriesTooShort {
                parameter: "p2".to_string(),
                len: 0
            })
        );
    }

    #[test]
    fn rejects_unequal_lengths() {
        let set = ParameterSet::new()
            .with_series("p1", vec![1.0, 2.0, 3.0])
            .with_series("p2", vec![1.0, 2.0]);
        assert_eq!(
            compute_score(&set),
            Err(InvalidInput::UnequalLengths {
                parameter: "p2".to_string(),
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn rejects_non_finite_values() {
        let set = ParameterSet::new()
            .with_series("p1", vec![1.0, f64::NAN])
            .with_series("p2", vec![1.0, 2.0]);
        assert!(matches!(
            compute_score(&set),
            Err(InvalidInput::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_values_whose_statistics_overflow() {
        let summed_past_max = ParameterSet::new()
            .with_series("a", vec![1.7e308, 1.7e308])
            .with_series("b", vec![1.0, 2.0])
            .with_series("c", vec![1.0, 3.0]);
        assert_eq!(
            compute_score(&summed_past_max),
            Err(InvalidInput::Overflow {
                parameter: "a".to_string()
            })
        );

        let squared_past_max = ParameterSet::new()
            .with_series("a", vec![1.0, 2.0])
            .with_series("b", vec![-1.5e308, 1.5e308]);
        assert_eq!(
            compute_score(&squared_past_max),
            Err(InvalidInput::Overflow {
                parameter: "b".to_string()
            })
        );
    }

    #[test]
    fn round_score_keeps_two_decimals() {
        assert_eq!(round_score(45.004399551275256), 45.0);
        assert_eq!(round_score(36.66666666749167), 36.67);
    }
}
