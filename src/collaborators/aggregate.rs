//! Built-in aggregate functions for collapsing ROS scores.
//!
//! Every variant follows NumPy's behavior on the same data: `Mean`, `Median`,
//! `Max` and `Min` return NaN as soon as any score is NaN, while `NanMean`
//! skips NaN scores. All variants return NaN for an empty score list.
use std::str::FromStr;

use crate::{collaborators::traits::Aggregate, metrics::errors::RosError};

/// AggregateKind — named aggregation over all scores of an evaluation.
///
/// Parsing accepts case-insensitive `"mean"`, `"nanmean"`, `"median"`,
/// `"max"` and `"min"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateKind {
    #[default]
    Mean,
    NanMean,
    Median,
    Max,
    Min,
}

impl Aggregate for AggregateKind {
    fn aggregate(&self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return f64::NAN;
        }
        if *self != AggregateKind::NanMean && scores.iter().any(|v| v.is_nan()) {
            return f64::NAN;
        }
        match self {
            AggregateKind::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
            AggregateKind::NanMean => {
                let (sum, count) = scores
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 { f64::NAN } else { sum / count as f64 }
            }
            AggregateKind::Median => median(scores),
            AggregateKind::Max => scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregateKind::Min => scores.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

impl FromStr for AggregateKind {
    type Err = RosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(AggregateKind::Mean),
            "nanmean" => Ok(AggregateKind::NanMean),
            "median" => Ok(AggregateKind::Median),
            "max" => Ok(AggregateKind::Max),
            "min" => Ok(AggregateKind::Min),
            _ => Err(RosError::InvalidOptionName {
                name: s.to_string(),
                reason: "Valid aggregates are case insensitive 'mean', 'nanmean', 'median', \
                         'max' or 'min'.",
            }),
        }
    }
}

// Callers guarantee a non-empty, NaN-free slice.
fn median(scores: &[f64]) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 { 0.5 * (sorted[mid - 1] + sorted[mid]) } else { sorted[mid] }
}
