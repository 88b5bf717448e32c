//! Draw accumulation and reduction for the ROS sampling loop.
//!
//! Purpose
//! -------
//! Hold the per-draw objective values of one evaluate call ([`DrawMatrix`]),
//! collapse them to one score per input (max over draws), reshape multi-label
//! results into per-sample label lists, and carry the final scores
//! ([`RosScores`]).
//!
//! Key behaviors
//! -------------
//! - [`DrawMatrix`] is shaped `[nr_samples, N]` or `[nr_samples, N, L]` and is
//!   written one full row per draw; invalidated cells hold `NaN`.
//! - [`DrawMatrix::max_over_draws`] applies an explicit [`NanPolicy`]:
//!   `Propagate` (any NaN draw makes the sample NaN, as a plain NumPy max) or
//!   `Ignore` (max over valid draws, NaN only when no draw is valid).
//! - [`select_labels`] is the separate multi-label reshape: for every sample,
//!   pick the columns of its active labels.
//!
//! Invariants & assumptions
//! ------------------------
//! - Row writes must match the per-draw shape exactly; a mismatched row is a
//!   collaborator contract violation and is reported as an error.
//! - The matrix is call-scoped: allocated per evaluate call, never shared.
//!
//! Testing notes
//! -------------
//! - Unit tests cover both NaN policies, the single-draw identity, the
//!   multi-label reshape (including out-of-range labels), and `RosScores`
//!   accessors.
use std::str::FromStr;

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use crate::metrics::errors::{RosError, RosResult};

/// How NaN (invalidated) draws take part in the max over draws.
///
/// Parsing accepts case-insensitive `"propagate"` and `"ignore"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    /// Any NaN draw makes the sample's score NaN.
    #[default]
    Propagate,
    /// NaN draws are skipped; the score is NaN only if every draw is NaN.
    Ignore,
}

impl FromStr for NanPolicy {
    type Err = RosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "propagate" => Ok(NanPolicy::Propagate),
            "ignore" => Ok(NanPolicy::Ignore),
            _ => Err(RosError::InvalidOptionName {
                name: s.to_string(),
                reason: "Valid NaN policies are case insensitive 'propagate' or 'ignore'.",
            }),
        }
    }
}

impl NanPolicy {
    /// Fold one more draw into a running maximum.
    #[inline]
    fn fold(&self, acc: f64, value: f64) -> f64 {
        match self {
            NanPolicy::Propagate => {
                if acc.is_nan() || value.is_nan() {
                    f64::NAN
                } else {
                    acc.max(value)
                }
            }
            // f64::max returns the non-NaN operand.
            NanPolicy::Ignore => acc.max(value),
        }
    }
}

/// DrawMatrix — per-draw ROS objective values for one batch.
///
/// Fields
/// ------
/// - `values`: `ArrayD<f64>` of shape `[nr_samples, N]` or
///   `[nr_samples, N, L]`, zero-initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawMatrix {
    values: ArrayD<f64>,
}

impl DrawMatrix {
    /// Allocate a zeroed matrix for `nr_samples` draws of shape `draw_shape`
    /// (`[N]` or `[N, L]`).
    pub fn new(nr_samples: usize, draw_shape: &[usize]) -> Self {
        let mut shape = Vec::with_capacity(draw_shape.len() + 1);
        shape.push(nr_samples);
        shape.extend_from_slice(draw_shape);
        DrawMatrix { values: ArrayD::zeros(IxDyn(&shape)) }
    }

    /// Number of draw rows.
    pub fn nr_samples(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    /// Shape of one draw row (`[N]` or `[N, L]`).
    pub fn draw_shape(&self) -> &[usize] {
        &self.values.shape()[1..]
    }

    /// Read-only view of all draws.
    pub fn view(&self) -> ArrayViewD<'_, f64> {
        self.values.view()
    }

    /// Store the objective values of draw `draw`.
    ///
    /// # Errors
    /// - [`RosError::ShapeMismatch`] if `row` does not have the draw shape.
    pub fn set_row(&mut self, draw: usize, row: ArrayViewD<'_, f64>) -> RosResult<()> {
        if row.shape() != self.draw_shape() {
            return Err(RosError::ShapeMismatch {
                what: "objective row",
                expected: self.draw_shape().to_vec(),
                actual: row.shape().to_vec(),
            });
        }
        self.values.index_axis_mut(Axis(0), draw).assign(&row);
        Ok(())
    }

    /// Overwrite every cell of `sample` in draw `draw` with NaN.
    ///
    /// # Errors
    /// - [`RosError::BatchSizeMismatch`] if `sample` is outside the batch.
    pub fn invalidate(&mut self, draw: usize, sample: usize) -> RosResult<()> {
        let batch = self.draw_shape()[0];
        if sample >= batch {
            return Err(RosError::BatchSizeMismatch {
                what: "changed prediction index",
                expected: batch,
                actual: sample,
            });
        }
        self.values.index_axis_mut(Axis(0), draw).index_axis_mut(Axis(0), sample).fill(f64::NAN);
        Ok(())
    }

    /// Element-wise maximum over the draw axis under `policy`.
    ///
    /// Returns an array of the draw shape. With a single draw the result is
    /// that draw's row.
    pub fn max_over_draws(&self, policy: NanPolicy) -> ArrayD<f64> {
        let mut rows = self.values.axis_iter(Axis(0));
        let Some(first) = rows.next() else {
            return ArrayD::from_elem(IxDyn(self.draw_shape()), f64::NAN);
        };
        let mut acc = first.to_owned();
        for row in rows {
            acc.zip_mut_with(&row, |a, &v| *a = policy.fold(*a, v));
        }
        acc
    }
}

/// Assemble per-sample lists of per-label scores.
///
/// # Arguments
/// - `reduced`: `(N, L)` scores after the max over draws.
/// - `labels`: the active label indices of each sample.
///
/// # Errors
/// - [`RosError::UnsupportedShape`] if `reduced` is not rank 2.
/// - [`RosError::BatchSizeMismatch`] if `labels.len() != N`.
/// - [`RosError::LabelOutOfRange`] if a label is `>= L`.
pub fn select_labels(reduced: ArrayViewD<'_, f64>, labels: &[Vec<usize>]) -> RosResult<Vec<Vec<f64>>> {
    if reduced.ndim() != 2 {
        return Err(RosError::UnsupportedShape { ndim: reduced.ndim(), multi_label: true });
    }
    let (batch, n_labels) = (reduced.shape()[0], reduced.shape()[1]);
    if labels.len() != batch {
        return Err(RosError::BatchSizeMismatch {
            what: "label lists",
            expected: batch,
            actual: labels.len(),
        });
    }
    labels
        .iter()
        .enumerate()
        .map(|(sample, label_list)| {
            label_list
                .iter()
                .map(|&label| {
                    if label >= n_labels {
                        return Err(RosError::LabelOutOfRange { sample, label, labels: n_labels });
                    }
                    Ok(reduced[[sample, label]])
                })
                .collect::<RosResult<Vec<f64>>>()
        })
        .collect()
}

/// Final scores of a ROS evaluation.
///
/// - `PerSample`: one score per input (single-label).
/// - `PerLabel`: one list of per-label scores per input (multi-label).
/// - `Aggregate`: one scalar for the whole evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RosScores {
    PerSample(Vec<f64>),
    PerLabel(Vec<Vec<f64>>),
    Aggregate(f64),
}

impl RosScores {
    /// Number of top-level entries (inputs, or 1 when aggregated).
    pub fn len(&self) -> usize {
        match self {
            RosScores::PerSample(v) => v.len(),
            RosScores::PerLabel(v) => v.len(),
            RosScores::Aggregate(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All scores in sample-major, label-minor order.
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            RosScores::PerSample(v) => v.clone(),
            RosScores::PerLabel(v) => v.iter().flatten().copied().collect(),
            RosScores::Aggregate(x) => vec![*x],
        }
    }

    /// Append the per-input scores of `other` (same variant) to `self`.
    ///
    /// # Errors
    /// - [`RosError::LabelModeMismatch`] when mixing single- and multi-label
    ///   scores, or when either side is already aggregated.
    pub fn extend(&mut self, other: RosScores) -> RosResult<()> {
        match (self, other) {
            (RosScores::PerSample(a), RosScores::PerSample(b)) => a.extend(b),
            (RosScores::PerLabel(a), RosScores::PerLabel(b)) => a.extend(b),
            (lhs, _) => {
                return Err(RosError::LabelModeMismatch {
                    multi_label: matches!(lhs, RosScores::PerLabel(_)),
                });
            }
        }
        Ok(())
    }
}
