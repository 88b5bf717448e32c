//! metrics::core::validation — batch contract checks for ROS evaluation.
//!
//! Purpose
//! -------
//! Centralize the structural preconditions of an evaluate call so that the
//! sampling loop can assume consistent batch sizes, label flavour and
//! explanation rank, and so that contract violations surface before any
//! collaborator is invoked.
//!
//! Key behaviors
//! -------------
//! - [`validate_batch`] checks inputs, labels and explanations against each
//!   other and resolves the [`ExplanationKind`] once per call.
//! - [`validate_logits`] and [`validate_explanations`] check collaborator
//!   outputs on every draw.
//!
//! Conventions
//! -----------
//! - Pure checks; no allocation beyond error payloads and no logging.
//! - Every failure is fatal for the call and reported as a [`RosError`].
use ndarray::{Array2, ArrayViewD};

use crate::metrics::{
    core::{data::LabelBatch, shape::ExplanationKind},
    errors::{RosError, RosResult},
};

/// Validate one evaluate-batch call and resolve its explanation layout.
///
/// Parameters
/// ----------
/// - `x_batch`: inputs, batch axis first, `N >= 1`.
/// - `y_batch`: `N` labels whose flavour matches `multi_label`.
/// - `a_batch`: explanations with leading dimension `N` and a supported rank.
/// - `multi_label`: label mode of the metric.
///
/// Returns
/// -------
/// `RosResult<ExplanationKind>`
///   The layout used for every draw of this call.
///
/// Errors
/// ------
/// - `RosError::EmptyBatch` when `N == 0` or `x_batch` is rank 0.
/// - `RosError::BatchSizeMismatch` when labels or explanations disagree
///   with `N`.
/// - `RosError::LabelModeMismatch` when label flavour and mode disagree.
/// - `RosError::UnsupportedShape` for unsupported explanation ranks.
/// - `RosError::LabelOutOfRange` when a multi-label index exceeds the
///   explanation's label axis.
pub fn validate_batch(
    x_batch: ArrayViewD<'_, f64>, y_batch: &LabelBatch, a_batch: ArrayViewD<'_, f64>,
    multi_label: bool,
) -> RosResult<ExplanationKind> {
    let batch = match x_batch.shape().first() {
        Some(&n) if n > 0 => n,
        _ => return Err(RosError::EmptyBatch),
    };
    if y_batch.is_multi_label() != multi_label {
        return Err(RosError::LabelModeMismatch { multi_label });
    }
    if y_batch.len() != batch {
        return Err(RosError::BatchSizeMismatch {
            what: "labels",
            expected: batch,
            actual: y_batch.len(),
        });
    }
    let kind = ExplanationKind::from_ndim(a_batch.ndim(), multi_label)?;
    if a_batch.shape()[0] != batch {
        return Err(RosError::BatchSizeMismatch {
            what: "explanations",
            expected: batch,
            actual: a_batch.shape()[0],
        });
    }
    if let LabelBatch::Multi(lists) = y_batch {
        let n_labels = a_batch.shape()[1];
        for (sample, list) in lists.iter().enumerate() {
            if let Some(&label) = list.iter().find(|&&label| label >= n_labels) {
                return Err(RosError::LabelOutOfRange { sample, label, labels: n_labels });
            }
        }
    }
    Ok(kind)
}

/// Check that a model returned one row of logits per input.
pub fn validate_logits(logits: &Array2<f64>, batch: usize) -> RosResult<()> {
    if logits.nrows() != batch {
        return Err(RosError::BatchSizeMismatch {
            what: "model logits",
            expected: batch,
            actual: logits.nrows(),
        });
    }
    Ok(())
}

/// Check that regenerated explanations match the shape of the originals.
pub fn validate_explanations(
    original: ArrayViewD<'_, f64>, perturbed: ArrayViewD<'_, f64>,
) -> RosResult<()> {
    if original.shape() != perturbed.shape() {
        return Err(RosError::ShapeMismatch {
            what: "perturbed explanations",
            expected: original.shape().to_vec(),
            actual: perturbed.shape().to_vec(),
        });
    }
    Ok(())
}
