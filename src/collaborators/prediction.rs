//! Prediction-change detectors.
//!
//! Purpose
//! -------
//! Decide which perturbed inputs flipped the model's predicted class. The ROS
//! sampling loop marks those draws as NaN instead of letting a class flip
//! inflate the stability ratio.
//!
//! Key behaviors
//! -------------
//! - [`ArgmaxChange`] compares the per-row argmax of the logits for the
//!   original and the perturbed batch.
//! - [`NeverChanged`] reports no changes and disables NaN-marking.
//! - [`changed_prediction_detector`] picks one of the two from the
//!   `return_nan_when_prediction_changes` flag.
//!
//! Conventions
//! -----------
//! - Argmax follows NumPy: the first maximal column wins and a NaN logit
//!   counts as the maximum.
use anyhow::ensure;
use ndarray::{Array2, ArrayView1, ArrayViewD, Axis};

use crate::collaborators::traits::{Model, PredictionChange};

/// Flags inputs whose argmax class differs after perturbation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgmaxChange;

impl PredictionChange for ArgmaxChange {
    fn changed_prediction_indices(
        &self, model: &dyn Model, x_batch: ArrayViewD<'_, f64>, x_perturbed: ArrayViewD<'_, f64>,
    ) -> anyhow::Result<Vec<usize>> {
        let original = model.predict(x_batch)?;
        let perturbed = model.predict(x_perturbed)?;
        ensure!(
            original.dim() == perturbed.dim(),
            "logit shapes differ between original {:?} and perturbed {:?} inputs",
            original.dim(),
            perturbed.dim()
        );
        Ok(changed_rows(&original, &perturbed))
    }
}

/// Reports no prediction changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverChanged;

impl PredictionChange for NeverChanged {
    fn changed_prediction_indices(
        &self, _model: &dyn Model, _x_batch: ArrayViewD<'_, f64>,
        _x_perturbed: ArrayViewD<'_, f64>,
    ) -> anyhow::Result<Vec<usize>> {
        Ok(Vec::new())
    }
}

/// Default detector for the given NaN-guard flag.
pub fn changed_prediction_detector(return_nan: bool) -> Box<dyn PredictionChange + Send + Sync> {
    if return_nan { Box::new(ArgmaxChange) } else { Box::new(NeverChanged) }
}

fn changed_rows(original: &Array2<f64>, perturbed: &Array2<f64>) -> Vec<usize> {
    original
        .axis_iter(Axis(0))
        .zip(perturbed.axis_iter(Axis(0)))
        .enumerate()
        .filter(|(_, (a, b))| argmax(*a) != argmax(*b))
        .map(|(i, _)| i)
        .collect()
}

fn argmax(row: ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in row.iter().enumerate() {
        best = match best {
            None => Some((i, v)),
            Some((_, b)) if b.is_nan() => best,
            Some(_) if v.is_nan() => Some((i, v)),
            Some((_, b)) if v > b => Some((i, v)),
            keep => keep,
        };
    }
    best.map(|(i, _)| i)
}
