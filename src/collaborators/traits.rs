//! Public collaborator surface for robustness metrics.
//!
//! - [`Model`]: the predictive model, an opaque map from an input batch to a
//!   `(N, C)` logit batch.
//! - [`Explainer`]: the explanation method, producing one attribution map per
//!   input for the given labels.
//! - [`Perturb`]: a stochastic perturbation of one input.
//! - [`PredictionChange`]: reports which inputs changed their predicted class
//!   under perturbation.
//! - [`Normalise`]: post-processing of an explanation batch.
//! - [`Aggregate`]: collapses all scores of an evaluation into one scalar.
//!
//! Convention: collaborators report failures as `anyhow::Error`; the metric
//! wraps them into `RosError::CollaboratorFailed` and aborts the call. They
//! are expected to be total over well-formed batches; no retry is attempted.
//!
//! Closures with the matching signature implement [`Model`], [`Explainer`],
//! [`Perturb`], [`Normalise`] and [`Aggregate`] directly.
use ndarray::{Array2, ArrayD, ArrayViewD};
use rand::rngs::StdRng;

use crate::metrics::core::data::LabelBatch;

/// User-implemented predictive model.
///
/// Required:
/// - `predict(x_batch) -> (N, C)` logits. Must be deterministic for the
///   prediction-change guard and the shared baseline to be meaningful.
pub trait Model {
    fn predict(&self, x_batch: ArrayViewD<'_, f64>) -> anyhow::Result<Array2<f64>>;
}

impl<F> Model for F
where
    F: Fn(ArrayViewD<'_, f64>) -> anyhow::Result<Array2<f64>>,
{
    fn predict(&self, x_batch: ArrayViewD<'_, f64>) -> anyhow::Result<Array2<f64>> {
        self(x_batch)
    }
}

/// User-implemented explanation method.
///
/// Required:
/// - `explain(model, x_batch, y_batch)`: one explanation per input, batch axis
///   first, with the same shape as the explanations it is compared against.
pub trait Explainer {
    fn explain(
        &self, model: &dyn Model, x_batch: ArrayViewD<'_, f64>, y_batch: &LabelBatch,
    ) -> anyhow::Result<ArrayD<f64>>;
}

impl<F> Explainer for F
where
    F: Fn(&dyn Model, ArrayViewD<'_, f64>, &LabelBatch) -> anyhow::Result<ArrayD<f64>>,
{
    fn explain(
        &self, model: &dyn Model, x_batch: ArrayViewD<'_, f64>, y_batch: &LabelBatch,
    ) -> anyhow::Result<ArrayD<f64>> {
        self(model, x_batch, y_batch)
    }
}

/// Stochastic perturbation of a single input (no batch axis).
///
/// Implementations must return an array of the input's shape and draw all
/// randomness from `rng`, so seeded evaluations are reproducible.
pub trait Perturb {
    fn perturb(&self, input: ArrayViewD<'_, f64>, rng: &mut StdRng) -> anyhow::Result<ArrayD<f64>>;
}

impl<F> Perturb for F
where
    F: Fn(ArrayViewD<'_, f64>, &mut StdRng) -> anyhow::Result<ArrayD<f64>>,
{
    fn perturb(&self, input: ArrayViewD<'_, f64>, rng: &mut StdRng) -> anyhow::Result<ArrayD<f64>> {
        self(input, rng)
    }
}

/// Detector for perturbations that flipped the model's prediction.
///
/// Returns the 0-based batch indices whose predicted class differs between
/// `x_batch` and `x_perturbed`.
pub trait PredictionChange {
    fn changed_prediction_indices(
        &self, model: &dyn Model, x_batch: ArrayViewD<'_, f64>, x_perturbed: ArrayViewD<'_, f64>,
    ) -> anyhow::Result<Vec<usize>>;
}

/// Explanation batch post-processing (batch axis first).
pub trait Normalise {
    fn normalise(&self, a_batch: ArrayD<f64>) -> ArrayD<f64>;
}

impl<F> Normalise for F
where
    F: Fn(ArrayD<f64>) -> ArrayD<f64>,
{
    fn normalise(&self, a_batch: ArrayD<f64>) -> ArrayD<f64> {
        self(a_batch)
    }
}

/// Collapse all scores of an evaluation into a single scalar.
pub trait Aggregate {
    fn aggregate(&self, scores: &[f64]) -> f64;
}

impl<F> Aggregate for F
where
    F: Fn(&[f64]) -> f64,
{
    fn aggregate(&self, scores: &[f64]) -> f64 {
        self(scores)
    }
}
