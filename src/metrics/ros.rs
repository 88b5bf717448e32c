//! Relative Output Stability — perturbation sampling and maximization.
//!
//! Purpose
//! -------
//! Estimate, for every input, the worst-case ratio between the relative
//! change of its explanation and the change of the model's logits over a
//! finite set of random perturbations (Agarwal et al., 2022,
//! arXiv:2203.06877):
//!
//! ```text
//! ROS(x) = max_{x'}  || (e_x - e_x') / e_x ||_2  /  max(|| h(x) - h(x') ||_2, eps_min)
//! ```
//!
//! Key behaviors
//! -------------
//! - [`RelativeOutputStability::evaluate_batch`] runs the sampling loop on
//!   one batch: logits once, then `nr_samples` draws of perturb → explain →
//!   predict → objective, with draws whose prediction flipped marked NaN, and
//!   finally the max over draws.
//! - [`RelativeOutputStability::evaluate`] splits a dataset into batches,
//!   computes missing explanations, evaluates every batch from one RNG
//!   stream and aggregates once over the whole dataset.
//! - Every collaborator (perturbation, detector, normaliser, aggregate) has a
//!   default chosen from [`RosOptions`] and can be replaced with a `with_*`
//!   method.
//!
//! Invariants & assumptions
//! ------------------------
//! - The metric is immutable after construction; each evaluate call owns its
//!   RNG and draw matrix, so calls never interfere.
//! - The explanation layout is resolved once per batch and reused for every
//!   draw.
//! - Any collaborator failure aborts the call with
//!   [`RosError::CollaboratorFailed`]; no partial scores are returned.
//!
//! Conventions
//! -----------
//! - Scores are `PerSample` in single-label mode, `PerLabel` (one list per
//!   input, in label order) in multi-label mode, and `Aggregate` when
//!   `return_aggregate` is set.
//! - Logging: `warn!` once at construction for the parameterisation notice,
//!   `debug!` per batch, `trace!` per draw.
use std::fmt;

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, trace, warn};

use crate::{
    collaborators::{
        aggregate::AggregateKind,
        normalise::{AverageSecondMoment, absolute},
        perturb::{DEFAULT_UNIFORM_LOWER_BOUND, UniformNoise, perturb_batch},
        prediction::changed_prediction_detector,
        traits::{Aggregate, Explainer, Model, Normalise, Perturb, PredictionChange},
    },
    metrics::{
        core::{
            data::LabelBatch,
            objective::objective_with_kind,
            options::RosOptions,
            reduce::{DrawMatrix, RosScores, select_labels},
            validation::{validate_batch, validate_explanations, validate_logits},
        },
        errors::{RosError, RosResult},
    },
};

/// RelativeOutputStability — ROS robustness metric.
///
/// Fields
/// ------
/// - `options`: validated configuration.
/// - `perturb`: per-input perturbation; default `U(0.02, noise_upper_bound)`.
/// - `prediction_change`: detector for flipped predictions; default
///   `ArgmaxChange` when the NaN guard is on, `NeverChanged` otherwise.
/// - `normaliser`: used when `options.normalise`; default
///   `AverageSecondMoment`.
/// - `aggregate`: used when `options.return_aggregate`; default `Mean`.
pub struct RelativeOutputStability {
    options: RosOptions,
    perturb: Box<dyn Perturb + Send + Sync>,
    prediction_change: Box<dyn PredictionChange + Send + Sync>,
    normaliser: Box<dyn Normalise + Send + Sync>,
    aggregate: Box<dyn Aggregate + Send + Sync>,
}

impl fmt::Debug for RelativeOutputStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelativeOutputStability")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RelativeOutputStability {
    /// Build the metric with default collaborators derived from `options`.
    ///
    /// Unless `options.disable_warnings` is set, logs a warning naming the
    /// parameters the score is most sensitive to.
    ///
    /// Errors
    /// ------
    /// - Any error of [`RosOptions::validate`], for options whose public
    ///   fields were edited after construction.
    /// - `RosError::InvalidNoiseBounds` if the default uniform noise cannot be
    ///   built from `options.noise_upper_bound`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_robustness::metrics::{RelativeOutputStability, RosOptions};
    /// let opts = RosOptions::new(10, 1e-6, 0.2).unwrap().with_disable_warnings(true);
    /// let metric = RelativeOutputStability::new(opts).unwrap();
    /// assert_eq!(metric.options().nr_samples, 10);
    /// ```
    pub fn new(options: RosOptions) -> RosResult<Self> {
        options.validate()?;
        let perturb =
            UniformNoise::new(DEFAULT_UNIFORM_LOWER_BOUND, Some(options.noise_upper_bound))?;
        if !options.disable_warnings {
            warn!(
                metric = "RelativeOutputStability",
                nr_samples = options.nr_samples,
                "The metric is sensitive to its parameterisation: the function used to generate \
                 perturbations 'perturb_func' and its parameters, and the number of times \
                 perturbations are sampled 'nr_samples'. Citation: Chirag Agarwal, et. al., 2022. \
                 \"Rethinking stability for attribution based explanations.\" \
                 https://arxiv.org/pdf/2203.06877.pdf"
            );
        }
        Ok(RelativeOutputStability {
            prediction_change: changed_prediction_detector(
                options.return_nan_when_prediction_changes,
            ),
            perturb: Box::new(perturb),
            normaliser: Box::new(AverageSecondMoment),
            aggregate: Box::new(AggregateKind::default()),
            options,
        })
    }

    /// Replace the input perturbation.
    pub fn with_perturb<P>(mut self, perturb: P) -> Self
    where
        P: Perturb + Send + Sync + 'static,
    {
        self.perturb = Box::new(perturb);
        self
    }

    /// Replace the prediction-change detector. This overrides the choice made
    /// from `return_nan_when_prediction_changes`.
    pub fn with_prediction_change<C>(mut self, detector: C) -> Self
    where
        C: PredictionChange + Send + Sync + 'static,
    {
        self.prediction_change = Box::new(detector);
        self
    }

    pub fn with_normalise<N>(mut self, normaliser: N) -> Self
    where
        N: Normalise + Send + Sync + 'static,
    {
        self.normaliser = Box::new(normaliser);
        self
    }

    pub fn with_aggregate<A>(mut self, aggregate: A) -> Self
    where
        A: Aggregate + Send + Sync + 'static,
    {
        self.aggregate = Box::new(aggregate);
        self
    }

    pub fn options(&self) -> &RosOptions {
        &self.options
    }

    /// Evaluate ROS on a single batch with precomputed explanations.
    ///
    /// Parameters
    /// ----------
    /// - `model`: predictive model, queried for original and perturbed logits.
    /// - `explainer`: regenerates explanations for perturbed inputs.
    /// - `x_batch`: `N >= 1` inputs, batch axis first.
    /// - `y_batch`: labels matching the metric's label mode.
    /// - `a_batch`: explanations of `x_batch` for `y_batch`, already
    ///   post-processed; `normalise`/`abs` apply only to perturbed ones here.
    ///
    /// Returns
    /// -------
    /// `RosResult<RosScores>`
    ///   Per-sample or per-label scores, or one aggregate when
    ///   `return_aggregate` is set. Scores of inputs whose prediction flipped
    ///   follow the configured `NanPolicy`.
    ///
    /// Errors
    /// ------
    /// - Batch contract violations (see `validate_batch`).
    /// - `RosError::CollaboratorFailed` if any collaborator fails.
    /// - `RosError::ShapeMismatch` / `RosError::BatchSizeMismatch` for
    ///   malformed collaborator outputs.
    pub fn evaluate_batch(
        &self, model: &dyn Model, explainer: &dyn Explainer, x_batch: ArrayViewD<'_, f64>,
        y_batch: &LabelBatch, a_batch: ArrayViewD<'_, f64>,
    ) -> RosResult<RosScores> {
        let mut rng = self.rng();
        let scores = self.score_batch(model, explainer, x_batch, y_batch, a_batch, &mut rng)?;
        Ok(self.finish(scores))
    }

    /// Evaluate ROS on a whole dataset, `batch_size` inputs at a time.
    ///
    /// When `a_batch` is `None` the explanations of each batch are generated
    /// with `explainer`. Supplied and generated explanations alike go through
    /// the same `normalise`/`abs` post-processing as perturbed explanations.
    /// All batches draw from one RNG stream, and the aggregate (if enabled)
    /// is applied once to the concatenated scores.
    ///
    /// Errors
    /// ------
    /// - `RosError::EmptyBatch` for an empty dataset.
    /// - `RosError::BatchSizeMismatch` when labels or explanations do not
    ///   cover every input.
    /// - Any error of [`RelativeOutputStability::evaluate_batch`].
    pub fn evaluate(
        &self, model: &dyn Model, explainer: &dyn Explainer, x_batch: ArrayViewD<'_, f64>,
        y_batch: &LabelBatch, a_batch: Option<ArrayViewD<'_, f64>>,
    ) -> RosResult<RosScores> {
        let n = match x_batch.shape().first() {
            Some(&n) if n > 0 => n,
            _ => return Err(RosError::EmptyBatch),
        };
        if y_batch.len() != n {
            return Err(RosError::BatchSizeMismatch {
                what: "labels",
                expected: n,
                actual: y_batch.len(),
            });
        }
        if let Some(a) = &a_batch {
            let actual = a.shape().first().copied().unwrap_or(0);
            if actual != n {
                return Err(RosError::BatchSizeMismatch {
                    what: "explanations",
                    expected: n,
                    actual,
                });
            }
        }

        let mut rng = self.rng();
        let mut scores = if y_batch.is_multi_label() {
            RosScores::PerLabel(Vec::with_capacity(n))
        } else {
            RosScores::PerSample(Vec::with_capacity(n))
        };
        let batch_size = self.options.batch_size;
        for start in (0..n).step_by(batch_size) {
            let end = (start + batch_size).min(n);
            debug!(start, end, n, "evaluating ROS batch");
            let rows = Slice::from(start..end);
            let x_chunk = x_batch.slice_axis(Axis(0), rows);
            let y_chunk = y_batch.slice(start..end)?;
            let a_chunk = match &a_batch {
                Some(a) => self.postprocess(a.slice_axis(Axis(0), rows).to_owned()),
                None => self.explain_batch(model, explainer, x_chunk.view(), &y_chunk)?,
            };
            let chunk_scores =
                self.score_batch(model, explainer, x_chunk, &y_chunk, a_chunk.view(), &mut rng)?;
            scores.extend(chunk_scores)?;
        }
        Ok(self.finish(scores))
    }

    fn rng(&self) -> StdRng {
        match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Generate explanations and apply the configured post-processing.
    fn explain_batch(
        &self, model: &dyn Model, explainer: &dyn Explainer, x_batch: ArrayViewD<'_, f64>,
        y_batch: &LabelBatch,
    ) -> RosResult<ArrayD<f64>> {
        let a_batch = explainer
            .explain(model, x_batch, y_batch)
            .map_err(|err| RosError::collaborator("explainer", err))?;
        Ok(self.postprocess(a_batch))
    }

    /// Apply `normalise` then `abs`, as configured.
    fn postprocess(&self, mut a_batch: ArrayD<f64>) -> ArrayD<f64> {
        if self.options.normalise {
            a_batch = self.normaliser.normalise(a_batch);
        }
        if self.options.abs {
            a_batch = absolute(a_batch);
        }
        a_batch
    }

    /// Sampling loop and max over draws for one batch, before aggregation.
    fn score_batch(
        &self, model: &dyn Model, explainer: &dyn Explainer, x_batch: ArrayViewD<'_, f64>,
        y_batch: &LabelBatch, a_batch: ArrayViewD<'_, f64>, rng: &mut StdRng,
    ) -> RosResult<RosScores> {
        let opts = &self.options;
        let kind = validate_batch(x_batch.view(), y_batch, a_batch.view(), opts.multi_label)?;
        let batch = x_batch.shape()[0];

        let logits =
            model.predict(x_batch.view()).map_err(|err| RosError::collaborator("model", err))?;
        validate_logits(&logits, batch)?;

        let draw_shape =
            if kind.is_multi_label() { vec![batch, a_batch.shape()[1]] } else { vec![batch] };
        let mut draws = DrawMatrix::new(opts.nr_samples, &draw_shape);

        for draw in 0..draws.nr_samples() {
            let x_perturbed = perturb_batch(self.perturb.as_ref(), x_batch.view(), rng)?;
            let a_perturbed = self.explain_batch(model, explainer, x_perturbed.view(), y_batch)?;
            validate_explanations(a_batch.view(), a_perturbed.view())?;

            let logits_perturbed = model
                .predict(x_perturbed.view())
                .map_err(|err| RosError::collaborator("model", err))?;
            validate_logits(&logits_perturbed, batch)?;

            let row = objective_with_kind(
                logits.view(),
                logits_perturbed.view(),
                a_batch.view(),
                a_perturbed.view(),
                kind,
                opts.eps_min,
            )?;
            draws.set_row(draw, row.view())?;

            let changed = self
                .prediction_change
                .changed_prediction_indices(model, x_batch.view(), x_perturbed.view())
                .map_err(|err| RosError::collaborator("prediction_change", err))?;
            for &sample in &changed {
                draws.invalidate(draw, sample)?;
            }
            trace!(draw, changed = changed.len(), "ROS draw evaluated");
        }

        let reduced = draws.max_over_draws(opts.nan_policy);
        match y_batch {
            LabelBatch::Single(_) => Ok(RosScores::PerSample(reduced.iter().copied().collect())),
            LabelBatch::Multi(lists) => {
                Ok(RosScores::PerLabel(select_labels(reduced.view(), lists)?))
            }
        }
    }

    fn finish(&self, scores: RosScores) -> RosScores {
        if self.options.return_aggregate {
            RosScores::Aggregate(self.aggregate.aggregate(&scores.flatten()))
        } else {
            scores
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collaborators::prediction::NeverChanged, metrics::core::reduce::NanPolicy};
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The end-to-end sampling loop on hand-computable single- and
    //   multi-label batches with deterministic stub collaborators.
    // - NaN-marking of flipped predictions under both NaN policies.
    // - Aggregation, the single-draw case, dataset batching, seeding, and
    //   collaborator failure propagation.
    //
    // Stub collaborators are deterministic so every expected value can be
    // written down from the formula.
    // -------------------------------------------------------------------------

    /// Adds a fixed offset to every element.
    struct Shift(f64);
    impl Perturb for Shift {
        fn perturb(
            &self, input: ArrayViewD<'_, f64>, _rng: &mut StdRng,
        ) -> anyhow::Result<ArrayD<f64>> {
            Ok(input.mapv(|v| v + self.0))
        }
    }

    /// Logits are the inputs.
    struct Identity;
    impl Model for Identity {
        fn predict(&self, x_batch: ArrayViewD<'_, f64>) -> anyhow::Result<Array2<f64>> {
            Ok(x_batch.to_owned().into_dimensionality()?)
        }
    }

    /// Explanation equals the input, optionally replicated along a label axis.
    struct InputAsExplanation {
        labels: Option<usize>,
    }
    impl Explainer for InputAsExplanation {
        fn explain(
            &self, _model: &dyn Model, x_batch: ArrayViewD<'_, f64>, _y: &LabelBatch,
        ) -> anyhow::Result<ArrayD<f64>> {
            match self.labels {
                None => Ok(x_batch.to_owned()),
                Some(l) => {
                    let (n, f) = (x_batch.shape()[0], x_batch.shape()[1]);
                    let mut out = ArrayD::zeros(ndarray::IxDyn(&[n, l, f]));
                    for k in 0..l {
                        let scaled = x_batch.mapv(|v| v * (k + 1) as f64);
                        out.index_axis_mut(Axis(1), k).assign(&scaled);
                    }
                    Ok(out)
                }
            }
        }
    }

    /// Always reports sample 0 as changed.
    struct FirstChanged;
    impl PredictionChange for FirstChanged {
        fn changed_prediction_indices(
            &self, _model: &dyn Model, _x: ArrayViewD<'_, f64>, _xs: ArrayViewD<'_, f64>,
        ) -> anyhow::Result<Vec<usize>> {
            Ok(vec![0])
        }
    }

    struct FailingModel;
    impl Model for FailingModel {
        fn predict(&self, _x_batch: ArrayViewD<'_, f64>) -> anyhow::Result<Array2<f64>> {
            anyhow::bail!("device out of memory")
        }
    }

    fn metric(nr_samples: usize) -> RelativeOutputStability {
        let opts = RosOptions::new(nr_samples, 1e-6, 0.2).unwrap().with_disable_warnings(true);
        RelativeOutputStability::new(opts).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify the full loop on a two-sample, rank-2 batch.
    //
    // Given
    // -----
    // - x = [[1, 2], [2, 4]], identity model, explanation = input, shift 0.5,
    //   NaN guard disabled, 3 draws.
    // - Numerator per sample: ||0.5 / x||, i.e. sqrt(0.25 + 0.0625) and
    //   sqrt(0.0625 + 0.015625); denominator: ||(0.5, 0.5)|| = sqrt(0.5).
    //
    // Expect
    // ------
    // - Every draw is identical, so the max equals the single-draw objective.
    fn evaluate_batch_matches_closed_form_single_label() {
        // Arrange
        let x = array![[1.0, 2.0], [2.0, 4.0]].into_dyn();
        let y = LabelBatch::Single(vec![1, 1]);
        let explainer = InputAsExplanation { labels: None };
        let ros = metric(3).with_perturb(Shift(0.5)).with_prediction_change(NeverChanged);

        // Act
        let scores = ros.evaluate_batch(&Identity, &explainer, x.view(), &y, x.view()).unwrap();

        // Assert
        let denom = 0.5_f64.sqrt();
        let RosScores::PerSample(values) = scores else { panic!("expected per-sample scores") };
        assert_relative_eq!(values[0], 0.3125_f64.sqrt() / denom, epsilon = 1e-12);
        assert_relative_eq!(values[1], 0.078125_f64.sqrt() / denom, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check the multi-label reshape through the whole loop.
    //
    // Given
    // -----
    // - x = [[1, 2], [2, 4]], three labels where label k scales the input by
    //   k + 1, y = [[0, 1], [2]], shift 0.5, 2 draws.
    //
    // Expect
    // ------
    // - Label scaling cancels in (e_x - e_xs) / e_x, so every selected label
    //   carries its sample's single-label score; lists have lengths 2 and 1.
    fn evaluate_batch_selects_active_labels() {
        // Arrange
        let x = array![[1.0, 2.0], [2.0, 4.0]].into_dyn();
        let y = LabelBatch::Multi(vec![vec![0, 1], vec![2]]);
        let explainer = InputAsExplanation { labels: Some(3) };
        let a = explainer.explain(&Identity, x.view(), &y).unwrap();
        let opts = RosOptions::new(2, 1e-6, 0.2)
            .unwrap()
            .with_multi_label(true)
            .with_nan_guard(false)
            .with_disable_warnings(true);
        let ros = RelativeOutputStability::new(opts).unwrap().with_perturb(Shift(0.5));

        // Act
        let scores = ros.evaluate_batch(&Identity, &explainer, x.view(), &y, a.view()).unwrap();

        // Assert
        let denom = 0.5_f64.sqrt();
        let RosScores::PerLabel(lists) = scores else { panic!("expected per-label scores") };
        assert_eq!(lists.len(), 2);
        assert_eq!((lists[0].len(), lists[1].len()), (2, 1));
        assert_relative_eq!(lists[0][0], 0.3125_f64.sqrt() / denom, epsilon = 1e-12);
        assert_relative_eq!(lists[0][1], 0.3125_f64.sqrt() / denom, epsilon = 1e-12);
        assert_relative_eq!(lists[1][0], 0.078125_f64.sqrt() / denom, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a detector that always flags sample 0 NaN-marks it under the
    // propagate policy and leaves it NaN under the ignore policy too, since
    // every draw is invalidated.
    //
    // Given
    // -----
    // - The single-label fixture with `FirstChanged`, both policies.
    //
    // Expect
    // ------
    // - Sample 0 NaN, sample 1 finite in both cases.
    fn flipped_predictions_become_nan_under_both_policies() {
        let x = array![[1.0, 2.0], [2.0, 4.0]].into_dyn();
        let y = LabelBatch::Single(vec![0, 0]);
        let explainer = InputAsExplanation { labels: None };

        for policy in [NanPolicy::Propagate, NanPolicy::Ignore] {
            let opts = RosOptions::new(3, 1e-6, 0.2)
                .unwrap()
                .with_nan_policy(policy)
                .with_disable_warnings(true);
            let ros = RelativeOutputStability::new(opts)
                .unwrap()
                .with_perturb(Shift(0.5))
                .with_prediction_change(FirstChanged);

            let scores =
                ros.evaluate_batch(&Identity, &explainer, x.view(), &y, x.view()).unwrap();

            let values = scores.flatten();
            assert!(values[0].is_nan(), "policy {policy:?}");
            assert!(values[1].is_finite(), "policy {policy:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify aggregation with the default mean, and the single-draw case.
    //
    // Given
    // -----
    // - The single-label fixture with `return_aggregate`, 1 draw.
    //
    // Expect
    // ------
    // - One scalar equal to the mean of the two closed-form scores.
    fn aggregate_collapses_scores_with_mean() {
        let x = array![[1.0, 2.0], [2.0, 4.0]].into_dyn();
        let y = LabelBatch::Single(vec![0, 0]);
        let explainer = InputAsExplanation { labels: None };
        let opts = RosOptions::new(1, 1e-6, 0.2)
            .unwrap()
            .with_aggregate(true)
            .with_nan_guard(false)
            .with_disable_warnings(true);
        let ros = RelativeOutputStability::new(opts).unwrap().with_perturb(Shift(0.5));

        let scores = ros.evaluate_batch(&Identity, &explainer, x.view(), &y, x.view()).unwrap();

        let denom = 0.5_f64.sqrt();
        let expected = 0.5 * (0.3125_f64.sqrt() + 0.078125_f64.sqrt()) / denom;
        let RosScores::Aggregate(value) = scores else { panic!("expected an aggregate") };
        assert_relative_eq!(value, expected, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check dataset-level batching and explanation generation.
    //
    // Given
    // -----
    // - Five inputs, batch size 2, no precomputed explanations, shift 0.5.
    //
    // Expect
    // ------
    // - Five per-sample scores equal to those of one big batch.
    fn evaluate_concatenates_batches() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 1.0], [1.0, 1.0], [4.0, 2.0]].into_dyn();
        let y = LabelBatch::Single(vec![0; 5]);
        let explainer = InputAsExplanation { labels: None };
        let opts = RosOptions::new(2, 1e-6, 0.2)
            .unwrap()
            .with_nan_guard(false)
            .with_disable_warnings(true)
            .with_batch_size(2)
            .unwrap();
        let ros = RelativeOutputStability::new(opts).unwrap().with_perturb(Shift(0.5));

        let batched = ros.evaluate(&Identity, &explainer, x.view(), &y, None).unwrap();
        let whole = ros.evaluate_batch(&Identity, &explainer, x.view(), &y, x.view()).unwrap();

        assert_eq!(batched.len(), 5);
        for (a, b) in batched.flatten().iter().zip(whole.flatten()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
        assert!(matches!(
            ros.evaluate(&Identity, &explainer, x.view(), &LabelBatch::Single(vec![0; 4]), None),
            Err(RosError::BatchSizeMismatch { what: "labels", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify seeded runs with the default uniform noise are reproducible.
    //
    // Given
    // -----
    // - Seed 7, default perturbation, 4 draws, run twice.
    //
    // Expect
    // ------
    // - Identical finite scores.
    fn seeded_evaluation_is_reproducible() {
        let x = array![[1.0, 2.0], [2.0, 4.0]].into_dyn();
        let y = LabelBatch::Single(vec![1, 1]);
        let explainer = InputAsExplanation { labels: None };
        let opts = RosOptions::new(4, 1e-6, 0.2)
            .unwrap()
            .with_seed(Some(7))
            .with_nan_guard(false)
            .with_disable_warnings(true);
        let ros = RelativeOutputStability::new(opts).unwrap();

        let first = ros.evaluate_batch(&Identity, &explainer, x.view(), &y, x.view()).unwrap();
        let second = ros.evaluate_batch(&Identity, &explainer, x.view(), &y, x.view()).unwrap();

        assert_eq!(first, second);
        assert!(first.flatten().iter().all(|v| v.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // Ensure collaborator failures abort the call with the collaborator named.
    //
    // Given
    // -----
    // - A model whose predict always fails.
    //
    // Expect
    // ------
    // - `CollaboratorFailed { collaborator: "model" }` carrying the message.
    fn model_failure_is_propagated() {
        let x = array![[1.0, 2.0]].into_dyn();
        let y = LabelBatch::Single(vec![0]);
        let explainer = InputAsExplanation { labels: None };

        let err = metric(2)
            .evaluate_batch(&FailingModel, &explainer, x.view(), &y, x.view())
            .unwrap_err();

        assert_eq!(
            err,
            RosError::CollaboratorFailed {
                collaborator: "model",
                message: "device out of memory".to_string(),
            }
        );
    }

    /// Closed-form score of a two-feature input under `normalise`, identity
    /// model, explanation = input and a constant shift.
    fn normalised_score(x: [f64; 2], shift: f64) -> f64 {
        let rms = |v: [f64; 2]| ((v[0] * v[0] + v[1] * v[1]) / 2.0).sqrt();
        let xs = [x[0] + shift, x[1] + shift];
        let (s, ss) = (rms(x), rms(xs));
        let numerator = (0..2)
            .map(|j| {
                let (e, es) = (x[j] / s, xs[j] / ss);
                ((e - es) / e).powi(2)
            })
            .sum::<f64>()
            .sqrt();
        numerator / (2.0 * shift * shift).sqrt()
    }

    #[test]
    // Purpose
    // -------
    // Ensure supplied explanations are post-processed like generated ones, so
    // both sides of the objective are on the same scale.
    //
    // Given
    // -----
    // - x = [[1, 2], [2, 4]], explanation = input, shift 0.5, `normalise` on,
    //   3 draws, batch size 1; once without `a_batch` and once with
    //   `a_batch = x`.
    //
    // Expect
    // ------
    // - Both runs return the closed-form normalised scores.
    fn normalise_treats_supplied_and_generated_explanations_alike() {
        // Arrange
        let x = array![[1.0, 2.0], [2.0, 4.0]].into_dyn();
        let y = LabelBatch::Single(vec![0, 0]);
        let explainer = InputAsExplanation { labels: None };
        let opts = RosOptions::new(3, 1e-6, 0.2)
            .unwrap()
            .with_normalise(true)
            .with_nan_guard(false)
            .with_disable_warnings(true)
            .with_batch_size(1)
            .unwrap();
        let ros = RelativeOutputStability::new(opts).unwrap().with_perturb(Shift(0.5));

        // Act
        let generated = ros.evaluate(&Identity, &explainer, x.view(), &y, None).unwrap();
        let supplied =
            ros.evaluate(&Identity, &explainer, x.view(), &y, Some(x.view())).unwrap();

        // Assert
        let expected = [normalised_score([1.0, 2.0], 0.5), normalised_score([2.0, 4.0], 0.5)];
        for scores in [generated.flatten(), supplied.flatten()] {
            assert_eq!(scores.len(), 2);
            for (got, want) in scores.iter().zip(expected) {
                assert_relative_eq!(*got, want, epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify `abs` on an input whose sign flips under perturbation.
    //
    // Given
    // -----
    // - x = [[-0.2, 2]], explanation = input, shift 0.5, `abs` on, 2 draws.
    // - With abs: e_x = [0.2, 2], e_xs = [0.3, 2.5], quotient [-0.5, -0.25].
    // - Without abs the first quotient would be (-0.2 - 0.3) / -0.2 = 2.5.
    //
    // Expect
    // ------
    // - sqrt(0.3125) / sqrt(0.5) with and without a supplied `a_batch`.
    fn abs_applies_to_supplied_and_generated_explanations() {
        let x = array![[-0.2, 2.0]].into_dyn();
        let y = LabelBatch::Single(vec![1]);
        let explainer = InputAsExplanation { labels: None };
        let opts = RosOptions::new(2, 1e-6, 0.2)
            .unwrap()
            .with_abs(true)
            .with_nan_guard(false)
            .with_disable_warnings(true);
        let ros = RelativeOutputStability::new(opts).unwrap().with_perturb(Shift(0.5));

        let generated = ros.evaluate(&Identity, &explainer, x.view(), &y, None).unwrap();
        let supplied =
            ros.evaluate(&Identity, &explainer, x.view(), &y, Some(x.view())).unwrap();

        let expected = 0.3125_f64.sqrt() / 0.5_f64.sqrt();
        assert_relative_eq!(generated.flatten()[0], expected, epsilon = 1e-12);
        assert_relative_eq!(supplied.flatten()[0], expected, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure options edited into an invalid state are rejected before any
    // evaluation can loop on them.
    //
    // Given
    // -----
    // - Valid options with `batch_size = 0`, then with `nr_samples = 0`.
    //
    // Expect
    // ------
    // - `InvalidBatchSize` and `InvalidNrSamples` from `new`.
    fn edited_options_are_rejected_at_construction() {
        let mut opts = RosOptions::new(2, 1e-6, 0.2).unwrap().with_disable_warnings(true);
        opts.batch_size = 0;
        assert_eq!(
            RelativeOutputStability::new(opts.clone()).unwrap_err(),
            RosError::InvalidBatchSize { value: 0 }
        );

        opts.batch_size = 4;
        opts.nr_samples = 0;
        assert_eq!(
            RelativeOutputStability::new(opts).unwrap_err(),
            RosError::InvalidNrSamples { value: 0 }
        );
    }
}
