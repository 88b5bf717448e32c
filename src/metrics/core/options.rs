//! ROS options — configuration for Relative Output Stability evaluation.
//!
//! Purpose
//! -------
//! Collect every construction-time knob of the metric in one place so that
//! evaluation is explicit and reproducible: the number of perturbation draws,
//! the division-by-zero floor, the default noise bound, the prediction-change
//! guard, explanation post-processing flags, the NaN reduction policy,
//! batching, seeding and warning control.
//!
//! Key behaviors
//! -------------
//! - [`RosOptions::new`] validates the numeric fields and returns typed errors
//!   instead of panicking.
//! - [`RosOptions::default`] reproduces the reference configuration
//!   (`nr_samples = 200`, `eps_min = 1e-6`, noise upper bound `0.2`, NaN guard
//!   on, no aggregation, no normalisation, no absolute value).
//! - Builder-style `with_*` setters adjust individual fields on an already
//!   valid instance; the numeric ones re-validate.
//!
//! Invariants & assumptions
//! ------------------------
//! - `nr_samples >= 1`, `batch_size >= 1`, `eps_min` finite and `> 0`,
//!   `noise_upper_bound` finite and greater than the uniform noise lower bound.
//! - Options are read-only for the lifetime of an evaluate call; the metric
//!   never mutates them.
//!
//! Conventions
//! -----------
//! - Collaborator strategies (perturbation, detector, normaliser, aggregate)
//!   are not options; they are injected on the metric itself. The flags here
//!   only select the default strategies.
//!
//! Testing notes
//! -------------
//! - Unit tests check defaults, validation of every numeric field, and that
//!   setters preserve the remaining fields.
use crate::{
    collaborators::perturb::DEFAULT_UNIFORM_LOWER_BOUND,
    metrics::{
        core::{guards::EpsMin, reduce::NanPolicy},
        errors::{RosError, RosResult},
    },
};

/// Default number of perturbation draws per input.
pub const DEFAULT_NR_SAMPLES: usize = 200;

/// Default upper bound of the uniform input noise.
pub const DEFAULT_NOISE_UPPER_BOUND: f64 = 0.2;

/// Default number of inputs per evaluated batch.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// RosOptions — construction-time configuration of the ROS metric.
///
/// Fields
/// ------
/// - `nr_samples`: number of perturbation draws per batch.
/// - `eps_min`: division-by-zero floor for the objective.
/// - `noise_upper_bound`: upper bound of the default uniform perturbation.
/// - `return_nan_when_prediction_changes`: enables the argmax NaN guard.
/// - `return_aggregate`: collapse the scores with the aggregate function.
/// - `abs`: take the absolute value of generated explanations.
/// - `normalise`: normalise generated explanations.
/// - `nan_policy`: how NaN draws take part in the max over draws.
/// - `multi_label`: evaluate several labels per input.
/// - `batch_size`: inputs per batch in dataset-level evaluation.
/// - `seed`: RNG seed; `None` draws from OS entropy.
/// - `disable_warnings`: suppress the parameterisation warning.
#[derive(Debug, Clone, PartialEq)]
pub struct RosOptions {
    pub nr_samples: usize,
    pub eps_min: EpsMin,
    pub noise_upper_bound: f64,
    pub return_nan_when_prediction_changes: bool,
    pub return_aggregate: bool,
    pub abs: bool,
    pub normalise: bool,
    pub nan_policy: NanPolicy,
    pub multi_label: bool,
    pub batch_size: usize,
    pub seed: Option<u64>,
    pub disable_warnings: bool,
}

impl RosOptions {
    /// Construct validated options for the numeric fields; every other field
    /// takes its default and can be adjusted with the `with_*` setters.
    ///
    /// Errors
    /// ------
    /// - `RosError::InvalidNrSamples` when `nr_samples == 0`.
    /// - `RosError::InvalidEpsMin` when `eps_min` is non-finite or `<= 0`.
    /// - `RosError::InvalidNoiseBounds` when `noise_upper_bound` is non-finite
    ///   or not above the uniform lower bound (`0.02`).
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_robustness::metrics::core::options::RosOptions;
    /// let opts = RosOptions::new(50, 1e-6, 0.2).unwrap().with_seed(Some(7));
    /// assert_eq!(opts.nr_samples, 50);
    /// assert!(RosOptions::new(0, 1e-6, 0.2).is_err());
    /// ```
    pub fn new(nr_samples: usize, eps_min: f64, noise_upper_bound: f64) -> RosResult<Self> {
        if nr_samples == 0 {
            return Err(RosError::InvalidNrSamples { value: nr_samples });
        }
        let eps_min = EpsMin::new(eps_min)?;
        validate_noise_upper_bound(noise_upper_bound)?;
        Ok(RosOptions { nr_samples, eps_min, noise_upper_bound, ..RosOptions::default() })
    }

    /// Re-check the numeric invariants.
    ///
    /// The fields are public, so options built with [`RosOptions::new`] can
    /// still be edited into an invalid state; the metric calls this before
    /// use.
    ///
    /// # Errors
    /// - `RosError::InvalidNrSamples` when `nr_samples == 0`.
    /// - `RosError::InvalidBatchSize` when `batch_size == 0`.
    /// - `RosError::InvalidNoiseBounds` for an invalid `noise_upper_bound`.
    pub fn validate(&self) -> RosResult<()> {
        if self.nr_samples == 0 {
            return Err(RosError::InvalidNrSamples { value: self.nr_samples });
        }
        if self.batch_size == 0 {
            return Err(RosError::InvalidBatchSize { value: self.batch_size });
        }
        validate_noise_upper_bound(self.noise_upper_bound)
    }

    pub fn with_nan_guard(mut self, return_nan_when_prediction_changes: bool) -> Self {
        self.return_nan_when_prediction_changes = return_nan_when_prediction_changes;
        self
    }

    pub fn with_aggregate(mut self, return_aggregate: bool) -> Self {
        self.return_aggregate = return_aggregate;
        self
    }

    pub fn with_abs(mut self, abs: bool) -> Self {
        self.abs = abs;
        self
    }

    pub fn with_normalise(mut self, normalise: bool) -> Self {
        self.normalise = normalise;
        self
    }

    pub fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }

    pub fn with_multi_label(mut self, multi_label: bool) -> Self {
        self.multi_label = multi_label;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_disable_warnings(mut self, disable_warnings: bool) -> Self {
        self.disable_warnings = disable_warnings;
        self
    }

    /// Set the dataset-level batch size.
    ///
    /// # Errors
    /// - `RosError::InvalidBatchSize` when `batch_size == 0`.
    pub fn with_batch_size(mut self, batch_size: usize) -> RosResult<Self> {
        if batch_size == 0 {
            return Err(RosError::InvalidBatchSize { value: batch_size });
        }
        self.batch_size = batch_size;
        Ok(self)
    }
}

impl Default for RosOptions {
    fn default() -> Self {
        RosOptions {
            nr_samples: DEFAULT_NR_SAMPLES,
            eps_min: EpsMin::default(),
            noise_upper_bound: DEFAULT_NOISE_UPPER_BOUND,
            return_nan_when_prediction_changes: true,
            return_aggregate: false,
            abs: false,
            normalise: false,
            nan_policy: NanPolicy::default(),
            multi_label: false,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
            disable_warnings: false,
        }
    }
}

fn validate_noise_upper_bound(upper: f64) -> RosResult<()> {
    if !upper.is_finite() {
        return Err(RosError::InvalidNoiseBounds {
            lower: DEFAULT_UNIFORM_LOWER_BOUND,
            upper,
            reason: "Noise bounds must be finite.",
        });
    }
    if upper <= DEFAULT_UNIFORM_LOWER_BOUND {
        return Err(RosError::InvalidNoiseBounds {
            lower: DEFAULT_UNIFORM_LOWER_BOUND,
            upper,
            reason: "Upper bound must exceed the uniform noise lower bound.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reference defaults of `RosOptions`.
    // - Validation performed by `RosOptions::new`, `with_batch_size` and
    //   `validate`.
    // - Setters leaving unrelated fields untouched.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the reference defaults.
    //
    // Given
    // -----
    // - `RosOptions::default()`.
    //
    // Expect
    // ------
    // - 200 draws, eps 1e-6, bound 0.2, NaN guard on, everything else off.
    fn default_matches_reference_configuration() {
        let opts = RosOptions::default();
        assert_eq!(opts.nr_samples, 200);
        assert_eq!(opts.eps_min.value(), 1e-6);
        assert_eq!(opts.noise_upper_bound, 0.2);
        assert!(opts.return_nan_when_prediction_changes);
        assert!(!opts.return_aggregate && !opts.abs && !opts.normalise && !opts.multi_label);
        assert_eq!(opts.nan_policy, NanPolicy::Propagate);
        assert_eq!(opts.batch_size, 64);
        assert_eq!(opts.seed, None);
    }

    #[test]
    // Purpose
    // -------
    // Ensure each numeric field is validated.
    //
    // Given
    // -----
    // - nr_samples = 0; eps_min = 0; bound = 0.01 (below 0.02); bound = NaN;
    //   batch size 0.
    //
    // Expect
    // ------
    // - The matching error variant for each.
    fn new_rejects_invalid_numeric_fields() {
        assert_eq!(RosOptions::new(0, 1e-6, 0.2), Err(RosError::InvalidNrSamples { value: 0 }));
        assert_eq!(RosOptions::new(1, 0.0, 0.2), Err(RosError::InvalidEpsMin { value: 0.0 }));
        assert!(matches!(
            RosOptions::new(1, 1e-6, 0.01),
            Err(RosError::InvalidNoiseBounds { .. })
        ));
        assert!(matches!(
            RosOptions::new(1, 1e-6, f64::NAN),
            Err(RosError::InvalidNoiseBounds { .. })
        ));
        assert_eq!(
            RosOptions::default().with_batch_size(0),
            Err(RosError::InvalidBatchSize { value: 0 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Ensure `validate` catches fields edited directly after construction.
    //
    // Given
    // -----
    // - Valid options with `batch_size`, `nr_samples` or `noise_upper_bound`
    //   overwritten with an invalid value.
    //
    // Expect
    // ------
    // - The matching error variant; untouched options validate.
    fn validate_rejects_fields_edited_after_construction() {
        let valid = RosOptions::new(5, 1e-6, 0.2).unwrap();
        assert_eq!(valid.validate(), Ok(()));

        let mut opts = valid.clone();
        opts.batch_size = 0;
        assert_eq!(opts.validate(), Err(RosError::InvalidBatchSize { value: 0 }));

        let mut opts = valid.clone();
        opts.nr_samples = 0;
        assert_eq!(opts.validate(), Err(RosError::InvalidNrSamples { value: 0 }));

        let mut opts = valid;
        opts.noise_upper_bound = 0.0;
        assert!(matches!(opts.validate(), Err(RosError::InvalidNoiseBounds { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Check that setters only touch their own field.
    //
    // Given
    // -----
    // - `new(3, 1e-4, 0.5)` followed by several setters.
    //
    // Expect
    // ------
    // - Numeric fields keep their validated values; flags reflect setters.
    fn setters_preserve_other_fields() {
        let opts = RosOptions::new(3, 1e-4, 0.5)
            .unwrap()
            .with_aggregate(true)
            .with_nan_policy(NanPolicy::Ignore)
            .with_seed(Some(11))
            .with_batch_size(8)
            .unwrap();
        assert_eq!(opts.nr_samples, 3);
        assert_eq!(opts.eps_min.value(), 1e-4);
        assert_eq!(opts.noise_upper_bound, 0.5);
        assert!(opts.return_aggregate);
        assert_eq!(opts.nan_policy, NanPolicy::Ignore);
        assert_eq!(opts.seed, Some(11));
        assert_eq!(opts.batch_size, 8);
    }
}
