//! Additive noise perturbations and batch application.
//!
//! Purpose
//! -------
//! Provide the default input perturbations used by the ROS sampling loop and
//! the helper that applies a per-input perturbation across a whole batch.
//!
//! Key behaviors
//! -------------
//! - [`UniformNoise`] adds i.i.d. `U(lower, upper)` noise to every element; with
//!   no upper bound the interval is symmetric, `U(-lower, lower)`.
//! - [`GaussianNoise`] adds i.i.d. `N(mean, std²)` noise to every element.
//! - [`perturb_batch`] perturbs each input independently, every index of every
//!   input, drawing fresh randomness per input from one RNG stream.
//!
//! Invariants & assumptions
//! ------------------------
//! - Noise parameters are validated at construction; sampling never panics.
//! - A perturbation must preserve the input's shape; `perturb_batch` rejects
//!   implementations that do not.
//!
//! Testing notes
//! -------------
//! - Unit tests check parameter validation, noise ranges, seeded
//!   reproducibility, and batch shape handling.
use anyhow::Context;
use ndarray::{ArrayD, ArrayViewD, Axis};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::{
    collaborators::traits::Perturb,
    metrics::errors::{RosError, RosResult},
};

/// Default lower bound of uniform input noise.
pub const DEFAULT_UNIFORM_LOWER_BOUND: f64 = 0.02;

/// Default mean of Gaussian input noise.
pub const DEFAULT_GAUSSIAN_MEAN: f64 = 0.0;

/// Default standard deviation of Gaussian input noise.
pub const DEFAULT_GAUSSIAN_STD: f64 = 0.01;

/// UniformNoise — additive `U(lower, upper)` noise.
///
/// Invariants
/// ----------
/// - Bounds are finite and `lower < upper` (symmetric case: `lower > 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformNoise {
    lower: f64,
    upper: f64,
}

impl UniformNoise {
    /// Construct uniform noise on `[lower_bound, upper_bound)`, or on
    /// `[-lower_bound, lower_bound)` when `upper_bound` is `None`.
    ///
    /// # Errors
    /// - [`RosError::InvalidNoiseBounds`] for non-finite or unordered bounds.
    pub fn new(lower_bound: f64, upper_bound: Option<f64>) -> RosResult<Self> {
        let (lower, upper) = match upper_bound {
            Some(upper) => (lower_bound, upper),
            None => (-lower_bound, lower_bound),
        };
        if !lower.is_finite() || !upper.is_finite() {
            return Err(RosError::InvalidNoiseBounds {
                lower,
                upper,
                reason: "Noise bounds must be finite.",
            });
        }
        if lower >= upper {
            return Err(RosError::InvalidNoiseBounds {
                lower,
                upper,
                reason: "Upper bound must be greater than lower bound.",
            });
        }
        Ok(UniformNoise { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

impl Perturb for UniformNoise {
    fn perturb(&self, input: ArrayViewD<'_, f64>, rng: &mut StdRng) -> anyhow::Result<ArrayD<f64>> {
        let dist = Uniform::new(self.lower, self.upper);
        Ok(input.mapv(|v| v + dist.sample(rng)))
    }
}

/// GaussianNoise — additive `N(mean, std²)` noise.
///
/// Invariants
/// ----------
/// - `mean` is finite; `std` is finite and `> 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNoise {
    mean: f64,
    std: f64,
}

impl GaussianNoise {
    /// # Errors
    /// - [`RosError::InvalidNoiseStd`] if `std` is non-finite or `<= 0`, or
    ///   `mean` is non-finite.
    pub fn new(mean: f64, std: f64) -> RosResult<Self> {
        if !std.is_finite() || std <= 0.0 || !mean.is_finite() {
            return Err(RosError::InvalidNoiseStd { value: std });
        }
        Ok(GaussianNoise { mean, std })
    }
}

impl Default for GaussianNoise {
    fn default() -> Self {
        GaussianNoise { mean: DEFAULT_GAUSSIAN_MEAN, std: DEFAULT_GAUSSIAN_STD }
    }
}

impl Perturb for GaussianNoise {
    fn perturb(&self, input: ArrayViewD<'_, f64>, rng: &mut StdRng) -> anyhow::Result<ArrayD<f64>> {
        let dist = Normal::new(self.mean, self.std)
            .map_err(|err| anyhow::anyhow!("invalid Gaussian noise parameters: {err}"))?;
        Ok(input.mapv(|v| v + dist.sample(rng)))
    }
}

/// Perturb every input of `x_batch` independently.
///
/// Parameters
/// ----------
/// - `perturb`: per-input perturbation.
/// - `x_batch`: inputs with the batch axis first.
/// - `rng`: randomness shared across inputs; each input consumes fresh draws.
///
/// Errors
/// ------
/// - `RosError::CollaboratorFailed` if the perturbation fails.
/// - `RosError::ShapeMismatch` if it changes an input's shape.
pub fn perturb_batch(
    perturb: &dyn Perturb, x_batch: ArrayViewD<'_, f64>, rng: &mut StdRng,
) -> RosResult<ArrayD<f64>> {
    let mut out = x_batch.to_owned();
    for (index, (input, mut target)) in
        x_batch.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))).enumerate()
    {
        let perturbed = perturb
            .perturb(input.view(), rng)
            .with_context(|| format!("perturbing input {index}"))
            .map_err(|err| RosError::collaborator("perturb", err))?;
        if perturbed.shape() != input.shape() {
            return Err(RosError::ShapeMismatch {
                what: "perturbed input",
                expected: input.shape().to_vec(),
                actual: perturbed.shape().to_vec(),
            });
        }
        target.assign(&perturbed);
    }
    Ok(out)
}
