//! Division-by-zero guards for the ROS objective.
//!
//! Purpose
//! -------
//! Provide a small, validated container for the `eps_min` floor used by the
//! Relative Output Stability objective, together with the elementwise guard
//! helpers that substitute that floor for exact zeros before division.
//!
//! Key behaviors
//! -------------
//! - Construct [`EpsMin`] values that enforce strict positivity and finiteness
//!   of the floor.
//! - Reject invalid floors via typed errors (`RosError`) instead of panicking
//!   at call sites.
//! - Replace **exact** zeros (and only exact zeros) with the floor, leaving
//!   every non-zero element untouched.
//!
//! Invariants & assumptions
//! ------------------------
//! - `eps_min > 0.0` and `eps_min.is_finite()` for every constructed guard.
//! - The guard is post-hoc: non-zero values, however small, are never shifted
//!   by `eps_min`, so the objective is unbiased away from the singularity.
//! - `-0.0` compares equal to `0.0` and is therefore guarded as well.
//!
//! Conventions
//! -----------
//! - Guards operate on `ndarray` containers in place or on scalars; they never
//!   allocate beyond what the caller passes in.
//! - This module never logs and performs no I/O.
//!
//! Downstream usage
//! ----------------
//! - Construct [`EpsMin`] once in the metric options and pass it into
//!   [`relative_output_stability_objective`](crate::metrics::core::objective::relative_output_stability_objective).
//! - Use [`guard_zeros`] on the explanation tensor used as the numerator's
//!   per-element denominator and [`guard_scalar`] / [`guard_zeros`] on the
//!   per-sample logit-difference norms.
//!
//! Testing notes
//! -------------
//! - Unit tests validate constructor acceptance/rejection and that only exact
//!   zeros are replaced.
use ndarray::{ArrayBase, DataMut, Dimension};

use crate::metrics::errors::{RosError, RosResult};

/// Default floor used to prevent division by zero in the ROS objective.
pub const DEFAULT_EPS_MIN: f64 = 1e-6;

/// EpsMin — validated division-by-zero floor.
///
/// Purpose
/// -------
/// Represent the strictly positive, finite scalar substituted for exact zeros
/// in the ROS objective's denominators.
///
/// Fields
/// ------
/// - `0`: `f64`
///   The floor value; read via [`EpsMin::value`].
///
/// Invariants
/// ----------
/// - `value > 0.0` and `value.is_finite()`.
///
/// Performance
/// -----------
/// - `Copy`; construction is O(1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsMin(f64);

impl EpsMin {
    /// Construct a validated floor.
    ///
    /// Errors
    /// ------
    /// - `RosError::InvalidEpsMin` when `value` is non-finite or `<= 0.0`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_robustness::metrics::core::guards::EpsMin;
    /// let eps = EpsMin::new(1e-6).unwrap();
    /// assert_eq!(eps.value(), 1e-6);
    /// assert!(EpsMin::new(0.0).is_err());
    /// ```
    pub fn new(value: f64) -> RosResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(RosError::InvalidEpsMin { value });
        }
        Ok(EpsMin(value))
    }

    /// The floor value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for EpsMin {
    fn default() -> Self {
        EpsMin(DEFAULT_EPS_MIN)
    }
}

/// Return `eps_min` when `value` is exactly zero, otherwise `value`.
#[inline]
pub fn guard_scalar(value: f64, eps_min: EpsMin) -> f64 {
    if value == 0.0 { eps_min.value() } else { value }
}

/// Replace every exact zero of `arr` with `eps_min`, in place.
pub fn guard_zeros<S, D>(arr: &mut ArrayBase<S, D>, eps_min: EpsMin)
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    arr.mapv_inplace(|v| guard_scalar(v, eps_min));
}
