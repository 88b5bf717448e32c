//! Relative Output Stability maximization objective.
//!
//! Purpose
//! -------
//! Evaluate, for one draw, the per-sample ratio between the relative change
//! of the explanation and the change of the model's output logits:
//!
//! ```text
//!            || (e_x - e_xs) / guard(e_x) ||_2
//! ROS_obj = -----------------------------------
//!            guard( || h_x - h_xs ||_2 )
//! ```
//!
//! (Agarwal et al., 2022, "Rethinking stability for attribution based
//! explanations", arXiv:2203.06877.)
//!
//! Key behaviors
//! -------------
//! - The numerator guard is elementwise: only exact zeros of `e_x` are
//!   replaced by `eps_min` before the elementwise division.
//! - The denominator guard is applied to the reduced per-sample norm: an
//!   exactly-zero logit difference becomes `eps_min`.
//! - In multi-label layouts the `(N,)` denominator is broadcast as `(N, 1)`
//!   so it divides every label's numerator independently.
//!
//! Invariants & assumptions
//! ------------------------
//! - `e_x` and `e_xs` share shape; `h_x` and `h_xs` share shape `(N, C)`;
//!   both share the batch size `N`. Violations are reported as errors, never
//!   broadcast silently.
//! - No sample's value depends on another sample's data, so the result is
//!   independent of evaluation order.
//!
//! Testing notes
//! -------------
//! - Unit tests check the unguarded closed form, both guards, rank dispatch,
//!   the multi-label broadcast, and shape validation.
use ndarray::{ArrayD, ArrayView2, ArrayViewD, Axis};

use crate::metrics::{
    core::{
        guards::{EpsMin, guard_zeros},
        norms::l2_last_axis,
        shape::ExplanationKind,
    },
    errors::{RosError, RosResult},
};

/// Compute the ROS objective, resolving the norm from `e_x`'s rank.
///
/// Parameters
/// ----------
/// - `h_x`, `h_xs`: `(N, C)` logits for the original and perturbed inputs.
/// - `e_x`, `e_xs`: explanations for the original and perturbed inputs, of
///   rank 2–4 (single-label) or 3–5 (multi-label, label axis at position 1).
/// - `multi_label`: label mode of the metric.
/// - `eps_min`: division-by-zero floor.
///
/// Returns
/// -------
/// `RosResult<ArrayD<f64>>`
///   Shape `(N,)` for single-label, `(N, L)` for multi-label inputs.
///
/// Errors
/// ------
/// - `RosError::UnsupportedShape` for unsupported explanation ranks.
/// - `RosError::ShapeMismatch` / `RosError::BatchSizeMismatch` for
///   inconsistent operands.
pub fn relative_output_stability_objective(
    h_x: ArrayView2<'_, f64>, h_xs: ArrayView2<'_, f64>, e_x: ArrayViewD<'_, f64>,
    e_xs: ArrayViewD<'_, f64>, multi_label: bool, eps_min: EpsMin,
) -> RosResult<ArrayD<f64>> {
    let kind = ExplanationKind::from_ndim(e_x.ndim(), multi_label)?;
    objective_with_kind(h_x, h_xs, e_x, e_xs, kind, eps_min)
}

/// Compute the ROS objective for an already-resolved explanation layout.
///
/// This is the per-draw entry point of the sampling loop; the layout is
/// resolved once per batch and passed in.
pub fn objective_with_kind(
    h_x: ArrayView2<'_, f64>, h_xs: ArrayView2<'_, f64>, e_x: ArrayViewD<'_, f64>,
    e_xs: ArrayViewD<'_, f64>, kind: ExplanationKind, eps_min: EpsMin,
) -> RosResult<ArrayD<f64>> {
    if e_x.shape() != e_xs.shape() {
        return Err(RosError::ShapeMismatch {
            what: "perturbed explanations",
            expected: e_x.shape().to_vec(),
            actual: e_xs.shape().to_vec(),
        });
    }
    if h_x.shape() != h_xs.shape() {
        return Err(RosError::ShapeMismatch {
            what: "perturbed logits",
            expected: h_x.shape().to_vec(),
            actual: h_xs.shape().to_vec(),
        });
    }
    let batch = e_x.shape().first().copied().unwrap_or(0);
    if h_x.nrows() != batch {
        return Err(RosError::BatchSizeMismatch {
            what: "logits vs explanations",
            expected: batch,
            actual: h_x.nrows(),
        });
    }

    let mut e_x_guarded = e_x.to_owned();
    guard_zeros(&mut e_x_guarded, eps_min);
    let quotient = (&e_x - &e_xs) / &e_x_guarded;
    let numerator = kind.norm(quotient.view())?;

    let mut denominator = l2_last_axis((&h_x - &h_xs).into_dyn().view());
    guard_zeros(&mut denominator, eps_min);

    let result = if kind.is_multi_label() {
        numerator / denominator.insert_axis(Axis(1))
    } else {
        numerator / denominator
    };
    Ok(result)
}
