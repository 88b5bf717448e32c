//! Euclidean reductions over the trailing axes of explanation tensors.
//!
//! Each [`ExplanationKind`] maps to one reduction that collapses every
//! non-batch (and, in multi-label mode, non-label) axis into one scalar:
//! - `Features` / `LabelledFeatures`: L2 over the last axis.
//! - `Planar` / `LabelledPlanar`: L2 over the last two axes jointly.
//! - `Channels` / `LabelledChannels`: L2 over the last two axes, giving a
//!   per-channel norm, then L2 over the resulting last axis.
//!
//! The channel reduction is two-stage: per-channel norms first, then the norm
//! across channels.
use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::metrics::{
    core::shape::ExplanationKind,
    errors::{RosError, RosResult},
};

impl ExplanationKind {
    /// Reduce `arr` to one L2 norm per sample (or per sample and label).
    ///
    /// # Arguments
    /// - `arr`: tensor of rank `self.ndim()`.
    ///
    /// # Returns
    /// Shape `(N,)` for single-label layouts and `(N, L)` for labelled ones.
    ///
    /// # Errors
    /// - [`RosError::UnsupportedShape`] if `arr.ndim() != self.ndim()`.
    pub fn norm(&self, arr: ArrayViewD<'_, f64>) -> RosResult<ArrayD<f64>> {
        if arr.ndim() != self.ndim() {
            return Err(RosError::UnsupportedShape {
                ndim: arr.ndim(),
                multi_label: self.is_multi_label(),
            });
        }
        let reduced = match self {
            ExplanationKind::Features | ExplanationKind::LabelledFeatures => l2_last_axis(arr),
            ExplanationKind::Planar | ExplanationKind::LabelledPlanar => l2_last_two_axes(arr),
            ExplanationKind::Channels | ExplanationKind::LabelledChannels => {
                l2_last_axis(l2_last_two_axes(arr).view())
            }
        };
        Ok(reduced)
    }
}

/// L2 norm over the last axis. `arr` must have rank ≥ 1.
pub fn l2_last_axis(arr: ArrayViewD<'_, f64>) -> ArrayD<f64> {
    let last = Axis(arr.ndim() - 1);
    arr.mapv(|v| v * v).sum_axis(last).mapv_into(f64::sqrt)
}

/// Joint L2 norm over the last two axes. `arr` must have rank ≥ 2.
pub fn l2_last_two_axes(arr: ArrayViewD<'_, f64>) -> ArrayD<f64> {
    let ndim = arr.ndim();
    arr.mapv(|v| v * v).sum_axis(Axis(ndim - 1)).sum_axis(Axis(ndim - 2)).mapv_into(f64::sqrt)
}
