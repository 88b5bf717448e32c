//! Explanation tensor layouts understood by the ROS objective.
//!
//! Single-label explanations are laid out as `(N, spatial...)`; multi-label
//! explanations carry the label axis second, `(N, L, spatial...)`, so that the
//! label axis is never among the trailing axes collapsed by the norm.
//!
//! The layout is resolved once per evaluate call from the explanation rank and
//! the metric's label mode, and reused for every draw.
use crate::metrics::errors::{RosError, RosResult};

/// Explanation layout family, keyed by rank and label mode.
///
/// - `Features`: `(N, F)`, e.g. tabular attributions.
/// - `Planar`: `(N, H, W)` or `(N, C, T)`, e.g. greyscale images or
///   multichannel time series.
/// - `Channels`: `(N, C, H, W)`, e.g. colour images.
/// - `LabelledFeatures`, `LabelledPlanar`, `LabelledChannels`: the same three
///   layouts with a label axis inserted at position 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationKind {
    Features,
    Planar,
    Channels,
    LabelledFeatures,
    LabelledPlanar,
    LabelledChannels,
}

impl ExplanationKind {
    /// Resolve the layout for an explanation of rank `ndim`.
    ///
    /// # Arguments
    /// - `ndim`: explanation rank, batch axis (and label axis) inclusive.
    /// - `multi_label`: whether the metric evaluates several labels per input.
    ///
    /// # Errors
    /// - [`RosError::UnsupportedShape`] for any rank outside `{2, 3, 4}`
    ///   (single-label) or `{3, 4, 5}` (multi-label).
    pub fn from_ndim(ndim: usize, multi_label: bool) -> RosResult<Self> {
        match (ndim, multi_label) {
            (2, false) => Ok(ExplanationKind::Features),
            (3, false) => Ok(ExplanationKind::Planar),
            (4, false) => Ok(ExplanationKind::Channels),
            (3, true) => Ok(ExplanationKind::LabelledFeatures),
            (4, true) => Ok(ExplanationKind::LabelledPlanar),
            (5, true) => Ok(ExplanationKind::LabelledChannels),
            _ => Err(RosError::UnsupportedShape { ndim, multi_label }),
        }
    }

    /// Rank of explanations with this layout.
    pub fn ndim(&self) -> usize {
        match self {
            ExplanationKind::Features => 2,
            ExplanationKind::Planar | ExplanationKind::LabelledFeatures => 3,
            ExplanationKind::Channels | ExplanationKind::LabelledPlanar => 4,
            ExplanationKind::LabelledChannels => 5,
        }
    }

    /// Whether the layout carries a label axis at position 1.
    pub fn is_multi_label(&self) -> bool {
        matches!(
            self,
            ExplanationKind::LabelledFeatures
                | ExplanationKind::LabelledPlanar
                | ExplanationKind::LabelledChannels
        )
    }
}
