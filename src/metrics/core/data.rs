//! Label batches — the target labels explanations are computed for.
//!
//! Single-label evaluation carries one class index per input; multi-label
//! evaluation carries a variable-length list of class indices per input, each
//! scored independently. Inputs, explanations and logits themselves are plain
//! `ndarray` tensors with the batch axis first and need no wrapper.
use std::ops::Range;

use crate::metrics::errors::{RosError, RosResult};

/// LabelBatch — one label, or one list of labels, per input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelBatch {
    Single(Vec<usize>),
    Multi(Vec<Vec<usize>>),
}

impl LabelBatch {
    /// Number of inputs the labels belong to.
    pub fn len(&self) -> usize {
        match self {
            LabelBatch::Single(v) => v.len(),
            LabelBatch::Multi(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether each input carries a list of labels.
    pub fn is_multi_label(&self) -> bool {
        matches!(self, LabelBatch::Multi(_))
    }

    /// Labels of the inputs in `range`, preserving the flavour.
    ///
    /// # Errors
    /// - [`RosError::BatchSizeMismatch`] if `range` exceeds the batch.
    pub fn slice(&self, range: Range<usize>) -> RosResult<LabelBatch> {
        if range.end > self.len() || range.start > range.end {
            return Err(RosError::BatchSizeMismatch {
                what: "label slice",
                expected: self.len(),
                actual: range.end,
            });
        }
        Ok(match self {
            LabelBatch::Single(v) => LabelBatch::Single(v[range].to_vec()),
            LabelBatch::Multi(v) => LabelBatch::Multi(v[range].to_vec()),
        })
    }
}

impl From<Vec<usize>> for LabelBatch {
    fn from(labels: Vec<usize>) -> Self {
        LabelBatch::Single(labels)
    }
}

impl From<Vec<Vec<usize>>> for LabelBatch {
    fn from(labels: Vec<Vec<usize>>) -> Self {
        LabelBatch::Multi(labels)
    }
}
