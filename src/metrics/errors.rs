//! Errors for robustness metrics (configuration checks, tensor shape
//! contracts, label bookkeeping, and collaborator failures).
//!
//! This module defines the metric error type, [`RosError`], used across the
//! Python-facing API and the internal Rust core. It implements
//! `Display`/`Error` and converts to `PyErr` for PyO3 when the
//! `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Tensor shapes are reported as `Vec<usize>` in row-major axis order, with
//!   the batch axis first.
//! - Failures raised by injected collaborators (model, explainer, perturbation,
//!   prediction-change detector) are normalized to
//!   [`RosError::CollaboratorFailed`] with the collaborator's message preserved
//!   verbatim.
//! - A perturbation that flips the predicted class is **not** an error; it is
//!   recorded as a NaN draw and never surfaces here.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for metric operations that may produce [`RosError`].
pub type RosResult<T> = Result<T, RosError>;

/// Unified error type for Relative Output Stability evaluation.
///
/// Covers option validation, explanation/logit shape contracts, label-batch
/// consistency, and failures propagated from injected collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum RosError {
    // ---- Options validation ----
    /// eps_min must be finite and > 0.
    InvalidEpsMin { value: f64 },

    /// nr_samples must be at least 1.
    InvalidNrSamples { value: usize },

    /// batch_size must be at least 1.
    InvalidBatchSize { value: usize },

    /// Uniform noise bounds must be finite with lower < upper.
    InvalidNoiseBounds { lower: f64, upper: f64, reason: &'static str },

    /// Gaussian noise standard deviation must be finite and > 0.
    InvalidNoiseStd { value: f64 },

    /// Unknown name passed to a string-selectable option.
    InvalidOptionName { name: String, reason: &'static str },

    // ---- Shape contracts ----
    /// Explanation rank is outside the supported set for the label mode.
    UnsupportedShape { ndim: usize, multi_label: bool },

    /// Two tensors that must agree in shape do not.
    ShapeMismatch { what: &'static str, expected: Vec<usize>, actual: Vec<usize> },

    /// Leading (batch) dimensions disagree between batch inputs.
    BatchSizeMismatch { what: &'static str, expected: usize, actual: usize },

    /// The batch contains no inputs.
    EmptyBatch,

    // ---- Labels ----
    /// Multi-label reshape referenced a label column that does not exist.
    LabelOutOfRange { sample: usize, label: usize, labels: usize },

    /// Label batch flavour does not match the metric's label mode.
    LabelModeMismatch { multi_label: bool },

    // ---- Collaborators ----
    /// An injected collaborator returned an error.
    CollaboratorFailed { collaborator: &'static str, message: String },
}

impl std::error::Error for RosError {}

impl std::fmt::Display for RosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options validation ----
            RosError::InvalidEpsMin { value } => {
                write!(f, "eps_min must be finite and > 0; got: {value}")
            }
            RosError::InvalidNrSamples { value } => {
                write!(f, "nr_samples must be at least 1; got: {value}")
            }
            RosError::InvalidBatchSize { value } => {
                write!(f, "batch_size must be at least 1; got: {value}")
            }
            RosError::InvalidNoiseBounds { lower, upper, reason } => {
                write!(
                    f,
                    "Uniform noise bounds must be finite with lower ({lower}) < upper ({upper}); {reason}"
                )
            }
            RosError::InvalidNoiseStd { value } => {
                write!(f, "Gaussian noise std must be finite and > 0; got: {value}")
            }
            RosError::InvalidOptionName { name, reason } => {
                write!(f, "Invalid option name {name:?}. {reason}")
            }
            // ---- Shape contracts ----
            RosError::UnsupportedShape { ndim, multi_label } => {
                if *multi_label {
                    write!(
                        f,
                        "Relative Output Stability only supports 5D, 4D and 3D explanations in multi-label mode (batch and label dimensions inclusive); got {ndim}D."
                    )
                } else {
                    write!(
                        f,
                        "Relative Output Stability only supports 4D, 3D and 2D explanations (batch dimension inclusive); got {ndim}D."
                    )
                }
            }
            RosError::ShapeMismatch { what, expected, actual } => {
                write!(f, "Shape mismatch for {what}: expected {expected:?}, got {actual:?}")
            }
            RosError::BatchSizeMismatch { what, expected, actual } => {
                write!(f, "Batch size mismatch for {what}: expected {expected}, got {actual}")
            }
            RosError::EmptyBatch => {
                write!(f, "Input batch is empty.")
            }
            // ---- Labels ----
            RosError::LabelOutOfRange { sample, label, labels } => {
                write!(
                    f,
                    "Label {label} of sample {sample} is out of range for {labels} explanation label columns."
                )
            }
            RosError::LabelModeMismatch { multi_label } => {
                if *multi_label {
                    write!(f, "Metric is in multi-label mode but received single labels.")
                } else {
                    write!(f, "Metric is in single-label mode but received label lists.")
                }
            }
            // ---- Collaborators ----
            RosError::CollaboratorFailed { collaborator, message } => {
                write!(f, "Collaborator '{collaborator}' failed: {message}")
            }
        }
    }
}

impl RosError {
    /// Wrap a collaborator error, keeping its full context chain in the message.
    pub(crate) fn collaborator(collaborator: &'static str, err: anyhow::Error) -> Self {
        RosError::CollaboratorFailed { collaborator, message: format!("{err:#}") }
    }
}

/// Convert a [`RosError`] into a Python `ValueError` with the error message.
///
/// This is used at the Rust↔Python boundary to surface metric errors cleanly.
#[cfg(feature = "python-bindings")]
impl std::convert::From<RosError> for PyErr {
    fn from(err: RosError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
