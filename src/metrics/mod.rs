//! metrics — robustness metrics for model explanations.
//!
//! Purpose
//! -------
//! Provide the Relative Output Stability (ROS) metric: how much an
//! explanation changes, relative to how much the model's output changes,
//! when the input is randomly perturbed. Larger scores mean less stable
//! explanations.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds options, guards, norms, the per-draw objective, the
//!   reducer and batch validation.
//! - [`ros`] holds [`RelativeOutputStability`], the sampling loop and the
//!   dataset-level driver.
//! - [`errors`] defines [`RosError`] and the [`RosResult`] alias.
//!
//! Downstream usage
//! ----------------
//! 1. Build [`RosOptions`] (or take the default) and a
//!    [`RelativeOutputStability`].
//! 2. Optionally inject collaborators with the `with_*` methods.
//! 3. Call `evaluate_batch` on a batch with precomputed explanations, or
//!    `evaluate` on a whole dataset.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule; `tests/` exercises the full
//!   pipeline with stub collaborators.

pub mod core;
pub mod errors;
pub mod ros;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    EpsMin, ExplanationKind, LabelBatch, NanPolicy, RosOptions, RosScores,
    relative_output_stability_objective,
};

pub use self::errors::{RosError, RosResult};

pub use self::ros::RelativeOutputStability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_robustness::metrics::prelude::*;
//
// to import the metric surface in a single line.

pub mod prelude {
    pub use super::{
        EpsMin, ExplanationKind, LabelBatch, NanPolicy, RelativeOutputStability, RosError,
        RosOptions, RosResult, RosScores, relative_output_stability_objective,
    };
}
