//! core — numerical building blocks of the ROS metric.
//!
//! Purpose
//! -------
//! Collect everything the ROS sampling loop needs that does not touch a
//! collaborator: options and guards, explanation layouts and their norms, the
//! per-draw objective, draw accumulation and reduction, label batches, and
//! batch validation.
//!
//! Key behaviors
//! -------------
//! - [`ExplanationKind`] resolves an explanation rank (plus label mode) into a
//!   norm once per call; [`norms`] implements the reductions.
//! - [`relative_output_stability_objective`] evaluates one draw.
//! - [`DrawMatrix`] accumulates draws, [`NanPolicy`] controls the max over
//!   draws and [`select_labels`] performs the multi-label reshape.
//! - [`validation`] checks batch contracts before any collaborator runs.
//!
//! Conventions
//! -----------
//! - Batch axis first everywhere; multi-label explanations carry the label
//!   axis at position 1.
//! - This module performs no I/O and no logging. Errors are reported as
//!   [`RosResult`](crate::metrics::errors::RosResult).

pub mod data;
pub mod guards;
pub mod norms;
pub mod objective;
pub mod options;
pub mod reduce;
pub mod shape;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::LabelBatch;
pub use self::guards::{DEFAULT_EPS_MIN, EpsMin, guard_scalar, guard_zeros};
pub use self::norms::{l2_last_axis, l2_last_two_axes};
pub use self::objective::{objective_with_kind, relative_output_stability_objective};
pub use self::options::{
    DEFAULT_BATCH_SIZE, DEFAULT_NOISE_UPPER_BOUND, DEFAULT_NR_SAMPLES, RosOptions,
};
pub use self::reduce::{DrawMatrix, NanPolicy, RosScores, select_labels};
pub use self::shape::ExplanationKind;
pub use self::validation::{validate_batch, validate_explanations, validate_logits};
