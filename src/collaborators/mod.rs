//! collaborators — injected behavior of the robustness metrics.
//!
//! Purpose
//! -------
//! Define the trait seams through which a metric talks to the outside world
//! (the model, the explanation method, input perturbation, prediction-change
//! detection, explanation post-processing, aggregation) and ship the default
//! implementations the metric falls back on when nothing is injected.
//!
//! Key behaviors
//! -------------
//! - [`traits`] declares [`Model`], [`Explainer`], [`Perturb`],
//!   [`PredictionChange`], [`Normalise`] and [`Aggregate`], with closure impls
//!   for the function-shaped ones.
//! - [`perturb`] provides [`UniformNoise`] (the metric default),
//!   [`GaussianNoise`] and the batch helper [`perturb_batch`].
//! - [`prediction`] provides [`ArgmaxChange`] and [`NeverChanged`].
//! - [`normalise`] provides [`AverageSecondMoment`] and [`absolute`].
//! - [`aggregate`] provides [`AggregateKind`].
//!
//! Conventions
//! -----------
//! - Collaborators return `anyhow::Result`; the metric converts failures into
//!   `RosError::CollaboratorFailed` with the collaborator's name attached.
//! - Every randomized collaborator draws from the `StdRng` handed to it so
//!   that seeded evaluations are reproducible.

pub mod aggregate;
pub mod normalise;
pub mod perturb;
pub mod prediction;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::aggregate::AggregateKind;
pub use self::normalise::{AverageSecondMoment, absolute};
pub use self::perturb::{GaussianNoise, UniformNoise, perturb_batch};
pub use self::prediction::{ArgmaxChange, NeverChanged, changed_prediction_detector};
pub use self::traits::{Aggregate, Explainer, Model, Normalise, Perturb, PredictionChange};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_robustness::collaborators::prelude::*;
//
// to import the collaborator traits and their default implementations.

pub mod prelude {
    pub use super::{
        Aggregate, AggregateKind, ArgmaxChange, AverageSecondMoment, Explainer, GaussianNoise,
        Model, NeverChanged, Normalise, Perturb, PredictionChange, UniformNoise,
    };
}
