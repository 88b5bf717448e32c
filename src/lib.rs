//! rust_robustness — robustness metrics for model explanations, with Python
//! bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the Relative Output Stability (ROS) metric to Python via the
//! `_rust_robustness` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`metrics` and `collaborators`) as the
//!   public crate surface.
//! - With the `python-bindings` feature, define the `RelativeOutputStability`
//!   `#[pyclass]`, the `relative_output_stability_objective` function and the
//!   `#[pymodule]` initializer, and register the `metrics` submodule under
//!   `rust_robustness` so dot-notation imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Python models must expose `predict(x) -> (N, C)` and explanation
//!   callables must accept `model`, `inputs` and `targets` keyword arguments
//!   and return an array whose leading axis is the batch.
//!
//! Conventions
//! -----------
//! - Errors from core Rust code are `RosError` internally and are converted
//!   to `ValueError` at the PyO3 boundary.
//! - Scores are returned to Python as lists: one float per input, one list
//!   of floats per input in multi-label mode, or a single-element list when
//!   aggregated.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends on [`metrics`] (the metric and its options) and
//!   [`collaborators`] (the traits to implement and the default strategies).
//! - The Python packaging layer imports `_rust_robustness` and wraps its
//!   classes in user-facing APIs.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   the integration tests under `tests/`.

pub mod collaborators;
pub mod metrics;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::{Array2, Ix2};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArrayDyn};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    collaborators::aggregate::AggregateKind,
    metrics::{
        core::{
            guards::EpsMin,
            options::RosOptions,
            reduce::{NanPolicy, RosScores},
        },
        ros::RelativeOutputStability,
    },
    utils::{PyExplainAdapter, PyModelAdapter, extract_f64_arrayd, extract_label_batch},
};

/// PyRelativeOutputStability — Python-facing wrapper for the ROS metric.
///
/// Purpose
/// -------
/// Build a [`RelativeOutputStability`] from Python keyword arguments and
/// evaluate it against a Python model and explanation callable.
///
/// Parameters
/// ----------
/// Constructed from Python via `RelativeOutputStability(...)` with keyword
/// arguments mirroring [`RosOptions`], plus:
/// - `aggregate`: `str`
///   Name of the aggregate used when `return_aggregate=True`
///   (`"mean"`, `"nanmean"`, `"median"`, `"max"`, `"min"`).
/// - `nan_policy`: `str`
///   `"propagate"` or `"ignore"`.
///
/// Fields
/// ------
/// - `inner`: [`RelativeOutputStability`]
///   Fully configured metric.
///
/// Notes
/// -----
/// - Native Rust code should use [`RelativeOutputStability`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "RelativeOutputStability", module = "rust_robustness.metrics")]
pub struct PyRelativeOutputStability {
    inner: RelativeOutputStability,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyRelativeOutputStability {
    #[new]
    #[pyo3(
        signature = (
            nr_samples = 200,
            eps_min = 1e-6,
            noise_upper_bound = 0.2,
            return_nan_when_prediction_changes = true,
            return_aggregate = false,
            aggregate = "mean",
            abs = false,
            normalise = false,
            nan_policy = "propagate",
            multi_label = false,
            batch_size = 64,
            seed = None,
            disable_warnings = false,
        ),
        text_signature = "(nr_samples=200, eps_min=1e-6, noise_upper_bound=0.2, \
                          return_nan_when_prediction_changes=True, return_aggregate=False, \
                          aggregate='mean', abs=False, normalise=False, \
                          nan_policy='propagate', multi_label=False, batch_size=64, \
                          seed=None, disable_warnings=False)"
    )]
    pub fn new(
        nr_samples: usize, eps_min: f64, noise_upper_bound: f64,
        return_nan_when_prediction_changes: bool, return_aggregate: bool, aggregate: &str,
        abs: bool, normalise: bool, nan_policy: &str, multi_label: bool, batch_size: usize,
        seed: Option<u64>, disable_warnings: bool,
    ) -> PyResult<Self> {
        let aggregate: AggregateKind = aggregate.parse()?;
        let nan_policy: NanPolicy = nan_policy.parse()?;
        let options = RosOptions::new(nr_samples, eps_min, noise_upper_bound)?
            .with_nan_guard(return_nan_when_prediction_changes)
            .with_aggregate(return_aggregate)
            .with_abs(abs)
            .with_normalise(normalise)
            .with_nan_policy(nan_policy)
            .with_multi_label(multi_label)
            .with_seed(seed)
            .with_disable_warnings(disable_warnings)
            .with_batch_size(batch_size)?;
        let inner = RelativeOutputStability::new(options)?.with_aggregate(aggregate);
        Ok(PyRelativeOutputStability { inner })
    }

    /// Evaluate the metric on a dataset, computing explanations with
    /// `explain_func` when `a_batch` is not given.
    #[pyo3(
        signature = (model, x_batch, y_batch, explain_func, a_batch = None)
    )]
    pub fn __call__<'py>(
        &self, py: Python<'py>, model: &Bound<'py, PyAny>, x_batch: &Bound<'py, PyAny>,
        y_batch: &Bound<'py, PyAny>, explain_func: &Bound<'py, PyAny>,
        a_batch: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let x = extract_f64_arrayd(py, x_batch)?;
        let y = extract_label_batch(y_batch, self.inner.options().multi_label)?;
        let a = a_batch.map(|raw| extract_f64_arrayd(py, raw)).transpose()?;
        let py_model = PyModelAdapter::new(model.clone());
        let explainer = PyExplainAdapter::new(model.clone(), explain_func.clone());

        let a_view = a.as_ref().map(|a| a.view());
        let scores = self.inner.evaluate(&py_model, &explainer, x.view(), &y, a_view)?;
        scores_to_py(py, scores)
    }

    /// Evaluate the metric on a single batch with precomputed explanations.
    #[pyo3(
        signature = (model, x_batch, y_batch, a_batch, explain_func),
        text_signature = "(self, model, x_batch, y_batch, a_batch, explain_func)"
    )]
    pub fn evaluate_batch<'py>(
        &self, py: Python<'py>, model: &Bound<'py, PyAny>, x_batch: &Bound<'py, PyAny>,
        y_batch: &Bound<'py, PyAny>, a_batch: &Bound<'py, PyAny>,
        explain_func: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let x = extract_f64_arrayd(py, x_batch)?;
        let y = extract_label_batch(y_batch, self.inner.options().multi_label)?;
        let a = extract_f64_arrayd(py, a_batch)?;
        let py_model = PyModelAdapter::new(model.clone());
        let explainer = PyExplainAdapter::new(model.clone(), explain_func.clone());

        let scores = self.inner.evaluate_batch(&py_model, &explainer, x.view(), &y, a.view())?;
        scores_to_py(py, scores)
    }

    #[getter]
    pub fn nr_samples(&self) -> usize {
        self.inner.options().nr_samples
    }

    #[getter]
    pub fn eps_min(&self) -> f64 {
        self.inner.options().eps_min.value()
    }

    #[getter]
    pub fn multi_label(&self) -> bool {
        self.inner.options().multi_label
    }
}

#[cfg(feature = "python-bindings")]
fn scores_to_py(py: Python<'_>, scores: RosScores) -> PyResult<Bound<'_, PyAny>> {
    let obj = match scores {
        RosScores::PerSample(values) => values.into_pyobject(py)?,
        RosScores::PerLabel(lists) => lists.into_pyobject(py)?,
        RosScores::Aggregate(value) => vec![value].into_pyobject(py)?,
    };
    Ok(obj.into_any())
}

/// Evaluate the ROS objective for one draw.
///
/// `h_x`, `h_xs` are `(N, C)` logits; `e_x`, `e_xs` are explanations of rank
/// 2–4 (3–5 when `multi_label`). Returns an `(N,)` or `(N, L)` array.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "relative_output_stability_objective",
    signature = (h_x, h_xs, e_x, e_xs, multi_label = false, eps_min = 1e-6),
    text_signature = "(h_x, h_xs, e_x, e_xs, /, multi_label=False, eps_min=1e-6)"
)]
pub fn py_relative_output_stability_objective<'py>(
    py: Python<'py>, h_x: &Bound<'py, PyAny>, h_xs: &Bound<'py, PyAny>, e_x: &Bound<'py, PyAny>,
    e_xs: &Bound<'py, PyAny>, multi_label: bool, eps_min: f64,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let h_x = extract_logits(py, h_x, "h_x")?;
    let h_xs = extract_logits(py, h_xs, "h_xs")?;
    let e_x = extract_f64_arrayd(py, e_x)?;
    let e_xs = extract_f64_arrayd(py, e_xs)?;
    let eps_min = EpsMin::new(eps_min)?;

    let result = metrics::core::objective::relative_output_stability_objective(
        h_x.view(),
        h_xs.view(),
        e_x.view(),
        e_xs.view(),
        multi_label,
        eps_min,
    )?;
    Ok(result.into_pyarray(py))
}

#[cfg(feature = "python-bindings")]
fn extract_logits<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array2<f64>> {
    extract_f64_arrayd(py, raw)?
        .into_dimensionality::<Ix2>()
        .map_err(|_| PyValueError::new_err(format!("{name} must be a 2-D (N, C) array of logits")))
}

/// _rust_robustness — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_robustness` Python module and register its `metrics`
/// submodule for the public `rust_robustness` package.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_robustness<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let metrics_mod = PyModule::new(_py, "metrics")?;
    metrics_module(_py, m, &metrics_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_robustness.metrics", metrics_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn metrics_module<'py>(
    _py: Python, rust_robustness: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PyRelativeOutputStability>()?;
    m.add_function(wrap_pyfunction!(py_relative_output_stability_objective, m)?)?;
    rust_robustness.add_submodule(m)?;
    Ok(())
}
