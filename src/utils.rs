//! utils — conversion helpers at the Python boundary.
//!
//! Everything here is compiled only with the `python-bindings` feature. The
//! helpers turn Python objects (NumPy arrays, pandas objects, nested
//! sequences, user callables) into the Rust types and collaborator traits
//! the metric works with.
#[cfg(feature = "python-bindings")]
use ndarray::{Array2, ArrayD, ArrayViewD};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray, // ArrayD / Vec → PyArray
    PyReadonlyArray2,
    PyReadonlyArrayDyn,
};

#[cfg(feature = "python-bindings")]
use crate::{
    collaborators::traits::{Explainer, Model},
    metrics::core::data::LabelBatch,
};

/// Copy an array-like of `f64` values of any rank into an owned `ArrayD`.
///
/// Accepts `numpy.ndarray`, objects with a `to_numpy()` method, and nested
/// sequences that `numpy.asarray` understands.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_arrayd<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<ArrayD<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArrayDyn<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(arr_ro) = obj.extract::<PyReadonlyArrayDyn<f64>>() {
            return Ok(arr_ro.as_array().to_owned());
        }
    }

    let converted = py
        .import("numpy")?
        .call_method1("asarray", (raw_data, "float64"))
        .map_err(|_| {
            PyTypeError::new_err("expected a numpy.ndarray or nested sequence of float64")
        })?;
    let arr_ro = converted.extract::<PyReadonlyArrayDyn<f64>>()?;
    Ok(arr_ro.as_array().to_owned())
}

/// Read labels as one class index per input, or one list per input when
/// `multi_label` is set.
#[cfg(feature = "python-bindings")]
pub fn extract_label_batch<'py>(
    raw_labels: &Bound<'py, PyAny>, multi_label: bool,
) -> PyResult<LabelBatch> {
    if multi_label {
        let lists: Vec<Vec<i64>> = raw_labels.extract().map_err(|_| {
            PyTypeError::new_err("multi-label y_batch must be a sequence of integer sequences")
        })?;
        let lists = lists
            .into_iter()
            .map(|list| list.into_iter().map(to_label).collect::<PyResult<Vec<usize>>>())
            .collect::<PyResult<Vec<Vec<usize>>>>()?;
        return Ok(LabelBatch::Multi(lists));
    }

    let labels: Vec<i64> = match raw_labels.call_method0("tolist") {
        Ok(list) => list.extract::<Vec<i64>>(),
        Err(_) => raw_labels.extract::<Vec<i64>>(),
    }
    .map_err(|_| PyTypeError::new_err("y_batch must be a 1-D sequence of integer labels"))?;
    let labels = labels.into_iter().map(to_label).collect::<PyResult<Vec<usize>>>()?;
    Ok(LabelBatch::Single(labels))
}

#[cfg(feature = "python-bindings")]
fn to_label(label: i64) -> PyResult<usize> {
    usize::try_from(label)
        .map_err(|_| PyValueError::new_err(format!("labels must be non-negative; got {label}")))
}

/// Python object exposing `predict(x) -> (N, C)` as a [`Model`].
#[cfg(feature = "python-bindings")]
pub struct PyModelAdapter<'py> {
    model: Bound<'py, PyAny>,
}

#[cfg(feature = "python-bindings")]
impl<'py> PyModelAdapter<'py> {
    pub fn new(model: Bound<'py, PyAny>) -> Self {
        PyModelAdapter { model }
    }
}

#[cfg(feature = "python-bindings")]
impl Model for PyModelAdapter<'_> {
    fn predict(&self, x_batch: ArrayViewD<'_, f64>) -> anyhow::Result<Array2<f64>> {
        let py = self.model.py();
        let inputs = x_batch.to_owned().into_pyarray(py);
        let logits = self.model.call_method1("predict", (inputs,))?;
        let logits = logits.extract::<PyReadonlyArray2<f64>>()?;
        Ok(logits.as_array().to_owned())
    }
}

/// Python callable `explain_func(model=..., inputs=..., targets=...)` as an
/// [`Explainer`]. The Python model object is passed through unchanged.
#[cfg(feature = "python-bindings")]
pub struct PyExplainAdapter<'py> {
    model: Bound<'py, PyAny>,
    explain_func: Bound<'py, PyAny>,
}

#[cfg(feature = "python-bindings")]
impl<'py> PyExplainAdapter<'py> {
    pub fn new(model: Bound<'py, PyAny>, explain_func: Bound<'py, PyAny>) -> Self {
        PyExplainAdapter { model, explain_func }
    }
}

#[cfg(feature = "python-bindings")]
impl Explainer for PyExplainAdapter<'_> {
    fn explain(
        &self, _model: &dyn Model, x_batch: ArrayViewD<'_, f64>, y_batch: &LabelBatch,
    ) -> anyhow::Result<ArrayD<f64>> {
        let py = self.explain_func.py();
        let targets = match y_batch {
            LabelBatch::Single(labels) => {
                let labels: Vec<i64> = labels.iter().map(|&l| l as i64).collect();
                labels.into_pyarray(py).into_any()
            }
            LabelBatch::Multi(lists) => lists.clone().into_pyobject(py)?.into_any(),
        };
        let kwargs = PyDict::new(py);
        kwargs.set_item("model", &self.model)?;
        kwargs.set_item("inputs", x_batch.to_owned().into_pyarray(py))?;
        kwargs.set_item("targets", targets)?;
        let explanations = self.explain_func.call((), Some(&kwargs))?;
        let explanations = explanations.extract::<PyReadonlyArrayDyn<f64>>()?;
        Ok(explanations.as_array().to_owned())
    }
}
