//! Conversion between `serde_json` values and Python objects

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde_json::Value;

use crate::project::RigError;

/// Convert a JSON value to the equivalent Python object
///
/// Objects become `dict`, arrays become `list`; integers that fit in `i64`
/// stay integers.
pub fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    let object = match value {
        Value::Null => py.None(),
        Value::Bool(b) => (*b).into_py(py),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into_py(py),
            None => n.as_f64().unwrap_or(f64::NAN).into_py(py),
        },
        Value::String(s) => s.as_str().into_py(py),
        Value::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_py(py)
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into_py(py)
        }
    };
    Ok(object)
}

/// Map a project error onto a Python exception
///
/// Data problems raise `ValueError`; backend failures raise `RuntimeError`.
pub fn rig_error_to_py(err: RigError) -> PyErr {
    match err {
        RigError::Scene(_) => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(err.to_string()),
        RigError::Serialization(_) | RigError::InvalidProject(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string())
        }
    }
}
