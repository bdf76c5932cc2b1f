//! PyO3 wrapper for RigProject

use pyo3::prelude::*;

use super::types::{json_to_py, rig_error_to_py};
use crate::project::{compute_project_hash, BuildStage, RigProject};
use crate::scene::MemoryScene;

/// Python wrapper for a rig project
///
/// # Example (from Python)
///
/// ```python
/// from rig_framework_core_rs import RigProject
///
/// project = RigProject.from_json(open("hero.json").read())
/// project.update_modules_order()
/// scene = project.build("rig")   # JSON snapshot of the built scene
/// print(project.project_hash())
/// ```
#[pyclass(name = "RigProject", unsendable)]
pub struct PyRigProject {
    inner: RigProject,
}

#[pymethods]
impl PyRigProject {
    #[new]
    fn new(name: &str) -> Self {
        PyRigProject {
            inner: RigProject::new(name),
        }
    }

    /// Load a persisted project
    ///
    /// # Errors
    ///
    /// Raises ValueError if `text` is not a JSON object
    #[staticmethod]
    fn from_json(text: &str) -> PyResult<Self> {
        let inner = RigProject::from_json(text).map_err(rig_error_to_py)?;
        Ok(PyRigProject { inner })
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(rig_error_to_py)
    }

    /// Project dictionary as nested Python dicts and lists
    fn to_dict(&self, py: Python) -> PyResult<PyObject> {
        json_to_py(py, &self.inner.get_project_as_dict())
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Module names in build order
    fn module_names(&self) -> Vec<String> {
        self.inner
            .modules()
            .iter()
            .map(|m| m.core().name().to_string())
            .collect()
    }

    fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// Raise ValueError describing the first structural problem, if any
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(rig_error_to_py)
    }

    fn update_modules_order(&mut self) {
        self.inner.update_modules_order();
    }

    fn project_hash(&self) -> PyResult<String> {
        compute_project_hash(&self.inner).map_err(rig_error_to_py)
    }

    /// Proxy parent loops as lists of proxy UUIDs
    fn find_parent_cycles(&self) -> Vec<Vec<String>> {
        self.inner
            .find_parent_cycles()
            .into_iter()
            .map(|cycle| cycle.into_iter().collect())
            .collect()
    }

    /// Build into a fresh in-memory scene
    ///
    /// # Arguments
    ///
    /// * `stage` - "proxy", "skeleton" or "rig"
    ///
    /// # Returns
    ///
    /// JSON snapshot of the resulting scene
    ///
    /// # Errors
    ///
    /// Raises ValueError for an unknown stage, RuntimeError if the build fails
    fn build(&mut self, stage: &str) -> PyResult<String> {
        let stage = BuildStage::parse(stage).ok_or_else(|| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Unknown build stage: {}", stage))
        })?;
        let mut scene = MemoryScene::new();
        self.inner.build(&mut scene, stage).map_err(rig_error_to_py)?;
        serde_json::to_string_pretty(&scene.to_json()).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("Scene encoding failed: {}", e))
        })
    }
}
