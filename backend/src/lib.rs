//! Rig Framework Core - Rust Engine
//!
//! Procedural character-rig framework. A rig is described by proxies
//! (placeholder transforms) grouped into modules, and built in phases into
//! a skeleton and a control rig inside a scene backend.
//!
//! # Architecture
//!
//! - **core**: UUIDs, transform math, naming, path tokens, attribute names
//! - **scene**: Scene backend contract, in-memory backend, UUID lookup
//! - **models**: Proxy, module state, orientation, code hooks
//! - **drivers**: Driver keys, driver tagging and lookup
//! - **modules**: Module specializations (root, generic, spine, limb, import file)
//! - **project**: RigProject orchestration and persistence
//!
//! # Critical Invariants
//!
//! 1. Scene objects are found by UUID attribute, never by name
//! 2. Cross-object references are UUID strings, never handles
//! 3. Every build phase completes for all modules before the next starts
//! 4. Invalid input is logged and ignored; only backend errors propagate

// Module declarations
pub mod core;
pub mod drivers;
pub mod models;
pub mod modules;
pub mod project;
pub mod scene;

// Re-exports for convenience
pub use drivers::{
    add_driver_uuid_attr, build_driver_key, connect_supporting_driver, find_driver_from_key,
    find_drivers_from_joint, find_drivers_from_module, get_supporting_drivers, DriverKey,
};
pub use models::{
    CodeHook, CodeOrder, ModuleCore, OrientationData, OrientationMethod, Proxy, ProxyData, ScriptHost,
};
pub use modules::{
    module_from_class_name, module_from_dict, ModuleGeneric, ModuleImportFile, ModuleLimb, ModuleRoot,
    ModuleSpine, RigModule,
};
pub use project::{compute_project_hash, BuildStage, ProjectPreferences, RigError, RigProject};
pub use scene::{
    get_object_from_uuid_attr, AttrType, AttrValue, MemoryScene, NodeHandle, NodeKind, RefreshGuard,
    SceneBackend, SceneError, Space,
};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn rig_framework_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::project::PyRigProject>()?;
    Ok(())
}
