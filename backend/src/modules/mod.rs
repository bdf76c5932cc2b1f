//! Rig modules
//!
//! Every module wraps a [`ModuleCore`] and implements [`RigModule`]. The
//! default phase methods delegate to the core; specializations override the
//! phases they need.
//!
//! Available modules:
//! 1. **ModuleRoot**: single `root` proxy; its joint blocks generic drivers
//! 2. **ModuleGeneric**: any number of proxies, one FK control each
//! 3. **ModuleSpine**: hip, three spine proxies and chest, evenly spaced
//! 4. **ModuleLimb**: upper / lower / end with FK and IK controls
//! 5. **ModuleImportFile**: no proxies; imports a file while the rig is built
//!
//! Modules are rebuilt from persisted dictionaries by class name:
//!
//! ```rust
//! use rig_framework_core_rs::modules::module_from_class_name;
//!
//! let module = module_from_class_name("ModuleLimb").unwrap();
//! assert_eq!(module.core().proxies().len(), 3);
//! assert!(module_from_class_name("ModuleTentacle").is_none());
//! ```

pub mod generic;
pub mod import_file;
pub mod limb;
pub mod root;
pub mod spine;

pub use generic::ModuleGeneric;
pub use import_file::ModuleImportFile;
pub use limb::ModuleLimb;
pub use root::ModuleRoot;
pub use spine::ModuleSpine;

use crate::models::fields::{get_object, get_str};
use crate::models::{ModuleCore, ProxyData};
use crate::scene::{NodeHandle, SceneBackend, SceneError};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// A rig part built through the phase pipeline
pub trait RigModule: fmt::Debug {
    /// Persisted class name (the `"module"` key)
    fn class_name(&self) -> &'static str;

    fn core(&self) -> &ModuleCore;

    fn core_mut(&mut self) -> &mut ModuleCore;

    fn build_proxy(
        &mut self,
        scene: &mut dyn SceneBackend,
        project_prefix: Option<&str>,
        optimized: bool,
    ) -> Result<Vec<ProxyData>, SceneError> {
        self.core_mut().build_proxy(scene, project_prefix, optimized)
    }

    fn build_proxy_setup(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        self.core_mut().build_proxy_setup(scene)
    }

    fn build_skeleton_joints(
        &mut self,
        scene: &mut dyn SceneBackend,
        project_prefix: Option<&str>,
    ) -> Result<Vec<NodeHandle>, SceneError> {
        self.core_mut().build_skeleton_joints(scene, project_prefix)
    }

    fn build_skeleton_hierarchy(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        self.core_mut().build_skeleton_hierarchy(scene)
    }

    fn build_rig(&mut self, _scene: &mut dyn SceneBackend, _project_prefix: Option<&str>) -> Result<(), SceneError> {
        debug!(module = self.core().name(), "no control rig for module");
        Ok(())
    }

    fn build_rig_post(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        self.core_mut().build_rig_post(scene)
    }

    fn read_data_from_scene(&mut self, scene: &dyn SceneBackend) {
        self.core_mut().read_data_from_scene(scene);
    }

    fn get_module_as_dict(&self) -> Value {
        self.core().to_dict(self.class_name())
    }

    /// Read a persisted module; fixed layouts reconcile proxies by UUID then purpose
    fn read_data_from_dict(&mut self, dict: &Value) {
        let Some(map) = dict.as_object() else {
            warn!(module = self.core().name(), "module data is not an object, ignored");
            return;
        };
        let core = self.core_mut();
        core.read_common_from_dict(map);
        let owner = core.name().to_string();
        if let Some(proxies) = get_object(map, "proxies", &owner) {
            core.reconcile_proxies_from_dict(proxies);
        }
    }
}

/// Construct a default module of the given persisted class
pub fn module_from_class_name(class_name: &str) -> Option<Box<dyn RigModule>> {
    match class_name {
        ModuleRoot::CLASS_NAME => Some(Box::new(ModuleRoot::new())),
        ModuleGeneric::CLASS_NAME => Some(Box::new(ModuleGeneric::new("generic"))),
        ModuleSpine::CLASS_NAME => Some(Box::new(ModuleSpine::new())),
        ModuleLimb::CLASS_NAME => Some(Box::new(ModuleLimb::new())),
        ModuleImportFile::CLASS_NAME => Some(Box::new(ModuleImportFile::new())),
        _ => {
            warn!(class_name, "unknown module class");
            None
        }
    }
}

/// Rebuild a module from its persisted dictionary
pub fn module_from_dict(dict: &Value) -> Option<Box<dyn RigModule>> {
    let class_name = dict
        .as_object()
        .and_then(|map| get_str(map, "module", "project"));
    let Some(class_name) = class_name else {
        warn!("module entry without class name skipped");
        return None;
    };
    let mut module = module_from_class_name(class_name)?;
    module.read_data_from_dict(dict);
    Some(module)
}
