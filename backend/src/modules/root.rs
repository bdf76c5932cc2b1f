//! Root module
//!
//! One `root` proxy at the origin. Its joint advertises the `root` and `block`
//! driver types: child modules attach under the root control, and no generic
//! fallback driver is ever synthesized for it.

use super::RigModule;
use crate::core::constants::driver_types;
use crate::models::{ModuleCore, OrientationData, OrientationMethod, Proxy};
use crate::scene::{SceneBackend, SceneError};

pub const ROOT_PURPOSE: &str = "root";

#[derive(Debug, Clone)]
pub struct ModuleRoot {
    core: ModuleCore,
}

impl ModuleRoot {
    pub const CLASS_NAME: &'static str = "ModuleRoot";

    pub fn new() -> Self {
        let mut core = ModuleCore::new("root");
        core.set_orientation(OrientationData::with_method(OrientationMethod::World));

        let mut root = Proxy::new("root");
        root.set_meta_purpose(ROOT_PURPOSE);
        root.add_driver_type(&[driver_types::ROOT, driver_types::BLOCK]);
        root.set_locator_scale(3.0);
        root.set_initial_position(Some(0.0), Some(0.0), Some(0.0));
        core.add_to_proxies(root);

        Self { core }
    }

    pub fn root_proxy(&self) -> Option<&Proxy> {
        self.core.find_proxy_by_purpose(ROOT_PURPOSE)
    }
}

impl Default for ModuleRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl RigModule for ModuleRoot {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn core(&self) -> &ModuleCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModuleCore {
        &mut self.core
    }

    fn build_rig(&mut self, scene: &mut dyn SceneBackend, project_prefix: Option<&str>) -> Result<(), SceneError> {
        let Some(root) = self.root_proxy() else {
            return Ok(());
        };
        let uuid = root.uuid().to_string();
        let attachment = self.core.attachment_uuid(root);
        let Some(control) = self
            .core
            .create_control(scene, &uuid, driver_types::ROOT, project_prefix, true)?
        else {
            return Ok(());
        };
        if let Some(parent) = attachment {
            self.core.add_module_child_driver(&control.key, &parent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::find_drivers_from_module;
    use crate::scene::MemoryScene;

    #[test]
    fn test_root_layout() {
        let module = ModuleRoot::new();
        let root = module.root_proxy().unwrap();
        assert_eq!(root.get_driver_types(), vec!["root", "block"]);
        assert_eq!(module.core().orientation().method, OrientationMethod::World);
    }

    #[test]
    fn test_root_builds_one_driver() {
        let mut module = ModuleRoot::new();
        let mut scene = MemoryScene::new();
        module.build_proxy(&mut scene, None, false).unwrap();
        module.build_proxy_setup(&mut scene).unwrap();
        module.build_skeleton_joints(&mut scene, None).unwrap();
        module.build_skeleton_hierarchy(&mut scene).unwrap();
        module.build_rig(&mut scene, None).unwrap();

        let drivers = find_drivers_from_module(&scene, module.core().uuid());
        assert_eq!(drivers.len(), 1);
        assert_eq!(scene.node_name(drivers[0]).unwrap(), "root_root_ctrl");
    }
}
