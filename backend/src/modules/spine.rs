//! Spine module
//!
//! Five proxies from hip to chest. During proxy setup the three spine proxies
//! are spaced evenly between the live hip and chest, so the operator only
//! places the two ends. The rig has a COG control above an FK chain.

use super::RigModule;
use crate::core::constants::driver_types;
use crate::core::transform::{Transform, Vector3};
use crate::models::{ModuleCore, Proxy};
use crate::scene::{SceneBackend, SceneError, Space};
use tracing::debug;

const HIP: &str = "hip";
const CHEST: &str = "chest";
const SPINE: [&str; 3] = ["spine01", "spine02", "spine03"];

#[derive(Debug, Clone)]
pub struct ModuleSpine {
    core: ModuleCore,
}

impl ModuleSpine {
    pub const CLASS_NAME: &'static str = "ModuleSpine";

    pub fn new() -> Self {
        let mut core = ModuleCore::new("spine");
        let names: Vec<&str> = std::iter::once(HIP).chain(SPINE).chain([CHEST]).collect();
        let step = 5.0 / (names.len() - 1) as f64;

        let mut previous: Option<Proxy> = None;
        for (i, name) in names.iter().enumerate() {
            let mut proxy = Proxy::new(*name);
            proxy.set_meta_purpose(name);
            if *name == HIP {
                proxy.add_driver_type(&[driver_types::COG, driver_types::FK]);
            } else {
                proxy.add_driver_type(&[driver_types::FK]);
            }
            proxy.set_initial_position(Some(0.0), Some(10.0 + step * i as f64), Some(0.0));
            if let Some(parent) = &previous {
                proxy.set_parent_uuid_from_proxy(parent);
            }
            previous = Some(proxy.clone());
            core.add_to_proxies(proxy);
        }
        Self { core }
    }

    fn live_position(&self, scene: &dyn SceneBackend, purpose: &str) -> Option<Vector3> {
        let node = self.core.find_proxy_by_purpose(purpose)?.find_in_scene(scene)?;
        scene.get_transform(node, Space::World).map(|t| t.position)
    }
}

impl Default for ModuleSpine {
    fn default() -> Self {
        Self::new()
    }
}

impl RigModule for ModuleSpine {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn core(&self) -> &ModuleCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModuleCore {
        &mut self.core
    }

    fn build_proxy_setup(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        self.core.build_proxy_setup(scene)?;

        let (Some(hip), Some(chest)) = (self.live_position(scene, HIP), self.live_position(scene, CHEST)) else {
            debug!(module = self.core.name(), "hip or chest not built, spacing skipped");
            return Ok(());
        };
        let segments = (SPINE.len() + 1) as f64;
        for (i, purpose) in SPINE.iter().enumerate() {
            let Some(node) = self
                .core
                .find_proxy_by_purpose(purpose)
                .and_then(|p| p.find_in_scene(scene))
            else {
                continue;
            };
            let target = hip.lerp(chest, (i + 1) as f64 / segments);
            if let Some(offset) = scene.get_parent(node) {
                let mut pose = scene.get_transform(offset, Space::World).unwrap_or_default();
                pose.position = target;
                scene.set_transform(offset, &pose, Space::World)?;
            }
            let mut local = scene.get_transform(node, Space::Local).unwrap_or(Transform::IDENTITY);
            local.position = Vector3::ZERO;
            scene.set_transform(node, &local, Space::Local)?;
        }
        Ok(())
    }

    fn build_rig(&mut self, scene: &mut dyn SceneBackend, project_prefix: Option<&str>) -> Result<(), SceneError> {
        let Some(hip) = self.core.find_proxy_by_purpose(HIP) else {
            return Ok(());
        };
        let hip_uuid = hip.uuid().to_string();
        let attachment = self.core.attachment_uuid(hip);

        let cog = self
            .core
            .create_control(scene, &hip_uuid, driver_types::COG, project_prefix, false)?;

        let mut parent_control = cog.as_ref().map(|c| c.control);
        for proxy in self.core.proxies() {
            let Some(fk) = self
                .core
                .create_control(scene, proxy.uuid(), driver_types::FK, project_prefix, true)?
            else {
                continue;
            };
            if let Some(parent) = parent_control {
                scene.parent(fk.group, Some(parent))?;
            }
            parent_control = Some(fk.control);
        }

        if let (Some(cog), Some(attachment)) = (cog, attachment) {
            self.core.add_module_child_driver(&cog.key, &attachment);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{build_driver_key, find_driver_from_key};
    use crate::scene::MemoryScene;

    #[test]
    fn test_layout_is_chained() {
        let module = ModuleSpine::new();
        let proxies = module.core().proxies();
        assert_eq!(proxies.len(), 5);
        assert_eq!(proxies[0].get_meta_purpose(), Some("hip"));
        assert_eq!(proxies[4].get_meta_purpose(), Some("chest"));
        for pair in proxies.windows(2) {
            assert_eq!(pair[1].parent_uuid(), Some(pair[0].uuid()));
        }
    }

    #[test]
    fn test_setup_spaces_spine_evenly() {
        let mut module = ModuleSpine::new();
        module
            .core_mut()
            .find_proxy_by_purpose_mut("chest")
            .unwrap()
            .set_initial_position(None, Some(18.0), None);
        // A stray spine pose is overridden by the spacing
        module
            .core_mut()
            .find_proxy_by_purpose_mut("spine02")
            .unwrap()
            .set_initial_position(Some(4.0), None, None);

        let mut scene = MemoryScene::new();
        module.build_proxy(&mut scene, None, false).unwrap();
        module.build_proxy_setup(&mut scene).unwrap();

        let spine02 = module.live_position(&scene, "spine02").unwrap();
        assert!(spine02.approx_eq(Vector3::new(0.0, 14.0, 0.0), 1e-9), "{:?}", spine02);
        let spine01 = module.live_position(&scene, "spine01").unwrap();
        assert!((spine01.y - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_rig_has_cog_above_fk() {
        let mut module = ModuleSpine::new();
        let mut scene = MemoryScene::new();
        module.build_proxy(&mut scene, None, false).unwrap();
        module.build_proxy_setup(&mut scene).unwrap();
        module.build_skeleton_joints(&mut scene, None).unwrap();
        module.build_skeleton_hierarchy(&mut scene).unwrap();
        module.build_rig(&mut scene, None).unwrap();

        let uuid = module.core().uuid();
        let cog = find_driver_from_key(&scene, &build_driver_key(uuid, Some("cog"), Some("hip"))).unwrap();
        let hip_fk = find_driver_from_key(&scene, &build_driver_key(uuid, Some("fk"), Some("hip"))).unwrap();
        let hip_group = scene.get_parent(hip_fk).unwrap();
        assert_eq!(scene.get_parent(hip_group), Some(cog));
    }
}
