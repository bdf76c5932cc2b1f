//! Limb module
//!
//! Three proxies (upper, lower, end) for an arm or leg. Proxy setup adds a
//! pole-vector locator in front of the knee/elbow. The rig gets an FK chain
//! plus an IK end control and a pole control; the IK end control carries the
//! FK/IK `influenceSwitch` attribute.

use super::RigModule;
use crate::core::constants::driver_types;
use crate::core::transform::{Transform, Vector3};
use crate::models::{ModuleCore, Proxy};
use crate::scene::{ensure_attr, AttrValue, NodeKind, SceneBackend, SceneError, Space};
use tracing::debug;

const UPPER: &str = "upper";
const LOWER: &str = "lower";
const END: &str = "end";

/// Module UUID stamped on the pole-vector locator
pub const LIMB_ATTR_POLE: &str = "poleModuleUUID";
/// FK (0.0) to IK (1.0) blend on the IK end control
pub const LIMB_ATTR_SWITCH: &str = "influenceSwitch";

#[derive(Debug, Clone)]
pub struct ModuleLimb {
    core: ModuleCore,
}

impl ModuleLimb {
    pub const CLASS_NAME: &'static str = "ModuleLimb";

    pub fn new() -> Self {
        let mut core = ModuleCore::new("limb");
        let layout = [
            (UPPER, Vector3::new(1.0, 9.0, 0.0)),
            (LOWER, Vector3::new(1.0, 5.0, 0.5)),
            (END, Vector3::new(1.0, 1.0, 0.0)),
        ];
        let mut previous: Option<String> = None;
        for (name, position) in layout {
            let mut proxy = Proxy::new(name);
            proxy.set_meta_purpose(name);
            proxy.add_driver_type(&[driver_types::FK, driver_types::IK]);
            proxy.set_initial_position(Some(position.x), Some(position.y), Some(position.z));
            if let Some(parent) = &previous {
                proxy.set_parent_uuid(parent);
            }
            previous = Some(proxy.uuid().to_string());
            core.add_to_proxies(proxy);
        }
        Self { core }
    }

    fn live_position(&self, scene: &dyn SceneBackend, purpose: &str) -> Option<Vector3> {
        let node = self.core.find_proxy_by_purpose(purpose)?.find_in_scene(scene)?;
        scene.get_transform(node, Space::World).map(|t| t.position)
    }

    /// Pole position: in front of the middle joint, one upper-segment away
    pub fn pole_position(upper: Vector3, lower: Vector3, end: Vector3) -> Vector3 {
        let distance = lower.sub(upper).length().max(1.0);
        let midpoint = upper.lerp(end, 0.5);
        let direction = lower
            .sub(midpoint)
            .normalized()
            .unwrap_or(Vector3::Z);
        lower.add(direction.scale(distance))
    }

    fn find_pole_locator(&self, scene: &dyn SceneBackend) -> Option<crate::scene::NodeHandle> {
        scene.find_by_attr(LIMB_ATTR_POLE, self.core.uuid(), Some(NodeKind::Locator))
    }
}

impl Default for ModuleLimb {
    fn default() -> Self {
        Self::new()
    }
}

impl RigModule for ModuleLimb {
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

        let positions = (
            self.live_position(scene, UPPER),
            self.live_position(scene, LOWER),
            self.live_position(scene, END),
        );
        let (Some(upper), Some(lower), Some(end)) = positions else {
            debug!(module = self.core.name(), "limb proxies incomplete, pole skipped");
            return Ok(());
        };
        let Some(lower_node) = self
            .core
            .find_proxy_by_purpose(LOWER)
            .and_then(|p| p.find_in_scene(scene))
        else {
            return Ok(());
        };

        let name = format!("{}_pole_loc", self.core.name());
        let pole = scene.create_node(NodeKind::Locator, &name)?;
        scene.set_transform(
            pole,
            &Transform::from_position(Self::pole_position(upper, lower, end)),
            Space::World,
        )?;
        scene.parent(pole, Some(lower_node))?;
        ensure_attr(scene, pole, LIMB_ATTR_POLE, AttrValue::from(self.core.uuid()))?;
        Ok(())
    }

    fn build_rig(&mut self, scene: &mut dyn SceneBackend, project_prefix: Option<&str>) -> Result<(), SceneError> {
        let mut attachments = Vec::new();

        let mut parent_control = None;
        for purpose in [UPPER, LOWER, END] {
            let Some(proxy) = self.core.find_proxy_by_purpose(purpose) else { continue };
            let Some(fk) = self
                .core
                .create_control(scene, proxy.uuid(), driver_types::FK, project_prefix, true)?
            else {
                continue;
            };
            match parent_control {
                Some(parent) => scene.parent(fk.group, Some(parent))?,
                None => {
                    if let Some(attachment) = self.core.attachment_uuid(proxy) {
                        attachments.push((fk.key.clone(), attachment));
                    }
                }
            }
            parent_control = Some(fk.control);
        }

        let upper_attachment = self
            .core
            .find_proxy_by_purpose(UPPER)
            .and_then(|p| self.core.attachment_uuid(p));

        if let Some(end) = self.core.find_proxy_by_purpose(END) {
            if let Some(ik) = self
                .core
                .create_control(scene, end.uuid(), driver_types::IK, project_prefix, false)?
            {
                ensure_attr(scene, ik.control, LIMB_ATTR_SWITCH, AttrValue::Float(0.0))?;
                if let Some(attachment) = &upper_attachment {
                    attachments.push((ik.key.clone(), attachment.clone()));
                }
            }
        }

        if let Some(lower) = self.core.find_proxy_by_purpose(LOWER) {
            let pole_position = self
                .find_pole_locator(scene)
                .and_then(|loc| scene.get_transform(loc, Space::World))
                .map(|t| t.position);
            if let Some(pole) = self
                .core
                .create_control(scene, lower.uuid(), driver_types::POLE, project_prefix, false)?
            {
                if let Some(position) = pole_position {
                    scene.set_transform(pole.group, &Transform::from_position(position), Space::World)?;
                }
                if let Some(attachment) = &upper_attachment {
                    attachments.push((pole.key.clone(), attachment.clone()));
                }
            }
        }

        for (key, attachment) in attachments {
            self.core.add_module_child_driver(&key, &attachment);
        }
        Ok(())
    }
}
