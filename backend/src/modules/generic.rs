//! Generic module
//!
//! A free-form chain: any number of proxies, one FK control per proxy. Each
//! control nests under the control of its parent proxy; controls whose parent
//! lives in another module are attached there after every module's rig exists.

use super::RigModule;
use crate::core::constants::driver_types;
use crate::models::fields::get_object;
use crate::models::{ControlData, ModuleCore, Proxy};
use crate::scene::{SceneBackend, SceneError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ModuleGeneric {
    core: ModuleCore,
}

impl ModuleGeneric {
    pub const CLASS_NAME: &'static str = "ModuleGeneric";

    pub fn new(name: &str) -> Self {
        Self {
            core: ModuleCore::new(name),
        }
    }

    /// Append a proxy whose purpose defaults to its name
    ///
    /// The new proxy is parented to the previous one when `chain` is set.
    pub fn add_new_proxy(&mut self, name: &str, chain: bool) -> &mut Proxy {
        let mut proxy = Proxy::new(name);
        proxy.set_meta_purpose(name);
        proxy.add_driver_type(&[driver_types::FK]);
        if chain {
            if let Some(previous) = self.core.proxies().last() {
                proxy.set_parent_uuid_from_proxy(previous);
            }
        }
        let idx = self.core.proxies().len();
        self.core.add_to_proxies(proxy);
        &mut self.core.proxies_mut()[idx]
    }
}

impl RigModule for ModuleGeneric {
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
        let mut controls: HashMap<String, ControlData> = HashMap::new();
        for proxy in self.core.proxies() {
            if let Some(control) =
                self.core
                    .create_control(scene, proxy.uuid(), driver_types::FK, project_prefix, true)?
            {
                controls.insert(proxy.uuid().to_string(), control);
            }
        }

        let mut attachments = Vec::new();
        for proxy in self.core.proxies() {
            let Some(control) = controls.get(proxy.uuid()) else { continue };
            let parent_control = proxy
                .parent_uuid()
                .and_then(|parent| controls.get(parent));
            match parent_control {
                Some(parent) => scene.parent(control.group, Some(parent.control))?,
                None => {
                    if let Some(attachment) = self.core.attachment_uuid(proxy) {
                        attachments.push((control.key.clone(), attachment));
                    }
                }
            }
        }
        for (key, attachment) in attachments {
            self.core.add_module_child_driver(&key, &attachment);
        }
        Ok(())
    }

    /// Generic modules take their proxy list from the dictionary as-is
    fn read_data_from_dict(&mut self, dict: &Value) {
        let Some(map) = dict.as_object() else {
            warn!(module = self.core.name(), "module data is not an object, ignored");
            return;
        };
        self.core.read_common_from_dict(map);
        let owner = self.core.name().to_string();
        if let Some(proxies) = get_object(map, "proxies", &owner) {
            self.core.replace_proxies_from_dict(proxies);
        }
    }
}
