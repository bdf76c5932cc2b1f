//! Module core
//!
//! `ModuleCore` holds the state every rig module shares (identity, naming,
//! orientation policy, code hook, proxies) and implements the default
//! behavior of each build phase. Specialized modules (see `crate::modules`)
//! wrap a core and override individual phases.
//!
//! # Phases
//!
//! ```text
//! build_proxy -> build_proxy_setup -> build_skeleton_joints
//!   -> build_skeleton_hierarchy -> build_rig -> build_rig_post
//! ```
//!
//! # Critical Invariants
//!
//! 1. No phase keeps a scene handle for a later phase; objects are found again
//!    by UUID attribute
//! 2. A phase that cannot find its source object logs and skips it
//! 3. External (cross-module) parenting happens after orientation
//! 4. `build_rig_post` runs only after every module's `build_rig`

use super::code::{CodeHook, CodeOrder, HookContext, ScriptHost};
use super::fields::{get_bool, get_object, get_str};
use super::orientation::{OrientationData, OrientationMethod};
use super::proxy::{Proxy, ProxyData};
use crate::core::constants::{
    CONTROL_GROUP_SUFFIX, CONTROL_SUFFIX, JOINT_ATTR_BASE_NAME, JOINT_ATTR_DRIVERS,
    JOINT_ATTR_MODULE_UUID, JOINT_ATTR_PURPOSE, JOINT_ATTR_RADIUS, JOINT_ATTR_UUID, JOINT_SUFFIX,
    META_PURPOSE, PROXY_ATTR_ROT_ORDER,
};
use crate::core::ids::{generate_uuid, is_short_uuid_valid, is_uuid_valid, SHORT_UUID_LENGTH};
use crate::core::naming::{combine_prefix, compose_name};
use crate::core::paths::PathTokens;
use crate::core::transform::{Transform, Vector3};
use crate::drivers::{add_driver_uuid_attr, find_driver_from_key, find_drivers_from_joint};
use crate::scene::{
    ensure_attr, get_object_from_uuid_attr, AttrValue, ConstraintKind, NodeHandle, NodeKind,
    SceneBackend, SceneError, Space,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Project environment visible to a module
///
/// Set by the owning project; used only to resolve path tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectEnv {
    pub name: String,
    pub project_dir: Option<PathBuf>,
}

/// Control created for one proxy's joint
#[derive(Debug, Clone, PartialEq)]
pub struct ControlData {
    pub group: NodeHandle,
    pub control: NodeHandle,
    pub key: String,
}

/// Control waiting to be attached under the module's parent driver
#[derive(Debug, Clone, PartialEq)]
struct ModuleChildDriver {
    driver_key: String,
    parent_proxy_uuid: String,
}

/// Shared state and default phase behavior of a rig module
#[derive(Debug, Clone)]
pub struct ModuleCore {
    name: String,
    uuid: String,
    prefix: Option<String>,
    suffix: Option<String>,
    parent_uuid: Option<String>,
    active: bool,
    orientation: OrientationData,
    code: Option<CodeHook>,
    metadata: Map<String, Value>,
    proxies: Vec<Proxy>,
    project: Option<ProjectEnv>,
    module_children_drivers: Vec<ModuleChildDriver>,
}

/// Find the joint built from the proxy `proxy_uuid`
pub fn find_joint(scene: &dyn SceneBackend, proxy_uuid: &str) -> Option<NodeHandle> {
    get_object_from_uuid_attr(scene, proxy_uuid, JOINT_ATTR_UUID, Some(NodeKind::Joint))
}

/// Set a world rotation without dragging the node's children along
fn set_world_rotation_keep_children(
    scene: &mut dyn SceneBackend,
    node: NodeHandle,
    rotation: Vector3,
) -> Result<(), SceneError> {
    let children = scene.children(node);
    for child in &children {
        scene.parent(*child, None)?;
    }
    if let Some(mut pose) = scene.get_transform(node, Space::World) {
        pose.rotation = rotation;
        scene.set_transform(node, &pose, Space::World)?;
    }
    for child in &children {
        scene.parent(*child, Some(node))?;
    }
    Ok(())
}

impl ModuleCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: generate_uuid(true),
            prefix: None,
            suffix: None,
            parent_uuid: None,
            active: true,
            orientation: OrientationData::default(),
            code: None,
            metadata: Map::new(),
            proxies: Vec::new(),
            project: None,
            module_children_drivers: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn parent_uuid(&self) -> Option<&str> {
        self.parent_uuid.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn orientation(&self) -> &OrientationData {
        &self.orientation
    }

    pub fn code(&self) -> Option<&CodeHook> {
        self.code.as_ref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn proxies_mut(&mut self) -> &mut [Proxy] {
        &mut self.proxies
    }

    pub fn parent_project(&self) -> Option<&ProjectEnv> {
        self.project.as_ref()
    }

    pub fn find_proxy(&self, uuid: &str) -> Option<&Proxy> {
        self.proxies.iter().find(|p| p.uuid() == uuid)
    }

    pub fn find_proxy_mut(&mut self, uuid: &str) -> Option<&mut Proxy> {
        self.proxies.iter_mut().find(|p| p.uuid() == uuid)
    }

    pub fn find_proxy_by_purpose(&self, purpose: &str) -> Option<&Proxy> {
        self.proxies
            .iter()
            .find(|p| p.get_meta_purpose() == Some(purpose))
    }

    pub fn find_proxy_by_purpose_mut(&mut self, purpose: &str) -> Option<&mut Proxy> {
        self.proxies
            .iter_mut()
            .find(|p| p.get_meta_purpose() == Some(purpose))
    }

    /// Module prefix composed with the project prefix
    pub fn full_prefix(&self, project_prefix: Option<&str>) -> Option<String> {
        combine_prefix(project_prefix, self.prefix.as_deref())
    }

    // ========================================================================
    // Setters
    // ========================================================================

    pub fn set_name(&mut self, name: &str) {
        if name.is_empty() {
            warn!(module = %self.uuid, "empty module name rejected");
            return;
        }
        self.name = name.to_string();
    }

    pub fn set_uuid(&mut self, uuid: &str) {
        if !is_short_uuid_valid(uuid, SHORT_UUID_LENGTH) {
            warn!(module = %self.name, uuid, "invalid module uuid rejected");
            return;
        }
        self.uuid = uuid.to_string();
    }

    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
    }

    pub fn set_suffix(&mut self, suffix: Option<&str>) {
        self.suffix = suffix.filter(|s| !s.is_empty()).map(str::to_string);
    }

    /// Attach the module to a proxy (usually owned by another module)
    pub fn set_parent_uuid(&mut self, uuid: &str) {
        if !is_uuid_valid(uuid) {
            warn!(module = %self.name, uuid, "invalid parent uuid rejected");
            return;
        }
        self.parent_uuid = Some(uuid.to_string());
    }

    pub fn set_parent_uuid_from_proxy(&mut self, proxy: &Proxy) {
        self.set_parent_uuid(proxy.uuid());
    }

    pub fn clear_parent_uuid(&mut self) {
        self.parent_uuid = None;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_orientation(&mut self, orientation: OrientationData) {
        self.orientation = orientation;
    }

    pub fn set_orientation_method(&mut self, method: OrientationMethod) {
        self.orientation.method = method;
    }

    pub fn set_code(&mut self, code: Option<CodeHook>) {
        self.code = code;
    }

    pub fn set_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn set_parent_project(&mut self, project: Option<ProjectEnv>) {
        self.project = project;
    }

    /// Add a proxy; a proxy whose UUID is already owned is rejected
    pub fn add_to_proxies(&mut self, proxy: Proxy) {
        if self.find_proxy(proxy.uuid()).is_some() {
            warn!(module = %self.name, uuid = proxy.uuid(), "proxy already in module");
            return;
        }
        self.proxies.push(proxy);
    }

    pub fn remove_from_proxies(&mut self, uuid: &str) -> Option<Proxy> {
        let idx = self.proxies.iter().position(|p| p.uuid() == uuid)?;
        Some(self.proxies.remove(idx))
    }

    pub fn clear_proxies(&mut self) {
        self.proxies.clear();
    }

    /// Resolve path tokens against the owning project and the current scene
    pub fn resolve_path(&self, scene: &dyn SceneBackend, raw: &str) -> PathBuf {
        let project_dir = self.project.as_ref().and_then(|p| p.project_dir.as_deref());
        let scene_path = scene.scene_path();
        PathBuf::from(PathTokens::from_environment(project_dir, scene_path.as_deref()).resolve(raw))
    }

    // ========================================================================
    // Build Phases
    // ========================================================================

    /// Build every proxy without applying transforms
    pub fn build_proxy(
        &mut self,
        scene: &mut dyn SceneBackend,
        project_prefix: Option<&str>,
        optimized: bool,
    ) -> Result<Vec<ProxyData>, SceneError> {
        let prefix = self.full_prefix(project_prefix);
        let mut built = Vec::with_capacity(self.proxies.len());
        for proxy in &self.proxies {
            if let Some(data) = proxy.build(scene, prefix.as_deref(), self.suffix.as_deref(), false, optimized)? {
                built.push(data);
            }
        }
        info!(module = %self.name, count = built.len(), "proxies built");
        Ok(built)
    }

    /// Apply every proxy's pivot and pose
    pub fn build_proxy_setup(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        for proxy in &self.proxies {
            proxy.apply_transforms(scene, true)?;
        }
        Ok(())
    }

    /// Create one joint per live proxy and stamp its cross-reference attributes
    ///
    /// The joint takes the proxy's world position and scale. A proxy that
    /// already has a joint keeps it, so a skeleton built earlier is reused
    /// rather than duplicated.
    pub fn build_skeleton_joints(
        &mut self,
        scene: &mut dyn SceneBackend,
        project_prefix: Option<&str>,
    ) -> Result<Vec<NodeHandle>, SceneError> {
        let prefix = self.full_prefix(project_prefix);
        let mut joints = Vec::with_capacity(self.proxies.len());
        for proxy in &self.proxies {
            let Some(source) = proxy.find_in_scene(scene) else {
                debug!(module = %self.name, proxy = proxy.name(), "proxy not in scene, joint skipped");
                continue;
            };
            if let Some(existing) = find_joint(scene, proxy.uuid()) {
                debug!(module = %self.name, proxy = proxy.name(), "joint already built, reused");
                joints.push(existing);
                continue;
            }
            let (position, scale) = scene
                .get_transform(source, Space::World)
                .map(|t| (t.position, t.scale))
                .unwrap_or((Vector3::ZERO, proxy.transform().scale));

            let base_name = compose_name(prefix.as_deref(), proxy.name(), self.suffix.as_deref());
            let joint = scene.create_node(NodeKind::Joint, &compose_name(None, &base_name, Some(JOINT_SUFFIX)))?;
            scene.set_transform(joint, &Transform::new(position, Vector3::ZERO, scale), Space::World)?;

            ensure_attr(scene, joint, JOINT_ATTR_RADIUS, AttrValue::Float(proxy.locator_scale()))?;
            ensure_attr(scene, joint, PROXY_ATTR_ROT_ORDER, AttrValue::Int(proxy.rotation_order()))?;
            ensure_attr(scene, joint, JOINT_ATTR_BASE_NAME, AttrValue::from(base_name.as_str()))?;
            ensure_attr(scene, joint, JOINT_ATTR_UUID, AttrValue::from(proxy.uuid()))?;
            scene.lock_attr(joint, JOINT_ATTR_UUID, true)?;
            ensure_attr(scene, joint, JOINT_ATTR_MODULE_UUID, AttrValue::from(self.uuid.as_str()))?;
            ensure_attr(
                scene,
                joint,
                JOINT_ATTR_PURPOSE,
                AttrValue::from(proxy.get_meta_purpose().unwrap_or_default()),
            )?;
            let drivers = serde_json::to_string(&proxy.get_driver_types())
                .map_err(|e| SceneError::Unsupported(format!("driver list encoding: {}", e)))?;
            ensure_attr(scene, joint, JOINT_ATTR_DRIVERS, AttrValue::Text(drivers))?;
            joints.push(joint);
        }
        info!(module = %self.name, count = joints.len(), "joints created");
        Ok(joints)
    }

    /// Parent and orient the module's joints
    ///
    /// 1. Inherit: copy proxy rotation before any parenting
    /// 2. Parent joints within the module
    /// 3. Automatic / world orientation
    /// 4. Parent top joints outside the module, last
    pub fn build_skeleton_hierarchy(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        let mut joint_of: HashMap<&str, NodeHandle> = HashMap::new();
        for proxy in &self.proxies {
            match find_joint(scene, proxy.uuid()) {
                Some(joint) => {
                    joint_of.insert(proxy.uuid(), joint);
                }
                None => debug!(module = %self.name, proxy = proxy.name(), "joint not found, skipped"),
            }
        }
        if joint_of.is_empty() {
            return Ok(());
        }

        if self.orientation.method == OrientationMethod::Inherit {
            for proxy in &self.proxies {
                let Some(joint) = joint_of.get(proxy.uuid()).copied() else { continue };
                let rotation = proxy
                    .find_in_scene(scene)
                    .and_then(|node| scene.get_transform(node, Space::World))
                    .map(|t| t.rotation)
                    .unwrap_or_else(|| proxy.transform().rotation);
                if let Some(mut pose) = scene.get_transform(joint, Space::World) {
                    pose.rotation = rotation;
                    scene.set_transform(joint, &pose, Space::World)?;
                }
            }
        }

        for proxy in &self.proxies {
            let (Some(joint), Some(parent)) = (joint_of.get(proxy.uuid()), proxy.parent_uuid()) else {
                continue;
            };
            if let Some(parent_joint) = joint_of.get(parent) {
                scene.parent(*joint, Some(*parent_joint))?;
            }
        }

        match self.orientation.method {
            OrientationMethod::Automatic => self.orient_automatic(scene, &joint_of)?,
            OrientationMethod::World => {
                for proxy in &self.proxies {
                    if let Some(joint) = joint_of.get(proxy.uuid()) {
                        set_world_rotation_keep_children(scene, *joint, Vector3::ZERO)?;
                    }
                }
            }
            OrientationMethod::Inherit => {}
        }

        for proxy in &self.proxies {
            let Some(joint) = joint_of.get(proxy.uuid()).copied() else { continue };
            let target = match proxy.parent_uuid() {
                Some(parent) if self.find_proxy(parent).is_some() => None,
                Some(parent) => Some(parent),
                None => self.parent_uuid.as_deref(),
            };
            let Some(target) = target else { continue };
            match find_joint(scene, target) {
                Some(parent_joint) => scene.parent(joint, Some(parent_joint))?,
                None => debug!(module = %self.name, parent = target, "external parent joint not found"),
            }
        }
        Ok(())
    }

    fn orient_automatic(
        &self,
        scene: &mut dyn SceneBackend,
        joint_of: &HashMap<&str, NodeHandle>,
    ) -> Result<(), SceneError> {
        let in_module_parent = |proxy: &Proxy| -> Option<&Proxy> {
            proxy.parent_uuid().and_then(|p| self.find_proxy(p))
        };

        // Parents before children; depth is bounded to survive parent loops
        let mut ordered: Vec<(usize, &Proxy)> = self
            .proxies
            .iter()
            .filter(|p| joint_of.contains_key(p.uuid()))
            .map(|proxy| {
                let mut depth = 0;
                let mut current = in_module_parent(proxy);
                while let Some(parent) = current {
                    depth += 1;
                    if depth > self.proxies.len() {
                        break;
                    }
                    current = in_module_parent(parent);
                }
                (depth, proxy)
            })
            .collect();
        ordered.sort_by_key(|(depth, _)| *depth);

        for (_, proxy) in ordered {
            let joint = joint_of[proxy.uuid()];
            let parent_joint = in_module_parent(proxy).and_then(|p| joint_of.get(p.uuid()).copied());
            let parent_rotation = parent_joint
                .and_then(|pj| scene.get_transform(pj, Space::World))
                .map(|t| t.rotation);
            let first_child = self
                .proxies
                .iter()
                .filter(|p| p.parent_uuid() == Some(proxy.uuid()))
                .find_map(|p| joint_of.get(p.uuid()).copied());

            let rotation = match first_child {
                Some(child) => {
                    let here = scene.get_transform(joint, Space::World).map(|t| t.position);
                    let there = scene.get_transform(child, Space::World).map(|t| t.position);
                    match (here, there) {
                        (Some(here), Some(there)) => self
                            .orientation
                            .aim(there.sub(here), parent_rotation)
                            .or(parent_rotation),
                        _ => parent_rotation,
                    }
                }
                None => parent_rotation,
            };
            set_world_rotation_keep_children(scene, joint, rotation.unwrap_or(Vector3::ZERO))?;
        }
        Ok(())
    }

    /// Create a control for `proxy_uuid`'s joint and tag it as a driver
    ///
    /// The control sits in a group placed at the joint. With `drive_joint`
    /// the joint is constrained to the control.
    ///
    /// # Returns
    /// `Ok(None)` if the joint was not built
    pub fn create_control(
        &self,
        scene: &mut dyn SceneBackend,
        proxy_uuid: &str,
        driver_type: &str,
        project_prefix: Option<&str>,
        drive_joint: bool,
    ) -> Result<Option<ControlData>, SceneError> {
        let Some(proxy) = self.find_proxy(proxy_uuid) else {
            warn!(module = %self.name, proxy_uuid, "control requested for unknown proxy");
            return Ok(None);
        };
        let Some(joint) = find_joint(scene, proxy_uuid) else {
            debug!(module = %self.name, proxy = proxy.name(), "joint not found, control skipped");
            return Ok(None);
        };

        let prefix = self.full_prefix(project_prefix);
        let base = compose_name(
            prefix.as_deref(),
            &format!("{}_{}", proxy.name(), driver_type),
            self.suffix.as_deref(),
        );
        let group = scene.create_node(NodeKind::Group, &compose_name(None, &base, Some(CONTROL_GROUP_SUFFIX)))?;
        let control = scene.create_node(NodeKind::Control, &compose_name(None, &base, Some(CONTROL_SUFFIX)))?;
        scene.parent(control, Some(group))?;
        if let Some(pose) = scene.get_transform(joint, Space::World) {
            scene.set_transform(group, &pose, Space::World)?;
        }
        scene.set_transform(control, &Transform::IDENTITY, Space::Local)?;

        let key = add_driver_uuid_attr(scene, control, &self.uuid, Some(driver_type), proxy.get_meta_purpose())?;
        if drive_joint {
            scene.constrain(ConstraintKind::Parent, control, joint, true)?;
        }
        Ok(Some(ControlData { group, control, key }))
    }

    /// Queue a control to be attached under the driver of `parent_proxy_uuid`'s joint
    pub fn add_module_child_driver(&mut self, driver_key: &str, parent_proxy_uuid: &str) {
        self.module_children_drivers.push(ModuleChildDriver {
            driver_key: driver_key.to_string(),
            parent_proxy_uuid: parent_proxy_uuid.to_string(),
        });
    }

    pub fn module_children_driver_count(&self) -> usize {
        self.module_children_drivers.len()
    }

    /// External attachment proxy for a proxy: its foreign parent or the module parent
    pub fn attachment_uuid(&self, proxy: &Proxy) -> Option<String> {
        match proxy.parent_uuid() {
            Some(parent) if self.find_proxy(parent).is_some() => None,
            Some(parent) => Some(parent.to_string()),
            None => self.parent_uuid.clone(),
        }
    }

    /// Re-parent queued controls under the driver of their parent joint
    ///
    /// The queue is drained; a rebuild queues its controls again.
    pub fn build_rig_post(&mut self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        let queued = std::mem::take(&mut self.module_children_drivers);
        for pending in &queued {
            let Some(control) = find_driver_from_key(scene, &pending.driver_key) else {
                debug!(module = %self.name, key = %pending.driver_key, "queued control not found");
                continue;
            };
            let Some(parent_joint) = find_joint(scene, &pending.parent_proxy_uuid) else {
                debug!(module = %self.name, parent = %pending.parent_proxy_uuid, "parent joint not found");
                continue;
            };
            let drivers = find_drivers_from_joint(scene, parent_joint, false, true)?;
            let Some(driver) = drivers.first().copied() else {
                debug!(module = %self.name, "parent joint exposes no driver");
                continue;
            };
            let target = scene.get_parent(control).unwrap_or(control);
            scene.parent(target, Some(driver))?;
            debug!(module = %self.name, %driver, "control attached to parent driver");
        }
        Ok(())
    }

    /// Run the module hook if it is registered for `order`
    ///
    /// Hook failures are logged and do not abort the build.
    pub fn run_code(
        &self,
        scene: &mut dyn SceneBackend,
        order: CodeOrder,
        host: Option<&mut (dyn ScriptHost + '_)>,
    ) -> bool {
        let Some(hook) = self.code.as_ref().filter(|h| h.order == order) else {
            return false;
        };
        let mut context = HookContext {
            scene,
            module_name: &self.name,
            module_uuid: &self.uuid,
            order,
        };
        match hook.execute(&mut context, host) {
            Ok(ran) => ran,
            Err(err) => {
                error!(module = %self.name, order = order.as_str(), %err, "module hook failed");
                false
            }
        }
    }

    // ========================================================================
    // Scene Read-back / Cleanup
    // ========================================================================

    pub fn read_data_from_scene(&mut self, scene: &dyn SceneBackend) {
        for proxy in &mut self.proxies {
            proxy.read_data_from_scene(scene);
        }
    }

    pub fn has_proxies_in_scene(&self, scene: &dyn SceneBackend) -> bool {
        self.proxies.iter().any(|p| p.find_in_scene(scene).is_some())
    }

    pub fn delete_proxies(&self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        for proxy in &self.proxies {
            proxy.delete_from_scene(scene)?;
        }
        Ok(())
    }

    /// Import a file relative to the project, resolving path tokens
    pub fn import_path(&self, scene: &mut dyn SceneBackend, raw: &str) -> Result<Vec<NodeHandle>, SceneError> {
        let path = self.resolve_path(scene, raw);
        scene.import_file(Path::new(&path))
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Persisted module dictionary
    pub fn to_dict(&self, class_name: &str) -> Value {
        let mut dict = Map::new();
        dict.insert("module".to_string(), Value::from(class_name));
        dict.insert("name".to_string(), Value::from(self.name.as_str()));
        dict.insert("uuid".to_string(), Value::from(self.uuid.as_str()));
        dict.insert("active".to_string(), Value::Bool(self.active));
        let opt = |v: &Option<String>| v.as_deref().map_or(Value::Null, Value::from);
        dict.insert("prefix".to_string(), opt(&self.prefix));
        dict.insert("suffix".to_string(), opt(&self.suffix));
        dict.insert("parent".to_string(), opt(&self.parent_uuid));
        dict.insert("orientation".to_string(), self.orientation.to_dict());
        dict.insert(
            "code".to_string(),
            self.code.as_ref().and_then(CodeHook::to_dict).unwrap_or(Value::Null),
        );
        dict.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        let proxies: Map<String, Value> = self
            .proxies
            .iter()
            .map(|p| (p.uuid().to_string(), p.get_proxy_as_dict(false, true, true)))
            .collect();
        dict.insert("proxies".to_string(), Value::Object(proxies));
        Value::Object(dict)
    }

    /// Read every module-level field except proxies
    pub fn read_common_from_dict(&mut self, dict: &Map<String, Value>) {
        let owner = self.name.clone();
        if let Some(name) = get_str(dict, "name", &owner) {
            self.set_name(name);
        }
        if let Some(uuid) = get_str(dict, "uuid", &owner) {
            self.set_uuid(uuid);
        }
        if let Some(active) = get_bool(dict, "active", &owner) {
            self.active = active;
        }
        if dict.contains_key("prefix") {
            self.set_prefix(get_str(dict, "prefix", &owner));
        }
        if dict.contains_key("suffix") {
            self.set_suffix(get_str(dict, "suffix", &owner));
        }
        match dict.get("parent") {
            Some(Value::Null) => self.parent_uuid = None,
            Some(_) => {
                if let Some(parent) = get_str(dict, "parent", &owner) {
                    self.set_parent_uuid(parent);
                }
            }
            None => {}
        }
        if let Some(orientation) = get_object(dict, "orientation", &owner) {
            self.orientation.read_from_dict(orientation);
        }
        if let Some(code) = get_object(dict, "code", &owner) {
            self.code = CodeHook::from_dict(code);
        }
        if let Some(metadata) = get_object(dict, "metadata", &owner) {
            for (key, value) in metadata {
                self.metadata.insert(key.clone(), value.clone());
            }
        }
    }

    /// Match incoming proxies to the fixed layout, by UUID then by purpose
    pub fn reconcile_proxies_from_dict(&mut self, proxies: &Map<String, Value>) {
        let mut claimed = vec![false; self.proxies.len()];
        for (uuid, data) in proxies {
            let by_uuid = self.proxies.iter().position(|p| p.uuid() == uuid);
            let purpose = data
                .get("metadata")
                .and_then(|m| m.get(META_PURPOSE))
                .and_then(Value::as_str);
            let idx = by_uuid.filter(|i| !claimed[*i]).or_else(|| {
                purpose.and_then(|purpose| {
                    self.proxies
                        .iter()
                        .enumerate()
                        .position(|(i, p)| !claimed[i] && p.get_meta_purpose() == Some(purpose))
                })
            });
            let Some(idx) = idx else {
                warn!(module = %self.name, uuid = %uuid, "no matching proxy in layout, ignored");
                continue;
            };
            claimed[idx] = true;
            let proxy = &mut self.proxies[idx];
            proxy.set_uuid(uuid);
            proxy.read_data_from_dict(data);
        }
    }

    /// Replace the proxy list with the incoming proxies
    pub fn replace_proxies_from_dict(&mut self, proxies: &Map<String, Value>) {
        self.proxies.clear();
        for (uuid, data) in proxies {
            let name = data.get("name").and_then(Value::as_str).unwrap_or("proxy");
            let mut proxy = Proxy::new(name);
            proxy.set_uuid(uuid);
            proxy.read_data_from_dict(data);
            self.add_to_proxies(proxy);
        }
    }
}
