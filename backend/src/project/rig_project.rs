//! RigProject: module list, build orchestration and persistence
//!
//! # Build pipeline
//!
//! ```text
//! build_proxy     pre_proxy → build_proxy (all) → build_proxy_setup (all) → post_proxy
//! build_skeleton  pre_skeleton → joints (all) → hierarchy (all) → post_skeleton
//! build_rig       read back proxies → build_skeleton
//!                 → pre_control_rig → build_rig (all) → build_rig_post (all) → post_control_rig
//!                 → delete proxies → post_build
//! ```
//!
//! Each phase finishes for every module before the next phase starts, so a
//! module may look up objects created by any other module in an earlier
//! phase regardless of list order. Only active modules are built.
//!
//! # Critical Invariants
//!
//! 1. Scene refresh is suspended for the duration of every build method and
//!    restored on every exit path, including errors ([`RefreshGuard`])
//! 2. Only backend errors propagate; bad data is logged and skipped
//! 3. A failed build is not rolled back
//! 4. Module hooks run project-wide in list order

use crate::core::ids::is_uuid_valid;
use crate::core::paths::PathTokens;
use crate::models::fields::{get_object, get_str};
use crate::models::{CodeOrder, ProjectEnv, Proxy, ProxyGraph, ScriptHost};
use crate::modules::{module_from_dict, RigModule};
use crate::scene::{RefreshGuard, SceneBackend, SceneError};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::preferences::ProjectPreferences;

// ============================================================================
// Errors
// ============================================================================

/// Project-level errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    /// Backend failure during a build phase
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Structural problem reported by [`RigProject::validate`]
    #[error("Invalid project: {0}")]
    InvalidProject(String),
}

/// How far a build should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Proxy,
    Skeleton,
    Rig,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStage::Proxy => "proxy",
            BuildStage::Skeleton => "skeleton",
            BuildStage::Rig => "rig",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "proxy" => Some(BuildStage::Proxy),
            "skeleton" => Some(BuildStage::Skeleton),
            "rig" => Some(BuildStage::Rig),
            _ => None,
        }
    }
}

// ============================================================================
// RigProject
// ============================================================================

pub struct RigProject {
    name: String,
    prefix: Option<String>,
    preferences: ProjectPreferences,
    modules: Vec<Box<dyn RigModule>>,
    script_host: Option<Box<dyn ScriptHost>>,
}

impl fmt::Debug for RigProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigProject")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("preferences", &self.preferences)
            .field("modules", &self.modules)
            .field("script_host", &self.script_host.is_some())
            .finish()
    }
}

impl Default for RigProject {
    fn default() -> Self {
        Self::new("untitled")
    }
}

impl RigProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            preferences: ProjectPreferences::default(),
            modules: Vec::new(),
            script_host: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn preferences(&self) -> &ProjectPreferences {
        &self.preferences
    }

    pub fn modules(&self) -> &[Box<dyn RigModule>] {
        &self.modules
    }

    pub fn set_name(&mut self, name: &str) {
        if name.is_empty() {
            warn!("empty project name rejected");
            return;
        }
        self.name = name.to_string();
        self.sync_project_env();
    }

    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
    }

    pub fn set_preferences(&mut self, preferences: ProjectPreferences) {
        self.preferences = preferences;
        self.sync_project_env();
    }

    /// Register the interpreter used for source-text hooks
    pub fn set_script_host(&mut self, host: Box<dyn ScriptHost>) {
        self.script_host = Some(host);
    }

    fn project_env(&self) -> ProjectEnv {
        ProjectEnv {
            name: self.name.clone(),
            project_dir: self.preferences.project_dir.clone(),
        }
    }

    fn sync_project_env(&mut self) {
        let env = self.project_env();
        for module in &mut self.modules {
            module.core_mut().set_parent_project(Some(env.clone()));
        }
    }

    // ========================================================================
    // Module List
    // ========================================================================

    /// Append a module and point it back at this project
    ///
    /// A module whose UUID is already registered is rejected.
    pub fn add_to_modules(&mut self, mut module: Box<dyn RigModule>) {
        let uuid = module.core().uuid().to_string();
        if self.get_module_from_uuid(&uuid).is_some() {
            warn!(project = %self.name, module = %uuid, "module already in project, ignored");
            return;
        }
        module.core_mut().set_parent_project(Some(self.project_env()));
        debug!(project = %self.name, module = module.core().name(), "module added");
        self.modules.push(module);
    }

    pub fn remove_from_modules(&mut self, uuid: &str) -> Option<Box<dyn RigModule>> {
        let idx = self.modules.iter().position(|m| m.core().uuid() == uuid)?;
        let mut module = self.modules.remove(idx);
        module.core_mut().set_parent_project(None);
        Some(module)
    }

    pub fn get_module_from_uuid(&self, uuid: &str) -> Option<&dyn RigModule> {
        self.modules
            .iter()
            .find(|m| m.core().uuid() == uuid)
            .map(|m| &**m)
    }

    pub fn get_module_from_uuid_mut(&mut self, uuid: &str) -> Option<&mut Box<dyn RigModule>> {
        self.modules.iter_mut().find(|m| m.core().uuid() == uuid)
    }

    /// Module owning the proxy `proxy_uuid`
    pub fn find_proxy_owner(&self, proxy_uuid: &str) -> Option<&dyn RigModule> {
        self.modules
            .iter()
            .find(|m| m.core().find_proxy(proxy_uuid).is_some())
            .map(|m| &**m)
    }

    pub fn find_proxy(&self, proxy_uuid: &str) -> Option<&Proxy> {
        self.modules.iter().find_map(|m| m.core().find_proxy(proxy_uuid))
    }

    /// Resolve path tokens against this project and the backend's scene
    pub fn resolve_path(&self, scene: &dyn SceneBackend, raw: &str) -> PathBuf {
        let scene_path = scene.scene_path();
        let tokens = PathTokens::from_environment(self.preferences.project_dir.as_deref(), scene_path.as_deref());
        PathBuf::from(tokens.resolve(raw))
    }

    /// Index of the module a module attaches to, if it is another module
    fn attachment_module_index(&self, idx: usize, owners: &HashMap<&str, usize>) -> Option<usize> {
        let core = self.modules[idx].core();
        let external = core.parent_uuid().or_else(|| {
            core.proxies()
                .iter()
                .filter_map(|p| p.parent_uuid())
                .find(|parent| core.find_proxy(parent).is_none())
        })?;
        owners.get(external).copied().filter(|owner| *owner != idx)
    }

    /// Reorder modules so every module follows the module it attaches to
    ///
    /// Breadth-first from each unattached module: all modules attached to a
    /// parent come right after it, in their existing relative order, before
    /// any grandchildren. Modules caught in an attachment loop keep their
    /// relative order at the end of the list.
    pub fn update_modules_order(&mut self) {
        let owners: HashMap<&str, usize> = self
            .modules
            .iter()
            .enumerate()
            .flat_map(|(idx, m)| m.core().proxies().iter().map(move |p| (p.uuid(), idx)))
            .collect();

        let parents: Vec<Option<usize>> = (0..self.modules.len())
            .map(|idx| self.attachment_module_index(idx, &owners))
            .collect();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.modules.len()];
        for (child, parent) in parents.iter().enumerate() {
            if let Some(parent) = parent {
                children[*parent].push(child);
            }
        }

        let mut order = Vec::with_capacity(self.modules.len());
        let mut visited = vec![false; self.modules.len()];
        let mut queue = VecDeque::new();
        for root in (0..self.modules.len()).filter(|idx| parents[*idx].is_none()) {
            queue.push_back(root);
            while let Some(idx) = queue.pop_front() {
                if visited[idx] {
                    continue;
                }
                visited[idx] = true;
                order.push(idx);
                queue.extend(children[idx].iter().copied());
            }
        }
        order.extend((0..self.modules.len()).filter(|idx| !visited[*idx]));

        let mut slots: Vec<Option<Box<dyn RigModule>>> = self.modules.drain(..).map(Some).collect();
        self.modules = order.into_iter().filter_map(|idx| slots[idx].take()).collect();
        debug!(project = %self.name, "modules reordered");
    }

    // ========================================================================
    // Build Phases
    // ========================================================================

    /// Run every module hook registered for `order`, in list order
    fn run_hooks(&mut self, scene: &mut dyn SceneBackend, order: CodeOrder) {
        for module in self.modules.iter().filter(|m| m.core().is_active()) {
            module.core().run_code(scene, order, self.script_host.as_deref_mut());
        }
    }

    /// Create every module's proxies and apply their poses
    pub fn build_proxy(&mut self, scene: &mut dyn SceneBackend) -> Result<(), RigError> {
        let mut guard = RefreshGuard::new(scene);
        let scene: &mut dyn SceneBackend = &mut *guard;
        info!(project = %self.name, "building proxies");

        self.run_hooks(scene, CodeOrder::PreProxy);
        let prefix = self.prefix.clone();
        for module in self.modules.iter_mut().filter(|m| m.core().is_active()) {
            module.build_proxy(scene, prefix.as_deref(), false)?;
        }
        for module in self.modules.iter_mut().filter(|m| m.core().is_active()) {
            module.build_proxy_setup(scene)?;
        }
        self.run_hooks(scene, CodeOrder::PostProxy);
        Ok(())
    }

    /// Create, parent and orient every module's joints
    pub fn build_skeleton(&mut self, scene: &mut dyn SceneBackend) -> Result<(), RigError> {
        let mut guard = RefreshGuard::new(scene);
        self.build_skeleton_unguarded(&mut *guard)
    }

    fn build_skeleton_unguarded(&mut self, scene: &mut dyn SceneBackend) -> Result<(), RigError> {
        info!(project = %self.name, "building skeleton");
        self.run_hooks(scene, CodeOrder::PreSkeleton);
        let prefix = self.prefix.clone();
        for module in self.modules.iter_mut().filter(|m| m.core().is_active()) {
            module.build_skeleton_joints(scene, prefix.as_deref())?;
        }
        for module in self.modules.iter_mut().filter(|m| m.core().is_active()) {
            module.build_skeleton_hierarchy(scene)?;
        }
        self.run_hooks(scene, CodeOrder::PostSkeleton);
        Ok(())
    }

    /// Build the skeleton and (per preferences) the control rig
    ///
    /// Proxy edits made in the scene are read back first, so the skeleton
    /// follows what the user sees.
    pub fn build_rig(&mut self, scene: &mut dyn SceneBackend) -> Result<(), RigError> {
        let mut guard = RefreshGuard::new(scene);
        let scene: &mut dyn SceneBackend = &mut *guard;

        if self.modules.iter().any(|m| m.core().has_proxies_in_scene(scene)) {
            self.read_data_from_scene(scene);
        }
        self.build_skeleton_unguarded(scene)?;

        if self.preferences.build_control_rig {
            info!(project = %self.name, "building control rig");
            self.run_hooks(scene, CodeOrder::PreControlRig);
            let prefix = self.prefix.clone();
            for module in self.modules.iter_mut().filter(|m| m.core().is_active()) {
                module.build_rig(scene, prefix.as_deref())?;
            }
            for module in self.modules.iter_mut().filter(|m| m.core().is_active()) {
                module.build_rig_post(scene)?;
            }
            self.run_hooks(scene, CodeOrder::PostControlRig);
        } else {
            debug!(project = %self.name, "control rig disabled in preferences");
        }

        if self.preferences.delete_proxy_after_build {
            for module in &self.modules {
                module.core().delete_proxies(scene)?;
            }
        }
        self.run_hooks(scene, CodeOrder::PostBuild);
        info!(project = %self.name, "rig built");
        Ok(())
    }

    /// Build up to and including `stage`, starting from proxies
    pub fn build(&mut self, scene: &mut dyn SceneBackend, stage: BuildStage) -> Result<(), RigError> {
        self.build_proxy(scene)?;
        match stage {
            BuildStage::Proxy => Ok(()),
            BuildStage::Skeleton => self.build_skeleton(scene),
            BuildStage::Rig => self.build_rig(scene),
        }
    }

    /// Refresh every module's proxies from the live scene
    pub fn read_data_from_scene(&mut self, scene: &dyn SceneBackend) {
        for module in &mut self.modules {
            module.read_data_from_scene(scene);
        }
    }

    // ========================================================================
    // Validation & Diagnostics
    // ========================================================================

    /// Check identities and proxy data
    ///
    /// A project needs at least one module that owns a proxy.
    ///
    /// # Errors
    /// The first problem found, as [`RigError::InvalidProject`]
    pub fn validate(&self) -> Result<(), RigError> {
        if self.name.is_empty() {
            return Err(RigError::InvalidProject("project has no name".to_string()));
        }
        if self.modules.iter().all(|m| m.core().proxies().is_empty()) {
            return Err(RigError::InvalidProject("project has no module with proxies".to_string()));
        }
        let mut module_uuids = HashSet::new();
        let mut proxy_uuids = HashSet::new();
        for module in &self.modules {
            let core = module.core();
            if !module_uuids.insert(core.uuid()) {
                return Err(RigError::InvalidProject(format!("duplicate module uuid {}", core.uuid())));
            }
            if let Some(parent) = core.parent_uuid() {
                if !is_uuid_valid(parent) {
                    return Err(RigError::InvalidProject(format!(
                        "module {} has malformed parent {}",
                        core.name(),
                        parent
                    )));
                }
            }
            for proxy in core.proxies() {
                if !proxy.is_valid() {
                    return Err(RigError::InvalidProject(format!(
                        "proxy {} in module {} is incomplete",
                        proxy.uuid(),
                        core.name()
                    )));
                }
                if !proxy_uuids.insert(proxy.uuid()) {
                    return Err(RigError::InvalidProject(format!("duplicate proxy uuid {}", proxy.uuid())));
                }
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Effective proxy parent edges; a top proxy inherits its module's parent
    fn proxy_graph(&self) -> ProxyGraph {
        ProxyGraph::from_edges(self.modules.iter().flat_map(|m| {
            let core = m.core();
            core.proxies()
                .iter()
                .map(move |p| (p.uuid(), p.parent_uuid().or(core.parent_uuid())))
        }))
    }

    /// Proxy parent loops, each as a sorted set of proxy UUIDs
    ///
    /// Builds do not check for loops; call this before building untrusted
    /// data.
    pub fn find_parent_cycles(&self) -> Vec<BTreeSet<String>> {
        self.proxy_graph().find_cycles()
    }

    /// `(proxy, parent)` pairs whose parent is not a proxy of this project
    pub fn find_dangling_parents(&self) -> Vec<(String, String)> {
        self.proxy_graph().dangling().to_vec()
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn get_project_as_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("name".to_string(), Value::from(self.name.as_str()));
        dict.insert(
            "prefix".to_string(),
            self.prefix.as_deref().map_or(Value::Null, Value::from),
        );
        dict.insert("preferences".to_string(), self.preferences.to_dict());
        dict.insert(
            "modules".to_string(),
            Value::Array(self.modules.iter().map(|m| m.get_module_as_dict()).collect()),
        );
        Value::Object(dict)
    }

    /// Replace this project's contents with a persisted dictionary
    ///
    /// Malformed fields keep their current value; module entries with an
    /// unknown class are skipped.
    pub fn read_data_from_dict(&mut self, dict: &Value) {
        let Some(map) = dict.as_object() else {
            warn!(project = %self.name, "project data is not an object, ignored");
            return;
        };
        let owner = self.name.clone();
        if let Some(name) = get_str(map, "name", &owner) {
            self.set_name(name);
        }
        match map.get("prefix") {
            Some(Value::String(prefix)) => self.set_prefix(Some(prefix)),
            Some(Value::Null) => self.set_prefix(None),
            Some(other) => warn!(project = %self.name, found = %other, "prefix is not a string, ignored"),
            None => {}
        }
        if let Some(preferences) = get_object(map, "preferences", &owner) {
            self.set_preferences(ProjectPreferences::from_dict(&Value::Object(preferences.clone())));
        }

        match map.get("modules") {
            Some(Value::Array(entries)) => {
                for mut module in self.modules.drain(..) {
                    module.core_mut().set_parent_project(None);
                }
                for entry in entries {
                    if let Some(module) = module_from_dict(entry) {
                        self.add_to_modules(module);
                    }
                }
            }
            Some(other) => warn!(project = %self.name, found = %other, "modules is not a list, ignored"),
            None => {}
        }
        info!(project = %self.name, modules = self.modules.len(), "project loaded");
    }

    pub fn to_json(&self) -> Result<String, RigError> {
        serde_json::to_string_pretty(&self.get_project_as_dict())
            .map_err(|e| RigError::Serialization(format!("project encoding failed: {}", e)))
    }

    /// Parse a persisted project
    ///
    /// # Errors
    /// Only when `text` is not JSON; content problems are logged and skipped
    pub fn from_json(text: &str) -> Result<Self, RigError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RigError::Serialization(format!("project is not valid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(RigError::Serialization("project must be a JSON object".to_string()));
        }
        let mut project = Self::default();
        project.read_data_from_dict(&value);
        Ok(project)
    }
}

// ============================================================================
// Fingerprint
// ============================================================================

/// SHA-256 over the project dictionary with sorted keys
///
/// Two projects with the same content hash identically regardless of the
/// insertion order of their dictionary keys.
pub fn compute_project_hash(project: &RigProject) -> Result<String, RigError> {
    hash_project_dict(project.get_project_as_dict())
}

/// SHA-256 of a project dict with every object's keys sorted
fn hash_project_dict(dict: Value) -> Result<String, RigError> {
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(dict))
        .map_err(|e| RigError::Serialization(format!("project hash encoding failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeHook, HookContext};
    use crate::modules::{ModuleGeneric, ModuleRoot};
    use crate::scene::MemoryScene;

    fn root_and_arm() -> (RigProject, String, String) {
        let mut project = RigProject::new("hero");
        let root = ModuleRoot::new();
        let root_proxy = root.root_proxy().map(|p| p.uuid().to_string()).unwrap();
        let root_uuid = root.core().uuid().to_string();

        let mut arm = ModuleGeneric::new("arm");
        arm.add_new_proxy("shoulder", false);
        arm.core_mut().set_parent_uuid(&root_proxy);

        project.add_to_modules(Box::new(arm));
        project.add_to_modules(Box::new(root));
        (project, root_uuid, root_proxy)
    }

    #[test]
    fn test_modules_point_back_at_project() {
        let (project, root_uuid, _) = root_and_arm();
        let root = project.get_module_from_uuid(&root_uuid).unwrap();
        assert_eq!(root.core().parent_project().unwrap().name, "hero");
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut project = RigProject::new("hero");
        let root = ModuleRoot::new();
        project.add_to_modules(Box::new(root.clone()));
        project.add_to_modules(Box::new(root));
        assert_eq!(project.modules().len(), 1);
    }

    #[test]
    fn test_remove_clears_back_reference() {
        let (mut project, root_uuid, _) = root_and_arm();
        let removed = project.remove_from_modules(&root_uuid).unwrap();
        assert!(removed.core().parent_project().is_none());
        assert_eq!(project.modules().len(), 1);
    }

    #[test]
    fn test_update_modules_order_moves_child_after_parent() {
        let (mut project, root_uuid, _) = root_and_arm();
        assert_eq!(project.modules()[0].core().name(), "arm");
        project.update_modules_order();
        assert_eq!(project.modules()[0].core().uuid(), root_uuid);
        assert_eq!(project.modules()[1].core().name(), "arm");
    }

    #[test]
    fn test_find_proxy_owner() {
        let (project, root_uuid, root_proxy) = root_and_arm();
        assert_eq!(project.find_proxy_owner(&root_proxy).unwrap().core().uuid(), root_uuid);
        assert!(project.find_proxy_owner("missing").is_none());
    }

    #[test]
    fn test_build_restores_refresh_on_success() {
        let (mut project, _, _) = root_and_arm();
        let mut scene = MemoryScene::new();
        project.build(&mut scene, BuildStage::Rig).unwrap();
        assert!(!scene.is_refresh_suspended());
        assert_eq!(scene.suspend_calls(), 2);
    }

    #[test]
    fn test_build_rig_deletes_proxies_by_default() {
        let (mut project, _, _) = root_and_arm();
        let mut scene = MemoryScene::new();
        project.build(&mut scene, BuildStage::Rig).unwrap();
        assert!(project.modules().iter().all(|m| !m.core().has_proxies_in_scene(&scene)));
        // In-memory proxies survive for serialization
        assert_eq!(project.modules()[0].core().proxies().len(), 1);
    }

    #[test]
    fn test_hooks_run_in_phase_order() {
        fn tag(ctx: &mut HookContext<'_>) -> Result<(), String> {
            ctx.scene
                .create_node(crate::scene::NodeKind::Group, &format!("hook_{}", ctx.order.as_str()))
                .map(|_| ())
                .map_err(|e| e.to_string())
        }
        let (mut project, root_uuid, _) = root_and_arm();
        project
            .get_module_from_uuid_mut(&root_uuid)
            .unwrap()
            .core_mut()
            .set_code(Some(CodeHook::callable(CodeOrder::PostSkeleton, tag)));
        let mut scene = MemoryScene::new();
        project.build(&mut scene, BuildStage::Proxy).unwrap();
        assert!(scene.find_by_name("hook_post_skeleton").is_none());
        project.build_skeleton(&mut scene).unwrap();
        assert!(scene.find_by_name("hook_post_skeleton").is_some());
    }

    #[test]
    fn test_validate_reports_duplicate_proxy() {
        let mut project = RigProject::new("hero");
        let mut a = ModuleGeneric::new("a");
        let shared = a.add_new_proxy("p", false).clone();
        let mut b = ModuleGeneric::new("b");
        b.core_mut().add_to_proxies(shared);
        project.add_to_modules(Box::new(a));
        project.add_to_modules(Box::new(b));
        assert!(matches!(project.validate(), Err(RigError::InvalidProject(_))));
        assert!(!project.is_valid());
    }

    #[test]
    fn test_cross_module_cycle_detected() {
        let mut project = RigProject::new("loop");
        let mut a = ModuleGeneric::new("a");
        let a_proxy = a.add_new_proxy("pa", false).uuid().to_string();
        let mut b = ModuleGeneric::new("b");
        let b_proxy = b.add_new_proxy("pb", false).uuid().to_string();
        a.core_mut().set_parent_uuid(&b_proxy);
        b.core_mut().set_parent_uuid(&a_proxy);
        project.add_to_modules(Box::new(a));
        project.add_to_modules(Box::new(b));

        let cycles = project.find_parent_cycles();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].contains(&a_proxy) && cycles[0].contains(&b_proxy));
        // Reordering must terminate and keep both modules
        project.update_modules_order();
        assert_eq!(project.modules().len(), 2);
    }

    #[test]
    fn test_dangling_parent_reported() {
        let mut project = RigProject::new("hero");
        let mut arm = ModuleGeneric::new("arm");
        arm.add_new_proxy("shoulder", false);
        let missing = crate::core::ids::generate_uuid(false);
        arm.core_mut().set_parent_uuid(&missing);
        project.add_to_modules(Box::new(arm));
        let dangling = project.find_dangling_parents();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].1, missing);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(matches!(RigProject::from_json("[1, 2]"), Err(RigError::Serialization(_))));
        assert!(matches!(RigProject::from_json("{"), Err(RigError::Serialization(_))));
    }

    #[test]
    fn test_hash_ignores_key_order() {
        fn reverse_keys(value: Value) -> Value {
            match value {
                Value::Object(map) => {
                    let mut entries: Vec<(String, Value)> =
                        map.into_iter().map(|(k, v)| (k, reverse_keys(v))).collect();
                    entries.reverse();
                    Value::Object(entries.into_iter().collect())
                }
                Value::Array(arr) => Value::Array(arr.into_iter().map(reverse_keys).collect()),
                other => other,
            }
        }

        let (project, _, _) = root_and_arm();
        let dict = project.get_project_as_dict();
        let reversed = reverse_keys(dict.clone());
        assert_ne!(
            serde_json::to_string(&dict).unwrap(),
            serde_json::to_string(&reversed).unwrap()
        );

        let hash = compute_project_hash(&project).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash_project_dict(reversed).unwrap(), hash);
    }

    #[test]
    fn test_empty_project_is_invalid() {
        let project = RigProject::new("empty");
        assert!(matches!(project.validate(), Err(RigError::InvalidProject(_))));
        assert!(!project.is_valid());
    }

    #[test]
    fn test_project_without_proxies_is_invalid() {
        let mut project = RigProject::new("bare");
        project.add_to_modules(Box::new(ModuleGeneric::new("empty")));
        assert!(!project.is_valid());

        let (project, _, _) = root_and_arm();
        assert!(project.is_valid());
    }

    #[test]
    fn test_update_modules_order_keeps_siblings_next_to_parent() {
        let mut project = RigProject::new("hero");
        let root = ModuleRoot::new();
        let root_proxy = root.root_proxy().map(|p| p.uuid().to_string()).unwrap();

        let mut left = ModuleGeneric::new("left");
        let left_proxy = left.add_new_proxy("l", false).uuid().to_string();
        left.core_mut().set_parent_uuid(&root_proxy);
        let mut right = ModuleGeneric::new("right");
        right.add_new_proxy("r", false);
        right.core_mut().set_parent_uuid(&root_proxy);
        let mut hand = ModuleGeneric::new("hand");
        hand.add_new_proxy("h", false);
        hand.core_mut().set_parent_uuid(&left_proxy);

        project.add_to_modules(Box::new(hand));
        project.add_to_modules(Box::new(left));
        project.add_to_modules(Box::new(right));
        project.add_to_modules(Box::new(root));
        project.update_modules_order();

        let names: Vec<&str> = project.modules().iter().map(|m| m.core().name()).collect();
        assert_eq!(names, vec!["root", "left", "right", "hand"]);
    }

    #[test]
    fn test_build_stage_parse() {
        assert_eq!(BuildStage::parse("skeleton"), Some(BuildStage::Skeleton));
        assert_eq!(BuildStage::parse("everything"), None);
        assert_eq!(BuildStage::Rig.as_str(), "rig");
    }
}
