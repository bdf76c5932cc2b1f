//! In-process scene backend
//!
//! `MemoryScene` is a complete [`SceneBackend`] that keeps the node graph in
//! memory. It backs the test suite, the CLI and the Python surface.
//!
//! # Behavior
//!
//! - Handles are assigned monotonically and never reused
//! - Names are kept unique by appending a counter (`arm`, `arm1`, `arm2`, ...)
//! - Transforms are stored local to the parent; world transforms are composed
//!   on demand. Re-parenting keeps the world transform.
//! - Parenting that would create a cycle is rejected
//! - Text attributes are indexed, so [`SceneBackend::find_by_attr`] does not
//!   scan the whole scene
//! - Constraints are evaluated once, when created
//!
//! # Example
//!
//! ```rust
//! use rig_framework_core_rs::scene::{MemoryScene, NodeKind, SceneBackend, Space};
//! use rig_framework_core_rs::core::transform::{Transform, Vector3};
//!
//! let mut scene = MemoryScene::new();
//! let parent = scene.create_node(NodeKind::Group, "grp").unwrap();
//! let child = scene.create_node(NodeKind::Locator, "loc").unwrap();
//!
//! scene.set_transform(parent, &Transform::from_position(Vector3::new(1.0, 0.0, 0.0)), Space::World).unwrap();
//! scene.parent(child, Some(parent)).unwrap();
//!
//! let local = scene.get_transform(child, Space::Local).unwrap();
//! assert_eq!(local.position, Vector3::new(-1.0, 0.0, 0.0));
//! ```

use super::{
    AttrInfo, AttrType, AttrValue, ConstraintKind, NodeHandle, NodeKind, SceneBackend, SceneError,
    Space,
};
use crate::core::transform::{Affine, Transform};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Attribute storage on one node
#[derive(Debug, Clone)]
struct AttrSlot {
    attr_type: AttrType,
    value: Option<AttrValue>,
    locked: bool,
}

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    kind: NodeKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    local: Transform,
    attrs: BTreeMap<String, AttrSlot>,
}

/// One attribute connection `source.source_attr -> target.target_attr`
#[derive(Debug, Clone, PartialEq)]
struct Connection {
    source: NodeHandle,
    source_attr: String,
    target: NodeHandle,
    target_attr: String,
}

/// In-memory scene graph
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: BTreeMap<NodeHandle, SceneNode>,
    next_handle: u64,
    names: BTreeSet<String>,
    /// (attribute, text value) -> nodes carrying it
    attr_index: BTreeMap<(String, String), BTreeSet<NodeHandle>>,
    connections: Vec<Connection>,
    scene_path: Option<PathBuf>,
    refresh_suspended: bool,
    /// Number of suspend calls observed (diagnostics)
    suspend_calls: usize,
    imported_files: Vec<PathBuf>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene that reports `path` as its current file
    pub fn with_scene_path(path: impl Into<PathBuf>) -> Self {
        Self {
            scene_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn set_scene_path(&mut self, path: Option<PathBuf>) {
        self.scene_path = path;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes whose (possibly decorated) name equals `name`
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(handle, _)| *handle)
    }

    /// Number of times refresh suspension was requested
    pub fn suspend_calls(&self) -> usize {
        self.suspend_calls
    }

    pub fn imported_files(&self) -> &[PathBuf] {
        &self.imported_files
    }

    fn node(&self, handle: NodeHandle) -> Result<&SceneNode, SceneError> {
        self.nodes.get(&handle).ok_or(SceneError::NodeNotFound(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut SceneNode, SceneError> {
        self.nodes
            .get_mut(&handle)
            .ok_or(SceneError::NodeNotFound(handle))
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.names.contains(name) {
            return name.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", name, i))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    fn world_affine(&self, handle: NodeHandle) -> Option<Affine> {
        let node = self.nodes.get(&handle)?;
        let local = node.local.to_affine();
        match node.parent {
            Some(parent) => Some(self.world_affine(parent)?.compose(&local)),
            None => Some(local),
        }
    }

    fn is_descendant(&self, candidate: NodeHandle, ancestor: NodeHandle) -> bool {
        let mut current = self.nodes.get(&candidate).and_then(|n| n.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(&handle).and_then(|n| n.parent);
        }
        false
    }

    fn index_remove(&mut self, handle: NodeHandle, attr: &str, value: Option<&AttrValue>) {
        if let Some(text) = value.and_then(AttrValue::as_str) {
            let key = (attr.to_string(), text.to_string());
            if let Some(set) = self.attr_index.get_mut(&key) {
                set.remove(&handle);
                if set.is_empty() {
                    self.attr_index.remove(&key);
                }
            }
        }
    }

    fn index_insert(&mut self, handle: NodeHandle, attr: &str, value: &AttrValue) {
        if let Some(text) = value.as_str() {
            self.attr_index
                .entry((attr.to_string(), text.to_string()))
                .or_default()
                .insert(handle);
        }
    }

    fn collect_subtree(&self, root: NodeHandle, out: &mut Vec<NodeHandle>) {
        out.push(root);
        if let Some(node) = self.nodes.get(&root) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
        }
    }

    /// Snapshot of the whole scene as JSON (world transforms, attributes, connections)
    pub fn to_json(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .map(|(handle, node)| {
                let world = self
                    .world_affine(*handle)
                    .map(|a| a.decompose())
                    .unwrap_or_default();
                let attributes: Map<String, Value> = node
                    .attrs
                    .iter()
                    .filter_map(|(name, slot)| {
                        slot.value.as_ref().map(|v| (name.clone(), v.to_json()))
                    })
                    .collect();
                json!({
                    "handle": handle.0,
                    "name": node.name,
                    "kind": node.kind,
                    "parent": node.parent.map(|p| p.0),
                    "world": world,
                    "attributes": attributes,
                })
            })
            .collect();
        let connections: Vec<Value> = self
            .connections
            .iter()
            .map(|c| {
                json!({
                    "source": c.source.0,
                    "source_attr": c.source_attr,
                    "target": c.target.0,
                    "target_attr": c.target_attr,
                })
            })
            .collect();
        json!({
            "scene_path": self.scene_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            "nodes": nodes,
            "connections": connections,
        })
    }
}

impl SceneBackend for MemoryScene {
    fn create_node(&mut self, kind: NodeKind, name: &str) -> Result<NodeHandle, SceneError> {
        let handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        let name = self.unique_name(name);
        self.names.insert(name.clone());
        self.nodes.insert(
            handle,
            SceneNode {
                name,
                kind,
                parent: None,
                children: Vec::new(),
                local: Transform::IDENTITY,
                attrs: BTreeMap::new(),
            },
        );
        Ok(handle)
    }

    fn delete_node(&mut self, node: NodeHandle) -> Result<(), SceneError> {
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
        }
        let mut doomed = Vec::new();
        self.collect_subtree(node, &mut doomed);
        for handle in &doomed {
            if let Some(removed) = self.nodes.remove(handle) {
                self.names.remove(&removed.name);
                for (attr, slot) in &removed.attrs {
                    self.index_remove(*handle, attr, slot.value.as_ref());
                }
            }
        }
        self.connections
            .retain(|c| !doomed.contains(&c.source) && !doomed.contains(&c.target));
        debug!(%node, removed = doomed.len(), "deleted node subtree");
        Ok(())
    }

    fn exists(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(&node)
    }

    fn node_name(&self, node: NodeHandle) -> Option<String> {
        self.nodes.get(&node).map(|n| n.name.clone())
    }

    fn node_kind(&self, node: NodeHandle) -> Option<NodeKind> {
        self.nodes.get(&node).map(|n| n.kind)
    }

    fn list_nodes(&self, kind: Option<NodeKind>) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .filter(|(_, n)| kind.map_or(true, |k| n.kind == k))
            .map(|(h, _)| *h)
            .collect()
    }

    fn add_attr(&mut self, node: NodeHandle, name: &str, attr_type: AttrType) -> Result<(), SceneError> {
        let n = self.node_mut(node)?;
        n.attrs.entry(name.to_string()).or_insert(AttrSlot {
            attr_type,
            value: None,
            locked: false,
        });
        Ok(())
    }

    fn has_attr(&self, node: NodeHandle, name: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.attrs.contains_key(name))
    }

    fn get_attr(&self, node: NodeHandle, name: &str) -> Option<AttrValue> {
        self.nodes.get(&node)?.attrs.get(name)?.value.clone()
    }

    fn set_attr(&mut self, node: NodeHandle, name: &str, value: AttrValue) -> Result<(), SceneError> {
        let n = self.node_mut(node)?;
        let slot = n
            .attrs
            .get_mut(name)
            .ok_or_else(|| SceneError::AttributeNotFound {
                node,
                attr: name.to_string(),
            })?;
        if slot.locked {
            return Err(SceneError::AttributeLocked {
                node,
                attr: name.to_string(),
            });
        }
        let value = match (slot.attr_type, value) {
            (AttrType::Float, AttrValue::Int(v)) => AttrValue::Float(v as f64),
            (AttrType::Int, AttrValue::Bool(v)) => AttrValue::Int(i64::from(v)),
            (expected, value) if expected == value.attr_type() => value,
            (expected, value) => {
                return Err(SceneError::AttributeTypeMismatch {
                    node,
                    attr: name.to_string(),
                    expected,
                    actual: value.attr_type(),
                })
            }
        };
        let previous = slot.value.replace(value.clone());
        self.index_remove(node, name, previous.as_ref());
        self.index_insert(node, name, &value);
        Ok(())
    }

    fn lock_attr(&mut self, node: NodeHandle, name: &str, locked: bool) -> Result<(), SceneError> {
        let n = self.node_mut(node)?;
        let slot = n
            .attrs
            .get_mut(name)
            .ok_or_else(|| SceneError::AttributeNotFound {
                node,
                attr: name.to_string(),
            })?;
        slot.locked = locked;
        Ok(())
    }

    fn list_user_attrs(&self, node: NodeHandle) -> Vec<AttrInfo> {
        self.nodes
            .get(&node)
            .map(|n| {
                n.attrs
                    .iter()
                    .map(|(name, slot)| AttrInfo {
                        name: name.clone(),
                        attr_type: slot.attr_type,
                        locked: slot.locked,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<(), SceneError> {
        let world = self
            .world_affine(child)
            .ok_or(SceneError::NodeNotFound(child))?;
        let new_local = match parent {
            Some(p) => {
                if p == child || self.is_descendant(p, child) {
                    return Err(SceneError::InvalidParent {
                        child,
                        parent: p,
                        reason: "would create a cycle".to_string(),
                    });
                }
                let parent_world = self.world_affine(p).ok_or(SceneError::NodeNotFound(p))?;
                parent_world
                    .inverse()
                    .ok_or(SceneError::SingularTransform(p))?
                    .compose(&world)
                    .decompose()
            }
            None => world.decompose(),
        };

        let old_parent = self.node(child)?.parent;
        if let Some(old) = old_parent {
            if let Some(o) = self.nodes.get_mut(&old) {
                o.children.retain(|c| *c != child);
            }
        }
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(child);
        }
        let node = self.node_mut(child)?;
        node.parent = parent;
        node.local = new_local;
        Ok(())
    }

    fn get_parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(&node)?.parent
    }

    fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn set_transform(&mut self, node: NodeHandle, transform: &Transform, space: Space) -> Result<(), SceneError> {
        let local = match space {
            Space::Local => *transform,
            Space::World => match self.node(node)?.parent {
                Some(parent) => {
                    let parent_world = self
                        .world_affine(parent)
                        .ok_or(SceneError::NodeNotFound(parent))?;
                    parent_world
                        .inverse()
                        .ok_or(SceneError::SingularTransform(parent))?
                        .compose(&transform.to_affine())
                        .decompose()
                }
                None => *transform,
            },
        };
        self.node_mut(node)?.local = local;
        Ok(())
    }

    fn get_transform(&self, node: NodeHandle, space: Space) -> Option<Transform> {
        match space {
            Space::Local => self.nodes.get(&node).map(|n| n.local),
            Space::World => self.world_affine(node).map(|a| a.decompose()),
        }
    }

    fn constrain(
        &mut self,
        kind: ConstraintKind,
        driver: NodeHandle,
        driven: NodeHandle,
        maintain_offset: bool,
    ) -> Result<NodeHandle, SceneError> {
        let driver_world = self
            .get_transform(driver, Space::World)
            .ok_or(SceneError::NodeNotFound(driver))?;
        let mut driven_world = self
            .get_transform(driven, Space::World)
            .ok_or(SceneError::NodeNotFound(driven))?;

        if !maintain_offset {
            match kind {
                ConstraintKind::Point => driven_world.position = driver_world.position,
                ConstraintKind::Orient => driven_world.rotation = driver_world.rotation,
                ConstraintKind::Parent => {
                    driven_world.position = driver_world.position;
                    driven_world.rotation = driver_world.rotation;
                }
            }
            self.set_transform(driven, &driven_world, Space::World)?;
        }

        let driven_name = self.node(driven)?.name.clone();
        let constraint = self.create_node(
            NodeKind::Constraint,
            &format!("{}_{}Constraint", driven_name, kind.as_str()),
        )?;
        self.parent(constraint, Some(driven))?;
        self.set_transform(constraint, &Transform::IDENTITY, Space::Local)?;
        self.add_attr(constraint, "target", AttrType::Message)?;
        self.connect_attr(driver, "worldMatrix", constraint, "target")?;
        Ok(constraint)
    }

    fn connect_attr(
        &mut self,
        source: NodeHandle,
        source_attr: &str,
        target: NodeHandle,
        target_attr: &str,
    ) -> Result<(), SceneError> {
        self.node(source)?;
        self.node(target)?;
        // A destination has a single source
        self.connections
            .retain(|c| !(c.target == target && c.target_attr == target_attr));
        self.connections.push(Connection {
            source,
            source_attr: source_attr.to_string(),
            target,
            target_attr: target_attr.to_string(),
        });
        Ok(())
    }

    fn list_outgoing(&self, node: NodeHandle, attr: &str) -> Vec<(NodeHandle, String)> {
        self.connections
            .iter()
            .filter(|c| c.source == node && c.source_attr == attr)
            .map(|c| (c.target, c.target_attr.clone()))
            .collect()
    }

    fn list_incoming(&self, node: NodeHandle, attr: &str) -> Option<(NodeHandle, String)> {
        self.connections
            .iter()
            .find(|c| c.target == node && c.target_attr == attr)
            .map(|c| (c.source, c.source_attr.clone()))
    }

    fn scene_path(&self) -> Option<PathBuf> {
        self.scene_path.clone()
    }

    fn suspend_refresh(&mut self, suspend: bool) {
        if suspend {
            self.suspend_calls += 1;
        }
        self.refresh_suspended = suspend;
    }

    fn is_refresh_suspended(&self) -> bool {
        self.refresh_suspended
    }

    fn import_file(&mut self, path: &Path) -> Result<Vec<NodeHandle>, SceneError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "import".to_string());
        let node = self.create_node(NodeKind::Reference, &format!("{}_RN", stem))?;
        self.add_attr(node, "filePath", AttrType::Text)?;
        self.set_attr(node, "filePath", AttrValue::Text(path.to_string_lossy().to_string()))?;
        self.imported_files.push(path.to_path_buf());
        Ok(vec![node])
    }

    fn find_by_attr(&self, attr: &str, value: &str, kind: Option<NodeKind>) -> Option<NodeHandle> {
        self.attr_index
            .get(&(attr.to_string(), value.to_string()))?
            .iter()
            .copied()
            .find(|handle| kind.map_or(true, |k| self.node_kind(*handle) == Some(k)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::Vector3;

    const TOL: f64 = 1e-6;

    #[test]
    fn test_names_are_made_unique() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node(NodeKind::Joint, "arm").unwrap();
        let b = scene.create_node(NodeKind::Joint, "arm").unwrap();
        assert_eq!(scene.node_name(a).unwrap(), "arm");
        assert_eq!(scene.node_name(b).unwrap(), "arm1");
    }

    #[test]
    fn test_parent_keeps_world_transform() {
        let mut scene = MemoryScene::new();
        let parent = scene.create_node(NodeKind::Group, "p").unwrap();
        let child = scene.create_node(NodeKind::Joint, "c").unwrap();
        let rotated = Transform::new(Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 0.0, 90.0), Vector3::ONE);
        scene.set_transform(parent, &rotated, Space::World).unwrap();
        scene
            .set_transform(child, &Transform::from_position(Vector3::new(3.0, 2.0, 0.0)), Space::World)
            .unwrap();

        scene.parent(child, Some(parent)).unwrap();
        let world = scene.get_transform(child, Space::World).unwrap();
        assert!(world.position.approx_eq(Vector3::new(3.0, 2.0, 0.0), TOL));
        assert!(world.rotation.approx_eq(Vector3::ZERO, TOL));
        assert_eq!(scene.children(parent), vec![child]);
    }

    #[test]
    fn test_parent_rejects_cycles() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node(NodeKind::Joint, "a").unwrap();
        let b = scene.create_node(NodeKind::Joint, "b").unwrap();
        scene.parent(b, Some(a)).unwrap();
        let err = scene.parent(a, Some(b)).unwrap_err();
        assert!(matches!(err, SceneError::InvalidParent { .. }));
        assert!(matches!(scene.parent(a, Some(a)), Err(SceneError::InvalidParent { .. })));
    }

    #[test]
    fn test_attribute_index_tracks_updates() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(NodeKind::Transform, "t").unwrap();
        scene.add_attr(node, "tag", AttrType::Text).unwrap();
        scene.set_attr(node, "tag", "first".into()).unwrap();
        assert_eq!(scene.find_by_attr("tag", "first", None), Some(node));

        scene.set_attr(node, "tag", "second".into()).unwrap();
        assert_eq!(scene.find_by_attr("tag", "first", None), None);
        assert_eq!(scene.find_by_attr("tag", "second", Some(NodeKind::Transform)), Some(node));
        assert_eq!(scene.find_by_attr("tag", "second", Some(NodeKind::Joint)), None);
    }

    #[test]
    fn test_set_attr_type_checks() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(NodeKind::Transform, "t").unwrap();
        scene.add_attr(node, "weight", AttrType::Float).unwrap();
        scene.set_attr(node, "weight", AttrValue::Int(2)).unwrap();
        assert_eq!(scene.get_attr(node, "weight"), Some(AttrValue::Float(2.0)));
        assert!(matches!(
            scene.set_attr(node, "weight", "x".into()),
            Err(SceneError::AttributeTypeMismatch { .. })
        ));
        assert!(matches!(
            scene.set_attr(node, "missing", AttrValue::Int(1)),
            Err(SceneError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_locked_attr_rejects_writes() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(NodeKind::Transform, "t").unwrap();
        scene.add_attr(node, "id", AttrType::Text).unwrap();
        scene.set_attr(node, "id", "x".into()).unwrap();
        scene.lock_attr(node, "id", true).unwrap();
        assert!(matches!(
            scene.set_attr(node, "id", "y".into()),
            Err(SceneError::AttributeLocked { .. })
        ));
        assert!(scene.list_user_attrs(node)[0].locked);
    }

    #[test]
    fn test_delete_removes_subtree_and_index() {
        let mut scene = MemoryScene::new();
        let root = scene.create_node(NodeKind::Group, "root").unwrap();
        let leaf = scene.create_node(NodeKind::Locator, "leaf").unwrap();
        scene.parent(leaf, Some(root)).unwrap();
        scene.add_attr(leaf, "tag", AttrType::Text).unwrap();
        scene.set_attr(leaf, "tag", "x".into()).unwrap();

        scene.delete_node(root).unwrap();
        assert!(!scene.exists(leaf));
        assert_eq!(scene.find_by_attr("tag", "x", None), None);
        // Names become available again
        let again = scene.create_node(NodeKind::Group, "root").unwrap();
        assert_eq!(scene.node_name(again).unwrap(), "root");
    }

    #[test]
    fn test_parent_constraint_snaps_driven() {
        let mut scene = MemoryScene::new();
        let driver = scene.create_node(NodeKind::Control, "ctrl").unwrap();
        let driven = scene.create_node(NodeKind::Joint, "jnt").unwrap();
        scene
            .set_transform(driver, &Transform::from_position(Vector3::new(0.0, 4.0, 0.0)), Space::World)
            .unwrap();
        let constraint = scene
            .constrain(ConstraintKind::Parent, driver, driven, false)
            .unwrap();

        let pos = scene.get_transform(driven, Space::World).unwrap().position;
        assert!(pos.approx_eq(Vector3::new(0.0, 4.0, 0.0), TOL));
        assert_eq!(scene.get_parent(constraint), Some(driven));
        assert_eq!(scene.list_incoming(constraint, "target").map(|c| c.0), Some(driver));
    }

    #[test]
    fn test_connections_single_source_per_destination() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node(NodeKind::Transform, "a").unwrap();
        let b = scene.create_node(NodeKind::Transform, "b").unwrap();
        let c = scene.create_node(NodeKind::Transform, "c").unwrap();
        scene.connect_attr(a, "out", c, "in").unwrap();
        scene.connect_attr(b, "out", c, "in").unwrap();
        assert!(scene.list_outgoing(a, "out").is_empty());
        assert_eq!(scene.list_incoming(c, "in"), Some((b, "out".to_string())));
    }

    #[test]
    fn test_import_file_records_reference() {
        let mut scene = MemoryScene::new();
        let nodes = scene.import_file(Path::new("/assets/body.ma")).unwrap();
        assert_eq!(scene.node_name(nodes[0]).unwrap(), "body_RN");
        assert_eq!(scene.imported_files(), &[PathBuf::from("/assets/body.ma")]);
    }

    #[test]
    fn test_snapshot_lists_nodes() {
        let mut scene = MemoryScene::with_scene_path("/shots/a.ma");
        scene.create_node(NodeKind::Joint, "j").unwrap();
        let snapshot = scene.to_json();
        assert_eq!(snapshot["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(snapshot["nodes"][0]["kind"], "joint");
        assert_eq!(snapshot["scene_path"], "/shots/a.ma");
    }
}
