//! Proxy model
//!
//! A proxy is the in-memory placeholder for one future joint. It records the
//! pose the operator gave the placeholder, the visual attributes replayed onto
//! the placeholder object, and module-local metadata.
//!
//! # Critical Invariants
//!
//! 1. `uuid` never changes after creation except through [`Proxy::set_uuid`]
//! 2. `parent_uuid` is a weak reference: a value plus a lookup, never ownership
//! 3. Setters validate and silently keep the previous value on bad input
//! 4. `transform` and `offset_transform` are world-space poses
//!
//! # Example
//! ```rust
//! use rig_framework_core_rs::models::Proxy;
//!
//! let mut proxy = Proxy::new("hip");
//! proxy.set_initial_position(Some(5.0), None, None);
//! proxy.set_position(Some(10.0), None, None);
//!
//! assert_eq!(proxy.transform().position.x, 10.0);
//! assert_eq!(proxy.offset_transform().position.x, 5.0);
//! ```

use super::fields::{get_object, get_str, get_transform};
use crate::core::constants::{
    LINE_ATTR_SOURCE, LINE_ATTR_TARGET, META_DRIVERS, META_LINE_PARENT, META_PURPOSE,
    OFFSET_SUFFIX, PROXY_ATTR_CURVE, PROXY_ATTR_PARENT, PROXY_ATTR_ROT_ORDER, PROXY_ATTR_SCALE,
    PROXY_ATTR_UUID, PROXY_DEFAULT_CURVE, PROXY_DEFAULT_SCALE, PROXY_SUFFIX,
};
use crate::core::ids::{generate_uuid, is_uuid_valid};
use crate::core::naming::compose_name;
use crate::core::transform::{Transform, Vector3};
use crate::scene::{
    ensure_attr, get_object_from_uuid_attr, AttrValue, NodeHandle, NodeKind,
    SceneBackend, SceneError, Space,
};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Attributes stamped by the framework that are not user data
const RESERVED_ATTRS: &[&str] = &[PROXY_ATTR_UUID, PROXY_ATTR_PARENT];

/// Rotation orders xyz, yzx, zxy, xzy, yxz, zyx
const ROTATION_ORDER_COUNT: i64 = 6;

/// Descriptor returned by [`Proxy::build`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyData {
    /// Scene name of the proxy object (may be decorated by the backend)
    pub name: String,
    /// The proxy object itself
    pub node: NodeHandle,
    /// Pivot group containing the proxy
    pub offset: NodeHandle,
    /// Helper objects created alongside (display lines)
    pub setup_refs: Vec<NodeHandle>,
    pub uuid: String,
}

/// Placeholder for one future joint
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    name: String,
    uuid: String,
    parent_uuid: Option<String>,
    transform: Option<Transform>,
    offset_transform: Option<Transform>,
    /// Replayed verbatim onto the built object
    attr_dict: BTreeMap<String, AttrValue>,
    metadata: Map<String, Value>,
}

impl Proxy {
    /// Create a proxy with a fresh identifier and default visual attributes
    pub fn new(name: impl Into<String>) -> Self {
        let mut attr_dict = BTreeMap::new();
        attr_dict.insert(PROXY_ATTR_CURVE.to_string(), AttrValue::from(PROXY_DEFAULT_CURVE));
        attr_dict.insert(PROXY_ATTR_SCALE.to_string(), AttrValue::Float(PROXY_DEFAULT_SCALE));
        attr_dict.insert(PROXY_ATTR_ROT_ORDER.to_string(), AttrValue::Int(0));
        Self {
            name: name.into(),
            uuid: generate_uuid(false),
            parent_uuid: None,
            transform: None,
            offset_transform: None,
            attr_dict,
            metadata: Map::new(),
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

    pub fn parent_uuid(&self) -> Option<&str> {
        self.parent_uuid.as_deref()
    }

    /// Current pose; identity until first set
    pub fn transform(&self) -> Transform {
        self.transform.unwrap_or_default()
    }

    /// Pose of the pivot group; identity until first set
    pub fn offset_transform(&self) -> Transform {
        self.offset_transform.unwrap_or_default()
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn attr_dict(&self) -> &BTreeMap<String, AttrValue> {
        &self.attr_dict
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn get_meta_purpose(&self) -> Option<&str> {
        self.metadata.get(META_PURPOSE).and_then(Value::as_str)
    }

    pub fn get_meta_line_parent(&self) -> Option<&str> {
        self.metadata.get(META_LINE_PARENT).and_then(Value::as_str)
    }

    /// Ordered driver-type tags from `metadata.drivers`
    pub fn get_driver_types(&self) -> Vec<String> {
        self.metadata
            .get(META_DRIVERS)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn locator_scale(&self) -> f64 {
        self.attr_dict
            .get(PROXY_ATTR_SCALE)
            .and_then(AttrValue::as_f64)
            .unwrap_or(PROXY_DEFAULT_SCALE)
    }

    pub fn rotation_order(&self) -> i64 {
        self.attr_dict
            .get(PROXY_ATTR_ROT_ORDER)
            .and_then(AttrValue::as_i64)
            .unwrap_or(0)
    }

    pub fn curve(&self) -> Option<&str> {
        self.attr_dict.get(PROXY_ATTR_CURVE).and_then(AttrValue::as_str)
    }

    /// Valid iff it has a non-empty name and a non-empty shape descriptor
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.curve().is_some_and(|c| !c.is_empty())
    }

    // ========================================================================
    // Setters
    // ========================================================================

    pub fn set_name(&mut self, name: &str) {
        if name.is_empty() {
            warn!(uuid = %self.uuid, "empty proxy name rejected");
            return;
        }
        self.name = name.to_string();
    }

    /// Re-bind identity; only used when reading serialized data
    pub fn set_uuid(&mut self, uuid: &str) {
        if !is_uuid_valid(uuid) {
            warn!(proxy = %self.name, uuid, "invalid proxy uuid rejected");
            return;
        }
        self.uuid = uuid.to_string();
    }

    pub fn set_parent_uuid(&mut self, uuid: &str) {
        if !is_uuid_valid(uuid) {
            warn!(proxy = %self.name, uuid, "invalid parent uuid rejected");
            return;
        }
        self.parent_uuid = Some(uuid.to_string());
    }

    pub fn set_parent_uuid_from_proxy(&mut self, parent: &Proxy) {
        self.set_parent_uuid(&parent.uuid);
    }

    pub fn clear_parent_uuid(&mut self) {
        self.parent_uuid = None;
    }

    /// Set position of both the proxy and its pivot
    pub fn set_initial_position(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.set_position(x, y, z);
        self.set_offset_position(x, y, z);
    }

    pub fn set_initial_rotation(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.set_rotation(x, y, z);
        self.set_offset_rotation(x, y, z);
    }

    pub fn set_initial_scale(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.set_scale(x, y, z);
        self.set_offset_scale(x, y, z);
    }

    pub fn set_position(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let t = self.transform.get_or_insert(Transform::IDENTITY);
        t.position = t.position.with(x, y, z);
    }

    pub fn set_rotation(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let t = self.transform.get_or_insert(Transform::IDENTITY);
        t.rotation = t.rotation.with(x, y, z);
    }

    pub fn set_scale(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let t = self.transform.get_or_insert(Transform::IDENTITY);
        t.scale = t.scale.with(x, y, z);
    }

    pub fn set_offset_position(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let t = self.offset_transform.get_or_insert(Transform::IDENTITY);
        t.position = t.position.with(x, y, z);
    }

    pub fn set_offset_rotation(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let t = self.offset_transform.get_or_insert(Transform::IDENTITY);
        t.rotation = t.rotation.with(x, y, z);
    }

    pub fn set_offset_scale(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let t = self.offset_transform.get_or_insert(Transform::IDENTITY);
        t.scale = t.scale.with(x, y, z);
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = Some(transform);
    }

    pub fn set_offset_transform(&mut self, transform: Transform) {
        self.offset_transform = Some(transform);
    }

    pub fn set_attr(&mut self, key: &str, value: AttrValue) {
        if key.is_empty() || RESERVED_ATTRS.contains(&key) {
            warn!(proxy = %self.name, key, "attribute name rejected");
            return;
        }
        self.attr_dict.insert(key.to_string(), value);
    }

    pub fn set_locator_scale(&mut self, scale: f64) {
        if !scale.is_finite() || scale <= 0.0 {
            warn!(proxy = %self.name, scale, "locator scale must be positive");
            return;
        }
        self.attr_dict
            .insert(PROXY_ATTR_SCALE.to_string(), AttrValue::Float(scale));
    }

    pub fn set_rotation_order(&mut self, order: i64) {
        if !(0..ROTATION_ORDER_COUNT).contains(&order) {
            warn!(proxy = %self.name, order, "rotation order out of range");
            return;
        }
        self.attr_dict
            .insert(PROXY_ATTR_ROT_ORDER.to_string(), AttrValue::Int(order));
    }

    pub fn set_curve(&mut self, curve: &str) {
        if curve.is_empty() {
            warn!(proxy = %self.name, "empty curve descriptor rejected");
            return;
        }
        self.attr_dict
            .insert(PROXY_ATTR_CURVE.to_string(), AttrValue::from(curve));
    }

    pub fn set_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn set_meta_purpose(&mut self, purpose: &str) {
        if purpose.is_empty() {
            warn!(proxy = %self.name, "empty purpose rejected");
            return;
        }
        self.metadata
            .insert(META_PURPOSE.to_string(), Value::from(purpose));
    }

    /// Display-only parent for the proxy line; does not affect hierarchy
    pub fn set_meta_line_parent(&mut self, uuid: &str) {
        if !is_uuid_valid(uuid) {
            warn!(proxy = %self.name, uuid, "invalid line parent rejected");
            return;
        }
        self.metadata
            .insert(META_LINE_PARENT.to_string(), Value::from(uuid));
    }

    /// Append driver-type tags not already present, preserving order
    pub fn add_driver_type<S: AsRef<str>>(&mut self, types: &[S]) {
        let mut drivers = self.get_driver_types();
        for driver_type in types {
            let driver_type = driver_type.as_ref();
            if driver_type.is_empty() {
                warn!(proxy = %self.name, "empty driver type ignored");
                continue;
            }
            if !drivers.iter().any(|d| d == driver_type) {
                drivers.push(driver_type.to_string());
            }
        }
        self.metadata
            .insert(META_DRIVERS.to_string(), json!(drivers));
    }

    // ========================================================================
    // Scene Operations
    // ========================================================================

    /// Live proxy object, if built
    pub fn find_in_scene(&self, scene: &dyn SceneBackend) -> Option<NodeHandle> {
        get_object_from_uuid_attr(scene, &self.uuid, PROXY_ATTR_UUID, Some(NodeKind::Locator))
    }

    /// Realize the proxy as a scene object inside a pivot group
    ///
    /// # Arguments
    /// * `scene` - Target scene
    /// * `prefix` / `suffix` - Naming decorations
    /// * `apply_transforms` - Push the in-memory poses immediately
    /// * `optimized` - Skip display helpers (lines to the parent)
    ///
    /// # Returns
    /// `Ok(None)` when the proxy is invalid (logged), the descriptor otherwise
    pub fn build(
        &self,
        scene: &mut dyn SceneBackend,
        prefix: Option<&str>,
        suffix: Option<&str>,
        apply_transforms: bool,
        optimized: bool,
    ) -> Result<Option<ProxyData>, SceneError> {
        if !self.is_valid() {
            warn!(proxy = %self.name, uuid = %self.uuid, "invalid proxy, not built");
            return Ok(None);
        }

        let base = compose_name(prefix, &self.name, suffix);
        let offset = scene.create_node(NodeKind::Group, &compose_name(None, &base, Some(OFFSET_SUFFIX)))?;
        let node = scene.create_node(NodeKind::Locator, &compose_name(None, &base, Some(PROXY_SUFFIX)))?;
        scene.parent(node, Some(offset))?;

        ensure_attr(scene, node, PROXY_ATTR_UUID, AttrValue::from(self.uuid.as_str()))?;
        scene.lock_attr(node, PROXY_ATTR_UUID, true)?;
        for (key, value) in &self.attr_dict {
            ensure_attr(scene, node, key, value.clone())?;
        }
        if let Some(parent) = &self.parent_uuid {
            ensure_attr(scene, node, PROXY_ATTR_PARENT, AttrValue::from(parent.as_str()))?;
        }

        let mut setup_refs = Vec::new();
        let line_target = self.get_meta_line_parent().or(self.parent_uuid.as_deref());
        if let (false, Some(target)) = (optimized, line_target) {
            let line = scene.create_node(NodeKind::Line, &compose_name(None, &base, Some("line")))?;
            scene.parent(line, Some(offset))?;
            ensure_attr(scene, line, LINE_ATTR_SOURCE, AttrValue::from(self.uuid.as_str()))?;
            ensure_attr(scene, line, LINE_ATTR_TARGET, AttrValue::from(target))?;
            setup_refs.push(line);
        }

        if apply_transforms {
            self.apply_transforms(scene, true)?;
        }

        let name = scene.node_name(node).unwrap_or(base);
        debug!(proxy = %name, uuid = %self.uuid, "proxy built");
        Ok(Some(ProxyData {
            name,
            node,
            offset,
            setup_refs,
            uuid: self.uuid.clone(),
        }))
    }

    /// Push `offset_transform` onto the live pivot group
    pub fn apply_offset_transform(&self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        let Some(node) = self.find_in_scene(scene) else {
            debug!(proxy = %self.name, "proxy not in scene, offset not applied");
            return Ok(());
        };
        if let (Some(offset), Some(transform)) = (scene.get_parent(node), self.offset_transform) {
            scene.set_transform(offset, &transform, Space::World)?;
        }
        Ok(())
    }

    /// Push the in-memory pose (and optionally the pivot pose) onto the live object
    pub fn apply_transforms(&self, scene: &mut dyn SceneBackend, apply_offset: bool) -> Result<(), SceneError> {
        if apply_offset {
            self.apply_offset_transform(scene)?;
        }
        let Some(node) = self.find_in_scene(scene) else {
            debug!(proxy = %self.name, "proxy not in scene, transform not applied");
            return Ok(());
        };
        if let Some(transform) = self.transform {
            scene.set_transform(node, &transform, Space::World)?;
        }
        Ok(())
    }

    /// Capture live edits: world pose, pivot pose and unlocked user attributes
    pub fn read_data_from_scene(&mut self, scene: &dyn SceneBackend) {
        let Some(node) = self.find_in_scene(scene) else {
            debug!(proxy = %self.name, "proxy not in scene, nothing to read");
            return;
        };
        self.transform = scene.get_transform(node, Space::World);
        if let Some(offset) = scene.get_parent(node) {
            self.offset_transform = scene.get_transform(offset, Space::World);
        }
        for info in scene.list_user_attrs(node) {
            if info.locked || RESERVED_ATTRS.contains(&info.name.as_str()) {
                continue;
            }
            if let Some(value) = scene.get_attr(node, &info.name) {
                self.attr_dict.insert(info.name, value);
            }
        }
    }

    /// Delete the live proxy together with its pivot group and helpers
    pub fn delete_from_scene(&self, scene: &mut dyn SceneBackend) -> Result<(), SceneError> {
        let Some(node) = self.find_in_scene(scene) else {
            return Ok(());
        };
        let target = scene.get_parent(node).unwrap_or(node);
        scene.delete_node(target)
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize to the persisted proxy dictionary
    pub fn get_proxy_as_dict(
        &self,
        include_uuid: bool,
        include_transform_data: bool,
        include_offset_data: bool,
    ) -> Value {
        let mut dict = Map::new();
        dict.insert("name".to_string(), Value::from(self.name.as_str()));
        if include_uuid {
            dict.insert("uuid".to_string(), Value::from(self.uuid.as_str()));
        }
        dict.insert(
            "parent".to_string(),
            self.parent_uuid.as_deref().map_or(Value::Null, Value::from),
        );
        if include_transform_data {
            if let Some(transform) = &self.transform {
                dict.insert("transform".to_string(), transform_to_json(transform));
            }
        }
        if include_offset_data {
            if let Some(offset) = &self.offset_transform {
                dict.insert("offsetTransform".to_string(), transform_to_json(offset));
            }
        }
        let attributes: Map<String, Value> = self
            .attr_dict
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        dict.insert("attributes".to_string(), Value::Object(attributes));
        dict.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        Value::Object(dict)
    }

    /// Read a persisted proxy dictionary; malformed fields keep their value
    pub fn read_data_from_dict(&mut self, dict: &Value) -> &mut Self {
        let Some(dict) = dict.as_object() else {
            warn!(proxy = %self.name, "proxy data is not an object, ignored");
            return self;
        };
        let owner = self.name.clone();
        if let Some(name) = get_str(dict, "name", &owner) {
            self.set_name(name);
        }
        if let Some(uuid) = get_str(dict, "uuid", &owner) {
            self.set_uuid(uuid);
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
        if let Some(transform) = get_transform(dict, "transform", &owner) {
            self.transform = Some(transform);
        }
        if let Some(offset) = get_transform(dict, "offsetTransform", &owner) {
            self.offset_transform = Some(offset);
        }
        if let Some(attributes) = get_object(dict, "attributes", &owner) {
            for (key, value) in attributes {
                match AttrValue::from_json(value) {
                    Some(value) => self.set_attr(key, value),
                    None => warn!(proxy = %owner, key = %key, "unsupported attribute value ignored"),
                }
            }
        }
        if let Some(metadata) = get_object(dict, "metadata", &owner) {
            for (key, value) in metadata {
                self.metadata.insert(key.clone(), value.clone());
            }
        }
        self
    }
}

fn transform_to_json(transform: &Transform) -> Value {
    let triple = |v: Vector3| json!([v.x, v.y, v.z]);
    json!({
        "position": triple(transform.position),
        "rotation": triple(transform.rotation),
        "scale": triple(transform.scale),
    })
}
