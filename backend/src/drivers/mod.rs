//! Driver tagging and lookup
//!
//! A driver is any transform or control that carries a composite key in its
//! `driverUUID` attribute:
//!
//! ```text
//! <module_uuid>-<driver_type>-<purpose>
//! ```
//!
//! The key lets one module find another module's controls without holding a
//! reference to them. Module UUIDs never contain `-` and driver types are
//! sanitized, so a key always splits positionally into three parts. Missing
//! segments degrade to `unknown`.
//!
//! Joints advertise which driver types to expect through a JSON-encoded list
//! (`jointDrivers`), together with their module UUID and purpose. That is all
//! [`find_drivers_from_joint`] needs to rebuild and resolve the keys.
//!
//! # Reserved types
//!
//! - `block`: never resolved as a key. A joint tagged `block` exposes no
//!   generic fallback driver, and lookups that skip blocked joints return
//!   nothing for it.
//! - `generic`: the fallback follow-transform synthesized on demand

use crate::core::constants::{
    driver_types, DRIVER_ATTR_PARENT, DRIVER_ATTR_SUPPORTING, DRIVER_ATTR_UUID, DRIVER_SUFFIX,
    JOINT_ATTR_DRIVERS, JOINT_ATTR_MODULE_UUID, JOINT_ATTR_PURPOSE, UNKNOWN,
};
use crate::scene::{
    ensure_attr, get_objects_with_attr, AttrType, AttrValue, ConstraintKind, NodeHandle, NodeKind,
    SceneBackend, SceneError, Space,
};
use std::fmt;
use tracing::{debug, warn};

// ============================================================================
// Composite Keys
// ============================================================================

/// Parsed composite driver key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DriverKey {
    pub module_uuid: String,
    pub driver_type: String,
    pub purpose: String,
}

impl DriverKey {
    /// Build a key, degrading empty segments to `unknown`
    pub fn new(module_uuid: &str, driver_type: Option<&str>, purpose: Option<&str>) -> Self {
        let segment = |value: Option<&str>| match value {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => UNKNOWN.to_string(),
        };
        Self {
            module_uuid: segment(Some(module_uuid)).replace('-', "_"),
            driver_type: segment(driver_type).replace('-', "_"),
            purpose: segment(purpose),
        }
    }

    /// Split a key into its three segments
    ///
    /// The purpose segment may itself contain `-`.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, '-');
        let module_uuid = parts.next().filter(|s| !s.is_empty())?;
        let driver_type = parts.next().filter(|s| !s.is_empty())?;
        let purpose = parts.next().filter(|s| !s.is_empty())?;
        Some(Self {
            module_uuid: module_uuid.to_string(),
            driver_type: driver_type.to_string(),
            purpose: purpose.to_string(),
        })
    }
}

impl fmt::Display for DriverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.module_uuid, self.driver_type, self.purpose)
    }
}

/// Composite key string for a module's driver
///
/// # Example
/// ```
/// use rig_framework_core_rs::drivers::build_driver_key;
///
/// assert_eq!(build_driver_key("a1b2c3d4e5f6", Some("fk"), Some("hip")), "a1b2c3d4e5f6-fk-hip");
/// assert_eq!(build_driver_key("a1b2c3d4e5f6", None, None), "a1b2c3d4e5f6-unknown-unknown");
/// ```
pub fn build_driver_key(module_uuid: &str, driver_type: Option<&str>, purpose: Option<&str>) -> String {
    DriverKey::new(module_uuid, driver_type, purpose).to_string()
}

// ============================================================================
// Tagging
// ============================================================================

/// Stamp the composite key on `node` and return it
pub fn add_driver_uuid_attr(
    scene: &mut dyn SceneBackend,
    node: NodeHandle,
    module_uuid: &str,
    driver_type: Option<&str>,
    purpose: Option<&str>,
) -> Result<String, SceneError> {
    let key = build_driver_key(module_uuid, driver_type, purpose);
    if scene.has_attr(node, DRIVER_ATTR_UUID) {
        scene.lock_attr(node, DRIVER_ATTR_UUID, false)?;
    }
    ensure_attr(scene, node, DRIVER_ATTR_UUID, AttrValue::from(key.as_str()))?;
    scene.lock_attr(node, DRIVER_ATTR_UUID, true)?;
    scene.add_attr(node, DRIVER_ATTR_SUPPORTING, AttrType::Message)?;
    debug!(%node, key = %key, "driver tagged");
    Ok(key)
}

/// Driver types advertised by a joint
pub fn get_joint_driver_types(scene: &dyn SceneBackend, joint: NodeHandle) -> Vec<String> {
    let Some(raw) = scene.get_attr(joint, JOINT_ATTR_DRIVERS) else {
        return Vec::new();
    };
    match raw.as_str().map(|s| serde_json::from_str::<Vec<String>>(s)) {
        Some(Ok(types)) => types,
        _ => {
            warn!(%joint, "joint driver list is not a JSON string list");
            Vec::new()
        }
    }
}

// ============================================================================
// Lookup
// ============================================================================

pub fn find_driver_from_key(scene: &dyn SceneBackend, key: &str) -> Option<NodeHandle> {
    scene.find_by_attr(DRIVER_ATTR_UUID, key, None)
}

/// Resolve the drivers of a joint from its advertised driver types
///
/// # Arguments
/// * `joint` - Joint carrying module UUID, purpose and driver list attributes
/// * `skip_block_drivers` - Return nothing for joints tagged `block`
/// * `create_missing_generic` - If nothing resolves, synthesize a `generic`
///   follow-transform constrained to the joint (never for `block` joints)
///
/// # Returns
/// Resolved drivers in the joint's driver-list order
pub fn find_drivers_from_joint(
    scene: &mut dyn SceneBackend,
    joint: NodeHandle,
    skip_block_drivers: bool,
    create_missing_generic: bool,
) -> Result<Vec<NodeHandle>, SceneError> {
    let module_uuid = match scene.get_attr(joint, JOINT_ATTR_MODULE_UUID) {
        Some(AttrValue::Text(uuid)) => uuid,
        _ => {
            debug!(%joint, "joint has no module uuid, no drivers");
            return Ok(Vec::new());
        }
    };
    let purpose = scene
        .get_attr(joint, JOINT_ATTR_PURPOSE)
        .and_then(|v| v.as_str().map(str::to_string));
    let types = get_joint_driver_types(scene, joint);
    let blocked = types.iter().any(|t| t == driver_types::BLOCK);
    if blocked && skip_block_drivers {
        return Ok(Vec::new());
    }

    let mut drivers = Vec::new();
    for driver_type in types.iter().filter(|t| *t != driver_types::BLOCK) {
        let key = build_driver_key(&module_uuid, Some(driver_type.as_str()), purpose.as_deref());
        match find_driver_from_key(scene, &key) {
            Some(driver) if !drivers.contains(&driver) => drivers.push(driver),
            Some(_) => {}
            None => debug!(key = %key, "driver not found"),
        }
    }

    if drivers.is_empty() && create_missing_generic && !blocked {
        let key = build_driver_key(&module_uuid, Some(driver_types::GENERIC), purpose.as_deref());
        let generic = match find_driver_from_key(scene, &key) {
            Some(existing) => existing,
            None => create_generic_driver(scene, joint, &module_uuid, purpose.as_deref())?,
        };
        drivers.push(generic);
    }
    Ok(drivers)
}

fn create_generic_driver(
    scene: &mut dyn SceneBackend,
    joint: NodeHandle,
    module_uuid: &str,
    purpose: Option<&str>,
) -> Result<NodeHandle, SceneError> {
    let joint_name = scene.node_name(joint).unwrap_or_else(|| UNKNOWN.to_string());
    let driver = scene.create_node(
        NodeKind::Transform,
        &format!("{}_{}_{}", joint_name, driver_types::GENERIC, DRIVER_SUFFIX),
    )?;
    if let Some(pose) = scene.get_transform(joint, Space::World) {
        scene.set_transform(driver, &pose, Space::World)?;
    }
    scene.constrain(ConstraintKind::Parent, joint, driver, true)?;
    add_driver_uuid_attr(scene, driver, module_uuid, Some(driver_types::GENERIC), purpose)?;
    debug!(%joint, %driver, "generic driver created");
    Ok(driver)
}

/// Every driver created by `module_uuid`, in creation order
pub fn find_drivers_from_module(scene: &dyn SceneBackend, module_uuid: &str) -> Vec<NodeHandle> {
    get_objects_with_attr(scene, DRIVER_ATTR_UUID)
        .into_iter()
        .filter(|node| {
            scene
                .get_attr(*node, DRIVER_ATTR_UUID)
                .as_ref()
                .and_then(AttrValue::as_str)
                .and_then(DriverKey::parse)
                .is_some_and(|key| key.module_uuid == module_uuid)
        })
        .collect()
}

// ============================================================================
// Supporting Drivers
// ============================================================================

/// Register `child_driver` as a supporting driver of `parent_driver`
pub fn connect_supporting_driver(
    scene: &mut dyn SceneBackend,
    parent_driver: NodeHandle,
    child_driver: NodeHandle,
) -> Result<(), SceneError> {
    scene.add_attr(parent_driver, DRIVER_ATTR_SUPPORTING, AttrType::Message)?;
    scene.add_attr(child_driver, DRIVER_ATTR_PARENT, AttrType::Message)?;
    scene.connect_attr(parent_driver, DRIVER_ATTR_SUPPORTING, child_driver, DRIVER_ATTR_PARENT)
}

pub fn get_supporting_drivers(scene: &dyn SceneBackend, parent_driver: NodeHandle) -> Vec<NodeHandle> {
    scene
        .list_outgoing(parent_driver, DRIVER_ATTR_SUPPORTING)
        .into_iter()
        .filter(|(_, attr)| attr == DRIVER_ATTR_PARENT)
        .map(|(node, _)| node)
        .collect()
}
