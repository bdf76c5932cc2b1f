//! Attribute names and reserved tags shared by all build phases
//!
//! These names are persisted on scene nodes; changing one breaks lookups in
//! scenes built by earlier versions.

// ============================================================================
// Proxy attributes
// ============================================================================

/// Proxy UUID stamped on every built proxy node
pub const PROXY_ATTR_UUID: &str = "proxyUUID";
/// Locator display scale
pub const PROXY_ATTR_SCALE: &str = "locatorScale";
/// Rotation order (0 = xyz .. 5 = zyx)
pub const PROXY_ATTR_ROT_ORDER: &str = "rotationOrder";
/// Curve shape name used to draw the proxy
pub const PROXY_ATTR_CURVE: &str = "proxyCurve";
/// Parent proxy UUID, informational
pub const PROXY_ATTR_PARENT: &str = "proxyParentUUID";
/// Source/target of a display line between two proxies
pub const LINE_ATTR_SOURCE: &str = "lineSourceUUID";
pub const LINE_ATTR_TARGET: &str = "lineTargetUUID";

pub const PROXY_DEFAULT_CURVE: &str = "_proxy_joint";
pub const PROXY_DEFAULT_SCALE: f64 = 1.0;

// ============================================================================
// Proxy metadata keys
// ============================================================================

pub const META_PURPOSE: &str = "purpose";
pub const META_LINE_PARENT: &str = "lineParent";
pub const META_DRIVERS: &str = "drivers";

// ============================================================================
// Joint attributes
// ============================================================================

/// UUID of the proxy a joint was created from
pub const JOINT_ATTR_UUID: &str = "jointUUID";
pub const JOINT_ATTR_MODULE_UUID: &str = "moduleUUID";
pub const JOINT_ATTR_BASE_NAME: &str = "baseName";
pub const JOINT_ATTR_PURPOSE: &str = "jointPurpose";
/// JSON-encoded list of driver types expected for the joint
pub const JOINT_ATTR_DRIVERS: &str = "jointDrivers";
/// Display radius copied from the proxy locator scale
pub const JOINT_ATTR_RADIUS: &str = "radius";

// ============================================================================
// Driver attributes
// ============================================================================

/// Composite key `<module_uuid>-<driver_type>-<purpose>`
pub const DRIVER_ATTR_UUID: &str = "driverUUID";
/// Message-style attribute listing supporting drivers on a parent driver
pub const DRIVER_ATTR_SUPPORTING: &str = "supportingDrivers";
/// Back-connection from a supporting driver to its parent driver
pub const DRIVER_ATTR_PARENT: &str = "parentDriver";

/// Value used for missing key segments
pub const UNKNOWN: &str = "unknown";

// ============================================================================
// Driver types
// ============================================================================

pub mod driver_types {
    pub const FK: &str = "fk";
    pub const IK: &str = "ik";
    pub const OFFSET: &str = "offset";
    pub const GENERIC: &str = "generic";
    pub const ROOT: &str = "root";
    pub const COG: &str = "cog";
    pub const POLE: &str = "pole";
    /// Reserved: suppresses lookups and generic fallbacks for a joint
    pub const BLOCK: &str = "block";
}

// ============================================================================
// Scene-level names
// ============================================================================

pub const PROXY_SUFFIX: &str = "proxy";
pub const OFFSET_SUFFIX: &str = "offset";
pub const JOINT_SUFFIX: &str = "jnt";
pub const CONTROL_SUFFIX: &str = "ctrl";
pub const CONTROL_GROUP_SUFFIX: &str = "ctrlGrp";
pub const DRIVER_SUFFIX: &str = "driver";
