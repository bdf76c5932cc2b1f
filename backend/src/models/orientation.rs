//! Joint orientation policy
//!
//! Each module picks one method, applied once while the skeleton hierarchy is
//! assembled:
//!
//! - **automatic**: aim each joint at its first child, using `aim_axis` /
//!   `up_axis` for the local frame and `up_dir` as the up hint. The hint is
//!   expressed in the parent joint's frame unless `world_aligned` is set.
//! - **inherit**: copy the proxy's rotation
//! - **world**: zero rotation (aligned with the world axes)

use super::fields::{get_bool, get_str, get_vector};
use crate::core::transform::{aim_rotation, Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMethod {
    #[default]
    Automatic,
    Inherit,
    World,
}

impl OrientationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrientationMethod::Automatic => "automatic",
            OrientationMethod::Inherit => "inherit",
            OrientationMethod::World => "world",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "automatic" => Some(OrientationMethod::Automatic),
            "inherit" => Some(OrientationMethod::Inherit),
            "world" => Some(OrientationMethod::World),
            _ => None,
        }
    }
}

/// Orientation settings of one module
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationData {
    pub method: OrientationMethod,
    pub aim_axis: Vector3,
    pub up_axis: Vector3,
    pub up_dir: Vector3,
    pub world_aligned: bool,
}

impl Default for OrientationData {
    fn default() -> Self {
        Self {
            method: OrientationMethod::Automatic,
            aim_axis: Vector3::X,
            up_axis: Vector3::Y,
            up_dir: Vector3::Y,
            world_aligned: false,
        }
    }
}

impl OrientationData {
    pub fn with_method(method: OrientationMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Up hint in world space, given the parent joint's world rotation
    pub fn resolve_up_dir(&self, parent_rotation: Option<Vector3>) -> Vector3 {
        match (self.world_aligned, parent_rotation) {
            (false, Some(rotation)) => Matrix3::from_euler_xyz(rotation).mul_vec(self.up_dir),
            _ => self.up_dir,
        }
    }

    /// World rotation aiming along `aim`; `None` for a degenerate aim vector
    pub fn aim(&self, aim: Vector3, parent_rotation: Option<Vector3>) -> Option<Vector3> {
        aim_rotation(aim, self.resolve_up_dir(parent_rotation), self.aim_axis, self.up_axis)
    }

    pub fn to_dict(&self) -> Value {
        let triple = |v: Vector3| json!([v.x, v.y, v.z]);
        json!({
            "method": self.method.as_str(),
            "aim_axis": triple(self.aim_axis),
            "up_axis": triple(self.up_axis),
            "up_dir": triple(self.up_dir),
            "world_aligned": self.world_aligned,
        })
    }

    /// Read an orientation dictionary; unknown methods keep the current one
    pub fn read_from_dict(&mut self, dict: &Map<String, Value>) {
        const OWNER: &str = "orientation";
        if let Some(method) = get_str(dict, "method", OWNER) {
            match OrientationMethod::parse(method) {
                Some(method) => self.method = method,
                None => warn!(method, "unknown orientation method ignored"),
            }
        }
        if let Some(axis) = get_vector(dict, "aim_axis", OWNER) {
            self.aim_axis = axis;
        }
        if let Some(axis) = get_vector(dict, "up_axis", OWNER) {
            self.up_axis = axis;
        }
        if let Some(dir) = get_vector(dict, "up_dir", OWNER) {
            self.up_dir = dir;
        }
        if let Some(world_aligned) = get_bool(dict, "world_aligned", OWNER) {
            self.world_aligned = world_aligned;
        }
    }
}
