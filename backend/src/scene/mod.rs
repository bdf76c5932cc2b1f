//! Scene backend contract
//!
//! The framework never talks to a 3D application directly. Everything it needs
//! from the scene goes through [`SceneBackend`]: node creation, attributes,
//! parenting, transforms, constraints, attribute connections, and a handful of
//! scene-level queries.
//!
//! # Handles
//!
//! [`NodeHandle`] values are only meaningful for the lifetime of one backend
//! instance and are never persisted. Build phases do not keep handles across
//! phase boundaries; they re-resolve objects by UUID attribute through
//! [`lookup`].
//!
//! # Implementations
//!
//! - [`memory::MemoryScene`]: complete in-process backend used by tests, the
//!   CLI and the Python surface

pub mod lookup;
pub mod memory;
pub mod refresh;

use crate::core::transform::Transform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use lookup::{get_object_from_uuid_attr, get_objects_with_attr};
pub use memory::MemoryScene;
pub use refresh::RefreshGuard;

// ============================================================================
// Core Types
// ============================================================================

/// Opaque reference to a live scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain transform (drivers, helpers)
    Transform,
    /// Empty grouping transform (offset/pivot containers)
    Group,
    /// Locator-style placeholder (proxies, pole vectors)
    Locator,
    /// Skeleton joint
    Joint,
    /// Animator-facing control curve
    Control,
    /// Display line between two nodes
    Line,
    /// Constraint node
    Constraint,
    /// Node created by importing an external file
    Reference,
}

/// Coordinate space for transform queries and edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    World,
    Local,
}

/// Constraint flavours supported by the backend contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Point,
    Orient,
    Parent,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Point => "point",
            ConstraintKind::Orient => "orient",
            ConstraintKind::Parent => "parent",
        }
    }
}

/// Declared type of a user attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    Bool,
    Int,
    Float,
    Text,
    List,
    /// Connection-only attribute without a value
    Message,
}

/// Attribute value
///
/// Serialized untagged so persisted attribute dictionaries read as plain JSON
/// scalars and arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Text(_) => AttrType::Text,
            AttrValue::List(_) => AttrType::List,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            AttrValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Convert from a JSON value; objects and nulls have no attribute form
    pub fn from_json(value: &serde_json::Value) -> Option<AttrValue> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Bool(v) => serde_json::Value::Bool(*v),
            AttrValue::Int(v) => serde_json::Value::from(*v),
            AttrValue::Float(v) => serde_json::Value::from(*v),
            AttrValue::Text(v) => serde_json::Value::String(v.clone()),
            AttrValue::List(items) => {
                serde_json::Value::Array(items.iter().map(AttrValue::to_json).collect())
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Description of one user attribute on a node
#[derive(Debug, Clone, PartialEq)]
pub struct AttrInfo {
    pub name: String,
    pub attr_type: AttrType,
    pub locked: bool,
}

/// Errors raised by a scene backend
///
/// These are the only errors that propagate out of build phases; everything
/// else (missing objects, bad input) is logged and skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeHandle),

    #[error("Attribute '{attr}' not found on {node}")]
    AttributeNotFound { node: NodeHandle, attr: String },

    #[error("Attribute '{attr}' on {node} expects {expected:?}, got {actual:?}")]
    AttributeTypeMismatch {
        node: NodeHandle,
        attr: String,
        expected: AttrType,
        actual: AttrType,
    },

    #[error("Attribute '{attr}' on {node} is locked")]
    AttributeLocked { node: NodeHandle, attr: String },

    #[error("Cannot parent {child} under {parent}: {reason}")]
    InvalidParent {
        child: NodeHandle,
        parent: NodeHandle,
        reason: String,
    },

    #[error("Transform on {0} cannot be solved (singular parent matrix)")]
    SingularTransform(NodeHandle),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(String),
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Operations the framework requires from a 3D scene
///
/// Implementors need no knowledge of proxies, modules or drivers; those are
/// layered on top through attributes.
pub trait SceneBackend {
    /// Create a node; the backend may decorate `name` to keep it unique
    fn create_node(&mut self, kind: NodeKind, name: &str) -> Result<NodeHandle, SceneError>;

    /// Delete a node and its whole subtree
    fn delete_node(&mut self, node: NodeHandle) -> Result<(), SceneError>;

    fn exists(&self, node: NodeHandle) -> bool;

    fn node_name(&self, node: NodeHandle) -> Option<String>;

    fn node_kind(&self, node: NodeHandle) -> Option<NodeKind>;

    /// All live nodes (optionally of one kind) in creation order
    fn list_nodes(&self, kind: Option<NodeKind>) -> Vec<NodeHandle>;

    /// Declare a user attribute; declaring an existing attribute is a no-op
    fn add_attr(&mut self, node: NodeHandle, name: &str, attr_type: AttrType) -> Result<(), SceneError>;

    fn has_attr(&self, node: NodeHandle, name: &str) -> bool;

    fn get_attr(&self, node: NodeHandle, name: &str) -> Option<AttrValue>;

    fn set_attr(&mut self, node: NodeHandle, name: &str, value: AttrValue) -> Result<(), SceneError>;

    fn lock_attr(&mut self, node: NodeHandle, name: &str, locked: bool) -> Result<(), SceneError>;

    fn list_user_attrs(&self, node: NodeHandle) -> Vec<AttrInfo>;

    /// Re-parent keeping the world transform; `None` parents to the world
    fn parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<(), SceneError>;

    fn get_parent(&self, node: NodeHandle) -> Option<NodeHandle>;

    fn children(&self, node: NodeHandle) -> Vec<NodeHandle>;

    fn set_transform(&mut self, node: NodeHandle, transform: &Transform, space: Space) -> Result<(), SceneError>;

    fn get_transform(&self, node: NodeHandle, space: Space) -> Option<Transform>;

    /// Constrain `driven` to follow `driver`; returns the constraint node
    fn constrain(
        &mut self,
        kind: ConstraintKind,
        driver: NodeHandle,
        driven: NodeHandle,
        maintain_offset: bool,
    ) -> Result<NodeHandle, SceneError>;

    fn connect_attr(
        &mut self,
        source: NodeHandle,
        source_attr: &str,
        target: NodeHandle,
        target_attr: &str,
    ) -> Result<(), SceneError>;

    /// Destinations fed by `node.attr`
    fn list_outgoing(&self, node: NodeHandle, attr: &str) -> Vec<(NodeHandle, String)>;

    /// Source feeding `node.attr`, if connected
    fn list_incoming(&self, node: NodeHandle, attr: &str) -> Option<(NodeHandle, String)>;

    /// Path of the currently open scene file
    fn scene_path(&self) -> Option<PathBuf>;

    /// Suspend or resume viewport refresh
    fn suspend_refresh(&mut self, suspend: bool);

    fn is_refresh_suspended(&self) -> bool;

    /// Bring an external file into the scene
    fn import_file(&mut self, path: &Path) -> Result<Vec<NodeHandle>, SceneError> {
        Err(SceneError::Unsupported(format!(
            "import_file({})",
            path.display()
        )))
    }

    /// First node (creation order) whose text attribute `attr` equals `value`
    ///
    /// Default implementation scans every node; backends with an attribute
    /// index should override it.
    fn find_by_attr(&self, attr: &str, value: &str, kind: Option<NodeKind>) -> Option<NodeHandle> {
        self.list_nodes(kind).into_iter().find(|node| {
            self.get_attr(*node, attr)
                .as_ref()
                .and_then(AttrValue::as_str)
                == Some(value)
        })
    }
}

/// Declare `name` (if needed) and set its value
pub fn ensure_attr(
    scene: &mut dyn SceneBackend,
    node: NodeHandle,
    name: &str,
    value: AttrValue,
) -> Result<(), SceneError> {
    if !scene.has_attr(node, name) {
        scene.add_attr(node, name, value.attr_type())?;
    }
    scene.set_attr(node, name, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_value_json_untagged() {
        let value: AttrValue = serde_json::from_str("[1, 2.5, \"a\", true]").unwrap();
        assert_eq!(
            value,
            AttrValue::List(vec![
                AttrValue::Int(1),
                AttrValue::Float(2.5),
                AttrValue::Text("a".to_string()),
                AttrValue::Bool(true),
            ])
        );
        assert_eq!(value.to_json(), serde_json::json!([1, 2.5, "a", true]));
    }

    #[test]
    fn test_attr_value_rejects_objects() {
        assert!(AttrValue::from_json(&serde_json::json!({"a": 1})).is_none());
        assert!(AttrValue::from_json(&serde_json::Value::Null).is_none());
    }

    #[test]
    fn test_attr_value_numeric_coercion() {
        assert_eq!(AttrValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttrValue::Bool(true).as_i64(), Some(1));
        assert_eq!(AttrValue::Text("x".into()).as_f64(), None);
    }
}
