//! Lenient dictionary field readers
//!
//! Persisted projects are read field by field. A missing key keeps the
//! caller's default silently; a key holding the wrong JSON type is logged and
//! ignored so the rest of the dictionary still loads.

use crate::core::transform::{Transform, Vector3};
use serde_json::{Map, Value};
use tracing::warn;

pub(crate) fn get_str<'a>(dict: &'a Map<String, Value>, key: &str, owner: &str) -> Option<&'a str> {
    match dict.get(key)? {
        Value::String(s) => Some(s.as_str()),
        Value::Null => None,
        other => {
            warn!(owner, key, found = %other, "expected a string, field ignored");
            None
        }
    }
}

pub(crate) fn get_bool(dict: &Map<String, Value>, key: &str, owner: &str) -> Option<bool> {
    match dict.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Null => None,
        other => {
            warn!(owner, key, found = %other, "expected a bool, field ignored");
            None
        }
    }
}

pub(crate) fn get_object<'a>(
    dict: &'a Map<String, Value>,
    key: &str,
    owner: &str,
) -> Option<&'a Map<String, Value>> {
    match dict.get(key)? {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            warn!(owner, key, found = %other, "expected an object, field ignored");
            None
        }
    }
}

pub(crate) fn get_vector(dict: &Map<String, Value>, key: &str, owner: &str) -> Option<Vector3> {
    let value = dict.get(key)?;
    match serde_json::from_value::<Vector3>(value.clone()) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(owner, key, %err, "expected [x, y, z], field ignored");
            None
        }
    }
}

/// Read `{"position", "rotation", "scale"}`; absent components stay at identity
pub(crate) fn get_transform(dict: &Map<String, Value>, key: &str, owner: &str) -> Option<Transform> {
    let map = get_object(dict, key, owner)?;
    let mut transform = Transform::IDENTITY;
    if let Some(position) = get_vector(map, "position", owner) {
        transform.position = position;
    }
    if let Some(rotation) = get_vector(map, "rotation", owner) {
        transform.rotation = rotation;
    }
    if let Some(scale) = get_vector(map, "scale", owner) {
        transform.scale = scale;
    }
    Some(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_wrong_types_are_ignored() {
        let dict = as_map(json!({"name": 5, "active": "yes", "meta": []}));
        assert_eq!(get_str(&dict, "name", "t"), None);
        assert_eq!(get_bool(&dict, "active", "t"), None);
        assert!(get_object(&dict, "meta", "t").is_none());
    }

    #[test]
    fn test_partial_transform_defaults() {
        let dict = as_map(json!({"transform": {"position": [1, 2, 3], "rotation": "bad"}}));
        let t = get_transform(&dict, "transform", "t").unwrap();
        assert_eq!(t.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Vector3::ZERO);
        assert_eq!(t.scale, Vector3::ONE);
    }
}
