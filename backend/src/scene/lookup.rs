//! UUID indirection
//!
//! Objects are found by the value of an identifier attribute instead of by
//! name. A miss is a normal outcome (the object may not have been built yet, or
//! was deleted) and is reported as `None`, never as an error.

use super::{NodeHandle, NodeKind, SceneBackend};
use tracing::debug;

/// Find the object whose `attr` attribute holds `uuid`
///
/// # Arguments
/// * `scene` - Scene to search
/// * `uuid` - Identifier value to match
/// * `attr` - Name of the identifier attribute (e.g. `proxyUUID`, `jointUUID`)
/// * `kind` - Restrict the search to one node kind
///
/// # Returns
/// The first matching node in creation order, or `None`
///
/// # Example
/// ```rust
/// use rig_framework_core_rs::scene::{ensure_attr, get_object_from_uuid_attr, MemoryScene, NodeKind, SceneBackend};
///
/// let mut scene = MemoryScene::new();
/// let joint = scene.create_node(NodeKind::Joint, "arm_jnt").unwrap();
/// ensure_attr(&mut scene, joint, "jointUUID", "abc".into()).unwrap();
///
/// assert_eq!(get_object_from_uuid_attr(&scene, "abc", "jointUUID", Some(NodeKind::Joint)), Some(joint));
/// assert_eq!(get_object_from_uuid_attr(&scene, "abc", "jointUUID", Some(NodeKind::Locator)), None);
/// ```
pub fn get_object_from_uuid_attr(
    scene: &dyn SceneBackend,
    uuid: &str,
    attr: &str,
    kind: Option<NodeKind>,
) -> Option<NodeHandle> {
    if uuid.is_empty() {
        return None;
    }
    let found = scene.find_by_attr(attr, uuid, kind);
    if found.is_none() {
        debug!(uuid, attr, ?kind, "no object carries identifier");
    }
    found
}

/// Every node that declares `attr`, in creation order
pub fn get_objects_with_attr(scene: &dyn SceneBackend, attr: &str) -> Vec<NodeHandle> {
    scene
        .list_nodes(None)
        .into_iter()
        .filter(|node| scene.has_attr(*node, attr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ensure_attr, MemoryScene};

    #[test]
    fn test_lookup_miss_returns_none() {
        let scene = MemoryScene::new();
        assert_eq!(get_object_from_uuid_attr(&scene, "nope", "proxyUUID", None), None);
        assert_eq!(get_object_from_uuid_attr(&scene, "", "proxyUUID", None), None);
    }

    #[test]
    fn test_lookup_after_delete_is_none() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(NodeKind::Locator, "p").unwrap();
        ensure_attr(&mut scene, node, "proxyUUID", "u1".into()).unwrap();
        scene.delete_node(node).unwrap();
        assert_eq!(get_object_from_uuid_attr(&scene, "u1", "proxyUUID", None), None);
    }

    #[test]
    fn test_objects_with_attr() {
        let mut scene = MemoryScene::new();
        let a = scene.create_node(NodeKind::Joint, "a").unwrap();
        let _b = scene.create_node(NodeKind::Joint, "b").unwrap();
        let c = scene.create_node(NodeKind::Joint, "c").unwrap();
        ensure_attr(&mut scene, a, "jointUUID", "1".into()).unwrap();
        ensure_attr(&mut scene, c, "jointUUID", "2".into()).unwrap();
        assert_eq!(get_objects_with_attr(&scene, "jointUUID"), vec![a, c]);
    }
}
