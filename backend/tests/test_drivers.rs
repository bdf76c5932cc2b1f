//! Driver Tests - composite keys, lookup and supporting drivers
//!
//! Critical invariants tested:
//! - Keys always have three non-empty segments with the first two dash-free
//! - `block` joints never resolve drivers and never get a generic fallback
//! - Generic fallbacks are created once and reused

use proptest::prelude::*;
use rig_framework_core_rs::core::ids::generate_uuid;
use rig_framework_core_rs::drivers::{
    add_driver_uuid_attr, build_driver_key, connect_supporting_driver, find_driver_from_key,
    find_drivers_from_joint, find_drivers_from_module, get_supporting_drivers, DriverKey,
};
use rig_framework_core_rs::{AttrValue, MemoryScene, NodeHandle, NodeKind, SceneBackend};

// ============================================================================
// Test Helpers
// ============================================================================

/// `^[^-]+-[^-]+-.+$` without a regex engine
fn is_well_formed(key: &str) -> bool {
    let mut parts = key.splitn(3, '-');
    let module = parts.next().unwrap_or_default();
    let kind = parts.next().unwrap_or_default();
    let purpose = parts.next().unwrap_or_default();
    !module.is_empty() && !kind.is_empty() && !purpose.is_empty()
}

fn make_joint(scene: &mut MemoryScene, module_uuid: &str, purpose: &str, drivers: &[&str]) -> NodeHandle {
    let joint = scene.create_node(NodeKind::Joint, &format!("{}_jnt", purpose)).unwrap();
    let set = |scene: &mut MemoryScene, name: &str, value: AttrValue| {
        scene.add_attr(joint, name, value.attr_type()).unwrap();
        scene.set_attr(joint, name, value).unwrap();
    };
    set(scene, "moduleUUID", AttrValue::from(module_uuid));
    set(scene, "jointPurpose", AttrValue::from(purpose));
    set(
        scene,
        "jointDrivers",
        AttrValue::Text(serde_json::to_string(drivers).unwrap()),
    );
    joint
}

// ============================================================================
// Keys
// ============================================================================

#[test]
fn test_key_parse_keeps_dashes_in_purpose() {
    let key = DriverKey::parse("abc123-fk-upper-arm").unwrap();
    assert_eq!(key.module_uuid, "abc123");
    assert_eq!(key.driver_type, "fk");
    assert_eq!(key.purpose, "upper-arm");
    assert!(DriverKey::parse("abc123--hip").is_none());
}

#[test]
fn test_tagging_replaces_locked_key() {
    let mut scene = MemoryScene::new();
    let node = scene.create_node(NodeKind::Control, "ctrl").unwrap();
    let module = generate_uuid(true);
    add_driver_uuid_attr(&mut scene, node, &module, Some("fk"), Some("hip")).unwrap();
    let key = add_driver_uuid_attr(&mut scene, node, &module, Some("ik"), Some("hip")).unwrap();
    assert_eq!(find_driver_from_key(&scene, &key), Some(node));
    assert_eq!(
        find_driver_from_key(&scene, &build_driver_key(&module, Some("fk"), Some("hip"))),
        None
    );
}

// ============================================================================
// Joint resolution
// ============================================================================

#[test]
fn test_joint_resolves_tagged_drivers_in_order() {
    let mut scene = MemoryScene::new();
    let module = generate_uuid(true);
    let joint = make_joint(&mut scene, &module, "wrist", &["ik", "fk"]);
    let fk = scene.create_node(NodeKind::Control, "fk_ctrl").unwrap();
    let ik = scene.create_node(NodeKind::Control, "ik_ctrl").unwrap();
    add_driver_uuid_attr(&mut scene, fk, &module, Some("fk"), Some("wrist")).unwrap();
    add_driver_uuid_attr(&mut scene, ik, &module, Some("ik"), Some("wrist")).unwrap();

    let drivers = find_drivers_from_joint(&mut scene, joint, false, true).unwrap();
    assert_eq!(drivers, vec![ik, fk]);
}

#[test]
fn test_block_suppresses_generic_fallback() {
    let mut scene = MemoryScene::new();
    let module = generate_uuid(true);
    let joint = make_joint(&mut scene, &module, "root", &["root", "block"]);
    let before = scene.node_count();

    assert!(find_drivers_from_joint(&mut scene, joint, true, true).unwrap().is_empty());
    assert!(find_drivers_from_joint(&mut scene, joint, false, true).unwrap().is_empty());
    assert_eq!(scene.node_count(), before);
}

#[test]
fn test_generic_fallback_created_once() {
    let mut scene = MemoryScene::new();
    let module = generate_uuid(true);
    let joint = make_joint(&mut scene, &module, "prop", &["fk"]);

    let first = find_drivers_from_joint(&mut scene, joint, false, true).unwrap();
    let second = find_drivers_from_joint(&mut scene, joint, false, true).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_eq!(find_drivers_from_module(&scene, &module), first);

    let untouched = make_joint(&mut scene, &module, "other", &["fk"]);
    assert!(find_drivers_from_joint(&mut scene, untouched, false, false).unwrap().is_empty());
}

// ============================================================================
// Supporting drivers
// ============================================================================

#[test]
fn test_supporting_drivers_accumulate() {
    let mut scene = MemoryScene::new();
    let module = generate_uuid(true);
    let parent = scene.create_node(NodeKind::Control, "parent").unwrap();
    add_driver_uuid_attr(&mut scene, parent, &module, Some("fk"), Some("hip")).unwrap();
    let a = scene.create_node(NodeKind::Transform, "a").unwrap();
    let b = scene.create_node(NodeKind::Transform, "b").unwrap();
    connect_supporting_driver(&mut scene, parent, a).unwrap();
    connect_supporting_driver(&mut scene, parent, b).unwrap();

    assert_eq!(get_supporting_drivers(&scene, parent), vec![a, b]);
    assert!(get_supporting_drivers(&scene, a).is_empty());
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_tagged_keys_well_formed(
        driver_type in proptest::option::of("[a-z_-]{0,8}"),
        purpose in proptest::option::of("[a-z0-9_-]{0,12}"),
    ) {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(NodeKind::Control, "ctrl").unwrap();
        let module = generate_uuid(true);
        let key = add_driver_uuid_attr(
            &mut scene,
            node,
            &module,
            driver_type.as_deref(),
            purpose.as_deref(),
        ).unwrap();

        prop_assert!(is_well_formed(&key), "malformed key {}", key);
        let parsed = DriverKey::parse(&key).unwrap();
        prop_assert_eq!(parsed.module_uuid, module);
        prop_assert_eq!(find_driver_from_key(&scene, &key), Some(node));
    }
}
