//! Identity Tests - UUID generation, validation and lookup
//!
//! Critical invariants tested:
//! - Generated identifiers are pairwise distinct within a run
//! - Invalid identifiers never replace an existing uuid or parent uuid
//! - Scene lookups go through the UUID attribute, not node names

use proptest::prelude::*;
use rig_framework_core_rs::core::ids::{generate_uuid, is_short_uuid_valid, is_uuid_valid, SHORT_UUID_LENGTH};
use rig_framework_core_rs::{
    get_object_from_uuid_attr, AttrType, AttrValue, MemoryScene, ModuleCore, NodeKind, Proxy, SceneBackend,
};
use std::collections::HashSet;

// ============================================================================
// Uniqueness
// ============================================================================

#[test]
fn test_proxy_and_module_uuids_unique() {
    let mut seen = HashSet::new();
    for i in 0..500 {
        let proxy = Proxy::new(format!("p{}", i));
        let module = ModuleCore::new(format!("m{}", i));
        assert!(seen.insert(proxy.uuid().to_string()));
        assert!(seen.insert(module.uuid().to_string()));
    }
}

#[test]
fn test_generated_forms_validate() {
    assert!(is_uuid_valid(&generate_uuid(false)));
    assert!(is_short_uuid_valid(&generate_uuid(true), SHORT_UUID_LENGTH));
    assert!(!is_uuid_valid(&generate_uuid(true)));
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_lookup_survives_rename_collisions() {
    let mut scene = MemoryScene::new();
    let first = scene.create_node(NodeKind::Locator, "arm").unwrap();
    let second = scene.create_node(NodeKind::Locator, "arm").unwrap();
    assert_ne!(scene.node_name(first), scene.node_name(second));

    let uuid = generate_uuid(false);
    scene.add_attr(second, "proxyUUID", AttrType::Text).unwrap();
    scene.set_attr(second, "proxyUUID", AttrValue::from(uuid.as_str())).unwrap();

    assert_eq!(get_object_from_uuid_attr(&scene, &uuid, "proxyUUID", None), Some(second));
    assert_eq!(
        get_object_from_uuid_attr(&scene, &uuid, "proxyUUID", Some(NodeKind::Joint)),
        None
    );
    assert_eq!(get_object_from_uuid_attr(&scene, "", "proxyUUID", None), None);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_invalid_proxy_uuid_never_applied(candidate in "\\PC{0,40}") {
        let mut proxy = Proxy::new("p");
        let before = proxy.uuid().to_string();
        proxy.set_uuid(&candidate);
        if is_uuid_valid(&candidate) {
            prop_assert_eq!(proxy.uuid(), candidate.as_str());
        } else {
            prop_assert_eq!(proxy.uuid(), before.as_str());
        }
    }

    #[test]
    fn prop_invalid_parent_uuid_never_applied(candidate in "[a-z0-9-]{0,36}") {
        prop_assume!(!is_uuid_valid(&candidate));
        let parent = generate_uuid(false);
        let mut proxy = Proxy::new("p");
        proxy.set_parent_uuid(&parent);
        proxy.set_parent_uuid(&candidate);
        prop_assert_eq!(proxy.parent_uuid(), Some(parent.as_str()));
    }

    #[test]
    fn prop_module_uuid_must_be_short(candidate in "[A-Za-z0-9]{0,16}") {
        let mut module = ModuleCore::new("m");
        let before = module.uuid().to_string();
        module.set_uuid(&candidate);
        if candidate.len() == SHORT_UUID_LENGTH {
            prop_assert_eq!(module.uuid(), candidate.as_str());
        } else {
            prop_assert_eq!(module.uuid(), before.as_str());
        }
    }
}
