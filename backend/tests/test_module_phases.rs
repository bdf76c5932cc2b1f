//! Module Phase Tests - per-module build phases and specializations
//!
//! Critical invariants tested:
//! - Phases tolerate missing prerequisites (logged skip, never an error)
//! - Orientation methods produce the expected joint rotations
//! - Specialized modules lay out and rig their fixed proxy sets

use rig_framework_core_rs::core::transform::Vector3;
use rig_framework_core_rs::drivers::{build_driver_key, find_driver_from_key, find_drivers_from_module};
use rig_framework_core_rs::models::find_joint;
use rig_framework_core_rs::{
    MemoryScene, ModuleGeneric, ModuleImportFile, ModuleLimb, ModuleSpine, OrientationMethod, ProjectPreferences,
    RigModule, RigProject, SceneBackend, Space,
};
use std::path::PathBuf;

// ============================================================================
// Test Helpers
// ============================================================================

fn run_all_phases(module: &mut dyn RigModule, scene: &mut MemoryScene) {
    module.build_proxy(scene, None, false).unwrap();
    module.build_proxy_setup(scene).unwrap();
    module.build_skeleton_joints(scene, None).unwrap();
    module.build_skeleton_hierarchy(scene).unwrap();
    module.build_rig(scene, None).unwrap();
    module.build_rig_post(scene).unwrap();
}

fn joint_position(module: &dyn RigModule, scene: &MemoryScene, purpose: &str) -> Vector3 {
    let proxy = module.core().find_proxy_by_purpose(purpose).unwrap();
    let joint = find_joint(scene, proxy.uuid()).unwrap();
    scene.get_transform(joint, Space::World).unwrap().position
}

// ============================================================================
// Phase ordering
// ============================================================================

#[test]
fn test_skeleton_before_proxies_is_noop() {
    let mut module = ModuleSpine::new();
    let mut scene = MemoryScene::new();
    let joints = module.build_skeleton_joints(&mut scene, None).unwrap();
    assert!(joints.is_empty());
    module.build_skeleton_hierarchy(&mut scene).unwrap();
    module.build_rig(&mut scene, None).unwrap();
    assert_eq!(scene.node_count(), 0);
}

#[test]
fn test_joint_names_use_project_prefix() {
    let mut module = ModuleGeneric::new("tail");
    module.add_new_proxy("tail01", false);
    module.core_mut().set_prefix(Some("L"));
    let mut scene = MemoryScene::new();
    module.build_proxy(&mut scene, Some("hero"), false).unwrap();
    let joints = module.build_skeleton_joints(&mut scene, Some("hero")).unwrap();
    let name = scene.node_name(joints[0]).unwrap();
    assert!(name.starts_with("hero"), "{}", name);
    assert!(name.ends_with("_jnt"), "{}", name);
}

#[test]
fn test_joint_copies_proxy_scale() {
    let mut module = ModuleGeneric::new("fin");
    module.add_new_proxy("fin01", false).set_initial_scale(Some(2.0), Some(2.0), Some(2.0));
    let mut scene = MemoryScene::new();
    module.build_proxy(&mut scene, None, false).unwrap();
    module.build_proxy_setup(&mut scene).unwrap();
    let joints = module.build_skeleton_joints(&mut scene, None).unwrap();

    let scale = scene.get_transform(joints[0], Space::World).unwrap().scale;
    assert!(scale.approx_eq(Vector3::new(2.0, 2.0, 2.0), 1e-9), "{:?}", scale);
}

#[test]
fn test_second_joint_pass_is_idempotent() {
    let mut module = ModuleGeneric::new("tail");
    module.add_new_proxy("tail01", false);
    let mut scene = MemoryScene::new();
    module.build_proxy(&mut scene, None, false).unwrap();
    let first = module.build_skeleton_joints(&mut scene, None).unwrap();
    let count = scene.node_count();
    let second = module.build_skeleton_joints(&mut scene, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(scene.node_count(), count);
}

// ============================================================================
// Orientation
// ============================================================================

#[test]
fn test_world_orientation_zeroes_rotation() {
    let mut module = ModuleGeneric::new("chain");
    module.add_new_proxy("a", false).set_initial_rotation(Some(30.0), None, None);
    module
        .add_new_proxy("b", true)
        .set_initial_position(Some(0.0), Some(4.0), None);
    module.core_mut().set_orientation_method(OrientationMethod::World);

    let mut scene = MemoryScene::new();
    run_all_phases(&mut module, &mut scene);
    for proxy in module.core().proxies() {
        let joint = find_joint(&scene, proxy.uuid()).unwrap();
        let rotation = scene.get_transform(joint, Space::World).unwrap().rotation;
        assert!(rotation.approx_eq(Vector3::ZERO, 1e-6), "{:?}", rotation);
    }
}

#[test]
fn test_joint_chain_parented_in_order() {
    let mut module = ModuleGeneric::new("chain");
    module.add_new_proxy("a", false);
    module.add_new_proxy("b", true).set_initial_position(Some(3.0), None, None);
    module.add_new_proxy("c", true).set_initial_position(Some(6.0), None, None);

    let mut scene = MemoryScene::new();
    run_all_phases(&mut module, &mut scene);
    let joints: Vec<_> = module
        .core()
        .proxies()
        .iter()
        .map(|p| find_joint(&scene, p.uuid()).unwrap())
        .collect();
    assert_eq!(scene.get_parent(joints[1]), Some(joints[0]));
    assert_eq!(scene.get_parent(joints[2]), Some(joints[1]));
    assert!(joint_position(&module, &scene, "c").approx_eq(Vector3::new(6.0, 0.0, 0.0), 1e-9));
}

// ============================================================================
// Specializations
// ============================================================================

#[test]
fn test_spine_rig_has_cog_and_fk_chain() {
    let mut module = ModuleSpine::new();
    let mut scene = MemoryScene::new();
    run_all_phases(&mut module, &mut scene);

    let uuid = module.core().uuid().to_string();
    // cog + hip/spine01-03/chest fk
    assert_eq!(find_drivers_from_module(&scene, &uuid).len(), 6);
    let cog = find_driver_from_key(&scene, &build_driver_key(&uuid, Some("cog"), Some("hip"))).unwrap();
    let hip_fk = find_driver_from_key(&scene, &build_driver_key(&uuid, Some("fk"), Some("hip"))).unwrap();
    let hip_group = scene.get_parent(hip_fk).unwrap();
    assert_eq!(scene.get_parent(hip_group), Some(cog));
}

#[test]
fn test_spine_joints_evenly_spaced() {
    let mut module = ModuleSpine::new();
    let mut scene = MemoryScene::new();
    run_all_phases(&mut module, &mut scene);

    let hip = joint_position(&module, &scene, "hip");
    let chest = joint_position(&module, &scene, "chest");
    let spine02 = joint_position(&module, &scene, "spine02");
    assert!(spine02.approx_eq(hip.lerp(chest, 0.5), 1e-9));
}

#[test]
fn test_limb_has_fk_ik_and_pole() {
    let mut module = ModuleLimb::new();
    let mut scene = MemoryScene::new();
    run_all_phases(&mut module, &mut scene);

    let uuid = module.core().uuid().to_string();
    for (kind, purpose) in [("fk", "upper"), ("fk", "lower"), ("fk", "end"), ("ik", "end"), ("pole", "lower")] {
        assert!(
            find_driver_from_key(&scene, &build_driver_key(&uuid, Some(kind), Some(purpose))).is_some(),
            "missing {} {}",
            kind,
            purpose
        );
    }
}

#[test]
fn test_import_file_resolves_project_dir() {
    let mut project = RigProject::new("hero");
    project.set_preferences(ProjectPreferences {
        project_dir: Some(PathBuf::from("/rigs/hero")),
        ..ProjectPreferences::default()
    });
    let mut import = ModuleImportFile::new();
    import.set_file_path("$PROJECT_DIR/geo/body.ma");
    project.add_to_modules(Box::new(import));

    let mut scene = MemoryScene::new();
    project.build_proxy(&mut scene).unwrap();
    project.build_rig(&mut scene).unwrap();
    assert_eq!(scene.imported_files(), &[PathBuf::from("/rigs/hero/geo/body.ma")]);
}
