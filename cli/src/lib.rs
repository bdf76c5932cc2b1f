//! Command implementations for the `rig-framework` binary
//!
//! Each command reads a project file, acts on it and returns the text to
//! print, so the commands can be exercised without spawning the binary.

use anyhow::{bail, Context as _};
use rig_framework_core_rs::{
    compute_project_hash, BuildStage, MemoryScene, ModuleLimb, ModuleRoot, ModuleSpine, RigModule, RigProject,
};
use std::path::Path;
use tracing::info;

pub fn load_project(path: &Path) -> anyhow::Result<RigProject> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read project '{}'", path.display()))?;
    RigProject::from_json(&text).with_context(|| format!("parse project '{}'", path.display()))
}

fn write_output(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))
}

/// Structural checks plus the opt-in parent diagnostics
///
/// Dangling parents are reported but do not fail validation; loops do.
pub fn cmd_validate(path: &Path) -> anyhow::Result<String> {
    let project = load_project(path)?;
    project.validate()?;

    let cycles = project.find_parent_cycles();
    if !cycles.is_empty() {
        let listed: Vec<String> = cycles
            .iter()
            .map(|c| c.iter().cloned().collect::<Vec<_>>().join(" -> "))
            .collect();
        bail!("proxy parent loop(s): {}", listed.join("; "));
    }

    let mut report = format!(
        "{}: {} module(s), {} proxies, valid",
        project.name(),
        project.modules().len(),
        project.modules().iter().map(|m| m.core().proxies().len()).sum::<usize>()
    );
    for (proxy, parent) in project.find_dangling_parents() {
        report.push_str(&format!("\nwarning: proxy {} parent {} is not in this project", proxy, parent));
    }
    Ok(report)
}

/// Build into an in-memory scene and return (or write) its snapshot
pub fn cmd_build(path: &Path, stage: &str, out: Option<&Path>) -> anyhow::Result<String> {
    let Some(stage) = BuildStage::parse(stage) else {
        bail!("unknown build stage '{}' (expected proxy, skeleton or rig)", stage);
    };
    let mut project = load_project(path)?;
    let mut scene = MemoryScene::with_scene_path(path);
    project
        .build(&mut scene, stage)
        .with_context(|| format!("build '{}' to stage {}", project.name(), stage.as_str()))?;
    info!(project = project.name(), nodes = scene.node_count(), "build finished");

    let snapshot = serde_json::to_string_pretty(&scene.to_json()).context("encode scene snapshot")?;
    match out {
        Some(out) => {
            write_output(out, &snapshot)?;
            Ok(format!("wrote {} ({} nodes)", out.display(), scene.node_count()))
        }
        None => Ok(snapshot),
    }
}

pub fn cmd_hash(path: &Path) -> anyhow::Result<String> {
    let project = load_project(path)?;
    Ok(compute_project_hash(&project)?)
}

/// Rewrite the project with modules following the modules they attach to
pub fn cmd_reorder(path: &Path, out: Option<&Path>) -> anyhow::Result<String> {
    let mut project = load_project(path)?;
    project.update_modules_order();
    let text = project.to_json()?;
    let target = out.unwrap_or(path);
    write_output(target, &text)?;
    let order: Vec<&str> = project.modules().iter().map(|m| m.core().name()).collect();
    Ok(format!("wrote {}: {}", target.display(), order.join(", ")))
}

/// Starter biped: root, spine on the root, one limb on the chest
pub fn template_project(name: &str) -> RigProject {
    let root = ModuleRoot::new();
    let mut spine = ModuleSpine::new();
    let mut limb = ModuleLimb::new();
    if let Some(root_proxy) = root.root_proxy() {
        spine.core_mut().set_parent_uuid_from_proxy(root_proxy);
    }
    if let Some(chest) = spine.core().find_proxy_by_purpose("chest") {
        limb.core_mut().set_parent_uuid_from_proxy(chest);
    }
    limb.core_mut().set_prefix(Some("L"));

    let mut project = RigProject::new(name);
    project.add_to_modules(Box::new(root));
    project.add_to_modules(Box::new(spine));
    project.add_to_modules(Box::new(limb));
    project
}

pub fn cmd_template(name: &str, out: Option<&Path>) -> anyhow::Result<String> {
    let text = template_project(name).to_json()?;
    match out {
        Some(out) => {
            write_output(out, &text)?;
            Ok(format!("wrote {}", out.display()))
        }
        None => Ok(text),
    }
}
