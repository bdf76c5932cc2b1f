//! Rig projects
//!
//! A [`RigProject`] owns an ordered list of modules plus the preferences that
//! steer a build. It is the only place build phases are sequenced across
//! modules and the only owner of module → project back-references.

pub mod preferences;
pub mod rig_project;

pub use preferences::ProjectPreferences;
pub use rig_project::{compute_project_hash, BuildStage, RigError, RigProject};
