//! Import-file module
//!
//! Owns no proxies. While the rig is built it imports the file named by its
//! `file_path` metadata. The path may contain tokens such as `$PROJECT_DIR`;
//! they are resolved at build time and stored unresolved.

use super::RigModule;
use crate::models::ModuleCore;
use crate::scene::{SceneBackend, SceneError};
use serde_json::Value;
use tracing::{info, warn};

pub const META_FILE_PATH: &str = "file_path";

#[derive(Debug, Clone)]
pub struct ModuleImportFile {
    core: ModuleCore,
}

impl ModuleImportFile {
    pub const CLASS_NAME: &'static str = "ModuleImportFile";

    pub fn new() -> Self {
        Self {
            core: ModuleCore::new("import_file"),
        }
    }

    pub fn set_file_path(&mut self, path: &str) {
        if path.is_empty() {
            warn!(module = self.core.name(), "empty file path rejected");
            return;
        }
        self.core.set_metadata(META_FILE_PATH, Value::from(path));
    }

    pub fn file_path(&self) -> Option<&str> {
        self.core.metadata().get(META_FILE_PATH).and_then(Value::as_str)
    }
}

impl Default for ModuleImportFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RigModule for ModuleImportFile {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn core(&self) -> &ModuleCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModuleCore {
        &mut self.core
    }

    fn build_rig(&mut self, scene: &mut dyn SceneBackend, _project_prefix: Option<&str>) -> Result<(), SceneError> {
        let Some(raw) = self.file_path().map(str::to_string) else {
            warn!(module = self.core.name(), "no file path set, nothing imported");
            return Ok(());
        };
        match self.core.import_path(scene, &raw) {
            Ok(nodes) => {
                info!(module = self.core.name(), path = %raw, count = nodes.len(), "file imported");
                Ok(())
            }
            Err(SceneError::Unsupported(what)) => {
                warn!(module = self.core.name(), %what, "backend cannot import files, skipped");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
