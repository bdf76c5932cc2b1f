//! Path token substitution
//!
//! Path-bearing module settings (e.g. an import-file path) may contain
//! tokens that are resolved at execution time and never persisted resolved:
//!
//! | Token          | Source                                   |
//! |----------------|------------------------------------------|
//! | `$PROJECT_DIR` | owning project's `project_dir` preference |
//! | `$SCENE_DIR`   | directory of the backend's current scene  |
//! | `$TEMP_DIR`    | system temp directory                     |
//! | `$HOME_DIR`    | user home directory                       |
//! | `$DESKTOP_DIR` | user desktop directory                    |
//!
//! Tokens whose source is unknown are left in place (and logged).

use std::path::{Path, PathBuf};
use tracing::warn;

pub const TOKEN_PROJECT_DIR: &str = "$PROJECT_DIR";
pub const TOKEN_SCENE_DIR: &str = "$SCENE_DIR";
pub const TOKEN_TEMP_DIR: &str = "$TEMP_DIR";
pub const TOKEN_HOME_DIR: &str = "$HOME_DIR";
pub const TOKEN_DESKTOP_DIR: &str = "$DESKTOP_DIR";

/// Resolved values for every supported token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTokens {
    pub project_dir: Option<PathBuf>,
    pub scene_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub desktop_dir: Option<PathBuf>,
}

impl PathTokens {
    /// Collect token values from the host system plus the given project/scene context
    pub fn from_environment(project_dir: Option<&Path>, scene_path: Option<&Path>) -> Self {
        Self {
            project_dir: project_dir.map(Path::to_path_buf),
            scene_dir: scene_path.and_then(|p| p.parent()).map(Path::to_path_buf),
            temp_dir: Some(std::env::temp_dir()),
            home_dir: dirs::home_dir(),
            desktop_dir: dirs::desktop_dir(),
        }
    }

    fn value_for(&self, token: &str) -> Option<&Path> {
        match token {
            TOKEN_PROJECT_DIR => self.project_dir.as_deref(),
            TOKEN_SCENE_DIR => self.scene_dir.as_deref(),
            TOKEN_TEMP_DIR => self.temp_dir.as_deref(),
            TOKEN_HOME_DIR => self.home_dir.as_deref(),
            TOKEN_DESKTOP_DIR => self.desktop_dir.as_deref(),
            _ => None,
        }
    }

    /// Substitute every known token in `raw`
    ///
    /// # Example
    /// ```
    /// use rig_framework_core_rs::core::paths::PathTokens;
    /// use std::path::PathBuf;
    ///
    /// let tokens = PathTokens {
    ///     project_dir: Some(PathBuf::from("/rigs/hero")),
    ///     ..Default::default()
    /// };
    /// assert_eq!(tokens.resolve("$PROJECT_DIR/model.ma"), "/rigs/hero/model.ma");
    /// ```
    pub fn resolve(&self, raw: &str) -> String {
        let mut resolved = raw.to_string();
        for token in [
            TOKEN_PROJECT_DIR,
            TOKEN_SCENE_DIR,
            TOKEN_TEMP_DIR,
            TOKEN_HOME_DIR,
            TOKEN_DESKTOP_DIR,
        ] {
            if !resolved.contains(token) {
                continue;
            }
            match self.value_for(token) {
                Some(value) => {
                    resolved = resolved.replace(token, &value.to_string_lossy());
                }
                None => warn!(token, path = raw, "path token has no value; left unresolved"),
            }
        }
        resolved
    }
}
