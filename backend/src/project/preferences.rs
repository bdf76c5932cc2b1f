//! Project preferences
//!
//! Persisted under the project's `"preferences"` key. Unknown keys are
//! ignored; a malformed value is logged and its default kept.

use crate::models::fields::{get_bool, get_str};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPreferences {
    /// Create controls during `build_rig` (skeleton only when false)
    pub build_control_rig: bool,
    /// Delete proxy nodes once the rig is built
    pub delete_proxy_after_build: bool,
    /// Value of the `$PROJECT_DIR` path token
    pub project_dir: Option<PathBuf>,
}

impl Default for ProjectPreferences {
    fn default() -> Self {
        Self {
            build_control_rig: true,
            delete_proxy_after_build: true,
            project_dir: None,
        }
    }
}

impl ProjectPreferences {
    pub fn to_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("build_control_rig".to_string(), Value::Bool(self.build_control_rig));
        dict.insert(
            "delete_proxy_after_build".to_string(),
            Value::Bool(self.delete_proxy_after_build),
        );
        dict.insert(
            "project_dir".to_string(),
            self.project_dir
                .as_ref()
                .map_or(Value::Null, |p| Value::from(p.to_string_lossy().into_owned())),
        );
        Value::Object(dict)
    }

    /// Read preferences, keeping defaults for anything absent or malformed
    pub fn from_dict(dict: &Value) -> Self {
        if let Ok(prefs) = serde_json::from_value::<ProjectPreferences>(dict.clone()) {
            return prefs;
        }
        let Some(map) = dict.as_object() else {
            warn!("preferences are not an object, defaults used");
            return Self::default();
        };

        let owner = "preferences";
        let mut prefs = Self::default();
        if let Some(value) = get_bool(map, "build_control_rig", owner) {
            prefs.build_control_rig = value;
        }
        if let Some(value) = get_bool(map, "delete_proxy_after_build", owner) {
            prefs.delete_proxy_after_build = value;
        }
        prefs.project_dir = get_str(map, "project_dir", owner).map(PathBuf::from);
        prefs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_build_everything() {
        let prefs = ProjectPreferences::default();
        assert!(prefs.build_control_rig);
        assert!(prefs.delete_proxy_after_build);
        assert!(prefs.project_dir.is_none());
    }

    #[test]
    fn test_partial_dict_keeps_defaults() {
        let prefs = ProjectPreferences::from_dict(&json!({"delete_proxy_after_build": false, "theme": "dark"}));
        assert!(prefs.build_control_rig);
        assert!(!prefs.delete_proxy_after_build);
    }

    #[test]
    fn test_malformed_value_defaulted() {
        let prefs = ProjectPreferences::from_dict(&json!({
            "build_control_rig": "yes",
            "project_dir": "/rigs/hero"
        }));
        assert!(prefs.build_control_rig);
        assert_eq!(prefs.project_dir, Some(PathBuf::from("/rigs/hero")));
    }

    #[test]
    fn test_dict_round_trip() {
        let prefs = ProjectPreferences {
            build_control_rig: false,
            delete_proxy_after_build: true,
            project_dir: Some(PathBuf::from("/tmp/rig")),
        };
        assert_eq!(ProjectPreferences::from_dict(&prefs.to_dict()), prefs);
    }
}
