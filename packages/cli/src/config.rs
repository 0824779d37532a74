use folio_editor::{DragConfig, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Drag engine tuning
    #[serde(default)]
    pub drag: DragConfig,

    /// Canvas viewport used by simulations
    #[serde(default)]
    pub viewport: Viewport,

    /// Prefix for generated block ids; random UUIDs when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = Self::path(cwd);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn path(cwd: &Path) -> PathBuf {
        cwd.join(DEFAULT_CONFIG_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "drag": { "nestIndent": 32, "scrollMaxSpeed": 40 },
            "viewport": { "zoom": 2 },
            "idPrefix": "sim"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.drag.nest_indent, 32.0);
        assert_eq!(config.drag.scroll_max_speed, 40.0);
        assert_eq!(config.drag.indicator_thickness, 3.0);
        assert_eq!(config.viewport.zoom, 2.0);
        assert_eq!(config.viewport.note_scale, 1.0);
        assert_eq!(config.id_prefix.as_deref(), Some("sim"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "drag": { "noteWidth": 640 } }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.drag.note_width, 640.0);
        assert_eq!(config.drag.note_height, 92.0);
        assert_eq!(config.id_prefix, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ drag: ").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
