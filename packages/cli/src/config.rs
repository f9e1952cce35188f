use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use protoedit_editor::{EditorOptions, DEFAULT_MAX_COMPLETION_DEPTH};

pub const DEFAULT_CONFIG_NAME: &str = "protoedit.config.json";

/// Protoedit configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Compiled schema (`protoc --descriptor_set_out`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_set: Option<String>,

    /// Fully-qualified name of the document's root message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_message: Option<String>,

    /// Longest chain of required messages completion follows
    #[serde(default = "default_max_completion_depth")]
    pub max_completion_depth: usize,
}

fn default_max_completion_depth() -> usize {
    DEFAULT_MAX_COMPLETION_DEPTH
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Descriptor set path, relative entries resolved against `cwd`
    pub fn descriptor_set_path(&self, cwd: &str) -> Option<PathBuf> {
        self.descriptor_set
            .as_ref()
            .map(|path| PathBuf::from(cwd).join(path))
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            max_completion_depth: self.max_completion_depth,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            descriptor_set: None,
            root_message: None,
            max_completion_depth: default_max_completion_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "descriptorSet": "schema/app.pb",
            "rootMessage": "app.Settings",
            "maxCompletionDepth": 8
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.descriptor_set.as_deref(), Some("schema/app.pb"));
        assert_eq!(config.root_message.as_deref(), Some("app.Settings"));
        assert_eq!(config.editor_options().max_completion_depth, 8);
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_completion_depth, DEFAULT_MAX_COMPLETION_DEPTH);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        assert_eq!(Config::load(cwd).unwrap(), Config::default());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "descriptorSet": "a.pb" }"#,
        )
        .unwrap();
        let config = Config::load(cwd).unwrap();
        assert_eq!(config.descriptor_set_path(cwd), Some(dir.path().join("a.pb")));
    }
}
