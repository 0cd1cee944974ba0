//! Configuration file discovery and loading

use crate::compose::{CompositionResult, compose};
use crate::overlay::OverlayRecord;
use crate::tree::ConfigTree;
use crate::{Result, StrataError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file names in discovery priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".strata.json",
    ".strata.jsonc",
    "strata.yaml",
    "strata.yml",
    "strata.toml",
];

/// Key holding extra raw overlays inside a config file
pub const OVERLAYS_KEY: &str = "overlays";

/// Parsed config file: the options tree plus raw overlays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub path: Option<PathBuf>,
    pub options: ConfigTree,
    pub overlays: Vec<OverlayRecord>,
}

impl ConfigFile {
    /// Split a document into options and the `overlays` array
    pub fn from_tree(path: Option<PathBuf>, mut tree: ConfigTree) -> Result<Self> {
        let overlays = match tree.remove(OVERLAYS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                StrataError::config_error(format!("invalid '{OVERLAYS_KEY}' entry: {e}"))
            })?,
        };

        Ok(Self {
            path,
            options: tree,
            overlays,
        })
    }

    /// Compose the overlay sequence this file describes
    pub fn compose(&self) -> Result<CompositionResult> {
        compose(&self.options, self.overlays.clone())
    }
}

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Searches each directory for the names in [`CONFIG_FILE_NAMES`], in
    /// order, and moves up the tree until a config is found or the
    /// filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| StrataError::io_error(start_path, e))?;

        loop {
            let found: Vec<PathBuf> = CONFIG_FILE_NAMES
                .iter()
                .map(|name| current.join(name))
                .filter(|path| path.is_file())
                .collect();

            if let Some(config_path) = found.first() {
                if found.len() > 1 {
                    warn!(
                        "Multiple config files in {}, using {}",
                        current.display(),
                        config_path.display()
                    );
                }
                debug!("Found config: {}", config_path.display());
                return Ok(Some(config_path.clone()));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Read a config file into a tree
    ///
    /// The format follows the extension: `.json`/`.jsonc` are read as JSON5,
    /// which accepts comments and trailing commas, `.yaml`/`.yml` as YAML and
    /// `.toml` as TOML.
    pub fn load_tree(path: &Path) -> Result<ConfigTree> {
        let content = fs::read_to_string(path).map_err(|e| StrataError::io_error(path, e))?;
        let failed = |e: &dyn std::fmt::Display| {
            StrataError::config_error(format!(
                "Failed to load config from '{}': {e}",
                path.display()
            ))
        };

        let value: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") | Some("jsonc") => json5::from_str(&content).map_err(|e| failed(&e))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| failed(&e))?
            }
            Some("toml") => toml::from_str(&content).map_err(|e| failed(&e))?,
            _ => {
                return Err(failed(
                    &"unsupported file extension (expected .json, .jsonc, .yaml, .yml or .toml)",
                ));
            }
        };

        ConfigTree::from_value(value).map_err(|e| failed(&e))
    }

    /// Load and split a config file
    pub fn load_from_file(path: &Path) -> Result<ConfigFile> {
        let tree = Self::load_tree(path)?;
        ConfigFile::from_tree(Some(path.to_path_buf()), tree)
    }

    /// Load config from path or auto-discover
    ///
    /// If a custom path is provided, loads from that path. Otherwise searches
    /// upward from `start_dir` (or the current directory); when nothing is
    /// found the default, empty configuration is returned.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<ConfigFile> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(StrataError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("No config file found, using defaults");
                Ok(ConfigFile::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            ".strata.json",
            r#"{
                "editorMode": true,
                "ruleOverrides": { "curly": "off" }
            }"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.options.get("editorMode"), Some(&json!(true)));
        assert_eq!(config.path.as_deref(), Some(config_path.as_path()));
        assert!(config.overlays.is_empty());
    }

    #[test]
    fn test_load_from_file_jsonc() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            ".strata.jsonc",
            r#"{
                // comments are fine
                "formatting": false,
                "ignorePaths": ["generated/**",],
            }"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.options.get("formatting"), Some(&json!(false)));
        assert_eq!(config.options.get("ignorePaths"), Some(&json!(["generated/**"])));
    }

    #[test]
    fn test_load_yaml_with_overlays() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "strata.yaml",
            "rules:\n  eqeqeq: warn\noverlays:\n  - name: vue\n    files: ['**/*.vue']\n    rules:\n      curly: 'off'\n",
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert!(!config.options.contains_key(OVERLAYS_KEY));
        assert_eq!(config.overlays.len(), 1);
        assert_eq!(config.overlays[0].name.as_deref(), Some("vue"));

        let result = config.compose().unwrap();
        let resolved = result.resolve("app.vue").unwrap();
        assert_eq!(resolved.layers.last().map(String::as_str), Some("user/overrides"));
        assert!(resolved.layers.iter().any(|layer| layer == "vue"));
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "strata.toml",
            r#"
editorMode = true

[stylistic]
enabled = false
"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.options.get("stylistic"), Some(&json!({ "enabled": false })));
    }

    #[test]
    fn test_auto_discover() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();

        create_temp_config(temp_dir.path(), "strata.yml", "formatting: false\n");

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "strata.yml");
    }

    #[test]
    fn test_auto_discover_priority() {
        let temp_dir = TempDir::new().unwrap();

        create_temp_config(temp_dir.path(), "strata.toml", "formatting = false\n");
        create_temp_config(temp_dir.path(), "strata.yaml", "formatting: false\n");
        create_temp_config(temp_dir.path(), ".strata.json", r#"{"formatting": false}"#);

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), ".strata.json");
    }

    #[test]
    fn test_load_without_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        // Guard against a stray config above the temp dir
        if ConfigLoader::auto_discover(temp_dir.path()).unwrap().is_some() {
            return;
        }

        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert!(result.is_err());

        let err = ConfigLoader::load_from_file(Path::new("nonexistent.json")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path =
            create_temp_config(temp_dir.path(), ".strata.json", r#"{ invalid json "#);

        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "strata.yaml", "- a\n- b\n");

        assert!(ConfigLoader::load_from_file(&config_path).is_err());
    }

    #[test]
    fn test_invalid_overlays_entry() {
        let temp_dir = TempDir::new().unwrap();
        let config_path =
            create_temp_config(temp_dir.path(), ".strata.json", r#"{ "overlays": 3 }"#);

        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains(OVERLAYS_KEY));
    }
}
