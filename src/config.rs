//! Autoloader Configuration
//!
//! Search paths and extensions can be declared in a TOML file instead of
//! being added one call at a time:
//!
//! ```toml
//! # autoload.toml
//! paths = ["./lib", "inc"]
//! extensions = [".class.php", "inc"]
//!
//! # Keep the seeded ".php" extension (default: true)
//! default_extensions = true
//!
//! # Register on the resolver chain right away (default: false)
//! enabled = true
//! ```
//!
//! Values are normalized when the autoloader is built, so `"./lib"` and
//! `"./lib/"` are equivalent here too.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AutoloadError, AutoloadResult};

/// Conventional configuration file name.
pub const CONFIG_FILE_NAME: &str = "autoload.toml";

/// Parsed autoloader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoloadConfig {
    /// Search paths, highest priority first.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Additional extensions, tried after the default one.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Seed the extension list with `.php`.
    #[serde(default = "default_true")]
    pub default_extensions: bool,

    /// Register the autoloader on its chain once built.
    #[serde(default)]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AutoloadConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            extensions: Vec::new(),
            default_extensions: true,
            enabled: false,
        }
    }
}

impl AutoloadConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> AutoloadResult<Self> {
        toml::from_str(content).map_err(|e| AutoloadError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> AutoloadResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| AutoloadError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load `autoload.toml` from `dir` if present.
    pub fn load_from_dir(dir: &Path) -> AutoloadResult<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full() {
        let config = AutoloadConfig::from_toml_str(
            r#"
paths = ["./lib", "inc"]
extensions = [".class.php", "inc"]
default_extensions = false
enabled = true
"#,
        )
        .unwrap();

        assert_eq!(config.paths, vec!["./lib", "inc"]);
        assert_eq!(config.extensions, vec![".class.php", "inc"]);
        assert!(!config.default_extensions);
        assert!(config.enabled);
    }

    #[test]
    fn test_parse_defaults() {
        let config = AutoloadConfig::from_toml_str("").unwrap();
        assert_eq!(config, AutoloadConfig::default());
        assert!(config.default_extensions);
        assert!(!config.enabled);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            AutoloadConfig::from_toml_str("paths = 3"),
            Err(AutoloadError::Config(_))
        ));
        assert!(matches!(
            AutoloadConfig::from_toml_str("unknown = true"),
            Err(AutoloadError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(AutoloadConfig::load_from_dir(dir.path()).unwrap(), None);

        fs::write(dir.path().join(CONFIG_FILE_NAME), "paths = [\"lib\"]\n").unwrap();
        let config = AutoloadConfig::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.paths, vec!["lib"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = AutoloadConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, AutoloadError::Io { .. }));
    }
}
