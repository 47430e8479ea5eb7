//! Configuration file handling.
//!
//! Loads configuration from `~/.config/camshot/config.toml` or a custom
//! path given on the command line. A missing file yields the defaults; a
//! present but malformed file is an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure for camshot.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Device index selected at startup
    #[serde(default)]
    pub device: u32,
    /// Mirror the preview horizontally (selfie mode)
    #[serde(default = "default_true")]
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            mirror: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Where snapshots go instead of the platform pictures directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse { path, source: e })
        } else {
            Ok(Config::default())
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("camshot")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.camera.device, 0);
        assert!(config.camera.mirror);
        assert!(config.output.directory.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[camera]\ndevice = 2").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.camera.device, 2);
        assert!(config.camera.mirror); // untouched default
    }

    #[test]
    fn test_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[camera]\ndevice = 1\nmirror = false\n\n[output]\ndirectory = \"/tmp/snaps\""
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.camera.device, 1);
        assert!(!config.camera.mirror);
        assert_eq!(config.output.directory, Some(PathBuf::from("/tmp/snaps")));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();

        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_default_path_ends_with_config() {
        let path = default_path();
        assert!(path.ends_with("camshot/config.toml"));
    }
}
