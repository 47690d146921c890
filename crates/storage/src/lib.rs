//! On-disk storage for canvas settings
//!
//! The configuration is written as a versioned JSON envelope under the
//! platform's local data directory. A missing file means defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use takeoff_core::CanvasConfig;
use tracing::debug;

const CONFIG_SCHEMA_VERSION: u32 = 1;
const CONFIG_FILE_NAME: &str = "canvas-config.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported config schema version {found}")]
    UnsupportedVersion { found: u32 },
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: CanvasConfig,
}

impl ConfigStore {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Takeoff", "Takeoff")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the saved configuration, or defaults when nothing was saved
    pub fn load(&self) -> Result<CanvasConfig, StorageError> {
        let path = self.config_path();
        if !path.exists() {
            debug!(path = %path.display(), "no saved canvas config, using defaults");
            return Ok(CanvasConfig::default());
        }

        load_file(&path)
    }

    pub fn save(&self, config: &CanvasConfig) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: config.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.config_path(), bytes)?;
        debug!(root = %self.root.display(), "canvas config saved");
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}

/// Read a configuration envelope from an explicit path
pub fn load_file(path: &Path) -> Result<CanvasConfig, StorageError> {
    let bytes = fs::read(path)?;
    let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;

    if envelope.version != CONFIG_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion { found: envelope.version });
    }

    Ok(envelope.config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use takeoff_core::UnitCosts;

    #[test]
    fn config_round_trip() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = ConfigStore::with_root(temp.path().join("nested"));

        let config = CanvasConfig {
            default_unit: "m".to_string(),
            rescale_on_calibration: false,
            unit_costs: UnitCosts { count: 85.0, linear: 12.5, area: 3.25 },
            ..CanvasConfig::default()
        };

        store.save(&config).expect("save should succeed");
        let loaded = store.load().expect("load should succeed");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_defaults_when_file_absent() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = ConfigStore::with_root(temp.path());

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded, CanvasConfig::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("partial.json");
        fs::write(&path, r#"{"version":1,"config":{"max_zoom":8.0}}"#).expect("write fixture");

        let loaded = load_file(&path).expect("load should succeed");

        assert_eq!(loaded.max_zoom, 8.0);
        assert_eq!(loaded.min_zoom, CanvasConfig::default().min_zoom);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"version":99,"config":{}}"#).expect("write fixture");

        let result = ConfigStore::with_root(temp.path()).load();

        assert!(matches!(result, Err(StorageError::UnsupportedVersion { found: 99 })));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        fs::write(temp.path().join(CONFIG_FILE_NAME), "{not json").expect("write fixture");

        let result = ConfigStore::with_root(temp.path()).load();

        assert!(matches!(result, Err(StorageError::Serde(_))));
    }
}
