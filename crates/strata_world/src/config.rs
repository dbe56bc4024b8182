//! # Store Configuration
//!
//! Streaming radii, worker count and the optional save directory.
//! Loaded once from TOML at startup, or swapped at runtime through
//! [`ChunkStore::reconfigure`](crate::ChunkStore::reconfigure).
//!
//! ```toml
//! load_radius = 16
//! unload_radius = 20
//! worker_count = 4
//! save_directory = "saves/world"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};

/// Configuration for the chunk store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Chunks within this horizontal distance of the viewer are kept resident.
    pub load_radius: u32,
    /// Chunks beyond this horizontal distance are evicted.
    ///
    /// Must exceed `load_radius`; the gap prevents load/evict thrashing at
    /// the boundary.
    pub unload_radius: u32,
    /// Number of background generation workers.
    pub worker_count: usize,
    /// Where evicted dirty chunks are written and restored from.
    ///
    /// `None` disables persistence: evicted edits are lost.
    pub save_directory: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            load_radius: 16,
            unload_radius: 20,
            worker_count: 4,
            save_directory: None,
        }
    }
}

impl StoreConfig {
    /// Small radii and two workers, for tests and tools.
    #[must_use]
    pub const fn test() -> Self {
        Self {
            load_radius: 2,
            unload_radius: 4,
            worker_count: 2,
            save_directory: None,
        }
    }

    /// Returns this configuration with a save directory.
    #[must_use]
    pub fn with_save_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_directory = Some(dir.into());
        self
    }

    /// Parses and validates a TOML document.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for malformed TOML or unknown keys, and
    /// `InvalidConfig` if the values fail [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> WorldResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| WorldError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Checks the invariants between fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `unload_radius <= load_radius` or
    /// `worker_count == 0`.
    pub fn validate(&self) -> WorldResult<()> {
        if self.unload_radius <= self.load_radius {
            return Err(WorldError::InvalidConfig(format!(
                "unload_radius ({}) must exceed load_radius ({})",
                self.unload_radius, self.load_radius
            )));
        }
        if self.worker_count == 0 {
            return Err(WorldError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(StoreConfig::default().validate().is_ok());
        assert!(StoreConfig::test().validate().is_ok());
    }

    #[test]
    fn test_parse_full_document() {
        let config = StoreConfig::from_toml_str(
            r#"
            load_radius = 6
            unload_radius = 9
            worker_count = 3
            save_directory = "/tmp/strata"
            "#,
        )
        .unwrap();

        assert_eq!(config.load_radius, 6);
        assert_eq!(config.unload_radius, 9);
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.save_directory, Some(PathBuf::from("/tmp/strata")));
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = StoreConfig::from_toml_str("worker_count = 8").unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.load_radius, 16);
        assert_eq!(config.unload_radius, 20);
        assert!(config.save_directory.is_none());
    }

    #[test]
    fn test_rejects_inverted_radii() {
        let err = StoreConfig::from_toml_str("load_radius = 8\nunload_radius = 8").unwrap_err();
        assert!(matches!(err, WorldError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = StoreConfig {
            worker_count: 0,
            ..StoreConfig::test()
        };
        assert!(matches!(config.validate(), Err(WorldError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = StoreConfig::from_toml_str("view_distance = 4").unwrap_err();
        assert!(matches!(err, WorldError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("strata_missing_config_does_not_exist.toml");
        let err = StoreConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, WorldError::Io { .. }));
    }
}
