//! Configuration for the analysis and backup commands.
//!
//! Values come from three layers, later ones winning:
//! built-in defaults, a JSON config file, then command line flags.
//! The config file lives at `<config dir>/photokeep/config.json` unless
//! `--config` points somewhere else.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Name of the application folder under the user's config directory
const APP_DIR: &str = "photokeep";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root of the photo library to analyze
    pub library_root: PathBuf,

    /// Where CSV reports and figures are written
    pub output_dir: PathBuf,

    /// Lens reference table (Lens,FStopSteps)
    pub lens_database: PathBuf,

    /// Images rated below this are ignored
    pub min_rating: f64,

    /// Extraction workers; None = available parallelism
    pub workers: Option<usize>,

    /// Give up waiting on a single file after this many seconds
    pub extract_timeout_secs: u64,

    /// Backup defaults
    pub backup: BackupConfig,
}

/// Backup defaults used when the command line names no sources
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupConfig {
    /// Folders to copy (camera folder, catalog folder, ...)
    pub sources: Vec<PathBuf>,

    /// Delete destination files that no longer exist in the sources
    pub mirror: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            output_dir: PathBuf::from("analyzed_data"),
            lens_database: PathBuf::from("lens_database.csv"),
            min_rating: 1.0,
            workers: None,
            extract_timeout_secs: 30,
            backup: BackupConfig::default(),
        }
    }
}

/// The user's Pictures folder, or `../Camera` when the platform has none
fn default_library_root() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| PathBuf::from("../Camera"))
}

impl Config {
    /// Get the path where the config file is looked up by default
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(APP_DIR);
            path.push("config.json");
            path
        })
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and built-in defaults are used if nothing is there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::from_json_file(&path)?;
        tracing::debug!("loaded config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.min_rating.is_finite() || self.min_rating < 0.0 {
            return Err(Error::invalid("min_rating", self.min_rating));
        }
        if self.workers == Some(0) {
            return Err(Error::invalid("workers", 0));
        }
        if self.extract_timeout_secs == 0 {
            return Err(Error::invalid("extract_timeout_secs", 0));
        }
        Ok(())
    }

    /// Number of extraction workers to run
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Per-file extraction timeout
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_json(r#"{ "min_rating": 3, "backup": { "mirror": true } }"#)
            .unwrap();

        assert_eq!(config.min_rating, 3.0);
        assert!(config.backup.mirror);
        assert!(config.backup.sources.is_empty());
        assert_eq!(config.output_dir, PathBuf::from("analyzed_data"));
        assert_eq!(config.extract_timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.min_rating = -1.0;
        assert!(config.validate().is_err());

        config.min_rating = 1.0;
        config.workers = Some(0);
        assert!(config.validate().is_err());

        config.workers = Some(2);
        config.extract_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worker_count() {
        let mut config = Config::default();
        assert!(config.worker_count() >= 1);

        config.workers = Some(3);
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "output_dir": "/tmp/stats", "workers": 2 }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/stats"));
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        match Config::load(Some(&path)) {
            Err(Error::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
