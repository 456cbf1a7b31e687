//! Configuration module for trf
//!
//! Persisted defaults for the command line. Configuration is stored in the
//! user's config directory; a missing file yields the defaults.

use crate::cache::CacheMode;
use crate::filter::{DEFAULT_LINES, MAX_JOBS};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TrfConfig {
    /// Concurrent extractions
    pub jobs: usize,

    /// Non-empty lines examined at each end of a file
    pub lines: usize,

    /// Cache mode: `""`, `r`, `w` or `rw`
    pub cache: CacheMode,

    /// Location of the cache database
    pub cache_file: PathBuf,

    /// Print debug trace lines
    pub debug: bool,

    /// Extractor specs used when none are given on the command line
    pub extractors: Vec<String>,
}

impl Default for TrfConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            lines: DEFAULT_LINES,
            cache: CacheMode::default(),
            cache_file: Self::default_cache_file(),
            debug: false,
            extractors: Vec::new(),
        }
    }
}

impl TrfConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("trf").join("config.toml"))
    }

    /// Default cache location, falling back to the working directory when no
    /// cache directory is known
    #[must_use]
    pub fn default_cache_file() -> PathBuf {
        dirs::cache_dir()
            .map_or_else(|| PathBuf::from(".trf-cache"), |dir| dir.join("trf").join("cache"))
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Concurrency clamped to `1..=MAX_JOBS`
    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs.clamp(1, MAX_JOBS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = TrfConfig::default();
        assert_eq!(config.jobs, 1);
        assert_eq!(config.lines, 3);
        assert_eq!(config.cache, CacheMode::ReadWrite);
        assert!(!config.debug);
        assert!(config.extractors.is_empty());
        assert!(config.cache_file.ends_with("cache"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrfConfig::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, TrfConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "jobs = 8\ncache = \"r\"\nextractors = [\"^(\\\\S+)@%Y-%m-%dT%H:%M:%S\"]\n",
        )
        .unwrap();

        let config = TrfConfig::load(&path).unwrap();
        assert_eq!(config.jobs, 8);
        assert_eq!(config.lines, 3);
        assert_eq!(config.cache, CacheMode::Read);
        assert_eq!(config.extractors, vec![r"^(\S+)@%Y-%m-%dT%H:%M:%S".to_string()]);
    }

    #[test]
    fn test_load_invalid_cache_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "cache = \"rwx\"\n").unwrap();

        assert!(TrfConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "jobs = 4\nlines = 5\ncache = \"\"\ncache_file = \"/var/tmp/trf.db\"\ndebug = true\n",
        )
        .unwrap();

        let config = TrfConfig::load(&path).unwrap();
        assert_eq!(
            config,
            TrfConfig {
                jobs: 4,
                lines: 5,
                cache: CacheMode::Off,
                cache_file: PathBuf::from("/var/tmp/trf.db"),
                debug: true,
                extractors: Vec::new(),
            }
        );
    }

    #[test]
    fn test_jobs_clamped() {
        let mut config = TrfConfig::default();
        config.jobs = 0;
        assert_eq!(config.jobs(), 1);
        config.jobs = 5000;
        assert_eq!(config.jobs(), MAX_JOBS);
    }
}
