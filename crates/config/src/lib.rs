//! Layered configuration for folio.
//!
//! Values are merged, later sources winning:
//!
//! 1. built-in defaults
//! 2. a TOML or YAML file (by extension, TOML otherwise)
//! 3. `FOLIO_`-prefixed environment variables, with `__` separating nested
//!    keys: `FOLIO_ARCHIVE_CACHE__CAPACITY=50`

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::OptionExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use folio_archive::CacheOptions;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "FOLIO_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "library.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database holding books, pages and page hashes.
    pub database: PathBuf,
    pub archive_cache: ArchiveCacheConfig,
    pub thumbnails: ThumbnailConfig,
}

/// Open archive handles kept for streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveCacheConfig {
    pub capacity: usize,
    /// Handles unused for this long are closed. At least 1.
    pub idle_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Longest side used when a thumbnail is requested without a size. No
    /// resizing when unset.
    pub default_size: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        let database = match project_dirs() {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILE),
            None => PathBuf::from(DATABASE_FILE),
        };
        Self { database, archive_cache: ArchiveCacheConfig::default(), thumbnails: ThumbnailConfig::default() }
    }
}

impl Default for ArchiveCacheConfig {
    fn default() -> Self {
        let defaults = CacheOptions::default();
        Self { capacity: defaults.capacity.get(), idle_seconds: defaults.idle.as_secs() }
    }
}

impl Config {
    /// Load from defaults, `file` (or the per-user config file when `None`)
    /// and the environment. A missing file is not an error.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file.map(Path::to_path_buf).or_else(default_config_file);
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), exists = file.exists(), "reading configuration file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|err| ErrorKind::Load(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive_cache.capacity == 0 {
            exn::bail!(ErrorKind::Invalid("archive_cache.capacity", "must be at least 1".into()));
        }
        // Zero would close handles between every request.
        if self.archive_cache.idle_seconds == 0 {
            exn::bail!(ErrorKind::Invalid("archive_cache.idle_seconds", "must be at least 1".into()));
        }
        if self.thumbnails.default_size == Some(0) {
            exn::bail!(ErrorKind::Invalid("thumbnails.default_size", "must be at least 1".into()));
        }
        Ok(())
    }

    /// Options for the archive handle cache.
    pub fn cache_options(&self) -> Result<CacheOptions> {
        let capacity = NonZeroUsize::new(self.archive_cache.capacity)
            .ok_or_raise(|| ErrorKind::Invalid("archive_cache.capacity", "must be at least 1".into()))?;
        Ok(CacheOptions { capacity, idle: Duration::from_secs(self.archive_cache.idle_seconds) })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "folio")
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
