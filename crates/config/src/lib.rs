//! Layered configuration for tome.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults (platform data directory, the user's documents and
//!    downloads).
//! 2. The first of `tome.toml`, `tome.yaml`, `tome.json` found in the platform
//!    configuration directory.
//! 3. A file passed explicitly (e.g. `--config`), which must exist.
//! 4. Environment variables prefixed with `TOME_` (`TOME_DATABASE`,
//!    `TOME_ROOTS='["/a", "/b"]'`, ...).

pub mod error;

use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "TOME_";
const FILE_STEM: &str = "tome";
const DATABASE_FILE: &str = "tome.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database: PathBuf,
    /// Directory under which extracted covers are stored.
    pub covers: PathBuf,
    /// Directories the local device index walks.
    pub roots: Vec<PathBuf>,
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let data = data_dir();
        let roots = UserDirs::new()
            .map(|dirs| [dirs.document_dir(), dirs.download_dir()].into_iter().flatten().map(Path::to_path_buf).collect())
            .unwrap_or_default();
        Self {
            database: data.join(DATABASE_FILE),
            covers: data,
            roots,
            log_level: "info".to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", FILE_STEM)
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(FILE_STEM))
}

impl Config {
    /// Load from every source, with `explicit` (if given) layered over the
    /// platform configuration file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_dir = project_dirs().map(|dirs| dirs.config_dir().to_path_buf());
        Self::load_from(config_dir.as_deref(), explicit)
    }

    /// As [`load`](Self::load), but looking for the implicit configuration
    /// file in `config_dir` instead of the platform default.
    pub fn load_from(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_dir.and_then(find_implicit) {
            debug!(path = %path.display(), "loading configuration file");
            figment = merge_file(figment, &path)?;
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            debug!(path = %path.display(), "loading explicit configuration file");
            figment = merge_file(figment, path)?;
        }
        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Paths must be absolute: the working directory of a scan is not
    /// something to depend on.
    pub fn validate(&self) -> Result<()> {
        if !self.database.is_absolute() {
            exn::bail!(ErrorKind::Invalid("database"));
        }
        if !self.covers.is_absolute() {
            exn::bail!(ErrorKind::Invalid("covers"));
        }
        if self.roots.iter().any(|root| !root.is_absolute()) {
            exn::bail!(ErrorKind::Invalid("roots"));
        }
        Ok(())
    }

    /// Scanning needs at least one root to walk.
    pub fn require_roots(&self) -> Result<&[PathBuf]> {
        if self.roots.is_empty() {
            exn::bail!(ErrorKind::Invalid("roots"));
        }
        Ok(&self.roots)
    }
}

fn find_implicit(dir: &Path) -> Option<PathBuf> {
    ["toml", "yaml", "yml", "json"]
        .into_iter()
        .map(|extension| dir.join(format!("{FILE_STEM}.{extension}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().map(|ext| ext.to_string_lossy().to_lowercase()).unwrap_or_default();
    Ok(match extension.as_str() {
        "toml" => figment.merge(Toml::file_exact(path)),
        "yaml" | "yml" => figment.merge(Yaml::file_exact(path)),
        "json" => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
