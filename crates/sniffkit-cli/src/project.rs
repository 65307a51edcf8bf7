//! Project discovery and configuration lookup.
//!
//! The project root is the nearest directory, starting at the checked path
//! and walking up, that holds a sniffkit config, a `composer.json` or a
//! `.git` directory. Without any marker the checked directory itself is the
//! root.
//!
//! The configuration comes from the first of:
//!
//! 1. `--config` (explicit path, not checked for existence here)
//! 2. `sniffkit.toml` or `.sniffkit.toml` in the project root
//! 3. `config.toml` in `$SNIFFKIT_CONFIG_DIR` (default `~/.sniffkit/`)
//! 4. built-in defaults
//!
//! PSR-4 checks read `composer.json` from the project root, so a check run
//! from a subdirectory sees the same autoload map as one run from the root.

use anyhow::{Context, Result};
use sniffkit_core::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Project config file names, in lookup order.
pub const CONFIG_NAMES: &[&str] = &["sniffkit.toml", ".sniffkit.toml"];

const COMPOSER_MANIFEST: &str = "composer.json";

const GLOBAL_CONFIG: &str = "config.toml";

/// Rule whose `base_path` option defaults to the project root.
const PSR4_RULE: &str = "psr4-autoload-consistency";

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the project root.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Path of the config file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            return Ok(Config::default());
        };
        if matches!(self, Self::Global(_)) {
            info!("Using global config: {}", path.display());
        }
        Config::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

/// The project a checked path belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Directory owning the checked path.
    pub root: PathBuf,
    /// `composer.json` in the root, when present.
    pub manifest: Option<PathBuf>,
    /// Selected configuration.
    pub config: ConfigSource,
}

impl Project {
    /// Discovers the project owning `path`.
    #[must_use]
    pub fn discover(path: &Path, explicit: Option<&Path>) -> Self {
        Self::discover_with(path, explicit, global_config_dir())
    }

    pub(crate) fn discover_with(
        path: &Path,
        explicit: Option<&Path>,
        global_dir: Option<PathBuf>,
    ) -> Self {
        let start = start_dir(path);
        let root = start
            .ancestors()
            .find(|dir| is_project_root(dir))
            .unwrap_or(&start)
            .to_path_buf();

        let manifest = Some(root.join(COMPOSER_MANIFEST)).filter(|p| p.is_file());
        let config = match explicit {
            Some(p) => ConfigSource::Explicit(p.to_path_buf()),
            None => CONFIG_NAMES
                .iter()
                .map(|name| root.join(name))
                .find(|p| p.is_file())
                .map(ConfigSource::Project)
                .or_else(|| {
                    global_dir
                        .map(|dir| dir.join(GLOBAL_CONFIG))
                        .filter(|p| p.is_file())
                        .map(ConfigSource::Global)
                })
                .unwrap_or(ConfigSource::Default),
        };

        debug!(root = %root.display(), config = ?config, "Discovered project");
        Self {
            root,
            manifest,
            config,
        }
    }

    /// Loads the configuration with project-relative settings resolved.
    ///
    /// A relative PSR-4 `base_path` is taken from the project root, and an
    /// absent one defaults to the root when it holds a `composer.json`.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = self.config.load()?;

        let configured = config
            .rule_config(PSR4_RULE)
            .and_then(|c| c.get_option::<String>("base_path"));
        let base = match configured {
            Some(base) => Some(self.root.join(base)),
            None => self.manifest.as_ref().map(|_| self.root.clone()),
        };
        if let Some(base) = base {
            config
                .rules
                .entry(PSR4_RULE.to_string())
                .or_default()
                .options
                .insert(
                    "base_path".to_string(),
                    toml::Value::String(base.display().to_string()),
                );
        }

        Ok(config)
    }
}

fn start_dir(path: &Path) -> PathBuf {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if path.is_file() {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        path
    }
}

fn is_project_root(dir: &Path) -> bool {
    CONFIG_NAMES.iter().any(|name| dir.join(name).is_file())
        || dir.join(COMPOSER_MANIFEST).is_file()
        || dir.join(".git").exists()
}

/// Global config directory: `$SNIFFKIT_CONFIG_DIR`, else `~/.sniffkit/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    match std::env::var_os("SNIFFKIT_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|h| h.join(".sniffkit")),
    }
}
