use crate::errors::Result;
use crate::replacer::{DEFAULT_CODE_EXTENSIONS, DEFAULT_SKIP_DIRS};
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "webpify.yaml";

/// Settings read from `webpify.yaml`. Every field is optional.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default WebP quality (0-100).
    #[serde(default)]
    pub quality: Option<u8>,
    /// Exclusion patterns applied to every run.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Extensions searched for image references.
    #[serde(default)]
    pub code_extensions: Option<Vec<String>>,
    /// Directory names never searched for references.
    #[serde(default)]
    pub skip_dirs: Option<Vec<String>>,
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub quality: Option<u8>,
    pub exclude: Vec<String>,
    pub code_extensions: Vec<String>,
    pub skip_dirs: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(FileConfig::default())
    }
}

impl Settings {
    /// The exclusion patterns for a non-interactive run.
    ///
    /// Patterns given on the command line replace the configured list; the
    /// configured list only applies when none were given.
    pub fn exclusions_with(&self, flags: Vec<String>) -> Vec<String> {
        if flags.iter().any(|p| !p.trim().is_empty()) {
            flags
        } else {
            self.exclude.clone()
        }
    }
}

impl From<FileConfig> for Settings {
    fn from(cfg: FileConfig) -> Self {
        Self {
            quality: cfg.quality,
            exclude: cfg.exclude,
            code_extensions: cfg.code_extensions.unwrap_or_else(|| {
                DEFAULT_CODE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
            }),
            skip_dirs: cfg
                .skip_dirs
                .unwrap_or_else(|| DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect()),
        }
    }
}

/// A utility for locating and loading the configuration file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds an explicitly requested configuration file.
    ///
    /// The search order is:
    /// 1. `config_path` as given (absolute, or relative to the current directory).
    /// 2. `config_path` relative to `working_dir`.
    /// 3. `config_path` inside the user config directory (`~/.config/webpify`).
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_working_dir = working_dir.join(config_path);
        if in_working_dir.exists() {
            return Ok(in_working_dir);
        }

        let mut tried_locations = vec![
            config_path.display().to_string(),
            in_working_dir.display().to_string(),
        ];

        if let Some(user_dir) = user_config_dir() {
            let user_config = user_dir.join(config_path);
            if user_config.exists() {
                return Ok(user_config);
            }
            tried_locations.push(user_config.display().to_string());
        }

        Err(format!(
            "Config file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried_locations.join("\n  - ")
        )
        .into())
    }

    /// Looks for `webpify.yaml` without an explicit path; absence is not an error.
    pub fn discover(working_dir: &Path) -> Option<PathBuf> {
        let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME), working_dir.join(CONFIG_FILE_NAME)];
        if let Some(user_dir) = user_config_dir() {
            locations.push(user_dir.join(CONFIG_FILE_NAME));
        }
        locations.into_iter().find(|p| p.is_file())
    }

    /// Loads a `FileConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<FileConfig> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Resolves the settings for a run: the explicit file if given, otherwise a
    /// discovered `webpify.yaml`, otherwise built-in defaults.
    pub fn resolve(config_path: Option<&Path>, working_dir: &Path) -> Result<Settings> {
        let path = match config_path {
            Some(p) => Some(Self::find_config(p, working_dir)?),
            None => Self::discover(working_dir),
        };

        match path {
            Some(path) => {
                debug!("using config file {}", path.display());
                let cfg = Self::load(&path)?;
                if let Some(q) = cfg.quality {
                    if q > 100 {
                        return Err(format!("quality must be between 0 and 100, got {q}").into());
                    }
                }
                Ok(Settings::from(cfg))
            }
            None => Ok(Settings::default()),
        }
    }
}

fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("webpify"))
}
