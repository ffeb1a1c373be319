//! Application configuration loading.
//!
//! # Responsibility
//! - Read `config.toml` from an explicit path or the default search paths.
//! - Supply defaults for every missing key.
//! - Resolve the storage backend kind and store file path.
//!
//! # Invariants
//! - A missing config file (outside an explicit path) yields defaults.
//! - A present but unparseable file is an error, never silently ignored.

use crate::factory::BackendKind;
use crate::logging::default_log_level;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";
const HOME_CONFIG_DIR: &str = ".minicrm";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    UnsupportedStorageType(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: `{}`", path.display()),
            Self::Io { path, source } => {
                write!(f, "failed to read config file `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config file `{}`: {source}", path.display())
            }
            Self::UnsupportedStorageType(value) => write!(
                f,
                "invalid storage type `{value}` (valid options: {})",
                crate::factory::supported_types().join(", ")
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::NotFound(_) | Self::UnsupportedStorageType(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// One of `memory|json|sqlite` (`gorm` is read as `sqlite`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Store file for `json` and `sqlite`; ignored for `memory`.
    pub file_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory.as_str().to_string(),
            file_path: "contacts.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Mini CRM".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub app: AppInfo,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from `explicit` or the first existing default
    /// location, falling back to defaults when none exists.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from(path);
        }

        match default_search_paths().into_iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from(&path),
            None => {
                info!("event=config_load module=config status=ok source=defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses one TOML file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "event=config_load module=config status=ok source=file path={}",
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Rejects unknown storage types.
    pub fn validate(&self) -> ConfigResult<()> {
        self.storage_kind().map(|_| ())
    }

    pub fn storage_kind(&self) -> ConfigResult<BackendKind> {
        self.storage
            .kind
            .parse::<BackendKind>()
            .map_err(|_| ConfigError::UnsupportedStorageType(self.storage.kind.clone()))
    }

    /// Store file path, defaulting per backend when the configured path is
    /// empty.
    pub fn storage_file_path(&self) -> PathBuf {
        let configured = self.storage.file_path.trim();
        if !configured.is_empty() {
            return PathBuf::from(configured);
        }

        self.storage_kind()
            .ok()
            .and_then(BackendKind::default_file_name)
            .map(PathBuf::from)
            .unwrap_or_default()
    }
}

/// `./config.toml`, then `$HOME/.minicrm/config.toml`.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(HOME_CONFIG_DIR).join(CONFIG_FILE_NAME));
    }
    paths
}
