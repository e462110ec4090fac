//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is logged and skipped, never fatal.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

pub const DATA_FOLDER_ENV: &str = "BINGO_DATA_FOLDER";
pub const PORT_ENV: &str = "BINGO_PORT";
pub const BACKEND_ENV: &str = "BINGO_BACKEND";

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";

const APP_DIR: &str = "based-bingo";
const DATABASE_FILE: &str = "based-bingo.db";
const LOCAL_STATE_FILE: &str = "local-storage.json";

/// Which store implementation backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Nothing survives a restart
    Memory,
    /// Single JSON key-value file
    Local,
    #[default]
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "local" => Ok(StoreBackend::Local),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown store backend {:?} (expected memory, local or sqlite)",
                other
            ))),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub data_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_host: Option<String>,
    pub backend: Option<StoreBackend>,
}

impl TomlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load from the platform config location, falling back to an empty config
    pub fn load_default() -> Self {
        match default_config_file() {
            Some(path) => Self::load_or_warn(&path),
            None => Self::default(),
        }
    }

    /// Load `path`, logging and ignoring failures
    pub fn load_or_warn(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// First existing config file: `~/.config/based-bingo/config.toml`, then `/etc/based-bingo/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }
    None
}

/// Platform defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_folder: PathBuf,
    pub port: u16,
    pub bind_host: String,
    pub backend: StoreBackend,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_folder = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("./based_bingo_data"));

        Self {
            data_folder,
            port: DEFAULT_PORT,
            bind_host: DEFAULT_BIND_HOST.to_string(),
            backend: StoreBackend::default(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_host: Option<String>,
    pub backend: Option<StoreBackend>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingoConfig {
    pub data_folder: PathBuf,
    pub port: u16,
    pub bind_host: String,
    pub backend: StoreBackend,
}

impl BingoConfig {
    /// Merge command line, environment, TOML and compiled defaults
    ///
    /// Fails only when an environment variable is set to an unusable value.
    pub fn resolve(overrides: &ConfigOverrides, toml: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let data_folder = overrides
            .data_folder
            .clone()
            .or_else(|| std::env::var_os(DATA_FOLDER_ENV).map(PathBuf::from))
            .or_else(|| toml.data_folder.clone())
            .unwrap_or(defaults.data_folder);

        let port = match overrides.port {
            Some(port) => port,
            None => match env_value::<u16>(PORT_ENV)? {
                Some(port) => port,
                None => toml.port.unwrap_or(defaults.port),
            },
        };

        let backend = match overrides.backend {
            Some(backend) => backend,
            None => match env_value::<StoreBackend>(BACKEND_ENV)? {
                Some(backend) => backend,
                None => toml.backend.unwrap_or(defaults.backend),
            },
        };

        let bind_host = overrides
            .bind_host
            .clone()
            .or_else(|| toml.bind_host.clone())
            .unwrap_or(defaults.bind_host);

        Ok(Self {
            data_folder,
            port,
            bind_host,
            backend,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join(DATABASE_FILE)
    }

    pub fn local_state_path(&self) -> PathBuf {
        self.data_folder.join(LOCAL_STATE_FILE)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Create the data folder if it does not exist
    pub fn ensure_data_folder(&self) -> Result<()> {
        if !self.data_folder.exists() {
            std::fs::create_dir_all(&self.data_folder)?;
        }
        Ok(())
    }
}

fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid {}={:?}: {}", name, raw, e))),
        _ => Ok(None),
    }
}
