//! Configuration loading and root folder resolution
//!
//! Resolution priority, highest first:
//! 1. Command-line argument or environment variable (both parsed by the binary)
//! 2. TOML config file
//! 3. Compiled default

use crate::db::DatabaseOptions;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default HTTP port for the bands service
pub const DEFAULT_PORT: u16 = 5780;

/// Default bind host
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default event bus capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "artistalbum.db";

/// Contents of the optional TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub event_capacity: Option<usize>,
    pub busy_timeout_ms: Option<u64>,
    pub max_connections: Option<u32>,
}

/// Values given on the command line (or through their env vars)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind: String,
    pub event_capacity: usize,
    pub database: DatabaseOptions,
}

impl ServiceConfig {
    /// Merge CLI overrides over the TOML file over compiled defaults
    pub fn resolve(cli: CliOverrides, file: TomlConfig) -> Self {
        let defaults = DatabaseOptions::default();

        let root_folder = cli
            .root_folder
            .or(file.root_folder)
            .unwrap_or_else(default_root_folder);

        Self {
            root_folder,
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind: cli
                .bind
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            event_capacity: file
                .event_capacity
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_EVENT_CAPACITY),
            database: DatabaseOptions {
                busy_timeout_ms: file.busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
                max_connections: file
                    .max_connections
                    .filter(|c| *c > 0)
                    .unwrap_or(defaults.max_connections),
            },
        }
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    /// `host:port` string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Load the TOML config file
///
/// An explicit path must exist and parse. Without one, the platform config
/// locations are searched; a missing file yields defaults and a broken one is
/// logged and ignored so the service still starts.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return parse_config_file(path);
    }

    match find_config_file() {
        Some(path) => match parse_config_file(&path) {
            Ok(config) => {
                info!("Loaded config file: {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring unusable config file {}: {}", path.display(), e);
                Ok(TomlConfig::default())
            }
        },
        None => {
            debug!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn parse_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Search `<config_dir>/artistalbum/config.toml`, then `/etc/artistalbum/config.toml` on Linux
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("artistalbum").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/artistalbum/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/artistalbum (or /var/lib/artistalbum for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("artistalbum"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/artistalbum"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("artistalbum"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/artistalbum"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("artistalbum"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\artistalbum"))
    } else {
        PathBuf::from("./artistalbum_data")
    }
}
