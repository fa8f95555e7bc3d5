//! Configuration loading and value resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Contents of the optional `config.toml`
///
/// All keys are optional; missing keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// SQLite database file holding the catalog
    pub database: Option<PathBuf>,
    /// Root of the local snapshot tree (`cards/<language>/<set>.json`)
    pub data_root: Option<PathBuf>,
    /// Language tag used to pick snapshot documents
    pub language: Option<String>,
    /// Worker count per set
    pub concurrency: Option<usize>,
    /// Enable the remote lookup tier by default
    pub remote_enabled: Option<bool>,
    /// pokemontcg.io API key
    pub api_key: Option<String>,
    /// Base URL of the remote catalog API
    pub api_base_url: Option<String>,
    /// Minimum interval between remote requests, in milliseconds
    pub remote_interval_ms: Option<u64>,
}

/// Default configuration file location (`~/.config/ptcg/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ptcg").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the TOML config from an explicit path or the default location
///
/// An explicit path that does not exist is an error. A missing file at the
/// default location is not: an empty config is returned instead.
pub fn load_config_file(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => load_toml_config(&path),
        Some(path) => {
            debug!("No config file at {}, using defaults", path.display());
            Ok(TomlConfig::default())
        }
        None => Ok(TomlConfig::default()),
    }
}

/// Resolve one setting following CLI → ENV → TOML → default
///
/// An environment variable that is set but does not parse is a
/// configuration error rather than a silent fallback.
pub fn resolve_setting<T>(
    cli_arg: Option<T>,
    env_var_name: &str,
    toml_value: Option<T>,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg {
        return Ok(value);
    }

    // Priority 2: Environment variable
    if let Ok(raw) = std::env::var(env_var_name) {
        if !raw.trim().is_empty() {
            return raw.trim().parse::<T>().map_err(|e| {
                Error::Config(format!("{} has invalid value {:?}: {}", env_var_name, raw, e))
            });
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = toml_value {
        return Ok(value);
    }

    // Priority 4: Compiled default
    Ok(default)
}

/// Get OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ptcg").join("catalog.db"))
        .unwrap_or_else(|| PathBuf::from("./ptcg_data/catalog.db"))
}
