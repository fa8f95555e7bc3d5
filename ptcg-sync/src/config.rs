//! Sync configuration
//!
//! Resolves [`SyncConfig`] from command-line overrides, environment variables,
//! the TOML config file and compiled defaults, in that order.

use crate::services::remote_client::DEFAULT_BASE_URL;
use ptcg_common::config::{default_database_path, resolve_setting, TomlConfig};
use ptcg_common::Error;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DATABASE: &str = "PTCG_DATABASE";
pub const ENV_DATA_ROOT: &str = "PTCG_DATA_ROOT";
pub const ENV_LANGUAGE: &str = "PTCG_LANGUAGE";
pub const ENV_CONCURRENCY: &str = "PTCG_CONCURRENCY";
pub const ENV_REMOTE_ENABLED: &str = "PTCG_REMOTE_ENABLED";
pub const ENV_API_KEY: &str = "POKEMONTCG_IO_API_KEY";
pub const ENV_API_BASE_URL: &str = "PTCG_API_BASE_URL";
pub const ENV_REMOTE_INTERVAL_MS: &str = "PTCG_REMOTE_INTERVAL_MS";

pub const DEFAULT_DATA_ROOT: &str = "./data";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_REMOTE_INTERVAL_MS: u64 = 1000;

/// Values supplied on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub data_root: Option<PathBuf>,
    pub language: Option<String>,
    pub concurrency: Option<usize>,
    pub remote_enabled: Option<bool>,
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub database_path: PathBuf,
    pub data_root: PathBuf,
    pub language: String,
    pub concurrency: usize,
    pub remote_enabled: bool,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub remote_interval_ms: u64,
}

impl SyncConfig {
    /// Resolve every setting
    ///
    /// Fails on unparsable environment values and on a concurrency of 0.
    pub fn resolve(cli: ConfigOverrides, toml: TomlConfig) -> ptcg_common::Result<Self> {
        let database_path =
            resolve_setting(cli.database, ENV_DATABASE, toml.database, default_database_path())?;
        let data_root = resolve_setting(
            cli.data_root,
            ENV_DATA_ROOT,
            toml.data_root,
            PathBuf::from(DEFAULT_DATA_ROOT),
        )?;
        let language = resolve_setting(
            cli.language,
            ENV_LANGUAGE,
            toml.language,
            DEFAULT_LANGUAGE.to_string(),
        )?;
        let concurrency = resolve_setting(
            cli.concurrency,
            ENV_CONCURRENCY,
            toml.concurrency,
            DEFAULT_CONCURRENCY,
        )?;
        if concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }

        let remote_enabled =
            resolve_setting(cli.remote_enabled, ENV_REMOTE_ENABLED, toml.remote_enabled, false)?;
        let api_key = Some(resolve_setting(None, ENV_API_KEY, toml.api_key, String::new())?)
            .filter(|key| !key.trim().is_empty());
        let api_base_url = resolve_setting(
            None,
            ENV_API_BASE_URL,
            toml.api_base_url,
            DEFAULT_BASE_URL.to_string(),
        )?;
        let remote_interval_ms = resolve_setting(
            None,
            ENV_REMOTE_INTERVAL_MS,
            toml.remote_interval_ms,
            DEFAULT_REMOTE_INTERVAL_MS,
        )?;

        Ok(Self {
            database_path,
            data_root,
            language,
            concurrency,
            remote_enabled,
            api_key,
            api_base_url,
            remote_interval_ms,
        })
    }

    pub fn remote_interval(&self) -> Duration {
        Duration::from_millis(self.remote_interval_ms)
    }
}
