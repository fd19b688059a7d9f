//! Configuration file handling for mmt.
//!
//! The configuration file is stored at `$MMT_HOME/config.json` and holds the URL of the record
//! store, the size and pace of the activity feed, and where the session token is kept.

use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_NAME: &str = "mmt";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN: &str = "token";
const CONFIG_JSON: &str = "config.json";
const MEMORY_STORE_JSON: &str = "memory_store.json";
const DEFAULT_API_URL: &str = "http://localhost:8000/";
const DEFAULT_ACTIVITY_LIMIT: usize = crate::api::DEFAULT_ACTIVITY_LIMIT;
const DEFAULT_CYCLE_MILLIS: u64 = 1000;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$MMT_HOME` and from there it loads `$MMT_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the home directory, its secrets subdirectory and an initial `config.json`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/mmt`
    /// - `api_url` - The base URL of the record store, e.g. `http://localhost:8000`. When `None`,
    ///   the local default is used.
    ///
    /// # Errors
    /// - Returns an error if the URL does not parse or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, api_url: Option<&str>) -> Result<Self> {
        let api_url_text = api_url.unwrap_or(DEFAULT_API_URL);
        let api_url = parse_api_url(api_url_text)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the mmt home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url_text.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that `mmt_home` and its config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(mmt_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = mmt_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The mmt home directory is missing, run 'mmt init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display())
        }

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// How many entries the recent-activity feed requests.
    pub fn activity_limit(&self) -> usize {
        self.config_file.activity_limit
    }

    /// The time between two steps of the activity feed's cycle.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.config_file.cycle_millis)
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Where the in-memory store keeps its contents between runs.
    pub fn memory_store_path(&self) -> PathBuf {
        self.root.join(MEMORY_STORE_JSON)
    }
}

fn parse_api_url(s: &str) -> Result<Url> {
    let url = Url::parse(s).with_context(|| format!("Invalid api_url '{s}'"))?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "The api_url must be http or https, got '{s}'"
    );
    Ok(url)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "mmt",
///   "config_version": 1,
///   "api_url": "http://localhost:8000/",
///   "activity_limit": 3,
///   "cycle_millis": 1000,
///   "token_path": ".secrets/token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "mmt"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the record store
    api_url: String,

    /// Number of entries in the recent-activity feed
    #[serde(default = "default_activity_limit")]
    activity_limit: usize,

    /// Milliseconds between two steps of the activity feed's cycle
    #[serde(default = "default_cycle_millis")]
    cycle_millis: u64,

    /// Path to the token file (optional, relative to the home directory or absolute).
    /// Defaults to $MMT_HOME/.secrets/token if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_activity_limit() -> usize {
    DEFAULT_ACTIVITY_LIMIT
}

fn default_cycle_millis() -> u64 {
    DEFAULT_CYCLE_MILLIS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: DEFAULT_API_URL.to_string(),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            cycle_millis: DEFAULT_CYCLE_MILLIS,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and validates it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if its values are unusable.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.activity_limit > 0,
            "The activity_limit in {} must be at least 1",
            path.display()
        );
        ensure!(
            config.cycle_millis > 0,
            "The cycle_millis in {} must be at least 1",
            path.display()
        );

        Ok(config)
    }

    /// Saves the ConfigFile to `path`.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the token path. If None, defaults to .secrets/token
    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN))
    }
}
