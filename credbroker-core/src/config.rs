//! # Configuration Management
//!
//! Locates the per-user configuration directory and loads the broker
//! settings and the credential bases file from it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bases::CredentialBases;
use crate::store::Persistence;

/// Environment variable that replaces the platform config directory.
pub const CONFIG_DIR_ENV: &str = "CREDBROKER_CONFIG_DIR";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const BASES_FILE_NAME: &str = "credential-bases.txt";

pub const DEFAULT_TARGET_PREFIX: &str = "credbroker - ";
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 180;
pub const DEFAULT_CREDENTIAL_TYPE: &str = "Domain Credentials";

/// Where the broker keeps its configuration
#[derive(Debug, Clone)]
pub struct ConfigDirs {
  pub config_dir: PathBuf,
}

impl ConfigDirs {
  /// Resolve the config directory, honouring `CREDBROKER_CONFIG_DIR`.
  pub fn new() -> Result<Self> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
      debug!(config_dir = %Path::new(&dir).display(), "using config directory from environment");
      return Ok(Self::at(dir));
    }

    let proj_dirs =
      ProjectDirs::from("dev", "credbroker", "credbroker").context("Failed to determine project directories")?;
    Ok(Self::at(proj_dirs.config_dir()))
  }

  /// Use an explicit config directory
  pub fn at(config_dir: impl Into<PathBuf>) -> Self {
    Self {
      config_dir: config_dir.into(),
    }
  }

  pub fn config_dir(&self) -> &Path {
    &self.config_dir
  }

  pub fn config_path(&self) -> PathBuf {
    self.config_dir.join(CONFIG_FILE_NAME)
  }

  pub fn bases_path(&self) -> PathBuf {
    self.config_dir.join(BASES_FILE_NAME)
  }

  /// Load `config.toml`, or the defaults when it does not exist
  pub fn load_config(&self) -> Result<BrokerConfig> {
    let config_path = self.config_path();
    if !config_path.exists() {
      debug!(path = %config_path.display(), "no config file, using defaults");
      return Ok(BrokerConfig::default());
    }

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: BrokerConfig =
      toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
    anyhow::ensure!(
      config.persistence != Persistence::None,
      "Invalid config in {}: persistence must be session, local-machine or enterprise",
      config_path.display()
    );
    Ok(config)
  }

  /// Write `config.toml`, creating the directory if needed
  pub fn save_config(&self, config: &BrokerConfig) -> Result<()> {
    fs::create_dir_all(&self.config_dir)
      .with_context(|| format!("Failed to create config directory {}", self.config_dir.display()))?;

    let content = toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
    let config_path = self.config_path();
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))
  }

  /// Load the credential bases file; a missing file has no bases
  pub fn load_bases(&self) -> Result<CredentialBases> {
    Ok(CredentialBases::load(self.bases_path())?)
  }
}

/// Settings from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
  /// Prepended to a credential type to form its store target
  pub target_prefix: String,
  /// Prompt time bound; zero or negative waits forever
  pub timeout_seconds: i64,
  /// Persistence used when writing prompted credentials back
  pub persistence: Persistence,
  pub default_credential_type: String,
  /// Prompt instruction lines per credential type
  pub instructions: BTreeMap<String, Vec<String>>,
}

impl Default for BrokerConfig {
  fn default() -> Self {
    Self {
      target_prefix: DEFAULT_TARGET_PREFIX.to_string(),
      timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
      persistence: Persistence::default(),
      default_credential_type: DEFAULT_CREDENTIAL_TYPE.to_string(),
      instructions: BTreeMap::new(),
    }
  }
}

impl BrokerConfig {
  /// The store target for a broker-managed credential type
  pub fn storage_key(&self, credential_type: &str) -> String {
    format!("{}{credential_type}", self.target_prefix)
  }

  /// The credential type a broker target belongs to, if it is one
  pub fn credential_type_of<'a>(&self, target: &'a str) -> Option<&'a str> {
    target.strip_prefix(self.target_prefix.as_str())
  }

  pub fn instructions_for(&self, credential_type: &str) -> &[String] {
    self
      .instructions
      .get(credential_type)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }
}
