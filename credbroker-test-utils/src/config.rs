//! Configuration directory management for testing
//!
//! A throwaway directory laid out like the broker's config directory. It does
//! not touch the environment; hand [`ConfigDirTestGuard::path`] to the code
//! under test or to a child process via `CREDBROKER_CONFIG_DIR`.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const BASES_FILE_NAME: &str = "credential-bases.txt";

/// A temporary config directory
pub struct ConfigDirTestGuard {
  temp_dir: TempDir,
}

impl ConfigDirTestGuard {
  /// Create an empty config directory
  pub fn new() -> anyhow::Result<Self> {
    let temp_dir = TempDir::new().map_err(|e| anyhow::anyhow!("Failed to create temporary directory: {e}"))?;
    Ok(Self { temp_dir })
  }

  /// Create a config directory holding the given bases file
  pub fn with_bases(bases: &str) -> anyhow::Result<Self> {
    let guard = Self::new()?;
    guard.write_bases(bases)?;
    Ok(guard)
  }

  pub fn path(&self) -> &Path {
    self.temp_dir.path()
  }

  pub fn config_path(&self) -> PathBuf {
    self.path().join(CONFIG_FILE_NAME)
  }

  pub fn bases_path(&self) -> PathBuf {
    self.path().join(BASES_FILE_NAME)
  }

  /// Write `config.toml`
  pub fn write_config(&self, content: &str) -> anyhow::Result<()> {
    fs::write(self.config_path(), content).map_err(|e| anyhow::anyhow!("Failed to write config file: {e}"))
  }

  /// Write `credential-bases.txt`
  pub fn write_bases(&self, content: &str) -> anyhow::Result<()> {
    fs::write(self.bases_path(), content).map_err(|e| anyhow::anyhow!("Failed to write bases file: {e}"))
  }
}
