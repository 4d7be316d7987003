//! Environment variable management for testing
//!
//! Points config lookup at a per-test temporary directory and restores the
//! previous environment on drop. Environment changes are process-wide, so
//! tests using this guard must not run concurrently with other tests that
//! read the same variables.

use std::env;
use std::path::PathBuf;

use tempfile::TempDir;

/// Overrides `XDG_CONFIG_HOME` and `CREDBROKER_CONFIG_DIR` for a test
pub struct EnvTestGuard {
  /// The temporary directory backing the overrides
  pub temp_dir: TempDir,
  originals: Vec<(&'static str, Option<String>)>,
}

impl Default for EnvTestGuard {
  fn default() -> Self {
    Self::new()
  }
}

impl EnvTestGuard {
  pub const XDG_CONFIG_HOME: &'static str = "XDG_CONFIG_HOME";
  pub const CONFIG_DIR_OVERRIDE: &'static str = "CREDBROKER_CONFIG_DIR";

  /// Override XDG_CONFIG_HOME only; the broker resolves its directory
  /// under it.
  pub fn new() -> Self {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let config_home = temp_dir.path().join("config");
    std::fs::create_dir_all(&config_home).expect("Failed to create config directory");

    let mut guard = Self {
      temp_dir,
      originals: Vec::new(),
    };
    guard.set(Self::XDG_CONFIG_HOME, Some(config_home));
    guard.set(Self::CONFIG_DIR_OVERRIDE, None);
    guard
  }

  /// Override XDG_CONFIG_HOME and point CREDBROKER_CONFIG_DIR at
  /// [`Self::override_dir`].
  pub fn with_config_override() -> Self {
    let mut guard = Self::new();
    let override_dir = guard.override_dir();
    std::fs::create_dir_all(&override_dir).expect("Failed to create override directory");
    guard.set(Self::CONFIG_DIR_OVERRIDE, Some(override_dir));
    guard
  }

  /// Get the path to the XDG config directory
  pub fn config_home(&self) -> PathBuf {
    self.temp_dir.path().join("config")
  }

  /// The directory CREDBROKER_CONFIG_DIR points at, when overridden
  pub fn override_dir(&self) -> PathBuf {
    self.temp_dir.path().join("override")
  }

  fn set(&mut self, name: &'static str, value: Option<PathBuf>) {
    if !self.originals.iter().any(|(saved, _)| *saved == name) {
      self.originals.push((name, env::var(name).ok()));
    }
    unsafe {
      match value {
        Some(value) => env::set_var(name, value),
        None => env::remove_var(name),
      }
    }
  }
}

impl Drop for EnvTestGuard {
  fn drop(&mut self) {
    for (name, original) in self.originals.drain(..) {
      match original {
        Some(val) => unsafe {
          env::set_var(name, val);
        },
        None => unsafe {
          env::remove_var(name);
        },
      }
    }
  }
}
