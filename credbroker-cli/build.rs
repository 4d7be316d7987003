//! Build script for the credbroker CLI
//!
//! Embeds version metadata for `--version` output

use std::process::Command;

/// Entry point for the build script.
fn main() {
  embed_build_info();
  set_rerun_conditions();
}

/// Captures the short Git commit hash, when Git is available, as `GIT_HASH`.
fn embed_build_info() {
  if let Ok(output) = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output()
    && output.status.success()
  {
    let git_hash = String::from_utf8(output.stdout).unwrap_or_default().trim().to_string();
    println!("cargo:rustc-env=GIT_HASH={git_hash}");
  }
}

/// Re-run when this script or the checked-out commit changes.
fn set_rerun_conditions() {
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=../.git/HEAD");
}
