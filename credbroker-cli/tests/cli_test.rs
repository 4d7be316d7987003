use std::str;

use anyhow::Result;
use assert_cmd::cargo::cargo_bin_cmd;
use credbroker_test_utils::ConfigDirTestGuard;
use predicates::prelude::*;

const BASES: &str = "\
Domain Credentials
    https://artifacts.example.com
    git:https://git.example.com/build
  stray
Build Farm
    build-server
";

#[test]
fn test_help_lists_commands() {
  let assert = cargo_bin_cmd!("credbroker").arg("--help").assert().success();

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
  for command in ["acquire", "get", "set", "list", "prompt", "from-basis", "from-default", "list-bases", "set-hg"] {
    assert!(stdout.contains(command), "{command} missing from help output");
  }
}

#[test]
fn test_list_bases_prints_names_on_stdout() -> Result<()> {
  let guard = ConfigDirTestGuard::with_bases(BASES)?;

  let assert = cargo_bin_cmd!("credbroker")
    .env("NO_COLOR", "1")
    .env("CREDBROKER_CONFIG_DIR", guard.path())
    .arg("list-bases")
    .assert()
    .success()
    .stderr(predicate::str::contains("The following basis credentials exist in"));

  let stdout = str::from_utf8(&assert.get_output().stdout)?;
  assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["Build Farm", "Domain Credentials"]);

  Ok(())
}

#[test]
fn test_list_bases_reports_file_problems() -> Result<()> {
  let guard = ConfigDirTestGuard::with_bases("  orphan-target\nLonely\n")?;

  cargo_bin_cmd!("credbroker")
    .env("NO_COLOR", "1")
    .env("CREDBROKER_CONFIG_DIR", guard.path())
    .arg("list-bases")
    .assert()
    .success()
    .stderr(predicate::str::contains("Ignoring entry 'orphan-target' on line 1"))
    .stderr(predicate::str::contains("Basis credential Lonely has no credentials listed under it"));

  Ok(())
}

#[test]
fn test_list_bases_without_file() -> Result<()> {
  let guard = ConfigDirTestGuard::new()?;

  cargo_bin_cmd!("credbroker")
    .env("NO_COLOR", "1")
    .env("CREDBROKER_CONFIG_DIR", guard.path())
    .arg("list-bases")
    .assert()
    .success()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("No basis credentials"));

  Ok(())
}

#[test]
fn test_malformed_config_is_reported() -> Result<()> {
  let guard = ConfigDirTestGuard::new()?;
  guard.write_config("timeout_seconds = \"later\"\n")?;

  cargo_bin_cmd!("credbroker")
    .env("NO_COLOR", "1")
    .env("CREDBROKER_CONFIG_DIR", guard.path())
    .arg("list-bases")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to parse config"));

  Ok(())
}

#[test]
fn test_get_missing_target_fails() {
  let expected = if cfg!(windows) {
    "Failed to get credential 'credbroker-test-missing-target'"
  } else {
    "Failed to open the credential store"
  };

  cargo_bin_cmd!("credbroker")
    .args(["get", "credbroker-test-missing-target"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains(expected));
}

#[cfg(not(windows))]
#[test]
fn test_set_hg_reports_missing_store() {
  cargo_bin_cmd!("credbroker")
    .args(["set-hg", "https://hg.example.com/tools", "alice", "hg-pw"])
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("Failed to open the credential store"))
    .stderr(predicate::str::contains("hg-pw").not());
}

#[test]
fn test_prompt_needs_a_terminal() {
  cargo_bin_cmd!("credbroker")
    .args(["prompt", "--timeout", "1"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no interactive terminal"));
}

#[test]
fn test_completion_script() {
  cargo_bin_cmd!("credbroker")
    .args(["completion", "bash"])
    .assert()
    .success()
    .stdout(predicate::str::contains("credbroker"));
}
