use credbroker::ConfigDirs;
use credbroker_test_utils::EnvTestGuard;

// Environment variables are process-wide, so both lookups live in one test.
#[test]
fn test_config_dir_resolution() {
  let env = EnvTestGuard::with_config_override();
  let dirs = ConfigDirs::new().unwrap();
  assert_eq!(dirs.config_dir(), env.override_dir());
  drop(env);

  let env = EnvTestGuard::new();
  let dirs = ConfigDirs::new().unwrap();
  if cfg!(target_os = "linux") {
    assert!(
      dirs.config_dir().starts_with(env.config_home()),
      "{} is not under {}",
      dirs.config_dir().display(),
      env.config_home().display()
    );
  }
  assert!(dirs.bases_path().ends_with("credential-bases.txt"));
}
