use credbroker::{
  BasesError, BrokerConfig, ConfigDirs, CredentialStore, MemoryGateway, Persistence, default_targets, update_from_basis,
  update_from_default,
};
use credbroker_test_utils::ConfigDirTestGuard;

const BASES: &str = "\
# Corporate login, shared by the artifact mirror and the build farm
Domain Credentials
    https://artifacts.example.com
    git:https://git.example.com/build

Artifactory
";

fn seeded_store() -> CredentialStore<MemoryGateway> {
  let store = CredentialStore::new(MemoryGateway::new());
  for (target, user) in [
    ("https://artifacts.example.com", "alice"),
    ("git:https://git.example.com/build", "alice"),
    ("git:https://git.example.com/docs", "alice"),
    ("alice@@https://hg.example.com/tools@Mercurial", "alice"),
    ("credbroker - Domain Credentials", "alice"),
    ("credbroker - Nexus", "alice"),
  ] {
    store
      .write_credential(target, user, "old", Persistence::LocalMachine)
      .unwrap();
  }
  store
}

#[test]
fn test_bases_file_drives_from_basis_update() {
  let guard = ConfigDirTestGuard::with_bases(BASES).unwrap();
  let dirs = ConfigDirs::at(guard.path());
  let config = dirs.load_config().unwrap();
  let bases = dirs.load_bases().unwrap();
  let store = seeded_store();

  let report = update_from_basis(&store, &config, &bases, "Domain Credentials", "alice", "new").unwrap();
  assert!(report.is_success());
  assert_eq!(report.updated.len(), 3);

  for target in [
    "credbroker - Domain Credentials",
    "https://artifacts.example.com",
    "git:https://git.example.com/build",
  ] {
    assert_eq!(store.read_credential(target).unwrap().password(), "new", "{target}");
  }
  assert_eq!(
    store.read_credential("git:https://git.example.com/docs").unwrap().password(),
    "old"
  );

  let persisted: Vec<_> = store
    .list_credentials()
    .unwrap()
    .into_iter()
    .filter(|info| report.updated.contains(&info.target))
    .map(|info| info.persistence)
    .collect();
  assert!(persisted.iter().all(|p| *p == Persistence::Enterprise));
}

#[test]
fn test_empty_basis_is_an_error_and_warned_about() {
  let guard = ConfigDirTestGuard::with_bases(BASES).unwrap();
  let dirs = ConfigDirs::at(guard.path());
  let bases = dirs.load_bases().unwrap();
  let store = seeded_store();
  let writes_before = store.gateway().write_calls();

  assert_eq!(bases.warnings().len(), 1);
  assert!(bases.warnings()[0].to_string().contains("Artifactory"));

  let err = update_from_basis(&store, &BrokerConfig::default(), &bases, "Artifactory", "alice", "new").unwrap_err();
  assert!(matches!(err, BasesError::NoEntries { .. }));
  assert!(err.to_string().contains("credential-bases.txt"));
  assert_eq!(store.gateway().write_calls(), writes_before);
}

#[test]
fn test_from_default_leaves_basis_credentials_alone() {
  let guard = ConfigDirTestGuard::with_bases(BASES).unwrap();
  let dirs = ConfigDirs::at(guard.path());
  let bases = dirs.load_bases().unwrap();
  let config = BrokerConfig::default();
  let store = seeded_store();

  let mut expected = vec![
    "alice@@https://hg.example.com/tools@Mercurial".to_string(),
    "credbroker - Nexus".to_string(),
    "git:https://git.example.com/docs".to_string(),
  ];
  expected.sort();
  let mut listed = default_targets(&store, &config, &bases, "alice").unwrap();
  listed.sort();
  assert_eq!(listed, expected);

  let report = update_from_default(&store, &config, &bases, "alice", "new").unwrap();
  let mut updated = report.updated.clone();
  updated.sort();
  assert_eq!(updated, expected);
  assert_eq!(
    store.read_credential("credbroker - Domain Credentials").unwrap().password(),
    "old"
  );
}

#[test]
fn test_custom_prefix_from_config() {
  let guard = ConfigDirTestGuard::with_bases(BASES).unwrap();
  guard.write_config("target_prefix = \"Intrepid - \"\n").unwrap();
  let dirs = ConfigDirs::at(guard.path());
  let config = dirs.load_config().unwrap();
  let bases = dirs.load_bases().unwrap();
  let store = CredentialStore::new(MemoryGateway::new());

  let report = update_from_basis(&store, &config, &bases, "Domain Credentials", "alice", "pw").unwrap();
  assert_eq!(report.updated[0], "Intrepid - Domain Credentials");
  assert!(store.read_credential("Intrepid - Domain Credentials").is_ok());
}
