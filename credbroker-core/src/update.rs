//! # Bulk Credential Updates
//!
//! Rewrite many stored credentials at once after a password change: either
//! everything listed under one basis, or every "default" credential that
//! belongs to a user and is not covered by any basis.

use tracing::{info, warn};

use crate::bases::{BasesError, CredentialBases};
use crate::config::BrokerConfig;
use crate::store::{CRED_TYPE_GENERIC, CredentialStore, NativeGateway, Persistence, StoreError, StoredCredentialInfo, WriteError};

const MERCURIAL_SEPARATOR: &str = "@@";
const MERCURIAL_SUFFIX: &str = "@Mercurial";
const GIT_PREFIX: &str = "git:";

/// Persistence for bulk-written credentials
pub const BULK_PERSISTENCE: Persistence = Persistence::Enterprise;

/// Target of the shared Mercurial keyring entry
pub const MERCURIAL_TARGET: &str = "Mercurial";

/// Persistence of Mercurial keyring entries
pub const MERCURIAL_PERSISTENCE: Persistence = Persistence::LocalMachine;

/// Which kind of stored credential a target is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
  /// `<user>@@<repo url>@Mercurial`
  Mercurial,
  /// `git:<url>`
  Git,
  /// `<prefix><credential type>`
  Broker,
}

/// Outcome of a bulk update. Individual write failures do not stop the run.
#[derive(Debug, Default)]
pub struct UpdateReport {
  pub updated: Vec<String>,
  pub failed: Vec<(String, WriteError)>,
}

impl UpdateReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }

  fn record(&mut self, target: &str, result: Result<(), WriteError>) {
    match result {
      Ok(()) => self.updated.push(target.to_string()),
      Err(err) => {
        warn!(target_name = target, error = %err, "failed to update credential");
        self.failed.push((target.to_string(), err));
      }
    }
  }
}

/// Classify a stored credential as belonging to `username`, if it does.
///
/// Only generic credentials qualify. A Mercurial entry's stored user name
/// is compared over the length of the user segment in its target, because
/// some clients store `<user>@@<url>` as the user name.
pub fn classify(info: &StoredCredentialInfo, username: &str, config: &BrokerConfig) -> Option<CredentialKind> {
  if info.kind != CRED_TYPE_GENERIC {
    return None;
  }

  if let Some(user_segment) = mercurial_user_segment(&info.target) {
    let len = user_segment.chars().count();
    return info
      .user_name
      .chars()
      .take(len)
      .eq(username.chars().take(len))
      .then_some(CredentialKind::Mercurial);
  }

  let kind = if info.target.starts_with(GIT_PREFIX) {
    CredentialKind::Git
  } else if config.credential_type_of(&info.target).is_some() {
    CredentialKind::Broker
  } else {
    return None;
  };
  (info.user_name == username).then_some(kind)
}

/// The user part of a `<user>@@<repo url>@Mercurial` target.
fn mercurial_user_segment(target: &str) -> Option<&str> {
  let separator = target.find(MERCURIAL_SEPARATOR)?;
  let suffix = target.find(MERCURIAL_SUFFIX)?;
  let url_start = separator + MERCURIAL_SEPARATOR.len();

  let well_formed = separator > 0 && suffix > url_start && suffix + MERCURIAL_SUFFIX.len() == target.len();
  well_formed.then(|| &target[..separator])
}

/// Stored credentials of `username` that no basis covers.
///
/// Git and Mercurial entries qualify unless some basis lists them; broker
/// entries qualify unless their credential type is itself a basis.
pub fn default_credentials<G: NativeGateway>(
  store: &CredentialStore<G>,
  config: &BrokerConfig,
  bases: &CredentialBases,
  username: &str,
) -> Result<Vec<StoredCredentialInfo>, StoreError> {
  let defaults = store
    .list_credentials()?
    .into_iter()
    .filter(|info| match classify(info, username, config) {
      Some(CredentialKind::Mercurial | CredentialKind::Git) => !bases.lists_target(&info.target),
      Some(CredentialKind::Broker) => config
        .credential_type_of(&info.target)
        .is_some_and(|credential_type| !bases.contains(credential_type)),
      None => false,
    })
    .collect();
  Ok(defaults)
}

/// Target names of [`default_credentials`]
pub fn default_targets<G: NativeGateway>(
  store: &CredentialStore<G>,
  config: &BrokerConfig,
  bases: &CredentialBases,
  username: &str,
) -> Result<Vec<String>, StoreError> {
  Ok(
    default_credentials(store, config, bases, username)?
      .into_iter()
      .map(|info| info.target)
      .collect(),
  )
}

/// Cache Mercurial keyring credentials for a repository.
///
/// Writes the shared `Mercurial` entry and the repository's
/// `<user>@@<url>@Mercurial` entry, both with the user name `<user>@@<url>`.
/// The first failed write stops the run.
pub fn store_mercurial<G: NativeGateway>(
  store: &CredentialStore<G>,
  url: &str,
  username: &str,
  password: &str,
) -> Result<(), WriteError> {
  let keyring_user = format!("{username}{MERCURIAL_SEPARATOR}{url}");
  let repository_target = format!("{keyring_user}{MERCURIAL_SUFFIX}");

  for target in [MERCURIAL_TARGET, repository_target.as_str()] {
    store.write_credential(target, &keyring_user, password, MERCURIAL_PERSISTENCE)?;
  }

  info!(username, url, "cached Mercurial credentials");
  Ok(())
}

/// Write the basis credential and every target listed under it.
///
/// # Errors
///
/// [`BasesError::NoEntries`] when the basis lists nothing; no credential is
/// written in that case.
pub fn update_from_basis<G: NativeGateway>(
  store: &CredentialStore<G>,
  config: &BrokerConfig,
  bases: &CredentialBases,
  basis: &str,
  username: &str,
  password: &str,
) -> Result<UpdateReport, BasesError> {
  let targets = bases.require_targets(basis)?;
  let mut report = UpdateReport::default();

  let basis_target = config.storage_key(basis);
  report.record(
    &basis_target,
    store.write_credential(&basis_target, username, password, BULK_PERSISTENCE),
  );
  for target in targets {
    report.record(target, store.write_credential(target, username, password, BULK_PERSISTENCE));
  }

  info!(basis, updated = report.updated.len(), failed = report.failed.len(), "updated credentials from basis");
  Ok(report)
}

/// Set a new password on every default credential of `username`, keeping
/// the user name already stored on each entry.
pub fn update_from_default<G: NativeGateway>(
  store: &CredentialStore<G>,
  config: &BrokerConfig,
  bases: &CredentialBases,
  username: &str,
  password: &str,
) -> Result<UpdateReport, StoreError> {
  let mut report = UpdateReport::default();
  for info in default_credentials(store, config, bases, username)? {
    report.record(
      &info.target,
      store.write_credential(&info.target, &info.user_name, password, BULK_PERSISTENCE),
    );
  }

  info!(updated = report.updated.len(), failed = report.failed.len(), "updated default credentials");
  Ok(report)
}

#[cfg(test)]
mod tests {
  use test_case::test_case;

  use super::*;
  use crate::store::MemoryGateway;

  fn info(target: &str, user_name: &str) -> StoredCredentialInfo {
    StoredCredentialInfo {
      target: target.to_string(),
      kind: CRED_TYPE_GENERIC,
      user_name: user_name.to_string(),
      persistence: Persistence::Enterprise,
      last_written: None,
    }
  }

  fn seeded_store() -> CredentialStore<MemoryGateway> {
    let store = CredentialStore::new(MemoryGateway::new());
    for (target, user) in [
      ("alice@@https://hg.example.com/repo@Mercurial", "alice@@https://hg.example.com/repo"),
      ("git:https://git.example.com", "alice"),
      ("git:https://listed.example.com", "alice"),
      ("credbroker - Domain Credentials", "alice"),
      ("credbroker - Artifactory", "alice"),
      ("git:https://bob.example.com", "bob"),
      ("unrelated-target", "alice"),
    ] {
      store
        .write_credential(target, user, "old-password", Persistence::LocalMachine)
        .unwrap();
    }
    store
  }

  fn bases() -> CredentialBases {
    CredentialBases::parse("Artifactory\n  git:https://listed.example.com\n", "test")
  }

  #[test_case("alice@@https://hg/repo@Mercurial", "alice", Some(CredentialKind::Mercurial); "mercurial plain user")]
  #[test_case("alice@@https://hg/repo@Mercurial", "alice@@https://hg/repo", Some(CredentialKind::Mercurial); "mercurial long user")]
  #[test_case("alice@@https://hg/repo@Mercurial", "alicia", None; "mercurial other user")]
  #[test_case("@@https://hg/repo@Mercurial", "alice", None; "mercurial missing user")]
  #[test_case("alice@@@Mercurial", "alice", None; "mercurial missing url")]
  #[test_case("git:https://git.example.com", "alice", Some(CredentialKind::Git); "git")]
  #[test_case("credbroker - Artifactory", "alice", Some(CredentialKind::Broker); "broker")]
  #[test_case("https://plain.example.com", "alice", None; "unrelated")]
  fn test_classify(target: &str, stored_user: &str, expected: Option<CredentialKind>) {
    let config = BrokerConfig::default();
    assert_eq!(classify(&info(target, stored_user), "alice", &config), expected);
  }

  #[test]
  fn test_classify_ignores_non_generic_credentials() {
    let config = BrokerConfig::default();
    let mut domain = info("git:https://git.example.com", "alice");
    domain.kind = 2;
    assert_eq!(classify(&domain, "alice", &config), None);
  }

  #[test]
  fn test_default_targets_skip_bases_and_other_users() {
    let store = seeded_store();
    let config = BrokerConfig::default();

    let mut targets = default_targets(&store, &config, &bases(), "alice").unwrap();
    targets.sort();
    assert_eq!(
      targets,
      vec![
        "alice@@https://hg.example.com/repo@Mercurial".to_string(),
        "credbroker - Domain Credentials".to_string(),
        "git:https://git.example.com".to_string(),
      ]
    );
  }

  #[test]
  fn test_update_from_basis_writes_basis_and_listed_targets() {
    let store = seeded_store();
    let config = BrokerConfig::default();

    let report = update_from_basis(&store, &config, &bases(), "Artifactory", "svc-build", "new-password").unwrap();
    assert!(report.is_success());
    assert_eq!(
      report.updated,
      vec!["credbroker - Artifactory".to_string(), "git:https://listed.example.com".to_string()]
    );

    let listed = store.read_credential("git:https://listed.example.com").unwrap();
    assert_eq!((listed.username(), listed.password()), ("svc-build", "new-password"));
    let untouched = store.read_credential("git:https://git.example.com").unwrap();
    assert_eq!(untouched.password(), "old-password");
  }

  #[test]
  fn test_update_from_unknown_basis_writes_nothing() {
    let store = seeded_store();
    let writes_before = store.gateway().write_calls();

    let err = update_from_basis(&store, &BrokerConfig::default(), &bases(), "Nope", "alice", "pw").unwrap_err();
    assert!(matches!(err, BasesError::NoEntries { .. }));
    assert_eq!(store.gateway().write_calls(), writes_before);
  }

  #[test]
  fn test_update_from_default_keeps_stored_user_names() {
    let store = seeded_store();
    let config = BrokerConfig::default();

    let report = update_from_default(&store, &config, &bases(), "alice", "new-password").unwrap();
    assert_eq!(report.updated.len(), 3);

    let mercurial = store
      .read_credential("alice@@https://hg.example.com/repo@Mercurial")
      .unwrap();
    assert_eq!(mercurial.username(), "alice@@https://hg.example.com/repo");
    assert_eq!(mercurial.password(), "new-password");
    assert_eq!(
      store.read_credential("credbroker - Artifactory").unwrap().password(),
      "old-password"
    );
    assert_eq!(
      store.read_credential("git:https://bob.example.com").unwrap().password(),
      "old-password"
    );
  }

  #[test]
  fn test_store_mercurial_writes_both_keyring_entries() {
    let store = CredentialStore::new(MemoryGateway::new());
    store_mercurial(&store, "https://hg.example.com/tools", "alice", "hg-pw").unwrap();

    for target in ["Mercurial", "alice@@https://hg.example.com/tools@Mercurial"] {
      let credential = store.read_credential(target).unwrap();
      assert_eq!(credential.username(), "alice@@https://hg.example.com/tools", "{target}");
      assert_eq!(credential.password(), "hg-pw", "{target}");
    }
    assert!(
      store
        .list_credentials()
        .unwrap()
        .iter()
        .all(|info| info.persistence == Persistence::LocalMachine)
    );

    let targets = default_targets(&store, &BrokerConfig::default(), &bases(), "alice").unwrap();
    assert_eq!(targets, vec!["alice@@https://hg.example.com/tools@Mercurial".to_string()]);
  }

  #[test]
  fn test_store_mercurial_stops_at_first_failure() {
    let store = CredentialStore::new(MemoryGateway::new());
    store.gateway().fail_writes_with(Some(5));

    let err = store_mercurial(&store, "https://hg.example.com/tools", "alice", "hg-pw").unwrap_err();
    assert!(matches!(err, WriteError::Store(StoreError::WriteDenied { ref target, code: 5 }) if target == "Mercurial"));
    assert_eq!(store.gateway().write_calls(), 1);
  }

  #[test]
  fn test_update_continues_past_failed_writes() {
    let store = seeded_store();
    store.gateway().fail_writes_with(Some(5));

    let report = update_from_default(&store, &BrokerConfig::default(), &bases(), "alice", "pw").unwrap();
    assert!(!report.is_success());
    assert!(report.updated.is_empty());
    assert_eq!(report.failed.len(), 3);
  }
}
