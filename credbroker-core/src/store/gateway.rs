//! # Native Store Gateway
//!
//! The seam between the broker and an OS credential store. A gateway moves
//! records in and out of the store and reports failures with the store's
//! error code; decoding of the returned record is left to the caller.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::trace;

use super::error::{ERROR_NOT_FOUND, StoreError};
use super::record::{
  CRED_TYPE_GENERIC, CallerOwnedRecord, Persistence, StoreOwnedRecord, StoredCredentialInfo, strip_terminator,
};

/// Access to an OS credential store holding generic credentials.
pub trait NativeGateway {
  /// Record type returned by [`NativeGateway::read`]; dropping it releases
  /// the store's memory.
  type Record: StoreOwnedRecord;

  /// Read the generic credential filed under `target`.
  ///
  /// # Errors
  ///
  /// [`StoreError::NotFoundOrDenied`] with the store's error code.
  fn read(&self, target: &str) -> Result<Self::Record, StoreError>;

  /// Create or overwrite the entry described by `record`. The store only
  /// reads from the record for the duration of the call.
  ///
  /// # Errors
  ///
  /// [`StoreError::WriteDenied`] with the store's error code.
  fn write(&self, record: &CallerOwnedRecord) -> Result<(), StoreError>;

  /// Summaries of every credential visible to the current user.
  ///
  /// # Errors
  ///
  /// [`StoreError::EnumerationFailed`] with the store's error code.
  fn enumerate(&self) -> Result<Vec<StoredCredentialInfo>, StoreError>;
}

/// An in-process credential store with the same record semantics as the OS
/// store: UTF-16 text, UTF-16LE secret blobs, last write wins.
///
/// Used by tests and dry runs. Clones share the same entries. The gateway
/// counts records it has handed out and not yet had back, so leaks are
/// observable.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
  inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
  entries: BTreeMap<String, MemoryEntry>,
  outstanding: usize,
  writes: usize,
  write_failure: Option<u32>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
  kind: u32,
  target_name: Vec<u16>,
  user_name: Option<Vec<u16>>,
  blob: Vec<u8>,
  persistence: Persistence,
  last_written: u64,
}

impl MemoryGateway {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records returned by `read` that have not been dropped yet
  pub fn outstanding_records(&self) -> usize {
    self.lock().outstanding
  }

  /// Number of write calls that reached the store
  pub fn write_calls(&self) -> usize {
    self.lock().writes
  }

  /// Make every following write fail with `code`; `None` restores writes
  pub fn fail_writes_with(&self, code: Option<u32>) {
    self.lock().write_failure = code;
  }

  /// File a raw entry, bypassing encoding. Lets tests plant records the
  /// broker itself would never write.
  pub fn insert_raw(&self, target: &str, kind: u32, user_name: Option<Vec<u16>>, blob: Vec<u8>) {
    let entry = MemoryEntry {
      kind,
      target_name: target.encode_utf16().collect(),
      user_name,
      blob,
      persistence: Persistence::Enterprise,
      last_written: super::record::utc_to_filetime(Utc::now()),
    };
    self.lock().entries.insert(target.to_string(), entry);
  }

  fn lock(&self) -> MutexGuard<'_, MemoryState> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl NativeGateway for MemoryGateway {
  type Record = MemoryRecord;

  fn read(&self, target: &str) -> Result<MemoryRecord, StoreError> {
    let mut state = self.lock();
    let entry = state
      .entries
      .get(target)
      .filter(|entry| entry.kind == CRED_TYPE_GENERIC)
      .cloned()
      .ok_or_else(|| StoreError::NotFoundOrDenied {
        target: target.to_string(),
        code: ERROR_NOT_FOUND,
      })?;
    state.outstanding += 1;
    trace!(target_name = target, "memory store handed out a record");

    Ok(MemoryRecord {
      entry,
      owner: Arc::clone(&self.inner),
    })
  }

  fn write(&self, record: &CallerOwnedRecord) -> Result<(), StoreError> {
    let mut state = self.lock();
    state.writes += 1;

    let target = record.target_display();
    if let Some(code) = state.write_failure {
      return Err(StoreError::WriteDenied { target, code });
    }

    let entry = MemoryEntry {
      kind: CRED_TYPE_GENERIC,
      target_name: strip_terminator(record.target_name()).to_vec(),
      user_name: Some(strip_terminator(record.user_name()).to_vec()),
      blob: record.blob().to_vec(),
      persistence: record.persistence(),
      last_written: super::record::utc_to_filetime(Utc::now()),
    };
    state.entries.insert(target, entry);
    Ok(())
  }

  fn enumerate(&self) -> Result<Vec<StoredCredentialInfo>, StoreError> {
    let state = self.lock();
    Ok(
      state
        .entries
        .iter()
        .map(|(target, entry)| StoredCredentialInfo {
          target: target.clone(),
          kind: entry.kind,
          user_name: entry
            .user_name
            .as_deref()
            .map(String::from_utf16_lossy)
            .unwrap_or_default(),
          persistence: entry.persistence,
          last_written: super::record::filetime_to_utc(entry.last_written),
        })
        .collect(),
    )
  }
}

/// A record handed out by [`MemoryGateway`]. Dropping it returns it to the
/// gateway.
#[derive(Debug)]
pub struct MemoryRecord {
  entry: MemoryEntry,
  owner: Arc<Mutex<MemoryState>>,
}

impl StoreOwnedRecord for MemoryRecord {
  fn kind(&self) -> u32 {
    self.entry.kind
  }

  fn target_name_units(&self) -> &[u16] {
    &self.entry.target_name
  }

  fn user_name_units(&self) -> Option<&[u16]> {
    self.entry.user_name.as_deref()
  }

  fn secret_blob(&self) -> &[u8] {
    &self.entry.blob
  }

  fn persistence(&self) -> Persistence {
    self.entry.persistence
  }
}

impl Drop for MemoryRecord {
  fn drop(&mut self) {
    let mut state = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
    state.outstanding = state.outstanding.saturating_sub(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_missing_target_reports_not_found() {
    let gateway = MemoryGateway::new();
    let err = gateway.read("unknown-target").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(gateway.outstanding_records(), 0);
  }

  #[test]
  fn test_records_are_counted_until_dropped() {
    let gateway = MemoryGateway::new();
    let record = CallerOwnedRecord::new("build-server", "alice", "s3cr3t", Persistence::LocalMachine).unwrap();
    gateway.write(&record).unwrap();

    let first = gateway.read("build-server").unwrap();
    let second = gateway.read("build-server").unwrap();
    assert_eq!(gateway.outstanding_records(), 2);

    drop(first);
    assert_eq!(gateway.outstanding_records(), 1);
    drop(second);
    assert_eq!(gateway.outstanding_records(), 0);
  }

  #[test]
  fn test_write_stores_blob_verbatim() {
    let gateway = MemoryGateway::new();
    let record = CallerOwnedRecord::new("build-server", "alice", "pw", Persistence::Session).unwrap();
    gateway.write(&record).unwrap();

    let stored = gateway.read("build-server").unwrap();
    assert_eq!(stored.secret_blob(), &[b'p', 0, b'w', 0]);
    assert_eq!(stored.persistence(), Persistence::Session);
    assert_eq!(stored.kind(), CRED_TYPE_GENERIC);
  }

  #[test]
  fn test_failing_writes_still_reach_the_store() {
    let gateway = MemoryGateway::new();
    gateway.fail_writes_with(Some(5));
    let record = CallerOwnedRecord::new("build-server", "alice", "pw", Persistence::Session).unwrap();

    let err = gateway.write(&record).unwrap_err();
    assert_eq!(
      err,
      StoreError::WriteDenied {
        target: "build-server".to_string(),
        code: 5
      }
    );
    assert_eq!(gateway.write_calls(), 1);
  }

  #[test]
  fn test_enumerate_never_exposes_secrets() {
    let gateway = MemoryGateway::new();
    let record = CallerOwnedRecord::new("build-server", "alice", "s3cr3t", Persistence::Enterprise).unwrap();
    gateway.write(&record).unwrap();

    let listed = gateway.enumerate().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].target, "build-server");
    assert_eq!(listed[0].user_name, "alice");
    assert!(listed[0].last_written.is_some());
    assert!(!format!("{listed:?}").contains("s3cr3t"));
  }
}
