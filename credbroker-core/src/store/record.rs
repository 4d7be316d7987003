//! # Native Credential Records
//!
//! The two ownership directions of the OS store's credential record:
//!
//! - [`StoreOwnedRecord`]: returned by a read. The memory belongs to the
//!   store and is handed back to it when the value is dropped, so every exit
//!   path (including a failed decode) releases it.
//! - [`CallerOwnedRecord`]: built by us for a write. All buffers are ordinary
//!   Rust allocations; the store only reads them during the write call and
//!   they are never passed to the store's release primitive.
//!
//! Neither type can be turned into the other.

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::Zeroizing;

use super::error::{EncodingError, StoreError};

/// `CRED_TYPE_GENERIC`, the only record type this broker reads or writes.
pub const CRED_TYPE_GENERIC: u32 = 1;

/// `CRED_MAX_CREDENTIAL_BLOB_SIZE`
pub const MAX_BLOB_BYTES: usize = 5 * 512;

/// `CRED_MAX_USERNAME_LENGTH`
pub const MAX_USER_NAME_UNITS: usize = 256 + 1 + 256;

/// `CRED_MAX_GENERIC_TARGET_NAME_LENGTH`
pub const MAX_TARGET_NAME_UNITS: usize = 32767;

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// How long and where a stored credential survives.
#[derive(clap::ValueEnum, Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Persistence {
  /// Not a valid choice for a write
  #[value(skip)]
  None,
  /// Cleared at logout
  Session,
  /// Survives logout, stays on this machine
  LocalMachine,
  /// Roams with the user profile where the store supports it
  #[default]
  Enterprise,
}

impl Persistence {
  /// The `CRED_PERSIST_*` value
  pub const fn to_native(self) -> u32 {
    match self {
      Self::None => 0,
      Self::Session => 1,
      Self::LocalMachine => 2,
      Self::Enterprise => 3,
    }
  }

  /// Map a `CRED_PERSIST_*` value; unknown values read as `None`
  pub const fn from_native(value: u32) -> Self {
    match value {
      1 => Self::Session,
      2 => Self::LocalMachine,
      3 => Self::Enterprise,
      _ => Self::None,
    }
  }

  /// Lower-case name used in listings
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Session => "session",
      Self::LocalMachine => "local-machine",
      Self::Enterprise => "enterprise",
    }
  }
}

/// Read access to a record owned by the store.
///
/// Implementations release the underlying memory in `Drop`.
pub trait StoreOwnedRecord {
  /// The `CRED_TYPE_*` discriminator
  fn kind(&self) -> u32;

  /// The target name as UTF-16 units, without terminator
  fn target_name_units(&self) -> &[u16];

  /// The user name as UTF-16 units, without terminator; `None` when the store
  /// holds a null user name
  fn user_name_units(&self) -> Option<&[u16]>;

  /// The secret blob, exactly `CredentialBlobSize` bytes long
  fn secret_blob(&self) -> &[u8];

  /// The persistence level the record was written with
  fn persistence(&self) -> Persistence;
}

/// A record built by the caller for a single write.
///
/// Text fields are NUL-terminated UTF-16; the secret is the password as
/// UTF-16LE bytes with no terminator, wiped when the record is dropped.
#[derive(Debug)]
pub struct CallerOwnedRecord {
  target_name: Vec<u16>,
  user_name: Vec<u16>,
  blob: Zeroizing<Vec<u8>>,
  persistence: Persistence,
}

impl CallerOwnedRecord {
  /// Encode a credential for writing.
  ///
  /// # Errors
  ///
  /// Returns an [`EncodingError`] when the persistence level is `None`, a text
  /// field contains a NUL, the target is empty, or a field exceeds the store's
  /// size limits.
  pub fn new(target: &str, user_name: &str, password: &str, persistence: Persistence) -> Result<Self, EncodingError> {
    if persistence == Persistence::None {
      return Err(EncodingError::InvalidPersistence);
    }
    if target.is_empty() {
      return Err(EncodingError::Empty { field: "target name" });
    }

    let target_name = encode_text("target name", target, MAX_TARGET_NAME_UNITS)?;
    let user_name = encode_text("user name", user_name, MAX_USER_NAME_UNITS)?;
    let blob = encode_secret(password)?;

    Ok(Self {
      target_name,
      user_name,
      blob,
      persistence,
    })
  }

  /// NUL-terminated target name
  pub fn target_name(&self) -> &[u16] {
    &self.target_name
  }

  /// NUL-terminated user name
  pub fn user_name(&self) -> &[u16] {
    &self.user_name
  }

  /// Encoded password bytes
  pub fn blob(&self) -> &[u8] {
    &self.blob
  }

  pub const fn persistence(&self) -> Persistence {
    self.persistence
  }

  /// The target name as text, for diagnostics
  pub fn target_display(&self) -> String {
    String::from_utf16_lossy(strip_terminator(&self.target_name))
  }
}

/// Summary of a stored credential. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredCredentialInfo {
  pub target: String,
  pub kind: u32,
  pub user_name: String,
  pub persistence: Persistence,
  pub last_written: Option<DateTime<Utc>>,
}

impl StoredCredentialInfo {
  /// Short label for the record type
  pub const fn kind_label(&self) -> &'static str {
    match self.kind {
      1 => "generic",
      2 => "domain-password",
      3 => "domain-certificate",
      4 => "domain-visible-password",
      _ => "other",
    }
  }
}

/// Encode a password as UTF-16LE bytes. The buffer is sized from the encoded
/// length, which can exceed the character count.
pub fn encode_secret(password: &str) -> Result<Zeroizing<Vec<u8>>, EncodingError> {
  let blob: Zeroizing<Vec<u8>> = Zeroizing::new(password.encode_utf16().flat_map(u16::to_le_bytes).collect());
  if blob.len() > MAX_BLOB_BYTES {
    return Err(EncodingError::BlobTooLarge {
      len: blob.len(),
      max: MAX_BLOB_BYTES,
    });
  }
  Ok(blob)
}

/// Decode a secret blob. The blob length is authoritative: no terminator is
/// searched for and embedded NUL units are kept.
pub fn decode_secret(target: &str, blob: &[u8]) -> Result<Zeroizing<String>, StoreError> {
  let malformed = || StoreError::Malformed {
    target: target.to_string(),
    field: "password blob",
  };

  if blob.len() % 2 != 0 {
    return Err(malformed());
  }

  let units: Zeroizing<Vec<u16>> = Zeroizing::new(
    blob
      .chunks_exact(2)
      .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
      .collect(),
  );

  String::from_utf16(&units).map(Zeroizing::new).map_err(|_| malformed())
}

/// Decode a user name; a null user name reads as empty.
pub fn decode_user_name(target: &str, units: Option<&[u16]>) -> Result<String, StoreError> {
  match units {
    None => Ok(String::new()),
    Some(units) => String::from_utf16(units).map_err(|_| StoreError::Malformed {
      target: target.to_string(),
      field: "user name",
    }),
  }
}

/// Convert a FILETIME tick count (100ns since 1601) to UTC; zero means unset
pub fn filetime_to_utc(ticks: u64) -> Option<DateTime<Utc>> {
  if ticks == 0 {
    return None;
  }
  let secs = i64::try_from(ticks / 10_000_000).ok()? - FILETIME_UNIX_OFFSET_SECS;
  let nanos = u32::try_from((ticks % 10_000_000) * 100).ok()?;
  DateTime::from_timestamp(secs, nanos)
}

/// Convert UTC to a FILETIME tick count
pub fn utc_to_filetime(time: DateTime<Utc>) -> u64 {
  let secs = time.timestamp() + FILETIME_UNIX_OFFSET_SECS;
  let ticks = u64::try_from(secs).unwrap_or(0) * 10_000_000;
  ticks + u64::from(time.timestamp_subsec_nanos() / 100)
}

fn encode_text(field: &'static str, value: &str, max: usize) -> Result<Vec<u16>, EncodingError> {
  if value.contains('\0') {
    return Err(EncodingError::InteriorNul { field });
  }
  let mut units: Vec<u16> = value.encode_utf16().collect();
  if units.len() > max {
    return Err(EncodingError::TooLong {
      field,
      len: units.len(),
      max,
    });
  }
  units.push(0);
  Ok(units)
}

pub(crate) fn strip_terminator(units: &[u16]) -> &[u16] {
  match units.split_last() {
    Some((&0, rest)) => rest,
    _ => units,
  }
}
