//! Error types for credential store access.

use thiserror::Error;

/// Win32 `ERROR_NOT_FOUND`, reported when no credential exists for a target.
pub const ERROR_NOT_FOUND: u32 = 1168;

/// Win32 `ERROR_NO_SUCH_LOGON_SESSION`, reported when the store is not
/// available to the current logon session.
pub const ERROR_NO_SUCH_LOGON_SESSION: u32 = 1312;

/// A failure reported by (or on behalf of) the OS credential store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  /// The read primitive failed: no such target, access denied, or any other
  /// store failure. Callers usually recover by prompting the user.
  #[error("no credential could be read for '{target}' (OS error {code})")]
  NotFoundOrDenied { target: String, code: u32 },

  /// The write primitive rejected the record.
  #[error("credential '{target}' could not be written (OS error {code})")]
  WriteDenied { target: String, code: u32 },

  /// The store returned a record whose contents cannot be decoded.
  #[error("credential '{target}' has a malformed {field}")]
  Malformed { target: String, field: &'static str },

  /// Enumerating the store failed.
  #[error("stored credentials could not be enumerated (OS error {code})")]
  EnumerationFailed { code: u32 },

  /// There is no OS credential store on this platform.
  #[error("the OS credential store is not available on this platform")]
  Unavailable,
}

impl StoreError {
  /// The OS error code carried by the failure, if any
  pub const fn os_code(&self) -> Option<u32> {
    match self {
      Self::NotFoundOrDenied { code, .. } | Self::WriteDenied { code, .. } | Self::EnumerationFailed { code } => {
        Some(*code)
      }
      Self::Malformed { .. } | Self::Unavailable => None,
    }
  }

  /// Whether this is a read of a target that simply does not exist
  pub const fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFoundOrDenied { code, .. } if *code == ERROR_NOT_FOUND)
  }
}

/// Input that cannot be turned into a native record. Always raised before
/// the store is called.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
  #[error("persistence level `none` cannot be used to write a credential")]
  InvalidPersistence,

  #[error("{field} must not contain a NUL character")]
  InteriorNul { field: &'static str },

  #[error("{field} must not be empty")]
  Empty { field: &'static str },

  #[error("{field} is {len} UTF-16 units long, the store accepts at most {max}")]
  TooLong { field: &'static str, len: usize, max: usize },

  #[error("password is {len} bytes once encoded, the store accepts at most {max}")]
  BlobTooLarge { len: usize, max: usize },
}

/// Failure of a credential write: either the input was bad or the store
/// rejected it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
  #[error("invalid credential: {0}")]
  Encoding(#[from] EncodingError),

  #[error(transparent)]
  Store(#[from] StoreError),
}
