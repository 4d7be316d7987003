//! # Credential Store Access
//!
//! Read and write username/password pairs in the per-user OS credential
//! store. [`CredentialStore`] is the entry point; it encodes and decodes
//! records and delegates the native calls to a [`NativeGateway`].

mod error;
mod gateway;
mod record;
#[cfg(windows)]
mod windows;

pub use error::{ERROR_NO_SUCH_LOGON_SESSION, ERROR_NOT_FOUND, EncodingError, StoreError, WriteError};
pub use gateway::{MemoryGateway, MemoryRecord, NativeGateway};
pub use record::{
  CRED_TYPE_GENERIC, CallerOwnedRecord, MAX_BLOB_BYTES, Persistence, StoreOwnedRecord, StoredCredentialInfo,
  decode_secret, encode_secret,
};
use tracing::{debug, info};
#[cfg(windows)]
pub use windows::{WindowsGateway, WindowsRecord};

use crate::credential::Credential;

/// The gateway for the platform's OS credential store.
#[cfg(windows)]
pub type PlatformGateway = WindowsGateway;

/// The gateway for the platform's OS credential store.
#[cfg(not(windows))]
pub type PlatformGateway = MemoryGateway;

/// Open the OS credential store for the current user.
///
/// # Errors
///
/// [`StoreError::Unavailable`] on platforms without a supported store.
#[cfg(windows)]
pub fn platform_store() -> Result<CredentialStore<PlatformGateway>, StoreError> {
  Ok(CredentialStore::new(WindowsGateway::new()))
}

/// Open the OS credential store for the current user.
///
/// # Errors
///
/// [`StoreError::Unavailable`] on platforms without a supported store.
#[cfg(not(windows))]
pub fn platform_store() -> Result<CredentialStore<PlatformGateway>, StoreError> {
  Err(StoreError::Unavailable)
}

/// Typed access to generic credentials in a store.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore<G> {
  gateway: G,
}

impl<G: NativeGateway> CredentialStore<G> {
  pub const fn new(gateway: G) -> Self {
    Self { gateway }
  }

  /// The underlying gateway
  pub const fn gateway(&self) -> &G {
    &self.gateway
  }

  /// Read the credential filed under `target`.
  ///
  /// The store-owned record is released before this returns, whether or not
  /// its fields decode.
  ///
  /// # Errors
  ///
  /// [`StoreError::NotFoundOrDenied`] when the store has no readable entry,
  /// [`StoreError::Malformed`] when the entry cannot be decoded.
  pub fn read_credential(&self, target: &str) -> Result<Credential, StoreError> {
    let record = self.gateway.read(target)?;
    let username = record::decode_user_name(target, record.user_name_units())?;
    let password = decode_secret(target, record.secret_blob())?;
    drop(record);

    debug!(target_name = target, username = %username, "read credential from store");
    Ok(Credential::new(username, password.as_str()))
  }

  /// Create or overwrite the credential filed under `target`.
  ///
  /// # Errors
  ///
  /// [`WriteError::Encoding`] when the input cannot be stored (checked before
  /// the store is called), [`WriteError::Store`] when the store rejects it.
  pub fn write_credential(
    &self,
    target: &str,
    username: &str,
    password: &str,
    persistence: Persistence,
  ) -> Result<(), WriteError> {
    if persistence == Persistence::None {
      return Err(EncodingError::InvalidPersistence.into());
    }

    let record = CallerOwnedRecord::new(target, username, password, persistence)?;
    self.gateway.write(&record)?;

    info!(
      target_name = target,
      username,
      persistence = persistence.as_str(),
      "wrote credential to store"
    );
    Ok(())
  }

  /// Write a [`Credential`] value
  pub fn write(&self, target: &str, credential: &Credential, persistence: Persistence) -> Result<(), WriteError> {
    self.write_credential(target, credential.username(), credential.password(), persistence)
  }

  /// Summaries of every stored credential, generic or not
  pub fn list_credentials(&self) -> Result<Vec<StoredCredentialInfo>, StoreError> {
    self.gateway.enumerate()
  }
}
