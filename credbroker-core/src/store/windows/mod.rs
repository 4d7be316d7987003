//! Windows Credential Manager gateway
//!
//! All unsafe Win32 credential code lives here. Records returned by
//! `CredReadW`/`CredEnumerateW` are wrapped in types that call `CredFree`
//! when dropped; records passed to `CredWriteW` are built from Rust-owned
//! buffers and never reach `CredFree`.

mod helpers;

use std::ptr::{self, NonNull};

use tracing::{debug, trace};
use windows_sys::Win32::Foundation::{FILETIME, GetLastError};
use windows_sys::Win32::Security::Credentials::{CREDENTIALW, CredEnumerateW, CredFree, CredReadW, CredWriteW};

use self::helpers::{pwstr_units, to_wide};
use super::error::{ERROR_NOT_FOUND, StoreError};
use super::gateway::NativeGateway;
use super::record::{
  CRED_TYPE_GENERIC, CallerOwnedRecord, Persistence, StoreOwnedRecord, StoredCredentialInfo, filetime_to_utc,
};

/// Gateway to the current user's Windows Credential Manager vault.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsGateway;

impl WindowsGateway {
  pub const fn new() -> Self {
    Self
  }
}

impl NativeGateway for WindowsGateway {
  type Record = WindowsRecord;

  fn read(&self, target: &str) -> Result<WindowsRecord, StoreError> {
    let target_name = to_wide(target);
    let mut raw: *mut CREDENTIALW = ptr::null_mut();

    // SAFETY: `target_name` is null-terminated and outlives the call; `raw`
    // is a valid out pointer.
    let ok = unsafe { CredReadW(target_name.as_ptr(), CRED_TYPE_GENERIC, 0, &mut raw) };
    if ok == 0 {
      // SAFETY: Reads thread-local error state set by the failed call.
      let code = unsafe { GetLastError() };
      debug!(target_name = target, code, "CredReadW failed");
      return Err(StoreError::NotFoundOrDenied {
        target: target.to_string(),
        code,
      });
    }

    let raw = NonNull::new(raw).ok_or_else(|| StoreError::Malformed {
      target: target.to_string(),
      field: "record pointer",
    })?;
    trace!(target_name = target, "CredReadW returned a record");
    Ok(WindowsRecord { raw })
  }

  fn write(&self, record: &CallerOwnedRecord) -> Result<(), StoreError> {
    let target = record.target_display();
    let blob = record.blob();
    let blob_size = u32::try_from(blob.len()).map_err(|_| StoreError::Malformed {
      target: target.clone(),
      field: "password blob",
    })?;

    let credential = CREDENTIALW {
      Flags: 0,
      Type: CRED_TYPE_GENERIC,
      TargetName: record.target_name().as_ptr().cast_mut(),
      Comment: ptr::null_mut(),
      LastWritten: FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
      },
      CredentialBlobSize: blob_size,
      CredentialBlob: if blob.is_empty() {
        ptr::null_mut()
      } else {
        blob.as_ptr().cast_mut()
      },
      Persist: record.persistence().to_native(),
      AttributeCount: 0,
      Attributes: ptr::null_mut(),
      TargetAlias: ptr::null_mut(),
      UserName: record.user_name().as_ptr().cast_mut(),
    };

    // SAFETY: Every pointer in `credential` borrows from `record`, which
    // outlives the call. CredWriteW only reads through them.
    let ok = unsafe { CredWriteW(&credential, 0) };
    if ok == 0 {
      // SAFETY: Reads thread-local error state set by the failed call.
      let code = unsafe { GetLastError() };
      debug!(target_name = %target, code, "CredWriteW failed");
      return Err(StoreError::WriteDenied { target, code });
    }

    Ok(())
  }

  fn enumerate(&self) -> Result<Vec<StoredCredentialInfo>, StoreError> {
    let mut count = 0u32;
    let mut raw: *mut *mut CREDENTIALW = ptr::null_mut();

    // SAFETY: A null filter enumerates everything; both out pointers are valid.
    let ok = unsafe { CredEnumerateW(ptr::null(), 0, &mut count, &mut raw) };
    if ok == 0 {
      // SAFETY: Reads thread-local error state set by the failed call.
      let code = unsafe { GetLastError() };
      if code == ERROR_NOT_FOUND {
        return Ok(Vec::new());
      }
      return Err(StoreError::EnumerationFailed { code });
    }

    let Some(raw) = NonNull::new(raw) else {
      return Ok(Vec::new());
    };
    let array = WindowsRecordArray { raw, count };
    Ok(array.summaries())
  }
}

/// A single record allocated by `CredReadW`.
#[derive(Debug)]
pub struct WindowsRecord {
  raw: NonNull<CREDENTIALW>,
}

impl WindowsRecord {
  fn credential(&self) -> &CREDENTIALW {
    // SAFETY: `raw` came from a successful CredReadW and is only freed in Drop.
    unsafe { self.raw.as_ref() }
  }
}

impl StoreOwnedRecord for WindowsRecord {
  fn kind(&self) -> u32 {
    self.credential().Type
  }

  fn target_name_units(&self) -> &[u16] {
    // SAFETY: TargetName is a null-terminated string inside the record block.
    unsafe { pwstr_units(self.credential().TargetName) }.unwrap_or(&[])
  }

  fn user_name_units(&self) -> Option<&[u16]> {
    // SAFETY: UserName is null or a null-terminated string inside the block.
    unsafe { pwstr_units(self.credential().UserName) }
  }

  fn secret_blob(&self) -> &[u8] {
    let credential = self.credential();
    if credential.CredentialBlob.is_null() || credential.CredentialBlobSize == 0 {
      return &[];
    }
    // SAFETY: The store guarantees CredentialBlobSize readable bytes at
    // CredentialBlob for the lifetime of the record block.
    unsafe { std::slice::from_raw_parts(credential.CredentialBlob, credential.CredentialBlobSize as usize) }
  }

  fn persistence(&self) -> Persistence {
    Persistence::from_native(self.credential().Persist)
  }
}

impl Drop for WindowsRecord {
  fn drop(&mut self) {
    // SAFETY: The block was allocated by CredReadW and is freed exactly once.
    unsafe { CredFree(self.raw.as_ptr().cast_const().cast()) };
  }
}

/// The pointer array allocated by `CredEnumerateW`.
struct WindowsRecordArray {
  raw: NonNull<*mut CREDENTIALW>,
  count: u32,
}

impl WindowsRecordArray {
  fn summaries(&self) -> Vec<StoredCredentialInfo> {
    (0..self.count as usize)
      .filter_map(|index| {
        // SAFETY: CredEnumerateW returned `count` valid entries.
        let entry = unsafe { *self.raw.as_ptr().add(index) };
        // SAFETY: Each non-null entry points into the same allocation.
        let credential = unsafe { entry.as_ref() }?;
        Some(summarize(credential))
      })
      .collect()
  }
}

impl Drop for WindowsRecordArray {
  fn drop(&mut self) {
    // SAFETY: The array was allocated by CredEnumerateW and is freed exactly once.
    unsafe { CredFree(self.raw.as_ptr().cast_const().cast()) };
  }
}

fn summarize(credential: &CREDENTIALW) -> StoredCredentialInfo {
  // SAFETY: Both fields are null or null-terminated strings in the block.
  let target = unsafe { pwstr_units(credential.TargetName) }.map(String::from_utf16_lossy);
  // SAFETY: As above.
  let user_name = unsafe { pwstr_units(credential.UserName) }.map(String::from_utf16_lossy);
  let ticks =
    (u64::from(credential.LastWritten.dwHighDateTime) << 32) | u64::from(credential.LastWritten.dwLowDateTime);

  StoredCredentialInfo {
    target: target.unwrap_or_default(),
    kind: credential.Type,
    user_name: user_name.unwrap_or_default(),
    persistence: Persistence::from_native(credential.Persist),
    last_written: filetime_to_utc(ticks),
  }
}
