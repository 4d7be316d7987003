use std::ffi::OsStr;
use std::iter::once;
use std::os::windows::ffi::OsStrExt;

use windows_sys::core::PWSTR;

/// Convert a Rust string into a null-terminated UTF-16 vector suitable for
/// Windows API calls.
pub(super) fn to_wide(value: &str) -> Vec<u16> {
  OsStr::new(value).encode_wide().chain(once(0)).collect()
}

/// Borrow the units of a null-terminated UTF-16 string, without the
/// terminator. A null pointer yields `None`.
///
/// # Safety
///
/// `value` must be null or point to a null-terminated UTF-16 string that
/// stays valid for `'a`.
pub(super) unsafe fn pwstr_units<'a>(value: PWSTR) -> Option<&'a [u16]> {
  if value.is_null() {
    return None;
  }

  let mut len = 0usize;
  // SAFETY: The caller guarantees a terminator exists, so every unit up to
  // and including it is readable.
  while unsafe { *value.add(len) } != 0 {
    len += 1;
  }

  // SAFETY: `len` units starting at `value` were just read above.
  Some(unsafe { std::slice::from_raw_parts(value.cast_const(), len) })
}
