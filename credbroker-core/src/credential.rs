//! # Credential Value
//!
//! The username/password pair handed between the store, the prompt and the
//! caller.

use std::fmt;

use zeroize::Zeroizing;

/// A username and password.
///
/// Two credentials are equal when both fields match. The password is wiped
/// from memory when the value is dropped and is never shown by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
  username: String,
  password: Zeroizing<String>,
}

impl Credential {
  /// Create a credential from its two fields
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: Zeroizing::new(password.into()),
    }
  }

  /// The user name
  pub fn username(&self) -> &str {
    &self.username
  }

  /// The password. Keep the borrow short and never log it.
  pub fn password(&self) -> &str {
    &self.password
  }

  /// Render the credential in the `<username>&&&<password>` form that build
  /// scripts parse.
  pub fn to_wire_string(&self) -> Zeroizing<String> {
    Zeroizing::new(format!("{}&&&{}", self.username, self.password.as_str()))
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credential")
      .field("username", &self.username)
      .field("password", &"****")
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equality_is_by_both_fields() {
    assert_eq!(Credential::new("alice", "s3cr3t"), Credential::new("alice", "s3cr3t"));
    assert_ne!(Credential::new("alice", "s3cr3t"), Credential::new("alice", "other"));
    assert_ne!(Credential::new("alice", "s3cr3t"), Credential::new("bob", "s3cr3t"));
  }

  #[test]
  fn test_debug_hides_password() {
    let credential = Credential::new("alice", "s3cr3t");
    let debug_output = format!("{credential:?}");

    assert!(debug_output.contains("alice"));
    assert!(!debug_output.contains("s3cr3t"));
  }

  #[test]
  fn test_wire_string() {
    let credential = Credential::new("alice", "pa&ss");
    assert_eq!(credential.to_wire_string().as_str(), "alice&&&pa&ss");
  }
}
