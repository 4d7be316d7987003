//! # credbroker CLI Library
//!
//! Command definitions and handlers for the `credbroker` binary.

use std::sync::LazyLock;

pub mod cli;
pub mod completion;

/// Version plus the commit it was built from, when known
pub static LONG_VERSION: LazyLock<String> = LazyLock::new(|| match option_env!("GIT_HASH") {
  Some(hash) if !hash.is_empty() => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
  _ => env!("CARGO_PKG_VERSION").to_string(),
});
