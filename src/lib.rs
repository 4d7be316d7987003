//! # credbroker
//!
//! Build-credential broker: stored credentials from the OS credential store,
//! with a time-bounded terminal prompt for the ones that are missing.
//!
//! This crate re-exports [`credbroker_core`]; the `credbroker` binary lives
//! in the `credbroker-cli` workspace member.

pub use credbroker_core::*;
