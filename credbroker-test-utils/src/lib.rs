//! Test utilities shared across the credbroker workspace
//!
//! This crate provides common testing infrastructure including:
//! - Environment isolation for config lookup ([`EnvTestGuard`])
//! - Throwaway config directories with config and bases files
//!   ([`ConfigDirTestGuard`])
//!
//! The clippy dead_code lint is disabled for this crate because test utilities
//! may not be used by all tests, and the compiler cannot detect usage across
//! crate boundaries in development dependencies.

#![allow(dead_code)]

pub mod config;
pub mod env;

pub use config::ConfigDirTestGuard;
pub use env::EnvTestGuard;
