//! # Acquire Command
//!
//! The full broker flow: stored credential if there is one, otherwise the
//! prompt, with the answer written back to the store.

use anyhow::{Context, Result};
use clap::Args;
use credbroker_core::{CredentialBroker, TerminalPrompter};
use tracing::debug;

use super::{load_config, open_store};

/// Command for acquiring a credential by type
#[derive(Args)]
pub struct AcquireArgs {
  /// Credential type; defaults to the configured default type
  pub credential_type: Option<String>,

  /// Override the configured prompt timeout in seconds
  #[arg(long, allow_negative_numbers = true)]
  pub timeout: Option<i64>,
}

pub(crate) fn handle_acquire_command(args: AcquireArgs) -> Result<()> {
  let (_, mut config) = load_config()?;
  if let Some(timeout) = args.timeout {
    config.timeout_seconds = timeout;
  }
  let credential_type = args
    .credential_type
    .unwrap_or_else(|| config.default_credential_type.clone());
  debug!(credential_type = %credential_type, timeout_seconds = config.timeout_seconds, "acquiring credential");

  let broker = CredentialBroker::new(open_store()?, TerminalPrompter, config);
  let credential = broker
    .acquire(&credential_type)
    .with_context(|| format!("Failed to acquire '{credential_type}' credentials"))?;

  print!("{}", credential.to_wire_string().as_str());
  Ok(())
}
