//! # Set Command
//!
//! Stores a user name and password under a target.

use anyhow::{Context, Result};
use clap::Args;
use credbroker_core::Persistence;
use credbroker_core::output::{format_persistence, format_target, print_success};
use credbroker_core::prompts::read_password;
use zeroize::Zeroizing;

use super::open_store;

/// Command for storing a credential
#[derive(Args)]
pub struct SetArgs {
  /// Store target to file the credential under
  pub target: String,

  /// User name to store
  pub username: String,

  /// Password to store; asked for without echo when omitted
  pub password: Option<String>,

  /// How long the stored credential survives
  #[arg(long, value_enum, default_value_t = Persistence::Enterprise)]
  pub persist: Persistence,
}

pub(crate) fn handle_set_command(args: SetArgs) -> Result<()> {
  let password = match args.password {
    Some(password) => Zeroizing::new(password),
    None => Zeroizing::new(read_password(&format!("Password for {}", args.username))?),
  };

  let store = open_store()?;
  store
    .write_credential(&args.target, &args.username, &password, args.persist)
    .with_context(|| format!("Failed to update '{}'", args.target))?;

  print_success(&format!(
    "Updated: {} ({})",
    format_target(&args.target),
    format_persistence(args.persist)
  ));
  Ok(())
}
