//! # Get Command
//!
//! Prints a stored credential in the `<username>&&&<password>` form that
//! build scripts parse.

use anyhow::{Context, Result};
use clap::Args;

use super::open_store;

/// Command for reading a stored credential
#[derive(Args)]
pub struct GetArgs {
  /// Store target the credential is filed under
  pub target: String,

  /// Print only the user name
  #[arg(long)]
  pub user_only: bool,
}

pub(crate) fn handle_get_command(args: GetArgs) -> Result<()> {
  let store = open_store()?;
  let credential = store
    .read_credential(&args.target)
    .with_context(|| format!("Failed to get credential '{}'", args.target))?;

  if args.user_only {
    println!("{}", credential.username());
  } else {
    // No trailing newline: callers split the raw output on "&&&".
    print!("{}", credential.to_wire_string().as_str());
  }
  Ok(())
}
