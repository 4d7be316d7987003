//! # Set-Hg Command
//!
//! Caches a Mercurial repository password in the keyring entries Mercurial's
//! keyring extension reads.

use anyhow::{Context, Result};
use clap::Args;
use credbroker_core::output::{format_target, format_user_name, print_success};
use credbroker_core::prompts::read_password;
use credbroker_core::store_mercurial;
use zeroize::Zeroizing;

use super::open_store;

/// Command for caching Mercurial credentials
#[derive(Args)]
pub struct SetHgArgs {
  /// Repository URL
  pub url: String,

  /// User name for the repository
  pub username: String,

  /// Password; asked for without echo when omitted
  pub password: Option<String>,
}

pub(crate) fn handle_set_hg_command(args: SetHgArgs) -> Result<()> {
  let password = match args.password {
    Some(password) => Zeroizing::new(password),
    None => Zeroizing::new(read_password(&format!("Password for {} at {}", args.username, args.url))?),
  };

  let store = open_store()?;
  store_mercurial(&store, &args.url, &args.username, &password)
    .with_context(|| format!("Failed to cache Mercurial credentials for {}, {}", args.username, args.url))?;

  print_success(&format!(
    "Cached Mercurial credentials for {}, {}",
    format_user_name(&args.username),
    format_target(&args.url)
  ));
  Ok(())
}
