//! # Bases Commands
//!
//! Bulk updates driven by `credential-bases.txt`, and the listings that
//! show what they would touch.

use anyhow::{Context, Result, bail};
use clap::Args;
use credbroker_core::output::{format_target, print_error, print_info, print_success, print_warning};
use credbroker_core::prompts::confirm;
use credbroker_core::update::{self, UpdateReport};
use credbroker_core::{BrokerConfig, Credential, PromptRequest, current_user_name, prompt_for_credentials};

use super::{load_bases, load_config, open_store};

/// Command for updating credentials from a basis
#[derive(Args)]
pub struct FromBasisArgs {
  /// Basis name from the bases file
  pub basis: String,
}

/// Command for updating every default credential
#[derive(Args)]
pub struct FromDefaultArgs {
  /// Update without asking for confirmation
  #[arg(long, short = 'y')]
  pub yes: bool,
}

/// Command for listing default credentials
#[derive(Args)]
pub struct ListDefaultsArgs {
  /// Owner of the credentials
  pub username: String,
}

pub(crate) fn handle_from_basis_command(args: FromBasisArgs) -> Result<()> {
  let (dirs, config) = load_config()?;
  let bases = load_bases(&dirs)?;
  // Check before prompting so a typo does not cost a password entry.
  bases.require_targets(&args.basis)?;

  let credential = ask_for_credentials(&config, &args.basis)?;
  let store = open_store()?;
  let report = update::update_from_basis(
    &store,
    &config,
    &bases,
    &args.basis,
    credential.username(),
    credential.password(),
  )?;
  finish(&report)
}

pub(crate) fn handle_from_default_command(args: FromDefaultArgs) -> Result<()> {
  let (dirs, config) = load_config()?;
  let bases = load_bases(&dirs)?;

  let credential = ask_for_credentials(&config, &config.default_credential_type)?;
  let store = open_store()?;

  let targets = update::default_targets(&store, &config, &bases, credential.username())
    .context("Failed to enumerate stored credentials")?;
  if targets.is_empty() {
    print_info(&format!(
      "No default credentials found for {}",
      format_target(credential.username())
    ));
    return Ok(());
  }

  for target in &targets {
    print_info(&format!("Will update {}", format_target(target)));
  }
  if !args.yes && !confirm(&format!("Set the new password on {} credentials?", targets.len()), true)? {
    print_info("Nothing updated");
    return Ok(());
  }

  let report = update::update_from_default(&store, &config, &bases, credential.username(), credential.password())
    .context("Failed to enumerate stored credentials")?;
  finish(&report)
}

pub(crate) fn handle_list_bases_command() -> Result<()> {
  let (dirs, _) = load_config()?;
  let bases = load_bases(&dirs)?;

  if bases.is_empty() {
    print_info(&format!("No basis credentials in {}", format_target(bases.source_name())));
    return Ok(());
  }

  print_info(&format!(
    "The following basis credentials exist in {}:",
    format_target(bases.source_name())
  ));
  for name in bases.names() {
    println!("{name}");
  }
  Ok(())
}

pub(crate) fn handle_list_defaults_command(args: ListDefaultsArgs) -> Result<()> {
  let (dirs, config) = load_config()?;
  let bases = load_bases(&dirs)?;
  let store = open_store()?;

  let targets = update::default_targets(&store, &config, &bases, &args.username)
    .context("Failed to enumerate stored credentials")?;
  if targets.is_empty() {
    print_info(&format!(
      "No Git, Mercurial or broker credentials of {} are outside {}",
      args.username,
      format_target(bases.source_name())
    ));
    return Ok(());
  }

  print_info(&format!(
    "The following credentials are not listed in {}:",
    format_target(bases.source_name())
  ));
  for target in targets {
    println!("{target}");
  }
  Ok(())
}

/// Ask for the user name and password to apply. Bulk updates are always
/// interactive, so the prompt waits without a timeout.
fn ask_for_credentials(config: &BrokerConfig, credential_type: &str) -> Result<Credential> {
  let request = PromptRequest::new(config.storage_key(credential_type))
    .with_instructions(config.instructions_for(credential_type).iter().cloned())
    .with_initial_user_name(current_user_name())
    .with_timeout_seconds(0);

  let Some(credential) = prompt_for_credentials(&request)? else {
    bail!("User did not supply credentials");
  };
  if credential.username().is_empty() {
    bail!("Empty username");
  }
  if credential.password().is_empty() {
    bail!("Empty password");
  }
  Ok(credential)
}

fn finish(report: &UpdateReport) -> Result<()> {
  for target in &report.updated {
    print_success(&format!("Updated: {}", format_target(target)));
  }
  for (target, err) in &report.failed {
    print_error(&format!("Failed to update {}: {err}", format_target(target)));
  }

  if !report.is_success() {
    print_warning("Some credentials were not updated; re-run after fixing the errors above");
    bail!("{} of {} credentials failed to update", report.failed.len(), report.failed.len() + report.updated.len());
  }
  Ok(())
}
