//! # Prompt Command
//!
//! Runs the interactive credential prompt on its own, without reading or
//! writing the store.

use anyhow::Result;
use clap::Args;
use credbroker_core::output::{format_user_name, print_info, print_success};
use credbroker_core::{PromptRequest, current_user_name, prompt_for_credentials};

use super::load_config;

/// Command for showing the credential prompt
#[derive(Args)]
pub struct PromptArgs {
  /// Window title
  #[arg(long, default_value = "credbroker")]
  pub title: String,

  /// Instruction line shown above the fields (repeatable, shown in order)
  #[arg(long = "instruction", short = 'i')]
  pub instructions: Vec<String>,

  /// Initial user name; defaults to the current OS user
  #[arg(long)]
  pub user: Option<String>,

  /// Seconds to wait before giving up; zero or negative waits forever.
  /// Defaults to the configured timeout.
  #[arg(long, allow_negative_numbers = true)]
  pub timeout: Option<i64>,
}

pub(crate) fn handle_prompt_command(args: PromptArgs) -> Result<()> {
  let timeout_seconds = match args.timeout {
    Some(timeout) => timeout,
    None => load_config()?.1.timeout_seconds,
  };

  let request = PromptRequest::new(args.title)
    .with_instructions(args.instructions)
    .with_initial_user_name(args.user.unwrap_or_else(current_user_name))
    .with_timeout_seconds(timeout_seconds);

  match prompt_for_credentials(&request)? {
    Some(credential) => {
      print_success(&format!("Entered credentials for {}", format_user_name(credential.username())));
      println!("{}", credential.username());
    }
    None => print_info("No credentials supplied"),
  }
  Ok(())
}
