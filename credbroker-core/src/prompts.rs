//! # Console Prompts
//!
//! The dialoguer theme and line-oriented prompts used outside the modal
//! credential form.

use anyhow::{Context, Result};
use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password};

/// Returns a dialoguer theme matching the broker's color palette.
pub fn broker_theme() -> ColorfulTheme {
  ColorfulTheme {
    prompt_style: Style::new().cyan().bold(),
    active_item_prefix: Style::new().green().apply_to("❯ ".to_string()),
    active_item_style: Style::new().green(),
    ..ColorfulTheme::default()
  }
}

/// Read a password without echoing it
pub fn read_password(prompt: &str) -> Result<String> {
  Password::with_theme(&broker_theme())
    .with_prompt(prompt)
    .interact()
    .context("Failed to read password")
}

/// Ask a yes/no question
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
  Confirm::with_theme(&broker_theme())
    .with_prompt(prompt)
    .default(default)
    .interact()
    .context("Failed to read confirmation")
}
