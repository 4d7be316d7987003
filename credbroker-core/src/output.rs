//! # Output Formatting
//!
//! Status lines and value formatting for the command line. Status lines go
//! to stderr so that stdout carries only machine-readable results.

use owo_colors::OwoColorize;

use crate::store::Persistence;

/// Enum representing different color modes for output
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
  /// Enable colored output
  Yes,
  /// Enable colored output (alias for Yes)
  Always,
  /// Automatically detect if colors should be used based on terminal
  /// capabilities
  Auto,
  /// Disable colored output
  No,
  /// Disable colored output (alias for No)
  Never,
}

/// Helper function to safely get an emoji or fallback to a default character
pub fn get_emoji_or_default(name: &str, default: &str) -> String {
  match emojis::get_by_shortcode(name) {
    Some(emoji) => emoji.to_string(),
    None => default.to_string(),
  }
}

/// Print a success message
pub fn print_success(message: &str) {
  let check = get_emoji_or_default("check_mark", "✓");
  eprintln!("{} {}", check.green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
  let cross = get_emoji_or_default("cross_mark", "✗");
  eprintln!("{} {}", cross.red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
  let warning = get_emoji_or_default("warning", "⚠");
  eprintln!("{} {}", warning.yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
  let info = get_emoji_or_default("information", "ℹ");
  eprintln!("{} {}", info.blue().bold(), message);
}

/// Format a store target name
pub fn format_target(target: &str) -> String {
  target.bright_cyan().bold().to_string()
}

/// Format a user name
pub fn format_user_name(user_name: &str) -> String {
  user_name.bright_green().to_string()
}

/// Format a persistence level
pub fn format_persistence(persistence: Persistence) -> String {
  match persistence {
    Persistence::Enterprise => persistence.as_str().green().to_string(),
    Persistence::LocalMachine => persistence.as_str().yellow().to_string(),
    Persistence::Session => persistence.as_str().bright_black().to_string(),
    Persistence::None => persistence.as_str().red().to_string(),
  }
}

/// Format a command or command example
pub fn format_command(cmd: &str) -> String {
  cmd.purple().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_emoji_or_default() {
    let result = get_emoji_or_default("check_mark", "✓");
    assert!(!result.is_empty());

    let result = get_emoji_or_default("nonexistent_emoji", "fallback");
    assert_eq!(result, "fallback");
  }

  #[test]
  fn test_formatters_keep_the_text() {
    assert!(format_target("build-server").contains("build-server"));
    assert!(format_user_name("alice").contains("alice"));
    assert!(format_command("credbroker get").contains("credbroker get"));
  }

  #[test]
  fn test_format_persistence_names_every_level() {
    for persistence in [
      Persistence::Session,
      Persistence::LocalMachine,
      Persistence::Enterprise,
      Persistence::None,
    ] {
      assert!(format_persistence(persistence).contains(persistence.as_str()));
    }
  }
}
