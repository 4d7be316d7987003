//! # List Command
//!
//! Shows the credentials in the store, as a table or as JSON. Passwords are
//! never part of the listing.

use anyhow::{Context, Result};
use clap::Args;
use credbroker_core::StoredCredentialInfo;
use credbroker_core::output::{format_command, print_info};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::open_store;

/// Command for listing stored credentials
#[derive(Args)]
pub struct ListArgs {
  /// Print JSON instead of a table
  #[arg(long)]
  pub json: bool,

  /// Only show targets containing this text (case-insensitive)
  #[arg(long, short = 'f')]
  pub filter: Option<String>,
}

#[derive(Tabled)]
struct CredentialRow {
  #[tabled(rename = "Target")]
  target: String,
  #[tabled(rename = "Type")]
  kind: &'static str,
  #[tabled(rename = "User")]
  user_name: String,
  #[tabled(rename = "Persistence")]
  persistence: &'static str,
  #[tabled(rename = "Last Written")]
  last_written: String,
}

impl From<&StoredCredentialInfo> for CredentialRow {
  fn from(info: &StoredCredentialInfo) -> Self {
    Self {
      target: info.target.clone(),
      kind: info.kind_label(),
      user_name: info.user_name.clone(),
      persistence: info.persistence.as_str(),
      last_written: info
        .last_written
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string()),
    }
  }
}

pub(crate) fn handle_list_command(args: ListArgs) -> Result<()> {
  let store = open_store()?;
  let mut credentials = store.list_credentials().context("Failed to list credentials")?;
  if let Some(filter) = &args.filter {
    let filter = filter.to_lowercase();
    credentials.retain(|info| info.target.to_lowercase().contains(&filter));
  }
  credentials.sort_by(|a, b| a.target.cmp(&b.target));

  if args.json {
    let json = serde_json::to_string_pretty(&credentials).context("Failed to serialize credentials")?;
    println!("{json}");
    return Ok(());
  }

  if credentials.is_empty() {
    print_info(&format!(
      "No stored credentials found. Add one with {}",
      format_command("credbroker set <target> <username>")
    ));
    return Ok(());
  }

  let rows: Vec<CredentialRow> = credentials.iter().map(CredentialRow::from).collect();
  let mut table = Table::new(rows);
  table.with(Style::sharp());
  println!("{table}");
  Ok(())
}
