//! # Command Line Interface
//!
//! Defines the CLI structure and command handlers for credbroker: reading
//! and writing stored credentials, prompting for them, and bulk updates
//! driven by the credential bases file.

mod acquire;
mod bases;
mod completion;
mod get;
mod list;
mod prompt;
mod set;
mod set_hg;

use anyhow::{Context, Result};
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{ArgAction, Parser, Subcommand};
use credbroker_core::output::{ColorMode, format_target, print_warning};
use credbroker_core::store::{CredentialStore, PlatformGateway, StoreError, WriteError, platform_store};
use credbroker_core::{BrokerConfig, ConfigDirs, CredentialBases};

/// Top-level CLI command for credbroker
#[derive(Parser)]
#[command(name = "credbroker")]
#[command(display_name = "🔑 credbroker")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(about = "Fetch, store and prompt for build credentials")]
#[command(
  long_about = "credbroker looks up username/password pairs in the OS credential store.\n\n\
        When a credential is missing it can ask for one in a time-bounded terminal\n\
        prompt and store the answer for next time. The time bound keeps unattended\n\
        builds from hanging when nobody is there to answer."
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = crate::LONG_VERSION.as_str())]
#[command(propagate_version = true)]
#[command(subcommand_required(true))]
#[command(disable_help_subcommand = true)]
#[command(max_term_width = 120)]
#[command(styles = Styles::styled()
    .header(AnsiColor::BrightGreen.on_default().bold().underline())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::BrightGreen.on_default().bold())
    .placeholder(AnsiColor::BrightWhite.on_default().italic())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::BrightRed.on_default().bold())
)]
pub struct Cli {
  /// Sets the level of verbosity (can be used multiple times)
  #[arg(
    short = 'v',
    long = "verbose",
    action = ArgAction::Count,
    global = true,
    long_help = "Sets the level of verbosity for tracing and logging output.\n\n\
             -v: Show info level messages\n\
             -vv: Show debug level messages\n\
             -vvv: Show trace level messages"
  )]
  pub verbose: u8,

  /// Controls when colored output is used
  #[arg(
    long,
    value_enum,
    ignore_case = true,
    global = true,
    default_value_t = ColorMode::Auto,
  )]
  pub colors: ColorMode,

  /// Subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// Subcommands for credbroker
#[derive(Subcommand)]
pub enum Commands {
  /// Get a credential for a broker-managed type, prompting if it is missing
  #[command(long_about = "Looks up \"<prefix><credential type>\" in the credential store.\n\n\
            If nothing is stored, shows the credential prompt, stores the answer and\n\
            prints it as \"<username>&&&<password>\". The prompt gives up after the\n\
            configured timeout, in which case the command fails.")]
  Acquire(acquire::AcquireArgs),

  /// Generate shell completions
  #[command(long_about = "Generates shell completion scripts for credbroker commands.\n\n\
            Supported shells include bash, zsh, and fish.")]
  Completion(completion::CompletionArgs),

  /// Set a credential and every credential listed under it in the bases file
  #[command(name = "from-basis")]
  #[command(long_about = "Prompts for a user name and password, then stores them as\n\
            \"<prefix><basis>\" and as every credential listed under <basis> in\n\
            credential-bases.txt.")]
  FromBasis(bases::FromBasisArgs),

  /// Set a new password on every default credential
  #[command(name = "from-default")]
  #[command(long_about = "Prompts for a user name and password, then sets the password on every\n\
            Git, Mercurial and broker credential of that user which is not covered by\n\
            credential-bases.txt. Each entry keeps the user name already stored on it.")]
  FromDefault(bases::FromDefaultArgs),

  /// Print a stored credential
  #[command(long_about = "Prints the credential stored under <target> as \"<username>&&&<password>\".\n\n\
            Fails with the store's error code when the target does not exist.")]
  Get(get::GetArgs),

  /// List stored credentials
  #[command(alias = "ls")]
  List(list::ListArgs),

  /// List the bases in credential-bases.txt
  #[command(name = "list-bases")]
  ListBases,

  /// List the credentials from-default would update
  #[command(name = "list-defaults")]
  ListDefaults(bases::ListDefaultsArgs),

  /// Show the credential prompt and print the entered user name
  #[command(long_about = "Shows the interactive credential prompt without touching the store.\n\n\
            Useful for checking instructions and timeouts. Prints the user name on OK,\n\
            nothing on Cancel, and fails on timeout.")]
  Prompt(prompt::PromptArgs),

  /// Store a credential
  Set(set::SetArgs),

  /// Cache Mercurial keyring credentials for a repository
  #[command(name = "set-hg")]
  #[command(long_about = "Stores the password under the shared \"Mercurial\" entry and under\n\
            \"<username>@@<url>@Mercurial\", both with the user name \"<username>@@<url>\",\n\
            where Mercurial's keyring extension looks for them.")]
  SetHg(set_hg::SetHgArgs),
}

pub fn handle_cli(cli: Cli) -> Result<()> {
  match cli.colors {
    ColorMode::Always | ColorMode::Yes => owo_colors::set_override(true),
    ColorMode::Never | ColorMode::No => owo_colors::set_override(false),
    ColorMode::Auto => {}
  }

  match cli.command {
    Commands::Acquire(args) => acquire::handle_acquire_command(args),
    Commands::Completion(args) => completion::handle_completion_command(args),
    Commands::FromBasis(args) => bases::handle_from_basis_command(args),
    Commands::FromDefault(args) => bases::handle_from_default_command(args),
    Commands::Get(args) => get::handle_get_command(args),
    Commands::List(args) => list::handle_list_command(args),
    Commands::ListBases => bases::handle_list_bases_command(),
    Commands::ListDefaults(args) => bases::handle_list_defaults_command(args),
    Commands::Prompt(args) => prompt::handle_prompt_command(args),
    Commands::Set(args) => set::handle_set_command(args),
    Commands::SetHg(args) => set_hg::handle_set_hg_command(args),
  }
}

/// Open the platform credential store
fn open_store() -> Result<CredentialStore<PlatformGateway>> {
  platform_store().context("Failed to open the credential store")
}

fn load_config() -> Result<(ConfigDirs, BrokerConfig)> {
  let dirs = ConfigDirs::new()?;
  let config = dirs.load_config()?;
  Ok((dirs, config))
}

/// Load the bases file and surface its warnings
fn load_bases(dirs: &ConfigDirs) -> Result<CredentialBases> {
  let bases = dirs.load_bases()?;
  for warning in bases.warnings() {
    print_warning(&format!("{warning} in {}", format_target(bases.source_name())));
  }
  Ok(bases)
}

/// Process exit code for a failed command: the OS store's error code when
/// one caused the failure, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
  err
    .chain()
    .find_map(|cause| {
      cause.downcast_ref::<StoreError>().or_else(|| match cause.downcast_ref::<WriteError>() {
        Some(WriteError::Store(store_err)) => Some(store_err),
        _ => None,
      })
    })
    .and_then(StoreError::os_code)
    .and_then(|code| i32::try_from(code).ok())
    .filter(|code| *code != 0)
    .unwrap_or(1)
}
