//! # Credential Broker Core
//!
//! Reads and writes username/password pairs in the per-user OS credential
//! store, and falls back to a time-bounded interactive prompt when a
//! credential is missing. The [`broker`] module ties the two together for
//! build tooling; everything else is usable on its own.

pub mod bases;
pub mod broker;
pub mod config;
pub mod credential;
pub mod output;
pub mod prompt;
pub mod prompts;
pub mod store;
pub mod update;

pub use bases::{BasesError, BasesWarning, CredentialBases};
pub use broker::{BrokerError, CredentialBroker, current_user_name};
pub use config::{BrokerConfig, ConfigDirs};
pub use credential::Credential;
pub use output::{ColorMode, print_error, print_info, print_success, print_warning};
pub use prompt::{CredentialPrompter, PromptError, PromptRequest, TerminalPrompter, prompt_for_credentials};
pub use store::{
  CredentialStore, EncodingError, MemoryGateway, NativeGateway, Persistence, PlatformGateway, StoreError,
  StoredCredentialInfo, WriteError, platform_store,
};
pub use update::{UpdateReport, default_targets, store_mercurial, update_from_basis, update_from_default};
