//! # Credential Broker
//!
//! The acquire flow used by build tooling: cached value, then the OS
//! store, then an interactive prompt whose answer is written back.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::credential::Credential;
use crate::prompt::{CredentialPrompter, PromptError, PromptRequest};
use crate::store::{CredentialStore, NativeGateway, WriteError};

/// Failures of [`CredentialBroker::acquire`].
#[derive(Debug, Error)]
pub enum BrokerError {
  #[error("User did not supply credentials for '{credential_type}'")]
  NotSupplied { credential_type: String },

  #[error(transparent)]
  Prompt(#[from] PromptError),

  #[error("Failed to store credentials for '{credential_type}': {source}")]
  Write {
    credential_type: String,
    #[source]
    source: WriteError,
  },
}

impl BrokerError {
  /// Whether the enclosing operation must abort rather than fall back.
  pub const fn is_fatal(&self) -> bool {
    matches!(self, Self::Prompt(err) if err.is_fatal())
  }
}

/// Hands out credentials by type, asking the user only when the store has
/// none.
pub struct CredentialBroker<G, P> {
  store: CredentialStore<G>,
  prompter: P,
  config: BrokerConfig,
  default_user_name: String,
  cache: Mutex<HashMap<String, Credential>>,
}

impl<G: NativeGateway, P: CredentialPrompter> CredentialBroker<G, P> {
  pub fn new(store: CredentialStore<G>, prompter: P, config: BrokerConfig) -> Self {
    Self {
      store,
      prompter,
      config,
      default_user_name: current_user_name(),
      cache: Mutex::new(HashMap::new()),
    }
  }

  /// Use `user_name` as the prompt's initial user name
  pub fn with_default_user_name(mut self, user_name: impl Into<String>) -> Self {
    self.default_user_name = user_name.into();
    self
  }

  pub const fn config(&self) -> &BrokerConfig {
    &self.config
  }

  pub const fn store(&self) -> &CredentialStore<G> {
    &self.store
  }

  /// Get the credential for `credential_type`.
  ///
  /// # Errors
  ///
  /// [`BrokerError::NotSupplied`] when the user cancels the prompt,
  /// [`BrokerError::Prompt`] when prompting fails (a timeout is fatal), and
  /// [`BrokerError::Write`] when the entered credential cannot be stored.
  pub fn acquire(&self, credential_type: &str) -> Result<Credential, BrokerError> {
    if let Some(credential) = self.cache().get(credential_type) {
      debug!(credential_type, "credential cache hit");
      return Ok(credential.clone());
    }

    let target = self.config.storage_key(credential_type);
    let credential = match self.store.read_credential(&target) {
      Ok(credential) => {
        debug!(target_name = %target, "credential found in store");
        credential
      }
      Err(err) => {
        debug!(target_name = %target, error = %err, "no usable stored credential, prompting");
        self.prompt_and_store(credential_type, &target)?
      }
    };

    self
      .cache()
      .insert(credential_type.to_string(), credential.clone());
    Ok(credential)
  }

  /// [`Self::acquire`] for the configured default credential type
  pub fn acquire_default(&self) -> Result<Credential, BrokerError> {
    let credential_type = self.config.default_credential_type.clone();
    self.acquire(&credential_type)
  }

  /// Drop a cached credential; returns whether one was cached
  pub fn forget(&self, credential_type: &str) -> bool {
    self.cache().remove(credential_type).is_some()
  }

  fn prompt_and_store(&self, credential_type: &str, target: &str) -> Result<Credential, BrokerError> {
    let request = PromptRequest::new(target)
      .with_instructions(self.config.instructions_for(credential_type).iter().cloned())
      .with_initial_user_name(self.default_user_name.clone())
      .with_timeout_seconds(self.config.timeout_seconds);

    let credential = self
      .prompter
      .prompt(&request)?
      .ok_or_else(|| BrokerError::NotSupplied {
        credential_type: credential_type.to_string(),
      })?;

    self
      .store
      .write(target, &credential, self.config.persistence)
      .map_err(|source| BrokerError::Write {
        credential_type: credential_type.to_string(),
        source,
      })?;
    info!(target_name = target, username = credential.username(), "stored prompted credential");

    Ok(credential)
  }

  fn cache(&self) -> MutexGuard<'_, HashMap<String, Credential>> {
    self.cache.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// The logged-in user's name, lower-cased; empty if unknown.
pub fn current_user_name() -> String {
  ["USERNAME", "USER", "LOGNAME"]
    .iter()
    .find_map(|var| std::env::var(var).ok().filter(|name| !name.is_empty()))
    .map(|name| name.to_lowercase())
    .unwrap_or_default()
}
