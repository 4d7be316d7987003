//! # Interactive Credential Prompt
//!
//! A modal terminal form that asks the user for a user name and password
//! and finishes in exactly one of three ways: OK, Cancel, or timeout.
//!
//! OK resolves to `Some(Credential)` and Cancel to `None`. A timeout is an
//! error: it means nobody was there to answer, and an unattended run must
//! stop rather than hang or carry on without credentials.

mod form;
mod guard;
mod modal;
mod session;
mod signal;

use std::io::{self, IsTerminal};

pub use form::{CredentialForm, Field, FormAction};
pub use guard::{TimeoutGuard, timeout_from_seconds};
pub use modal::{EVENT_TICK, EventSource, TerminalEvents, run_modal};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
pub use session::{PromptSession, PromptState};
pub use signal::OutcomeSignal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::credential::Credential;

/// What to show in a prompt and how long to wait.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptRequest {
  pub title: String,
  /// Shown above the fields, in order
  pub instructions: Vec<String>,
  pub initial_user_name: String,
  /// Zero or negative waits for the user indefinitely
  pub timeout_seconds: i64,
}

impl PromptRequest {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      ..Self::default()
    }
  }

  pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.instructions = instructions.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_initial_user_name(mut self, user_name: impl Into<String>) -> Self {
    self.initial_user_name = user_name.into();
    self
  }

  pub const fn with_timeout_seconds(mut self, seconds: i64) -> Self {
    self.timeout_seconds = seconds;
    self
  }
}

/// Failures of an interactive prompt.
#[derive(Debug, Error)]
pub enum PromptError {
  #[error(
    "Timed out after {seconds}s waiting for credentials in an interactive prompt. \
     Store the credential up front (for example with `credbroker set`) if this is an automated run. \
     Aborting so that an unattended run does not hang."
  )]
  TimedOut { seconds: i64 },

  #[error("Terminal error while prompting for credentials: {0}")]
  Terminal(#[from] io::Error),

  #[error("Cannot prompt for credentials: no interactive terminal is attached")]
  NoTerminal,
}

impl PromptError {
  /// Whether this failure must abort the enclosing operation.
  pub const fn is_fatal(&self) -> bool {
    matches!(self, Self::TimedOut { .. })
  }
}

/// Anything that can ask a person for credentials.
pub trait CredentialPrompter {
  /// `Ok(None)` means the user declined.
  fn prompt(&self, request: &PromptRequest) -> Result<Option<Credential>, PromptError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl CredentialPrompter for TerminalPrompter {
  fn prompt(&self, request: &PromptRequest) -> Result<Option<Credential>, PromptError> {
    prompt_for_credentials(request)
  }
}

/// Show the prompt on the controlling terminal and block until it closes.
///
/// The form is drawn on stderr so that stdout stays free for the caller's
/// machine-readable output. Raw mode and the alternate screen are undone on
/// every exit path.
///
/// # Errors
///
/// [`PromptError::TimedOut`] if the timeout fired, [`PromptError::NoTerminal`]
/// when stdin or stderr is not a terminal, [`PromptError::Terminal`] on I/O
/// failure.
pub fn prompt_for_credentials(request: &PromptRequest) -> Result<Option<Credential>, PromptError> {
  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    warn!(title = %request.title, "no terminal available for credential prompt");
    return Err(PromptError::NoTerminal);
  }

  let screen = ScreenGuard::enter()?;
  let mut terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
  let result = prompt_with(&mut terminal, &mut TerminalEvents, request);

  drop(terminal);
  screen.restore()?;

  result
}

/// Run the prompt on an arbitrary backend and event source.
///
/// # Errors
///
/// As for [`prompt_for_credentials`], minus the terminal checks.
pub fn prompt_with<B, E>(
  terminal: &mut Terminal<B>,
  events: &mut E,
  request: &PromptRequest,
) -> Result<Option<Credential>, PromptError>
where
  B: Backend,
  E: EventSource,
{
  let session = PromptSession::new();
  let mut form = CredentialForm::new(
    request.title.clone(),
    request.instructions.clone(),
    request.initial_user_name.clone(),
  );
  let guard = TimeoutGuard::arm(timeout_from_seconds(request.timeout_seconds), session.clone());

  debug!(
    title = %request.title,
    timeout_seconds = request.timeout_seconds,
    "showing credential prompt"
  );
  let state = run_modal(terminal, events, &mut form, &session, &guard);
  drop(guard);

  resolve(state?, form, request)
}

/// Map the state the prompt closed in to the prompt's result.
fn resolve(state: PromptState, form: CredentialForm, request: &PromptRequest) -> Result<Option<Credential>, PromptError> {
  match state {
    PromptState::TimedOut => Err(PromptError::TimedOut {
      seconds: request.timeout_seconds,
    }),
    PromptState::Confirmed => {
      info!(title = %request.title, user_name = form.user_name(), "credentials entered");
      Ok(Some(form.into_credential()))
    }
    PromptState::Cancelled => {
      info!(title = %request.title, "user declined to supply credentials");
      Ok(None)
    }
    PromptState::Open => {
      warn!(title = %request.title, "prompt loop ended while the prompt was still open");
      Ok(None)
    }
  }
}

/// Raw mode, alternate screen and mouse capture for the lifetime of a prompt.
struct ScreenGuard {
  active: bool,
}

impl ScreenGuard {
  fn enter() -> io::Result<Self> {
    crossterm::terminal::enable_raw_mode()?;
    let guard = Self { active: true };
    crossterm::execute!(
      io::stderr(),
      crossterm::terminal::EnterAlternateScreen,
      crossterm::event::EnableMouseCapture
    )?;
    Ok(guard)
  }

  fn restore(mut self) -> io::Result<()> {
    self.active = false;
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
      io::stderr(),
      crossterm::event::DisableMouseCapture,
      crossterm::terminal::LeaveAlternateScreen,
      crossterm::cursor::Show
    )
  }
}

impl Drop for ScreenGuard {
  fn drop(&mut self) {
    if self.active {
      let _ = crossterm::terminal::disable_raw_mode();
      let _ = crossterm::execute!(
        io::stderr(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
      );
    }
  }
}
