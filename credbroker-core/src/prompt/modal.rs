//! The blocking modal loop.
//!
//! Draws the form, feeds it events and translates its actions into
//! session transitions until OK, Cancel or the timeout closes the prompt.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tracing::debug;

use super::form::{CredentialForm, FormAction};
use super::guard::TimeoutGuard;
use super::session::{PromptSession, PromptState};

/// How often the loop wakes up to notice a timeout when no input arrives.
pub const EVENT_TICK: Duration = Duration::from_millis(100);

/// Source of terminal input events.
pub trait EventSource {
  /// Wait up to `wait` for the next event.
  fn next_event(&mut self, wait: Duration) -> io::Result<Option<Event>>;
}

/// Events from the process's terminal via crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalEvents;

impl EventSource for TerminalEvents {
  fn next_event(&mut self, wait: Duration) -> io::Result<Option<Event>> {
    if event::poll(wait)? {
      event::read().map(Some)
    } else {
      Ok(None)
    }
  }
}

/// Run `form` until `session` closes and return the terminal state.
///
/// The first field interaction permanently cancels `guard`.
pub fn run_modal<B, E>(
  terminal: &mut Terminal<B>,
  events: &mut E,
  form: &mut CredentialForm,
  session: &PromptSession,
  guard: &TimeoutGuard,
) -> io::Result<PromptState>
where
  B: Backend,
  E: EventSource,
{
  while session.is_open() {
    terminal.draw(|frame| form.render(frame))?;

    let Some(event) = events.next_event(EVENT_TICK)? else {
      continue;
    };

    match form.handle_event(&event) {
      FormAction::Continue => {}
      FormAction::Interacted => {
        if guard.cancel() {
          debug!("user interacted with the prompt; timeout stood down");
        }
      }
      FormAction::Confirm => {
        session.confirm();
      }
      FormAction::Cancel => {
        session.cancel();
      }
    }
  }

  Ok(session.state())
}
