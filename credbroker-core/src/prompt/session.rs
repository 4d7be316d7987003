//! The shared "is the prompt still open" resource.
//!
//! OK, Cancel and the timeout each try to move the session out of `Open`.
//! The transition happens under one lock, so exactly one of them succeeds;
//! the winner records its signal and the others observe a closed session.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::signal::OutcomeSignal;

/// Lifecycle of a prompt. Every state but `Open` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
  Open,
  Confirmed,
  Cancelled,
  TimedOut,
}

impl PromptState {
  pub const fn is_open(self) -> bool {
    matches!(self, Self::Open)
  }
}

#[derive(Debug)]
struct SessionInner {
  state: Mutex<PromptState>,
  closed: Condvar,
  ok_fired: OutcomeSignal,
  cancel_fired: OutcomeSignal,
  timed_out: OutcomeSignal,
}

/// Handle to one prompt's state. Clones refer to the same prompt.
#[derive(Debug, Clone)]
pub struct PromptSession {
  inner: Arc<SessionInner>,
}

impl Default for PromptSession {
  fn default() -> Self {
    Self::new()
  }
}

impl PromptSession {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(SessionInner {
        state: Mutex::new(PromptState::Open),
        closed: Condvar::new(),
        ok_fired: OutcomeSignal::new(),
        cancel_fired: OutcomeSignal::new(),
        timed_out: OutcomeSignal::new(),
      }),
    }
  }

  pub fn state(&self) -> PromptState {
    *self.lock()
  }

  pub fn is_open(&self) -> bool {
    self.state().is_open()
  }

  /// OK was activated. Returns `false` if the prompt had already closed.
  pub fn confirm(&self) -> bool {
    self.close(PromptState::Confirmed, &self.inner.ok_fired)
  }

  /// Cancel was activated. Returns `false` if the prompt had already closed.
  pub fn cancel(&self) -> bool {
    self.close(PromptState::Cancelled, &self.inner.cancel_fired)
  }

  /// The timeout elapsed. Returns `false` if the prompt had already closed.
  pub fn time_out(&self) -> bool {
    self.close(PromptState::TimedOut, &self.inner.timed_out)
  }

  pub fn ok_fired(&self) -> bool {
    self.inner.ok_fired.is_fired()
  }

  pub fn cancel_fired(&self) -> bool {
    self.inner.cancel_fired.is_fired()
  }

  pub fn timed_out(&self) -> bool {
    self.inner.timed_out.is_fired()
  }

  /// Block until the prompt closes or `limit` elapses, returning the state
  /// seen last. `None` waits without a limit.
  pub fn wait_closed(&self, limit: Option<Duration>) -> PromptState {
    let deadline = limit.map(|limit| Instant::now() + limit);
    let mut state = self.lock();

    while state.is_open() {
      state = match deadline {
        None => self.inner.closed.wait(state).unwrap_or_else(PoisonError::into_inner),
        Some(deadline) => {
          let now = Instant::now();
          if now >= deadline {
            break;
          }
          self
            .inner
            .closed
            .wait_timeout(state, deadline - now)
            .unwrap_or_else(PoisonError::into_inner)
            .0
        }
      };
    }

    *state
  }

  fn close(&self, outcome: PromptState, signal: &OutcomeSignal) -> bool {
    let mut state = self.lock();
    if !state.is_open() {
      debug!(?outcome, current = ?*state, "prompt already closed, ignoring");
      return false;
    }

    *state = outcome;
    signal.fire();
    self.inner.closed.notify_all();

    debug!(?outcome, "prompt closed");
    true
  }

  fn lock(&self) -> MutexGuard<'_, PromptState> {
    self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use std::thread;

  use super::*;

  #[test]
  fn test_first_close_wins() {
    let session = PromptSession::new();
    assert!(session.is_open());

    assert!(session.confirm());
    assert!(!session.time_out());
    assert!(!session.cancel());

    assert_eq!(session.state(), PromptState::Confirmed);
    assert!(session.ok_fired());
    assert!(!session.timed_out());
    assert!(!session.cancel_fired());
  }

  #[test]
  fn test_racing_closers_set_exactly_one_signal() {
    for _ in 0..50 {
      let session = PromptSession::new();
      let racers: Vec<_> = [PromptState::Confirmed, PromptState::Cancelled, PromptState::TimedOut]
        .into_iter()
        .map(|outcome| {
          let session = session.clone();
          thread::spawn(move || match outcome {
            PromptState::Confirmed => session.confirm(),
            PromptState::Cancelled => session.cancel(),
            _ => session.time_out(),
          })
        })
        .collect();

      let winners = racers.into_iter().map(|r| r.join().unwrap()).filter(|won| *won).count();
      let signals = [session.ok_fired(), session.cancel_fired(), session.timed_out()];

      assert_eq!(winners, 1);
      assert_eq!(signals.iter().filter(|fired| **fired).count(), 1);
      assert!(!session.is_open());
    }
  }

  #[test]
  fn test_wait_closed_returns_when_another_thread_closes() {
    let session = PromptSession::new();
    let closer = {
      let session = session.clone();
      thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        session.cancel();
      })
    };

    assert_eq!(session.wait_closed(None), PromptState::Cancelled);
    closer.join().unwrap();
  }

  #[test]
  fn test_wait_closed_honours_limit() {
    let session = PromptSession::new();
    assert_eq!(session.wait_closed(Some(Duration::from_millis(10))), PromptState::Open);
  }
}
