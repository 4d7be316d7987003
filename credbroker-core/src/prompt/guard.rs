//! Single-shot timeout for an open prompt.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::session::PromptSession;
use super::signal::OutcomeSignal;

/// Turn a timeout in seconds into a duration; zero or negative means no
/// timeout at all.
pub fn timeout_from_seconds(seconds: i64) -> Option<Duration> {
  u64::try_from(seconds)
    .ok()
    .filter(|seconds| *seconds > 0)
    .map(Duration::from_secs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
  Armed,
  Cancelled,
  Fired,
}

#[derive(Debug)]
struct GuardShared {
  state: Mutex<GuardState>,
  wake: Condvar,
  fired: OutcomeSignal,
}

impl GuardShared {
  fn lock(&self) -> MutexGuard<'_, GuardState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Closes a prompt as timed out unless cancelled first.
///
/// The deferred action runs on its own thread. Firing happens while the
/// guard's lock is held and only if the prompt is still open, so a late
/// timeout can never override OK or Cancel. Dropping the guard cancels it and
/// waits for the thread to finish.
#[derive(Debug)]
pub struct TimeoutGuard {
  shared: Option<Arc<GuardShared>>,
  worker: Option<JoinHandle<()>>,
}

impl TimeoutGuard {
  /// Arm a guard for `session`. `None` or a zero duration leaves it unarmed.
  pub fn arm(timeout: Option<Duration>, session: PromptSession) -> Self {
    let Some(timeout) = timeout.filter(|timeout| !timeout.is_zero()) else {
      debug!("prompt timeout disabled");
      return Self::disarmed();
    };

    let shared = Arc::new(GuardShared {
      state: Mutex::new(GuardState::Armed),
      wake: Condvar::new(),
      fired: OutcomeSignal::new(),
    });
    let worker = {
      let shared = Arc::clone(&shared);
      thread::Builder::new()
        .name("credbroker-prompt-timeout".to_string())
        .spawn(move || run_timer(&shared, &session, timeout))
    };

    match worker {
      Ok(worker) => {
        debug!(timeout_secs = timeout.as_secs(), "prompt timeout armed");
        Self {
          shared: Some(shared),
          worker: Some(worker),
        }
      }
      Err(err) => {
        // Without a timer thread the prompt still works, it just waits.
        tracing::warn!(error = %err, "could not start prompt timer; waiting without a timeout");
        Self::disarmed()
      }
    }
  }

  /// A guard that never fires.
  pub const fn disarmed() -> Self {
    Self {
      shared: None,
      worker: None,
    }
  }

  /// Stand the guard down. Idempotent; returns `true` only if this call
  /// disarmed a pending timeout.
  pub fn cancel(&self) -> bool {
    let Some(shared) = &self.shared else {
      return false;
    };

    let mut state = shared.lock();
    if *state != GuardState::Armed {
      return false;
    }
    *state = GuardState::Cancelled;
    shared.wake.notify_all();
    debug!("prompt timeout cancelled");
    true
  }

  /// Whether a timeout is still pending
  pub fn is_armed(&self) -> bool {
    self
      .shared
      .as_ref()
      .is_some_and(|shared| *shared.lock() == GuardState::Armed)
  }

  /// Whether the guard fired and closed the prompt
  pub fn has_fired(&self) -> bool {
    self.shared.as_ref().is_some_and(|shared| shared.fired.is_fired())
  }
}

impl Drop for TimeoutGuard {
  fn drop(&mut self) {
    self.cancel();
    if let Some(worker) = self.worker.take() {
      let _ = worker.join();
    }
  }
}

fn run_timer(shared: &GuardShared, session: &PromptSession, timeout: Duration) {
  // A timeout too large to represent as an instant never elapses.
  let deadline = Instant::now().checked_add(timeout);
  let mut state = shared.lock();

  loop {
    if *state != GuardState::Armed {
      return;
    }

    state = match deadline {
      None => shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner),
      Some(deadline) => {
        let now = Instant::now();
        if now >= deadline {
          break;
        }
        shared
          .wake
          .wait_timeout(state, deadline - now)
          .unwrap_or_else(PoisonError::into_inner)
          .0
      }
    };
  }

  // Still holding the guard lock: a concurrent cancel cannot slip in between
  // the check above and closing the prompt.
  if session.time_out() {
    *state = GuardState::Fired;
    shared.fired.fire();
    info!(timeout_secs = timeout.as_secs(), "prompt timed out");
  } else {
    *state = GuardState::Cancelled;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prompt::session::PromptState;

  #[test]
  fn test_timeout_from_seconds() {
    assert_eq!(timeout_from_seconds(0), None);
    assert_eq!(timeout_from_seconds(-5), None);
    assert_eq!(timeout_from_seconds(3), Some(Duration::from_secs(3)));
  }

  #[test]
  fn test_fires_and_closes_open_prompt() {
    let session = PromptSession::new();
    let guard = TimeoutGuard::arm(Some(Duration::from_millis(30)), session.clone());

    assert_eq!(session.wait_closed(Some(Duration::from_secs(5))), PromptState::TimedOut);
    assert!(session.timed_out());
    // The worker sets its own flag right after closing the session.
    drop(guard);
  }

  #[test]
  fn test_has_fired_after_worker_finishes() {
    let session = PromptSession::new();
    let mut guard = TimeoutGuard::arm(Some(Duration::from_millis(10)), session.clone());
    if let Some(worker) = guard.worker.take() {
      worker.join().unwrap();
    }

    assert!(guard.has_fired());
    assert!(!guard.is_armed());
    assert!(!guard.cancel());
  }

  #[test]
  fn test_cancelled_guard_never_fires() {
    let session = PromptSession::new();
    let guard = TimeoutGuard::arm(Some(Duration::from_millis(30)), session.clone());

    assert!(guard.is_armed());
    assert!(guard.cancel());
    assert!(!guard.cancel());

    assert_eq!(session.wait_closed(Some(Duration::from_millis(150))), PromptState::Open);
    assert!(!guard.has_fired());
  }

  #[test]
  fn test_late_timeout_does_not_override_confirm() {
    let session = PromptSession::new();
    let mut guard = TimeoutGuard::arm(Some(Duration::from_millis(20)), session.clone());
    assert!(session.confirm());

    if let Some(worker) = guard.worker.take() {
      worker.join().unwrap();
    }
    assert_eq!(session.state(), PromptState::Confirmed);
    assert!(!session.timed_out());
    assert!(!guard.has_fired());
  }

  #[test]
  fn test_zero_timeout_is_never_armed() {
    let session = PromptSession::new();
    let guard = TimeoutGuard::arm(Some(Duration::ZERO), session.clone());

    assert!(!guard.is_armed());
    assert!(!guard.cancel());
    assert_eq!(session.wait_closed(Some(Duration::from_millis(50))), PromptState::Open);
  }

  #[test]
  fn test_unrepresentable_timeout_waits_until_cancelled() {
    let session = PromptSession::new();
    let guard = TimeoutGuard::arm(Some(Duration::MAX), session.clone());
    thread::sleep(Duration::from_millis(50));

    let worker_running = guard.worker.as_ref().is_some_and(|worker| !worker.is_finished());
    assert!(worker_running);
    assert!(guard.is_armed());

    assert!(guard.cancel());
    drop(guard);
    assert!(session.is_open());
  }
}
