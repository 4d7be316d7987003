use std::sync::atomic::{AtomicBool, Ordering};

/// A one-shot latch: starts unset, can be set once, stays set.
#[derive(Debug, Default)]
pub struct OutcomeSignal {
  fired: AtomicBool,
}

impl OutcomeSignal {
  pub const fn new() -> Self {
    Self {
      fired: AtomicBool::new(false),
    }
  }

  /// Set the latch. Returns `true` only for the call that set it.
  pub fn fire(&self) -> bool {
    self
      .fired
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  pub fn is_fired(&self) -> bool {
    self.fired.load(Ordering::Acquire)
  }
}
