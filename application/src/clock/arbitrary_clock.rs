use crate::clock::clock::Clock;
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock whose time only moves when told to. Used to drive session expiry in tests.
pub struct ArbitraryClock {
  pub now: AtomicI64,
}

impl Clock for ArbitraryClock {
  fn now(&self) -> i64 { self.now.load(Ordering::Relaxed) }
}

impl ArbitraryClock {
  pub fn new() -> ArbitraryClock {
    ArbitraryClock::at(0)
  }

  pub fn at(now: i64) -> ArbitraryClock {
    ArbitraryClock {
      now: AtomicI64::new(now),
    }
  }

  pub fn set(&self, now: i64) {
    self.now.store(now, Ordering::Relaxed);
  }

  pub fn advance(&self, secs: i64) {
    self.now.fetch_add(secs, Ordering::Relaxed);
  }
}

impl Default for ArbitraryClock {
  fn default() -> Self {
    ArbitraryClock::new()
  }
}
