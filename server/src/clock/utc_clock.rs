use crate::clock::clock::Clock;
use chrono::Utc;

/// Wall clock used by the running server for session activity and order times.
pub struct UtcClock();

impl Clock for UtcClock {
  fn now(&self) -> i64 {
    Utc::now().timestamp()
  }
}
