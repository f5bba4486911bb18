/// Source of "now" in seconds since the epoch.
pub trait Clock: Send + Sync {
  fn now(&self) -> i64;
}
