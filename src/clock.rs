//! Monotonic microsecond time source.

use std::time::Instant;

/// A monotonic microsecond clock.
///
/// Pluggable so tests can drive eviction deadlines deterministically instead
/// of racing the wall clock.
pub trait Clock: Send + Sync {
  /// Returns the current time in microseconds since an arbitrary, fixed
  /// epoch. Only differences between calls are meaningful.
  fn now_micros(&self) -> i64;
}

/// The default [`Clock`], backed by [`std::time::Instant`].
pub struct SystemClock {
  epoch: Instant,
}

impl SystemClock {
  /// Creates a clock whose epoch is the instant of construction.
  #[must_use]
  pub fn new() -> Self {
    Self { epoch: Instant::now() }
  }
}

impl Default for SystemClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for SystemClock {
  fn now_micros(&self) -> i64 {
    i64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(i64::MAX)
  }
}
