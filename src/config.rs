//! The pool's configuration surface (§6 of the design): four options, no
//! others.

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::error::FactoryError;
use crate::reader::Reader;
use std::sync::Arc;

/// Callback used on first acquire for a slot.
pub type ReaderFactory<R> = Arc<dyn Fn(&[u8]) -> Result<R, FactoryError> + Send + Sync>;

const DEFAULT_TTL_MICROS: i64 = 60_000_000;
const DEFAULT_MAX_SEGMENTS: usize = 64;

/// Immutable configuration for one [`Pool`](crate::Pool).
pub struct Configuration<R: Reader> {
  pub(crate) inactive_reader_ttl_micros: i64,
  pub(crate) reader_pool_max_segments: usize,
  pub(crate) reader_factory: ReaderFactory<R>,
  pub(crate) clock: Arc<dyn Clock>,
}

impl<R: Reader> Configuration<R> {
  /// Starts building a [`Configuration`]. A [`ReaderFactory`] must be
  /// supplied before [`ConfigurationBuilder::build`].
  #[must_use]
  pub fn builder() -> ConfigurationBuilder<R> {
    ConfigurationBuilder::new()
  }

  /// Eviction deadline offset used by the idle sweep.
  #[must_use]
  pub fn inactive_reader_ttl_micros(&self) -> i64 {
    self.inactive_reader_ttl_micros
  }

  /// Maximum entries per chain. Total maximum slots per table is
  /// `reader_pool_max_segments * ENTRY_SIZE`.
  #[must_use]
  pub fn reader_pool_max_segments(&self) -> usize {
    self.reader_pool_max_segments
  }
}

/// Builder for [`Configuration`].
pub struct ConfigurationBuilder<R: Reader> {
  inactive_reader_ttl_micros: i64,
  reader_pool_max_segments: usize,
  reader_factory: Option<ReaderFactory<R>>,
  clock: Arc<dyn Clock>,
}

impl<R: Reader> ConfigurationBuilder<R> {
  fn new() -> Self {
    Self {
      inactive_reader_ttl_micros: DEFAULT_TTL_MICROS,
      reader_pool_max_segments: DEFAULT_MAX_SEGMENTS,
      reader_factory: None,
      clock: Arc::new(SystemClock::new()),
    }
  }

  /// Overrides the idle eviction TTL, in microseconds. Defaults to 60s.
  #[must_use]
  pub fn inactive_reader_ttl_micros(mut self, ttl: i64) -> Self {
    self.inactive_reader_ttl_micros = ttl;
    self
  }

  /// Overrides the maximum chain length per table. Defaults to 64.
  #[must_use]
  pub fn reader_pool_max_segments(mut self, max_segments: usize) -> Self {
    assert!(max_segments >= 1, "reader_pool_max_segments must be at least 1");
    self.reader_pool_max_segments = max_segments;
    self
  }

  /// Supplies the callback used to construct a reader on first acquire.
  /// Required.
  #[must_use]
  pub fn reader_factory(mut self, factory: ReaderFactory<R>) -> Self {
    self.reader_factory = Some(factory);
    self
  }

  /// Overrides the monotonic clock. Defaults to [`SystemClock`].
  #[must_use]
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Finalizes the configuration.
  ///
  /// # Panics
  ///
  /// Panics if no [`ConfigurationBuilder::reader_factory`] was supplied.
  #[must_use]
  pub fn build(self) -> Configuration<R> {
    Configuration {
      inactive_reader_ttl_micros: self.inactive_reader_ttl_micros,
      reader_pool_max_segments: self.reader_pool_max_segments,
      reader_factory: self.reader_factory.expect("reader_factory is required"),
      clock: self.clock,
    }
  }
}
