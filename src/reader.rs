//! The collaborator interface for the underlying table reader.
//!
//! `readerpool` does not know how to open a table; the reader's own
//! state machine, memory-mapping, and file handles are owned entirely by an
//! implementation of this trait, supplied by the surrounding system.

/// A pooled table reader.
///
/// The pool constructs a `R` lazily (via
/// [`ReaderFactory`](crate::ReaderFactory)) the first time a slot is used,
/// then cycles it between `reactivate`/`passivate` across subsequent
/// acquire/release pairs. `close` is called at most once across the
/// reader's lifetime: when it is evicted, locked away, or the pool shuts
/// down.
pub trait Reader: Send + Sync + 'static {
  /// The error type returned by [`Reader::reactivate`].
  type Error: std::error::Error + Send + Sync + 'static;

  /// Transitions the reader from passive back to active ahead of being
  /// handed to a caller. Called on every acquire of an already-resident
  /// reader; never called for a freshly constructed one.
  fn reactivate(&self) -> Result<(), Self::Error>;

  /// Transitions the reader to passive: suspends background work, but does
  /// not release file descriptors or memory mappings. Called on every
  /// successful release back into the pool.
  fn passivate(&self);

  /// Physically closes the reader, releasing its underlying resources.
  /// Called at most once across the reader's lifetime.
  fn close(self);
}
