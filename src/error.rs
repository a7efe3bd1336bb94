//! Typed error surface for the pool's public operations.

/// A boxed, type-erased error produced by a [`Reader`](crate::Reader)
/// implementation's `reactivate` transition or by the
/// [`ReaderFactory`](crate::ReaderFactory) callback.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`Pool`](crate::Pool) operations.
///
/// [`PoolError::Critical`] marks an invariant violation in the calling code
/// (a double-close, or an `unlock` by a thread that does not hold the lock).
/// It is deliberately not retried or swallowed anywhere in this crate.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
  /// The pool has been closed; no further handles will be handed out.
  #[error("reader pool is closed")]
  Closed,

  /// Another thread holds the exclusive lock on this table.
  #[error("table is exclusively locked by another thread")]
  Locked,

  /// The chain has reached its configured segment limit and every slot is
  /// owned.
  #[error("reader pool for this table is at capacity")]
  Unavailable,

  /// Reader construction or reactivation failed.
  #[error("reader operation failed")]
  Factory(#[source] FactoryError),

  /// A caller violated a pool invariant (double-close, unlock by a
  /// non-owner, unlock of an unknown table). Unrecoverable.
  #[error("reader pool invariant violated: {0}")]
  Critical(&'static str),
}

impl PoolError {
  pub(crate) fn factory<E>(error: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Factory(Box::new(error))
  }
}
