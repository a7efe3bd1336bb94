//! Observability hooks: typed events emitted on every state-change boundary.

/// The component that produced an [`Event`].
///
/// Currently always [`Source::Reader`]; kept as an enum (rather than a bare
/// constant) because the same listener shape is shared with the writer pool
/// in the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  /// The reader pool.
  Reader,
}

/// The exhaustive set of event codes emitted by [`Pool`](crate::Pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
  /// A reader was constructed for the first time in a slot.
  Create,
  /// A handle was handed out for an already-resident reader.
  Get,
  /// A handle was returned to the pool.
  Return,
  /// A reader was physically closed by the idle eviction sweep.
  Expire,
  /// A `get` failed because the chain is at capacity.
  Full,
  /// `lock` succeeded.
  LockSuccess,
  /// `lock` failed because a slot was owned by another thread.
  LockBusy,
  /// `lock` physically closed a resident reader while claiming its slot.
  LockClose,
  /// `unlock` succeeded.
  Unlocked,
  /// `unlock` was called on a table with no active lock.
  NotLocked,
  /// `unlock` was called by a thread that does not hold the lock.
  NotLockOwner,
}

/// A single observability event.
///
/// `segment_index` and `slot_index` are `-1` for events that are not tied to
/// a specific slot (for example `FULL`, `UNLOCKED`).
#[derive(Debug, Clone)]
pub struct Event {
  /// The event code.
  pub kind: EventKind,
  /// Always [`Source::Reader`] for this pool.
  pub source: Source,
  /// The id of the thread that triggered the event.
  pub thread_id: i64,
  /// The table name the event concerns.
  pub name: Box<[u8]>,
  /// The chain segment involved, or `-1`.
  pub segment_index: i64,
  /// The slot within the segment involved, or `-1`.
  pub slot_index: i64,
}

impl Event {
  pub(crate) fn new(kind: EventKind, thread_id: i64, name: &[u8], segment_index: i64, slot_index: i64) -> Self {
    Self {
      kind,
      source: Source::Reader,
      thread_id,
      name: Box::from(name),
      segment_index,
      slot_index,
    }
  }
}

/// A capability invoked on every state-change event.
///
/// Implementations must not block or panic; the pool calls this on its hot
/// paths while holding no internal lock, but a slow listener still adds
/// latency to every caller.
pub trait Listener: Send + Sync {
  /// Receives one event.
  fn on_event(&self, event: &Event);
}

impl<F> Listener for F
where
  F: Fn(&Event) + Send + Sync,
{
  fn on_event(&self, event: &Event) {
    self(event);
  }
}
