//! The allocation primitive: one atomic owner word, one timestamp, one
//! reader cell.

use crate::sync::AtomicI64;
use crate::sync::Ordering;
use std::cell::UnsafeCell;

/// Sentinel marking a slot as free, or a `lockOwner`/`nextStatus` word as
/// unlocked.
pub(crate) const UNALLOCATED: i64 = -1;

/// Alias of [`UNALLOCATED`] used on `lockOwner` words, kept distinct for
/// readability at call sites.
pub(crate) const UNLOCKED: i64 = UNALLOCATED;

/// A single slot: `(owner, reader, timestamp)`.
///
/// Ownership of `allocation` is the only synchronization for `reader` and
/// `timestamp` — whichever thread observes `allocation == self` via a
/// successful CAS has exclusive read/write rights on the other two fields
/// until it releases the slot.
pub(crate) struct Slot<R> {
  allocation: AtomicI64,
  timestamp: AtomicI64,
  reader: UnsafeCell<Option<R>>,
}

// SAFETY: `reader` is only ever touched by the thread that currently holds
// `allocation`, which is enforced by CAS, not by the type system. `R: Send`
// is therefore sufficient for `Slot<R>` to cross thread boundaries; no `Sync`
// bound is needed on `R` because no two threads ever read it concurrently.
unsafe impl<R: Send> Send for Slot<R> {}
unsafe impl<R: Send> Sync for Slot<R> {}

impl<R> Slot<R> {
  pub(crate) fn new() -> Self {
    Self {
      allocation: AtomicI64::new(UNALLOCATED),
      timestamp: AtomicI64::new(0),
      reader: UnsafeCell::new(None),
    }
  }

  /// Attempts to claim this slot for `thread`. Returns `true` on success.
  pub(crate) fn try_acquire(&self, thread: i64) -> bool {
    self
      .allocation
      .compare_exchange(UNALLOCATED, thread, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  pub(crate) fn owner(&self) -> i64 {
    self.allocation.load(Ordering::Acquire)
  }

  pub(crate) fn stamp(&self, now: i64) {
    self.timestamp.store(now, Ordering::Release);
  }

  pub(crate) fn timestamp(&self) -> i64 {
    self.timestamp.load(Ordering::Acquire)
  }

  /// Releases the slot back to [`UNALLOCATED`].
  ///
  /// # Safety
  ///
  /// The caller must currently own the slot (have observed
  /// `allocation == thread` via [`Slot::try_acquire`] or equivalent).
  pub(crate) fn release(&self) {
    self.allocation.store(UNALLOCATED, Ordering::Release);
  }

  /// Attempts to reclaim an already-released slot for `thread`, used by the
  /// eviction sweep and by the post-close reclaim-on-shutdown path.
  pub(crate) fn try_reclaim(&self, thread: i64) -> bool {
    self.try_acquire(thread)
  }

  /// Runs `f` against the slot's reader cell.
  ///
  /// # Safety
  ///
  /// The caller must currently own the slot.
  pub(crate) unsafe fn with_reader_mut<T>(&self, f: impl FnOnce(&mut Option<R>) -> T) -> T {
    f(unsafe { &mut *self.reader.get() })
  }

  /// Borrows the resident reader for as long as `&self` lives.
  ///
  /// # Safety
  ///
  /// The caller must currently own the slot and know a reader is resident
  /// (true for the lifetime of any [`Handle`](crate::Handle)).
  pub(crate) unsafe fn resident_ref(&self) -> &R {
    unsafe { (*self.reader.get()).as_ref() }.expect("slot is occupied for the lifetime of its handle")
  }

  /// Opportunistically peeks whether a reader is resident, without
  /// requiring ownership. Used only by the eviction sweep as a cheap
  /// pre-filter before attempting the owning CAS; the authoritative check
  /// happens under ownership in [`Slot::with_reader_mut`].
  pub(crate) fn peek_resident(&self) -> bool {
    unsafe { (*self.reader.get()).is_some() }
  }
}
