//! Per-table chain segments.

use crate::slot::Slot;
use crate::slot::UNLOCKED;
use crate::sync::AtomicI64;
use crate::sync::AtomicU8;
use crate::sync::Ordering;
use crate::sync::spin_loop;
use crossbeam_utils::CachePadded;
use std::sync::Arc;
use std::sync::OnceLock;

/// Fixed number of slots per chain segment.
pub const ENTRY_SIZE: usize = 32;

const STATUS_OPEN: u8 = 0;
const STATUS_ALLOCATED: u8 = 1;
const STATUS_LOCKED: u8 = 2;

/// Outcome of attempting to acquire a free slot in one [`Entry`].
pub(crate) enum AcquireOutcome {
  /// Claimed slot `index`.
  Acquired(usize),
  /// No free slot in this entry; the chain should grow or advance.
  Exhausted,
}

/// One segment of a table's reader chain.
///
/// `lock_owner` and `next_status` are rarely-written control words; the
/// `slots` array is the hot path for every `get`/`close`. Separating them
/// into their own cache lines keeps acquire/release traffic from bouncing
/// the lock-protocol cache line between cores.
pub(crate) struct Entry<R> {
  pub(crate) index: usize,
  slots: Box<[Slot<R>; ENTRY_SIZE]>,
  control: CachePadded<Control>,
  next: OnceLock<Arc<Entry<R>>>,
}

struct Control {
  lock_owner: AtomicI64,
  next_status: AtomicU8,
}

impl<R> Entry<R> {
  pub(crate) fn new(index: usize) -> Self {
    Self {
      index,
      slots: Box::new(std::array::from_fn(|_| Slot::new())),
      control: CachePadded::new(Control {
        lock_owner: AtomicI64::new(UNLOCKED),
        next_status: AtomicU8::new(STATUS_OPEN),
      }),
      next: OnceLock::new(),
    }
  }

  pub(crate) fn slot(&self, index: usize) -> &Slot<R> {
    &self.slots[index]
  }

  pub(crate) fn slots(&self) -> &[Slot<R>; ENTRY_SIZE] {
    &self.slots
  }

  pub(crate) fn lock_owner(&self) -> i64 {
    self.control.lock_owner.load(Ordering::Acquire)
  }

  /// Attempts to claim a free slot for `thread`, scanning from index `0`.
  pub(crate) fn try_acquire_slot(&self, thread: i64) -> AcquireOutcome {
    for (index, slot) in self.slots.iter().enumerate() {
      if slot.try_acquire(thread) {
        return AcquireOutcome::Acquired(index);
      }
    }
    AcquireOutcome::Exhausted
  }

  /// Attempts `CAS(lock_owner, UNLOCKED, self)`. Returns `true` if the
  /// caller now holds (or already held) the lock.
  pub(crate) fn try_acquire_lock(&self, thread: i64) -> bool {
    match self
      .control
      .lock_owner
      .compare_exchange(UNLOCKED, thread, Ordering::AcqRel, Ordering::Acquire)
    {
      Ok(_) => true,
      Err(actual) => actual == thread,
    }
  }

  pub(crate) fn release_lock(&self) {
    self.control.lock_owner.store(UNLOCKED, Ordering::Release);
  }

  /// Either returns the already-published successor, or attempts to become
  /// the thread that constructs it. Returns `Err(())` if growth is
  /// permanently blocked because this entry is locked.
  pub(crate) fn grow_or_wait(&self) -> Result<Arc<Entry<R>>, ()> {
    loop {
      match self.control.next_status.load(Ordering::Acquire) {
        STATUS_LOCKED => return Err(()),
        STATUS_ALLOCATED => return Ok(self.wait_for_next()),
        STATUS_OPEN => {
          if self
            .control
            .next_status
            .compare_exchange(STATUS_OPEN, STATUS_ALLOCATED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
          {
            let successor = Arc::new(Entry::new(self.index + 1));
            // `next` is set exactly once by the sole CAS winner above.
            let _ = self.next.set(Arc::clone(&successor));
            return Ok(successor);
          }
          // Lost the race; re-read and retry.
        }
        _ => unreachable!("invalid next_status"),
      }
    }
  }

  fn wait_for_next(&self) -> Arc<Entry<R>> {
    loop {
      if let Some(next) = self.next.get() {
        return Arc::clone(next);
      }
      spin_loop();
    }
  }

  pub(crate) fn next(&self) -> Option<Arc<Entry<R>>> {
    self.next.get().map(Arc::clone)
  }

  /// Blocks further chain growth by transitioning `next_status` to
  /// `LOCKED`, or descends into an already-growing successor.
  ///
  /// Returns `Ok(Some(next))` when the caller must continue locking into
  /// `next`, `Ok(None)` when the chain now ends here (locked), and
  /// `Err(())` on an unreachable-by-protocol state.
  pub(crate) fn block_growth(&self) -> Result<Option<Arc<Entry<R>>>, ()> {
    loop {
      match self.control.next_status.load(Ordering::Acquire) {
        STATUS_OPEN => {
          if self
            .control
            .next_status
            .compare_exchange(STATUS_OPEN, STATUS_LOCKED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
          {
            return Ok(None);
          }
          // Lost the race to a concurrent grower or locker; re-read.
        }
        STATUS_ALLOCATED => return Ok(Some(self.wait_for_next())),
        STATUS_LOCKED => return Ok(None),
        _ => return Err(()),
      }
    }
  }
}
