//! Pool lifecycle and the four core operations: `get`, `lock`/`unlock`, and
//! `release_all`.

use crate::entry::AcquireOutcome;
use crate::entry::ENTRY_SIZE;
use crate::entry::Entry;
use crate::error::PoolError;
use crate::handle::Handle;
use crate::listener::Event;
use crate::listener::EventKind;
use crate::listener::Listener;
use crate::reader::Reader;
use crate::slot::UNALLOCATED;
use crate::thread_id::current_thread_id;
use crate::Configuration;
use dashmap::DashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A lock-free, segmented pool of reusable table readers.
///
/// `Pool` is a cheaply-cloneable handle (an [`Arc`] internally): clone it
/// to share the same pool across threads rather than wrapping it in an
/// `Arc` yourself. See the [crate-level documentation](crate) for an
/// overview.
pub struct Pool<R: Reader> {
  inner: Arc<Inner<R>>,
}

impl<R: Reader> Clone for Pool<R> {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

struct Inner<R: Reader> {
  configuration: Configuration<R>,
  entries: DashMap<Box<[u8]>, Arc<Entry<R>>>,
  closed: AtomicBool,
  listener: Option<Arc<dyn Listener>>,
}

/// A read-only diagnostic snapshot of one table's chain, returned by
/// [`Pool::entries`].
#[derive(Debug, Clone)]
pub struct EntryInfo {
  /// The table name.
  pub name: Box<[u8]>,
  /// Number of segments currently in the chain.
  pub segments: usize,
  /// Whether the chain is currently exclusively locked.
  pub locked: bool,
  /// Number of slots currently owned, across the whole chain.
  pub busy_slots: usize,
}

impl<R: Reader> Pool<R> {
  /// Creates a new, open pool.
  #[must_use]
  pub fn new(configuration: Configuration<R>, listener: Option<Arc<dyn Listener>>) -> Self {
    tracing::debug!(
      ttl_micros = configuration.inactive_reader_ttl_micros,
      max_segments = configuration.reader_pool_max_segments,
      "reader pool created"
    );

    Self {
      inner: Arc::new(Inner {
        configuration,
        entries: DashMap::new(),
        closed: AtomicBool::new(false),
        listener,
      }),
    }
  }

  pub(crate) fn emit(&self, kind: EventKind, thread_id: i64, name: &[u8], segment_index: i64, slot_index: i64) {
    let event = Event::new(kind, thread_id, name, segment_index, slot_index);
    tracing::trace!(?event.kind, event.thread_id, event.segment_index, event.slot_index, "reader pool event");

    if let Some(listener) = &self.inner.listener {
      listener.on_event(&event);
    }
  }

  pub(crate) fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::Acquire)
  }

  pub(crate) fn now_micros(&self) -> i64 {
    self.inner.configuration.clock.now_micros()
  }

  fn head(&self, name: &[u8]) -> Arc<Entry<R>> {
    if let Some(entry) = self.inner.entries.get(name) {
      return Arc::clone(&entry);
    }

    Arc::clone(
      self
        .inner
        .entries
        .entry(Box::from(name))
        .or_insert_with(|| Arc::new(Entry::new(0))),
    )
  }

  /// Acquires a handle to `name`'s reader, constructing or reactivating it
  /// as needed.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::Closed`] if the pool has been closed,
  /// [`PoolError::Locked`] if another thread holds the exclusive lock on
  /// this table, [`PoolError::Unavailable`] if the chain is at capacity, or
  /// [`PoolError::Factory`] if reader construction/reactivation failed.
  pub fn get(&self, name: &[u8]) -> Result<Handle<R>, PoolError> {
    if self.is_closed() {
      return Err(PoolError::Closed);
    }

    let thread = current_thread_id();
    let head = self.head(name);

    if head.lock_owner() != UNALLOCATED {
      return Err(PoolError::Locked);
    }

    let mut current = head;

    loop {
      match current.try_acquire_slot(thread) {
        AcquireOutcome::Acquired(index) => {
          let now = self.inner.configuration.clock.now_micros();
          let slot = current.slot(index);
          slot.stamp(now);

          let outcome = unsafe {
            slot.with_reader_mut(|resident| -> Result<bool, PoolError> {
              match resident {
                Some(reader) => {
                  if let Err(error) = reader.reactivate() {
                    let reader = resident.take().expect("checked Some above");
                    reader.close();
                    return Err(PoolError::factory(error));
                  }
                  Ok(false)
                }
                None => match (self.inner.configuration.reader_factory)(name) {
                  Ok(reader) => {
                    *resident = Some(reader);
                    Ok(true)
                  }
                  Err(error) => Err(PoolError::Factory(error)),
                },
              }
            })
          };

          // Release happens after `with_reader_mut` returns, never inside
          // its closure: releasing while the closure still holds
          // `&mut Option<R>` would let a concurrent `get` CAS-acquire this
          // slot and call `with_reader_mut` again before our borrow ends.
          let constructed = match outcome {
            Ok(constructed) => constructed,
            Err(error) => {
              slot.release();
              return Err(error);
            }
          };

          // Every successful acquire emits GET; a freshly constructed
          // reader additionally emits CREATE, so one acquire can carry
          // both events.
          if constructed {
            self.emit(EventKind::Create, thread, name, current.index as i64, index as i64);
          }
          self.emit(EventKind::Get, thread, name, current.index as i64, index as i64);

          if self.is_closed() {
            // Pool closed between our CAS and publication: detach the
            // reader and hand it to the caller as an orphan instead of
            // leaving it pooled where the shutdown sweep would never see it.
            let reader = unsafe { slot.with_reader_mut(std::mem::take) }
              .expect("reader was just installed or reactivated above");
            slot.release();
            return Ok(Handle::orphaned(reader));
          }

          return Ok(Handle::pooled(self.clone(), Arc::clone(&current), index, thread, Box::from(name)));
        }
        AcquireOutcome::Exhausted => {
          if current.index + 1 >= self.inner.configuration.reader_pool_max_segments {
            self.emit(EventKind::Full, thread, name, current.index as i64, -1);
            return Err(PoolError::Unavailable);
          }

          match current.grow_or_wait() {
            Ok(next) => current = next,
            Err(()) => {
              self.emit(EventKind::Full, thread, name, current.index as i64, -1);
              return Err(PoolError::Unavailable);
            }
          }
        }
      }
    }
  }

  /// Attempts to exclusively lock every slot of `name`'s chain, closing any
  /// resident readers.
  ///
  /// Reentrant per-thread: a thread that already holds the lock may call
  /// this again, but it fails if that same thread still holds a live
  /// handle into the chain.
  ///
  /// Returns `false` without rolling back already-claimed slots in earlier
  /// segments of the chain — see `DESIGN.md` for why this mirrors the
  /// documented protocol rather than "fixing" it.
  pub fn lock(&self, name: &[u8]) -> bool {
    let thread = current_thread_id();
    let mut current = self.head(name);

    loop {
      if !current.try_acquire_lock(thread) {
        self.emit(EventKind::LockBusy, thread, name, current.index as i64, -1);
        return false;
      }

      for (index, slot) in current.slots().iter().enumerate() {
        if slot.try_acquire(thread) {
          let closed = unsafe { slot.with_reader_mut(std::mem::take) };
          if let Some(reader) = closed {
            reader.close();
            self.emit(EventKind::LockClose, thread, name, current.index as i64, index as i64);
          }
          continue;
        }

        let owner = slot.owner();

        if owner == thread {
          if slot.peek_resident() {
            current.release_lock();
            return false;
          }
          // Already ours with no resident reader: harmless reentry.
          continue;
        }

        current.release_lock();
        self.emit(EventKind::LockBusy, thread, name, current.index as i64, index as i64);
        return false;
      }

      match current.block_growth() {
        Ok(Some(next)) => current = next,
        Ok(None) => {
          self.emit(EventKind::LockSuccess, thread, name, current.index as i64, -1);
          return true;
        }
        Err(()) => unreachable!("next_status left in an invalid state"),
      }
    }
  }

  /// Releases the exclusive lock on `name` and discards its chain entirely.
  ///
  /// A subsequent `get` on the same name builds a fresh chain. Callers must
  /// ensure no `get` is concurrently in flight against this chain (see the
  /// open design question resolved in `DESIGN.md`).
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::Critical`] if `name` is unknown or is locked by a
  /// different thread.
  pub fn unlock(&self, name: &[u8]) -> Result<(), PoolError> {
    let thread = current_thread_id();

    let Some(entry) = self.inner.entries.get(name).map(|entry| Arc::clone(&entry)) else {
      self.emit(EventKind::NotLocked, thread, name, -1, -1);
      return Err(PoolError::Critical("unlock called on an unknown table"));
    };

    if entry.lock_owner() != thread {
      self.emit(EventKind::NotLockOwner, thread, name, entry.index as i64, -1);
      return Err(PoolError::Critical("unlock called by a thread that does not hold the lock"));
    }

    self.inner.entries.remove(name);
    self.emit(EventKind::Unlocked, thread, name, -1, -1);
    Ok(())
  }

  /// Sweeps every slot in every chain, physically closing readers whose
  /// last-touch timestamp precedes `deadline_micros`.
  ///
  /// Returns `true` if any reader was evicted, in the idle-sweep use case
  /// (`deadline = now - ttl`). When used for shutdown draining
  /// (`deadline = i64::MAX`), returns `true` iff there were zero CAS
  /// failures, i.e. the pool is fully drained.
  pub fn release_all(&self, deadline_micros: i64) -> bool {
    let thread = current_thread_id();
    let shutdown = deadline_micros == i64::MAX;
    let mut evicted_any = false;
    let mut cas_failures = 0usize;

    for item in &self.inner.entries {
      let mut current = Some(Arc::clone(item.value()));
      let name = item.key();

      while let Some(entry) = current {
        for (index, slot) in entry.slots().iter().enumerate() {
          if slot.timestamp() >= deadline_micros {
            continue;
          }
          if !slot.peek_resident() {
            continue;
          }
          if !slot.try_reclaim(thread) {
            cas_failures += 1;
            continue;
          }

          if slot.timestamp() < deadline_micros {
            if let Some(reader) = unsafe { slot.with_reader_mut(std::mem::take) } {
              reader.close();
              evicted_any = true;
              self.emit(EventKind::Expire, thread, name, entry.index as i64, index as i64);
            }
          }

          slot.release();
        }

        current = entry.next();
      }
    }

    if shutdown {
      cas_failures == 0
    } else {
      evicted_any
    }
  }

  /// Idempotently closes the pool: transitions it to closed and drains
  /// every chain via [`Pool::release_all`] with `deadline = i64::MAX`.
  pub fn close(&self) {
    if self.inner.closed.swap(true, Ordering::AcqRel) {
      return;
    }

    tracing::debug!("reader pool closing");
    self.release_all(i64::MAX);
  }

  /// Total number of slots currently owned, across every table.
  #[must_use]
  pub fn busy_count(&self) -> usize {
    self
      .inner
      .entries
      .iter()
      .map(|item| {
        let mut current = Some(Arc::clone(item.value()));
        let mut count = 0usize;

        while let Some(entry) = current {
          count += entry.slots().iter().filter(|slot| slot.owner() != UNALLOCATED).count();
          current = entry.next();
        }

        count
      })
      .sum()
  }

  /// Total capacity currently reachable for one table's chain, in slots.
  #[must_use]
  pub fn max_slots(&self) -> usize {
    self.inner.configuration.reader_pool_max_segments * ENTRY_SIZE
  }

  /// A read-only snapshot of every currently-known table chain.
  #[must_use]
  pub fn entries(&self) -> Vec<EntryInfo> {
    self
      .inner
      .entries
      .iter()
      .map(|item| {
        let name = item.key().clone();
        let mut current = Some(Arc::clone(item.value()));
        let mut segments = 0usize;
        let mut busy_slots = 0usize;
        let locked = item.value().lock_owner() != UNALLOCATED;

        while let Some(entry) = current {
          segments += 1;
          busy_slots += entry.slots().iter().filter(|slot| slot.owner() != UNALLOCATED).count();
          current = entry.next();
        }

        EntryInfo { name, segments, locked, busy_slots }
      })
      .collect()
  }
}
