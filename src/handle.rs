//! Leased reader handles: the release path (§4.2) and the three-state
//! `pooled` / `orphaned` / `destroyed` lifecycle from the design notes.

use crate::entry::Entry;
use crate::listener::EventKind;
use crate::pool::Pool;
use crate::reader::Reader;
use crate::PoolError;
use std::ops::Deref;
use std::sync::Arc;

enum Backing<R: Reader> {
  /// Lives inside a slot owned by `pool`/`entry`; `close` returns it.
  Pooled { pool: Pool<R>, entry: Arc<Entry<R>>, index: usize, thread: i64, name: Box<[u8]> },
  /// Detached from any slot; `close` physically destroys it.
  Orphaned(R),
  /// Already closed; further `close` calls are a no-op.
  Destroyed,
}

/// A leased reader, checked out from a [`Pool`].
///
/// Dereferences to `R`. Dropping the handle (or calling
/// [`Handle::close`] explicitly) returns it to the pool, unless the handle
/// is orphaned or the pool has since closed, in which case the reader is
/// physically closed instead.
pub struct Handle<R: Reader> {
  backing: Backing<R>,
}

impl<R: Reader> Handle<R> {
  pub(crate) fn pooled(pool: Pool<R>, entry: Arc<Entry<R>>, index: usize, thread: i64, name: Box<[u8]>) -> Self {
    Self { backing: Backing::Pooled { pool, entry, index, thread, name } }
  }

  pub(crate) fn orphaned(reader: R) -> Self {
    Self { backing: Backing::Orphaned(reader) }
  }

  fn reader(&self) -> &R {
    match &self.backing {
      Backing::Pooled { entry, index, .. } => {
        // SAFETY: this slot's owner stays this handle's thread for the
        // handle's whole lifetime; no other thread touches its reader cell
        // until `close` releases it.
        unsafe { entry.slot(*index).resident_ref() }
      }
      Backing::Orphaned(reader) => reader,
      Backing::Destroyed => unreachable!("handle used after close"),
    }
  }

  /// Releases the handle.
  ///
  /// Idempotent. A pooled handle returns its reader to the pool unless the
  /// pool has since closed and this thread loses the race to
  /// [`Pool::release_all`] — in that case the reader is physically closed
  /// here instead. An orphaned handle is always physically closed. Closing
  /// an already-closed handle is a no-op.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::Critical`] if the handle's cached owning slot no
  /// longer matches its thread — a double-close bug in the caller.
  pub fn close(&mut self) -> Result<(), PoolError> {
    match std::mem::replace(&mut self.backing, Backing::Destroyed) {
      Backing::Destroyed => Ok(()),
      Backing::Orphaned(reader) => {
        reader.close();
        Ok(())
      }
      Backing::Pooled { pool, entry, index, thread, name } => {
        let slot = entry.slot(index);

        if slot.owner() != thread {
          return Err(PoolError::Critical("handle closed twice or from a foreign thread"));
        }

        let passivated = unsafe { slot.with_reader_mut(|resident| resident.as_ref().map(|r| r.passivate())) };
        debug_assert!(passivated.is_some(), "a pooled handle's slot always holds a reader");

        let now = pool.now_micros();
        slot.stamp(now);
        slot.release();

        if !pool.is_closed() {
          pool.emit(EventKind::Return, thread, &name, entry.index as i64, index as i64);
          return Ok(());
        }

        if slot.try_reclaim(thread) {
          if let Some(reader) = unsafe { slot.with_reader_mut(std::mem::take) } {
            reader.close();
          }
          slot.release();
        }

        Ok(())
      }
    }
  }
}

impl<R: Reader> Deref for Handle<R> {
  type Target = R;

  fn deref(&self) -> &R {
    self.reader()
  }
}

impl<R: Reader> Drop for Handle<R> {
  fn drop(&mut self) {
    if let Err(error) = self.close() {
      // `close` on Drop cannot propagate; a Critical error here means the
      // caller already closed this handle, or moved it across threads,
      // before dropping it.
      panic!("reader pool invariant violated on drop: {error}");
    }
  }
}
