//! Dense, small, positive thread ids.
//!
//! Each OS thread that touches any pool is assigned an id the first time it
//! does so, and gives it back when the thread exits. The registry is the
//! only piece of process-global, mutex-guarded state in this crate; every
//! other path is CAS-only.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use slab::Slab;
use std::cell::Cell;

static REGISTRY: Lazy<Mutex<Slab<()>>> = Lazy::new(|| Mutex::new(Slab::new()));

struct ThreadId {
  value: i64,
}

impl ThreadId {
  fn new() -> Self {
    let key = REGISTRY.lock().insert(());

    // `allocations[i]` uses -1 as UNALLOCATED, so ids start at 1.
    Self {
      value: i64::try_from(key).expect("thread id registry overflowed i64") + 1,
    }
  }
}

impl Drop for ThreadId {
  fn drop(&mut self) {
    let key = usize::try_from(self.value - 1).expect("thread id underflow");
    REGISTRY.lock().remove(key);
  }
}

#[cfg(not(loom))]
thread_local! {
  static CURRENT: Cell<Option<i64>> = const { Cell::new(None) };
  static HANDLE: std::cell::RefCell<Option<ThreadId>> = const { std::cell::RefCell::new(None) };
}

// loom models each spawned thread separately and needs its own
// thread-local storage to keep simulated threads from seeing each other's
// cached id; `loom::thread_local!` doesn't support `const` initializers.
#[cfg(loom)]
loom::thread_local! {
  static CURRENT: Cell<Option<i64>> = Cell::new(None);
  static HANDLE: std::cell::RefCell<Option<ThreadId>> = std::cell::RefCell::new(None);
}

/// Returns this thread's dense positive id, minting one on first use.
pub(crate) fn current_thread_id() -> i64 {
  if let Some(id) = CURRENT.with(Cell::get) {
    return id;
  }

  let id = HANDLE.with(|slot| {
    let mut slot = slot.borrow_mut();
    slot.get_or_insert_with(ThreadId::new).value
  });

  CURRENT.with(|cell| cell.set(Some(id)));

  id
}
