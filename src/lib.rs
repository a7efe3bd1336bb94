//! A lock-free, segmented reader pool for a time-series table-access layer.
//!
//! `readerpool` hands out shared, reusable handles to table readers. It
//! amortizes the cost of opening a table (file descriptors, memory-mapped
//! segments, metadata parsing) across many short-lived queries, while
//! letting a thread temporarily fence off all concurrent readers of a named
//! table to perform an exclusive operation (rename, drop, schema change).
//!
//! # Overview
//!
//! Readers are grouped per table name into a chain of fixed-size [`Entry`]
//! segments. Each segment holds `ENTRY_SIZE` slots; a slot is claimed with a
//! single compare-and-swap on its owner word, so acquiring and releasing a
//! handle never blocks on a central mutex. When a segment is full the chain
//! grows lazily, up to [`Configuration::reader_pool_max_segments`].
//!
//! ```
//! use readerpool::{Configuration, Pool, Reader};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! struct DemoReader;
//!
//! impl Reader for DemoReader {
//!   type Error = Infallible;
//!
//!   fn reactivate(&self) -> Result<(), Self::Error> {
//!     Ok(())
//!   }
//!
//!   fn passivate(&self) {}
//!
//!   fn close(self) {}
//! }
//!
//! let configuration = Configuration::builder()
//!   .reader_factory(Arc::new(|_name: &[u8]| Ok(DemoReader)))
//!   .build();
//!
//! let pool: Pool<DemoReader> = Pool::new(configuration, None);
//!
//! let handle = pool.get(b"trades").unwrap();
//! drop(handle);
//!
//! assert_eq!(pool.busy_count(), 0);
//! ```
//!
//! # Exclusive locking
//!
//! [`Pool::lock`] atomically claims every slot of a table's chain, closing
//! any resident readers and preventing new acquisitions until
//! [`Pool::unlock`] discards the chain entirely. `lock`/`unlock` must be
//! paired by the caller such that no `get` is concurrently mid-flight when
//! `unlock` runs — see the design notes in `DESIGN.md` for why.
//!
//! # Idle eviction
//!
//! [`Pool::release_all`] sweeps every slot in every chain, physically
//! closing readers that have not been touched since before a deadline. The
//! same sweep drains the pool on [`Pool::close`] with a deadline of
//! [`i64::MAX`].
//!
//! # Non-goals
//!
//! This crate does not implement durability, transactions, query execution,
//! the reader's own memory-mapping machinery, or writer-pool coordination
//! beyond the shared lock/unlock shape. It consumes a [`Reader`]
//! implementation, a [`Clock`], and an optional [`Listener`] as external
//! collaborators.

mod clock;
mod config;
mod entry;
mod error;
mod handle;
mod listener;
mod pool;
mod reader;
mod slot;
mod thread_id;

#[cfg(all(test, not(loom)))]
mod tests;

pub use self::clock::Clock;
pub use self::clock::SystemClock;
pub use self::config::Configuration;
pub use self::config::ConfigurationBuilder;
pub use self::config::ReaderFactory;
pub use self::entry::ENTRY_SIZE;
pub use self::error::FactoryError;
pub use self::error::PoolError;
pub use self::handle::Handle;
pub use self::listener::Event;
pub use self::listener::EventKind;
pub use self::listener::Listener;
pub use self::listener::Source;
pub use self::pool::EntryInfo;
pub use self::pool::Pool;
pub use self::reader::Reader;

pub(crate) mod sync {
  #[cfg(not(loom))]
  mod exports {
    pub(crate) use ::core::sync::atomic::AtomicBool;
    pub(crate) use ::core::sync::atomic::AtomicI64;
    pub(crate) use ::core::sync::atomic::AtomicU8;
    pub(crate) use ::core::sync::atomic::Ordering;
    pub(crate) use ::core::sync::atomic::spin_loop;
  }

  #[cfg(loom)]
  mod exports {
    pub(crate) use ::loom::sync::atomic::AtomicBool;
    pub(crate) use ::loom::sync::atomic::AtomicI64;
    pub(crate) use ::loom::sync::atomic::AtomicU8;
    pub(crate) use ::loom::sync::atomic::Ordering;
    pub(crate) use ::loom::hint::spin_loop;
  }

  pub(crate) use self::exports::*;
}
