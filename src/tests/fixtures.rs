//! Shared test doubles: a reader that counts its own lifecycle calls, and a
//! clock whose value the test controls directly.

use crate::Clock;
use crate::Configuration;
use crate::ConfigurationBuilder;
use crate::Event;
use crate::EventKind;
use crate::Listener;
use std::convert::Infallible;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

#[derive(Default)]
struct Counters {
  reactivate: AtomicUsize,
  passivate: AtomicUsize,
  close: AtomicUsize,
}

/// A [`Reader`](crate::Reader) that records how many times each lifecycle
/// method was called, shared via an [`Arc`] so the test can observe it after
/// the handle has moved into the pool.
#[derive(Clone)]
pub(crate) struct TestReader {
  name: Box<[u8]>,
  counters: Arc<Counters>,
}

impl TestReader {
  pub(crate) fn reactivate_count(&self) -> usize {
    self.counters.reactivate.load(Ordering::Acquire)
  }

  pub(crate) fn passivate_count(&self) -> usize {
    self.counters.passivate.load(Ordering::Acquire)
  }

  pub(crate) fn close_count(&self) -> usize {
    self.counters.close.load(Ordering::Acquire)
  }

  pub(crate) fn name(&self) -> &[u8] {
    &self.name
  }
}

impl crate::Reader for TestReader {
  type Error = Infallible;

  fn reactivate(&self) -> Result<(), Self::Error> {
    self.counters.reactivate.fetch_add(1, Ordering::AcqRel);
    Ok(())
  }

  fn passivate(&self) {
    self.counters.passivate.fetch_add(1, Ordering::AcqRel);
  }

  fn close(self) {
    self.counters.close.fetch_add(1, Ordering::AcqRel);
  }
}

/// A clock whose reading is set directly by the test, instead of tracking
/// the wall clock.
#[derive(Default)]
pub(crate) struct TestClock {
  micros: AtomicI64,
}

impl TestClock {
  pub(crate) fn set(&self, micros: i64) {
    self.micros.store(micros, Ordering::Release);
  }

  pub(crate) fn advance(&self, by: i64) {
    self.micros.fetch_add(by, Ordering::AcqRel);
  }
}

impl Clock for TestClock {
  fn now_micros(&self) -> i64 {
    self.micros.load(Ordering::Acquire)
  }
}

/// A factory that always succeeds, stamping each constructed reader with
/// the name it was built for and a fresh counter set.
pub(crate) fn counting_factory() -> crate::ReaderFactory<TestReader> {
  Arc::new(|name: &[u8]| {
    Ok(TestReader {
      name: Box::from(name),
      counters: Arc::new(Counters::default()),
    })
  })
}

/// A factory that always fails, for exercising the construction-error path.
pub(crate) fn failing_factory() -> crate::ReaderFactory<TestReader> {
  Arc::new(|_name: &[u8]| Err(Box::<dyn std::error::Error + Send + Sync>::from("factory refused to build a reader")))
}

pub(crate) fn configuration_builder() -> ConfigurationBuilder<TestReader> {
  Configuration::builder().reader_factory(counting_factory())
}

/// A [`Listener`] that records every event it receives, in order.
#[derive(Default)]
pub(crate) struct RecordingListener {
  events: Mutex<Vec<EventKind>>,
}

impl RecordingListener {
  pub(crate) fn kinds(&self) -> Vec<EventKind> {
    self.events.lock().unwrap().clone()
  }

  pub(crate) fn count(&self, kind: EventKind) -> usize {
    self.kinds().into_iter().filter(|k| *k == kind).count()
  }
}

impl Listener for RecordingListener {
  fn on_event(&self, event: &Event) {
    self.events.lock().unwrap().push(event.kind);
  }
}
