use super::fixtures::counting_factory;
use super::fixtures::RecordingListener;
use super::fixtures::TestClock;
use crate::Configuration;
use crate::EventKind;
use crate::Pool;
use std::sync::Arc;

/// Scenario 5: an idle sweep evicts a reader past its deadline exactly
/// once, and reports nothing to do on a subsequent sweep.
#[test]
fn idle_eviction_closes_readers_past_the_deadline_only_once() {
  let listener = Arc::new(RecordingListener::default());
  let clock = Arc::new(TestClock::default());
  clock.set(0);

  let ttl = 1_000;
  let configuration = Configuration::builder()
    .reader_factory(counting_factory())
    .inactive_reader_ttl_micros(ttl)
    .clock(clock.clone())
    .build();
  let pool: Pool<_> = Pool::new(configuration, Some(listener.clone()));

  let mut handle = pool.get(b"t").unwrap();
  handle.close().unwrap();

  clock.set(2_000);
  assert!(pool.release_all(2_000 - ttl));
  assert_eq!(listener.count(EventKind::Expire), 1);

  clock.set(3_000);
  assert!(!pool.release_all(3_000 - ttl), "nothing left to evict");
}

#[test]
fn a_live_handle_is_never_evicted() {
  let clock = Arc::new(TestClock::default());
  clock.set(0);

  let configuration = Configuration::builder()
    .reader_factory(counting_factory())
    .inactive_reader_ttl_micros(1)
    .clock(clock.clone())
    .build();
  let pool: Pool<_> = Pool::new(configuration, None);

  let handle = pool.get(b"t").unwrap();
  clock.set(1_000_000);

  assert!(!pool.release_all(1_000_000));
  assert_eq!(pool.busy_count(), 1);
  drop(handle);
}
