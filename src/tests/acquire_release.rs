use super::fixtures::configuration_builder;
use super::fixtures::RecordingListener;
use crate::EventKind;
use crate::Pool;
use std::sync::Arc;

/// Scenario 1: a single-threaded acquire/release cycle reuses the same
/// underlying reader instead of reopening it.
#[test]
fn acquire_release_cycle_reuses_the_resident_reader() {
  let listener = Arc::new(RecordingListener::default());
  let configuration = configuration_builder().reader_pool_max_segments(1).build();
  let pool: Pool<_> = Pool::new(configuration, Some(listener.clone()));

  let mut first = pool.get(b"t").unwrap();
  assert_eq!(first.reactivate_count(), 0, "a freshly constructed reader is not reactivated");
  first.close().unwrap();

  let second = pool.get(b"t").unwrap();
  assert_eq!(second.reactivate_count(), 1, "the second acquire reactivates the resident reader");
  assert_eq!(second.name(), b"t");

  assert_eq!(listener.count(EventKind::Create), 1);
  assert_eq!(listener.count(EventKind::Get), 2, "GET fires on every acquire, including the one that also fires CREATE");
  assert_eq!(listener.count(EventKind::Return), 1);
}

#[test]
fn closing_a_handle_twice_is_a_no_op() {
  let configuration = configuration_builder().build();
  let pool: Pool<_> = Pool::new(configuration, None);

  let mut handle = pool.get(b"t").unwrap();
  handle.close().unwrap();
  assert!(handle.close().is_ok());
}

#[test]
fn a_failing_factory_releases_the_slot_for_retry() {
  use super::fixtures::failing_factory;
  use crate::Configuration;

  let configuration = Configuration::builder().reader_factory(failing_factory()).build();
  let pool = Pool::new(configuration, None);

  assert!(pool.get(b"t").is_err());
  // the slot must have been released on failure, or this second attempt
  // would incorrectly see the chain as exhausted.
  assert!(pool.get(b"t").is_err());
}
