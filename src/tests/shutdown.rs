use super::fixtures::configuration_builder;
use crate::Pool;

/// Scenario 6: shutdown cannot fully drain while a handle is outstanding;
/// closing that handle performs a physical close directly instead of
/// returning it to the now-closed pool, after which a drain succeeds.
#[test]
fn shutdown_drains_only_after_outstanding_handles_close() {
  let configuration = configuration_builder().build();
  let pool: Pool<_> = Pool::new(configuration, None);

  let mut handle = pool.get(b"t").unwrap();
  let reader = handle.clone();

  pool.close();
  assert!(!pool.release_all(i64::MAX), "an outstanding handle blocks a full drain");

  handle.close().unwrap();
  assert_eq!(reader.close_count(), 1, "the pool being closed means close() physically destroys the reader");

  assert!(pool.release_all(i64::MAX), "draining again after the handle closes succeeds");
}

#[test]
fn close_is_idempotent() {
  let configuration = configuration_builder().build();
  let pool: Pool<_> = Pool::new(configuration, None);

  pool.close();
  pool.close();
  pool.close();
}

#[test]
fn get_after_close_fails_closed() {
  let configuration = configuration_builder().build();
  let pool: Pool<_> = Pool::new(configuration, None);

  pool.close();
  assert!(matches!(pool.get(b"t"), Err(crate::PoolError::Closed)));
}
