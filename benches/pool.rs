//! Criterion benchmarks for the reader pool's hot paths: single-threaded
//! acquire/release, contended acquire/release across threads, and the
//! exclusive lock path.
//!
//! Run with: cargo bench --bench pool

use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use readerpool::Configuration;
use readerpool::Pool;
use readerpool::Reader;
use std::convert::Infallible;
use std::sync::Arc;
use std::thread;

#[derive(Clone)]
struct BenchReader;

impl Reader for BenchReader {
  type Error = Infallible;

  fn reactivate(&self) -> Result<(), Self::Error> {
    Ok(())
  }

  fn passivate(&self) {}

  fn close(self) {}
}

fn pool() -> Pool<BenchReader> {
  let configuration = Configuration::builder()
    .reader_factory(Arc::new(|_name: &[u8]| Ok(BenchReader)))
    .build();
  Pool::new(configuration, None)
}

fn get_close_cycle(c: &mut Criterion) {
  let pool = pool();
  // warm the slot so the loop measures reactivate, not construction.
  pool.get(b"t").unwrap().close().unwrap();

  c.bench_function("get_close_warm_slot", |b| {
    b.iter(|| {
      let mut handle = pool.get(black_box(b"t")).unwrap();
      handle.close().unwrap();
    });
  });
}

fn contended_get_close(c: &mut Criterion) {
  let mut group = c.benchmark_group("contended_get_close");

  for thread_count in [1usize, 2, 4, 8] {
    let pool = pool();
    pool.get(b"t").unwrap().close().unwrap();

    group.bench_with_input(BenchmarkId::from_parameter(thread_count), &thread_count, |b, &thread_count| {
      b.iter(|| {
        let handles: Vec<_> = (0..thread_count)
          .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
              for _ in 0..16 {
                let mut handle = pool.get(b"t").unwrap();
                handle.close().unwrap();
              }
            })
          })
          .collect();

        for handle in handles {
          handle.join().unwrap();
        }
      });
    });
  }

  group.finish();
}

fn lock_unlock_cycle(c: &mut Criterion) {
  let pool = pool();

  c.bench_function("lock_unlock_idle_table", |b| {
    b.iter(|| {
      assert!(pool.lock(black_box(b"t")));
      pool.unlock(black_box(b"t")).unwrap();
    });
  });
}

criterion_group!(benches, get_close_cycle, contended_get_close, lock_unlock_cycle);
criterion_main!(benches);
