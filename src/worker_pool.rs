//! A bounded worker pool for chunk-level parallelism, built fresh per
//! `Encoder`/`Decoder` call from the resolved thread count rather than
//! relying on rayon's process-wide global pool (two codec instances with
//! different `threads` settings shouldn't fight over one global pool size).
//!
//! Chunks are dispatched independently and their results collected back in
//! input order — order only matters for the final concatenation, not for
//! when each chunk actually finishes. A [`CancelToken`] lets a failing
//! chunk signal siblings to skip their own work instead of computing
//! results that will be thrown away once the first error surfaces.

use crate::errors::{CodecError, CodecResult};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct CancelToken(AtomicBool);

impl CancelToken {
  fn new() -> Self {
    Self(AtomicBool::new(false))
  }

  fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub(crate) fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

pub(crate) struct WorkerPool {
  pool: rayon::ThreadPool,
}

impl WorkerPool {
  pub(crate) fn new(threads: usize) -> CodecResult<Self> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(threads)
      .build()
      .map_err(|e| CodecError::backend_failure(format!("failed to build worker pool: {}", e)))?;
    Ok(Self { pool })
  }

  /// Runs `f` over `items` in parallel, returning results in input order.
  /// If any call errors, remaining not-yet-started calls observe the
  /// cancel token and return early instead of doing wasted work; the first
  /// error encountered during collection is returned.
  pub(crate) fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> CodecResult<Vec<R>>
  where
    T: Sync,
    R: Send,
    F: Fn(&T, &CancelToken) -> CodecResult<R> + Sync,
  {
    let cancel = CancelToken::new();
    self.pool.install(|| {
      items
        .par_iter()
        .map(|item| {
          if cancel.is_cancelled() {
            return Err(CodecError::cancelled(
              "worker pool cancelled after an earlier chunk failed",
            ));
          }
          match f(item, &cancel) {
            Ok(r) => Ok(r),
            Err(e) => {
              cancel.cancel();
              Err(e)
            }
          }
        })
        .collect()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn runs_in_order_and_collects_all_results() {
    let pool = WorkerPool::new(4).unwrap();
    let items: Vec<u32> = (0..200).collect();
    let results = pool
      .map_ordered(&items, |&x, _cancel| Ok::<_, CodecError>(x * 2))
      .unwrap();
    let expected: Vec<u32> = items.iter().map(|x| x * 2).collect();
    assert_eq!(results, expected);
  }

  #[test]
  fn propagates_first_error() {
    let pool = WorkerPool::new(4).unwrap();
    let items: Vec<u32> = (0..50).collect();
    let result = pool.map_ordered(&items, |&x, _cancel| {
      if x == 10 {
        Err(CodecError::backend_failure("boom"))
      } else {
        Ok(x)
      }
    });
    assert!(result.is_err());
  }

  #[test]
  fn single_threaded_pool_still_works() {
    let pool = WorkerPool::new(1).unwrap();
    let items: Vec<u32> = (0..10).collect();
    let results = pool
      .map_ordered(&items, |&x, _cancel| Ok::<_, CodecError>(x + 1))
      .unwrap();
    assert_eq!(results, (1..11).collect::<Vec<u32>>());
  }
}
