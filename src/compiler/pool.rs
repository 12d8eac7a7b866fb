//! Bounded worker pool shared by the parse and compile phases.
//!
//! Each item is handled end-to-end by one worker and returns a self-contained
//! result; the only synchronization is the barrier at the end of [`TaskPool::try_map`].

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::core::{BuildError, CancelToken};

/// A rayon thread pool plus the token that can stop it.
pub struct TaskPool {
    pool: rayon::ThreadPool,
    cancel: CancelToken,
}

impl TaskPool {
    /// `jobs == 0` sizes the pool to host parallelism.
    pub fn new(jobs: usize, cancel: CancelToken) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("assetman-worker-{i}"))
            .build()?;
        Ok(Self { pool, cancel })
    }

    pub fn jobs(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run `f` over every item and collect the results in input order.
    ///
    /// The first failure stops workers from starting new items and is the
    /// error returned. Cancellation wins over item failures and returns
    /// [`BuildError::Interrupted`] even if every started item succeeded.
    pub fn try_map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, BuildError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, BuildError> + Sync + Send,
    {
        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<BuildError>> = Mutex::new(None);

        let results: Result<Vec<R>, ()> = self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    if self.cancel.is_cancelled() || failed.load(Ordering::Relaxed) {
                        return Err(());
                    }
                    f(item).map_err(|e| {
                        if !failed.swap(true, Ordering::Relaxed) {
                            *first_error.lock() = Some(e);
                        }
                    })
                })
                .collect()
        });

        if self.cancel.is_cancelled() {
            return Err(BuildError::Interrupted);
        }
        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }
        results.map_err(|()| BuildError::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_results_keep_input_order() {
        let pool = TaskPool::new(4, CancelToken::new()).unwrap();
        let items: Vec<usize> = (0..100).collect();
        let out = pool.try_map(&items, |n| Ok(n * 2)).unwrap();
        assert_eq!(out, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_worker() {
        let pool = TaskPool::new(1, CancelToken::new()).unwrap();
        assert_eq!(pool.jobs(), 1);
        let out = pool.try_map(&["a", "b"], |s| Ok(s.len())).unwrap();
        assert_eq!(out, vec![1, 1]);
    }

    #[test]
    fn test_first_error_is_reported() {
        let pool = TaskPool::new(1, CancelToken::new()).unwrap();
        let started = AtomicUsize::new(0);
        let err = pool
            .try_map(&[1, 2, 3, 4], |n| {
                started.fetch_add(1, Ordering::SeqCst);
                if *n == 2 {
                    Err(BuildError::compile("fake", "boom"))
                } else {
                    Ok(*n)
                }
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::Compile { .. }));
        assert!(started.load(Ordering::SeqCst) < 4);
    }

    #[test]
    fn test_cancelled_pool_runs_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let pool = TaskPool::new(2, token).unwrap();
        let ran = AtomicUsize::new(0);
        let err = pool
            .try_map(&[1, 2, 3], |n| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(*n)
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::Interrupted));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_wins_over_item_error() {
        let pool = TaskPool::new(1, CancelToken::new()).unwrap();
        let err = pool
            .try_map(&[1], |_| {
                // an interrupted child tool fails its item
                pool.cancel_token().cancel();
                Err::<(), _>(BuildError::compile("lessc site.less", "killed"))
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::Interrupted));
    }
}
