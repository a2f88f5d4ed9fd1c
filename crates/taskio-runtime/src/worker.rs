//! Worker thread management
//!
//! Workers are OS threads that each call `run` on one shared service.
//! A worker returns when the service stops or runs out of work.

use std::cell::Cell;
use std::thread::{self, JoinHandle};

use taskio_core::kprint;
use taskio_core::{kdebug, kwarn, ServiceError, ServiceResult, WorkerError};

use crate::service::TaskIoService;

/// Pool of threads driving one service
pub struct WorkerPool {
    /// Join handles for worker threads
    handles: Vec<JoinHandle<ServiceResult<usize>>>,

    /// Number of workers requested
    num_workers: usize,
}

impl WorkerPool {
    /// Create an empty pool; `start` spawns the threads
    pub fn new(num_workers: usize) -> Self {
        Self {
            handles: Vec::with_capacity(num_workers),
            num_workers,
        }
    }

    /// Spawn every worker thread, each running `service.run()`.
    ///
    /// On spawn failure the already-started workers keep running; the
    /// caller decides whether to stop the service.
    pub fn start(&mut self, service: &TaskIoService) -> ServiceResult<()> {
        for i in 0..self.num_workers {
            let service = service.clone();
            let handle = thread::Builder::new()
                .name(format!("taskio-worker-{}", i))
                .spawn(move || {
                    set_current_worker_id(i);
                    kprint::set_worker_id(i);
                    kdebug!("worker started");
                    let result = service.run();
                    kdebug!("worker exiting: {:?}", result);
                    kprint::clear_worker_id();
                    result
                })
                .map_err(|_| WorkerError::SpawnFailed)?;

            self.handles.push(handle);
        }
        Ok(())
    }

    /// Wait for all workers to finish. Returns the total number of
    /// handlers they executed, or the first failure.
    pub fn join(self) -> ServiceResult<usize> {
        let mut total: usize = 0;
        let mut first_err: Option<ServiceError> = None;

        for handle in self.handles {
            match handle.join() {
                Ok(Ok(n)) => total = total.saturating_add(n),
                Ok(Err(e)) => {
                    kwarn!("worker failed: {}", e);
                    first_err = first_err.or(Some(e));
                }
                Err(_) => {
                    kwarn!("worker panicked");
                    first_err = first_err.or(Some(WorkerError::Panicked.into()));
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }

    /// Get number of workers
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of threads actually spawned
    #[inline]
    pub fn started(&self) -> usize {
        self.handles.len()
    }
}

// Thread-local worker ID
thread_local! {
    static CURRENT_WORKER_ID: Cell<usize> = const { Cell::new(usize::MAX) };
}

/// Set the current worker ID for this thread
pub fn set_current_worker_id(id: usize) {
    CURRENT_WORKER_ID.with(|cell| cell.set(id));
}

/// Get the current worker ID, `None` outside a pool thread
#[inline]
pub fn current_worker_id() -> Option<usize> {
    let id = CURRENT_WORKER_ID.with(|cell| cell.get());
    (id != usize::MAX).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::CondvarTask;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_pool_runs_all_handlers() {
        let svc = TaskIoService::with_task(CondvarTask::new());
        let work = svc.work();
        let hits = Arc::new(AtomicUsize::new(0));
        let workers_seen = Arc::new(Mutex::new(HashSet::new()));

        let mut pool = WorkerPool::new(3);
        pool.start(&svc).unwrap();
        assert_eq!(pool.started(), 3);

        for _ in 0..300 {
            let (h, seen) = (hits.clone(), workers_seen.clone());
            svc.post(move || {
                h.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = current_worker_id() {
                    seen.lock().unwrap().insert(id);
                }
            });
        }
        drop(work);

        assert_eq!(pool.join().unwrap(), 300);
        assert_eq!(hits.load(Ordering::SeqCst), 300);
        assert!(workers_seen.lock().unwrap().iter().all(|&id| id < 3));
    }

    #[test]
    fn test_worker_panic_reported() {
        let svc = TaskIoService::with_task(CondvarTask::new());
        svc.post(|| panic!("handler failure"));

        let mut pool = WorkerPool::new(1);
        pool.start(&svc).unwrap();
        assert_eq!(
            pool.join().unwrap_err(),
            ServiceError::Worker(WorkerError::Panicked)
        );
    }

    #[test]
    fn test_worker_id_outside_pool() {
        assert_eq!(current_worker_id(), None);
    }
}
