//! # taskio - Handler Scheduler
//!
//! A pool of threads sharing one FIFO of handlers, interleaved with a
//! polling task that waits for external readiness.
//!
//! ## Features
//!
//! - **post / dispatch**: queue a handler, or run it inline when already
//!   inside the service on this thread
//! - **run / run_one / poll / poll_one**: drive the queue from any number
//!   of threads, blocking or not
//! - **Work guards**: keep `run` alive while more work may arrive
//! - **Task adapters**: condvar (portable) and eventfd (Linux)
//!
//! ## Quick Start
//!
//! ```ignore
//! use taskio::{Runtime, ServiceConfig};
//!
//! fn main() {
//!     let mut runtime = Runtime::new(ServiceConfig::from_env().num_workers(4)).unwrap();
//!
//!     let executed = runtime.block_on(|service| {
//!         for i in 0..10 {
//!             service.post(move || println!("handler {}", i));
//!         }
//!     }).unwrap();
//!     println!("{} handlers", executed.1);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   post() ──▶ ┌───────────────────────────────┐
//!              │  [ H | H | TASK | H | ... ]   │  one mutex
//!              └───────────────────────────────┘
//!                    │            │
//!          ┌─────────┼────────────┼─────────┐
//!          ▼         ▼            ▼         ▼
//!     ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐
//!     │ Worker  │ │ Worker  │ │ Worker  │ │  idle   │
//!     │ handler │ │  task   │ │ handler │ │ (wait)  │
//!     └─────────┘ └─────────┘ └─────────┘ └─────────┘
//! ```

// Re-export core types
pub use taskio_core::{
    ConfigError,
    Handler,
    Operation,
    ServiceError,
    ServiceResult,
    Task,
    WorkerError,
};

// Re-export kprint macros for debug logging
pub use taskio_core::{kprint, kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use taskio_core::kprint::{LogLevel, init as init_logging, set_log_level, set_flush_enabled};

// Re-export env utilities
pub use taskio_core::{env_get, env_get_bool, env_get_opt};

// Re-export runtime types
pub use taskio_runtime::{
    ServiceConfig,
    TaskKind,
    TaskIoService,
    WeakService,
    Work,
    WorkerPool,
    CondvarTask,
    current_worker_id,
    new_task,
};

#[cfg(target_os = "linux")]
pub use taskio_runtime::EventFdTask;

/// Runtime handle: a service plus the worker threads that drive it
pub struct Runtime {
    service: TaskIoService,
    config: ServiceConfig,
}

impl Runtime {
    /// Create a new runtime with the given configuration
    ///
    /// This does not start any threads. Call `block_on()` to begin.
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        kprint::init();
        if config.debug_logging {
            config.print();
        }
        let service = TaskIoService::with_config(config.clone())?;
        Ok(Self { service, config })
    }

    /// The service workers run
    pub fn service(&self) -> &TaskIoService {
        &self.service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Start the workers, call `f`, then wait for all work to drain.
    ///
    /// A `Work` guard is held while `f` runs, so workers stay up even
    /// before the first post. Returns `f`'s value together with the number
    /// of handlers the workers executed. The service is stopped and reset
    /// afterwards, so `block_on` can be called again.
    pub fn block_on<F, T>(&mut self, f: F) -> ServiceResult<(T, usize)>
    where
        F: FnOnce(&TaskIoService) -> T,
    {
        let mut pool = WorkerPool::new(self.config.effective_workers());
        let work = self.service.work();
        if let Err(e) = pool.start(&self.service) {
            self.service.stop();
            drop(work);
            let _ = pool.join();
            self.service.reset();
            return Err(e);
        }

        let value = f(&self.service);
        drop(work);

        let executed = pool.join();
        self.service.reset();
        Ok((value, executed?))
    }

    /// Destroy pending handlers; further posts are discarded
    pub fn shutdown(&mut self) {
        self.service.shutdown();
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
