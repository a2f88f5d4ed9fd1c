//! Library defaults for `ServiceConfig`
//!
//! Overridden at runtime by the `TASKIO_*` environment variables, see
//! `ServiceConfig::from_env`.

/// Concurrency hint passed to `init` (0 = no hint)
pub const CONCURRENCY_HINT: usize = 0;

/// Worker threads started by `WorkerPool` / `Runtime` (0 = one per CPU)
pub const NUM_WORKERS: usize = 0;

/// Upper bound on worker threads
pub const MAX_WORKERS: usize = 256;

/// Enable scheduler debug logging
pub const DEBUG_LOGGING: bool = false;
