//! # taskio-runtime
//!
//! Multi-threaded handler scheduler with an interleaved polling task.
//!
//! This crate provides:
//! - `TaskIoService`, the shared handler queue driven by `run`/`poll`
//! - Task adapters (condvar everywhere, eventfd on Linux)
//! - `Work` guards for keeping `run` alive between posts
//! - Worker thread management
//! - Configuration with environment overrides

pub mod call_stack;
pub mod config;
mod idle;
pub mod service;
pub mod task;
pub mod work;
pub mod worker;

// Re-exports
pub use config::{ServiceConfig, TaskKind};
pub use service::{TaskIoService, WeakService};
pub use task::{new_task, CondvarTask};
pub use work::Work;
pub use worker::{current_worker_id, WorkerPool};

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        pub use task::EventFdTask;
    }
}
