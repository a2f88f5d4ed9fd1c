//! # taskio-core
//!
//! Core types and traits for the taskio handler scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! The scheduler itself lives in `taskio-runtime`.
//!
//! ## Modules
//!
//! - `handler` - Handler trait and the move-only `Operation` handle
//! - `queue` - FIFO handler queue with the task's slot
//! - `traits` - Task adapter trait
//! - `error` - Error types
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod env;
pub mod error;
pub mod handler;
pub mod kprint;
pub mod queue;
pub mod traits;

pub use env::{env_get, env_get_bool, env_get_opt};
pub use error::{ConfigError, ServiceError, ServiceResult, WorkerError};
pub use handler::{Handler, Operation};
pub use queue::{Entry, HandlerQueue};
pub use traits::Task;
