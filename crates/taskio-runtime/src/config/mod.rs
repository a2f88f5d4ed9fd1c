//! Service configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (`from_env`)
//! 3. Library defaults (`config::defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use taskio_runtime::config::{ServiceConfig, TaskKind};
//!
//! let config = ServiceConfig::from_env()
//!     .num_workers(8)
//!     .task(TaskKind::Condvar);
//! ```

pub mod defaults;

use std::fmt;
use std::str::FromStr;

use taskio_core::env::{parse_bool, parse_opt};
use taskio_core::ConfigError;

/// Which task adapter the service drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Portable condvar-backed task
    Condvar,
    /// eventfd + poll(2) task (Linux only)
    EventFd,
}

impl TaskKind {
    /// Best adapter for this platform
    pub fn platform_default() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(target_os = "linux")] {
                TaskKind::EventFd
            } else {
                TaskKind::Condvar
            }
        }
    }
}

impl FromStr for TaskKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "condvar" => Ok(TaskKind::Condvar),
            "eventfd" => Ok(TaskKind::EventFd),
            _ => Err(ConfigError::InvalidValue("task must be `condvar` or `eventfd`")),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Condvar => write!(f, "condvar"),
            TaskKind::EventFd => write!(f, "eventfd"),
        }
    }
}

/// Service configuration with builder pattern.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Hint passed to `TaskIoService::init`
    pub concurrency_hint: usize,
    /// Worker threads for `WorkerPool` (0 = one per CPU)
    pub num_workers: usize,
    /// Task adapter to construct
    pub task: TaskKind,
    /// Enable scheduler debug logging
    pub debug_logging: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ServiceConfig {
    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `TASKIO_CONCURRENCY_HINT` - Hint passed to `init`
    /// - `TASKIO_NUM_WORKERS` - Worker threads (0 = one per CPU)
    /// - `TASKIO_TASK` - `condvar` or `eventfd`
    /// - `TASKIO_DEBUG` - Enable debug logging (0/1)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading the `TASKIO_*` values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            concurrency_hint: parse_opt(lookup("TASKIO_CONCURRENCY_HINT").as_deref())
                .unwrap_or(defaults::CONCURRENCY_HINT),
            num_workers: parse_opt(lookup("TASKIO_NUM_WORKERS").as_deref())
                .unwrap_or(defaults::NUM_WORKERS),
            task: parse_opt(lookup("TASKIO_TASK").as_deref())
                .unwrap_or_else(TaskKind::platform_default),
            debug_logging: parse_bool(lookup("TASKIO_DEBUG").as_deref(), defaults::DEBUG_LOGGING),
        }
    }

    /// Create config with library defaults only (no env override).
    pub fn new() -> Self {
        Self {
            concurrency_hint: defaults::CONCURRENCY_HINT,
            num_workers: defaults::NUM_WORKERS,
            task: TaskKind::platform_default(),
            debug_logging: defaults::DEBUG_LOGGING,
        }
    }

    // Builder methods

    pub fn concurrency_hint(mut self, hint: usize) -> Self {
        self.concurrency_hint = hint;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn task(mut self, kind: TaskKind) -> Self {
        self.task = kind;
        self
    }

    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Worker count with 0 resolved to the CPU count
    pub fn effective_workers(&self) -> usize {
        if self.num_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .min(defaults::MAX_WORKERS)
        } else {
            self.num_workers
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_workers > defaults::MAX_WORKERS {
            return Err(ConfigError::InvalidValue("num_workers must be <= 256"));
        }
        if !cfg!(target_os = "linux") && self.task == TaskKind::EventFd {
            return Err(ConfigError::InvalidValue("eventfd task requires Linux"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("taskio configuration:");
        eprintln!("  concurrency_hint:  {}", self.concurrency_hint);
        eprintln!("  num_workers:       {} ({} effective)", self.num_workers, self.effective_workers());
        eprintln!("  task:              {}", self.task);
        eprintln!("  debug_logging:     {}", self.debug_logging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_valid() {
        let config = ServiceConfig::new();
        assert!(config.validate().is_ok());
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn test_builder() {
        let config = ServiceConfig::new()
            .num_workers(8)
            .concurrency_hint(2)
            .task(TaskKind::Condvar)
            .debug_logging(true);

        assert_eq!(config.num_workers, 8);
        assert_eq!(config.effective_workers(), 8);
        assert_eq!(config.concurrency_hint, 2);
        assert_eq!(config.task, TaskKind::Condvar);
        assert!(config.debug_logging);
    }

    #[test]
    fn test_validation() {
        let config = ServiceConfig::new().num_workers(1000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_task_kind_parse() {
        assert_eq!("eventfd".parse::<TaskKind>(), Ok(TaskKind::EventFd));
        assert_eq!(" Condvar ".parse::<TaskKind>(), Ok(TaskKind::Condvar));
        assert!("epoll".parse::<TaskKind>().is_err());
        assert_eq!(TaskKind::Condvar.to_string(), "condvar");
    }

    #[test]
    fn test_lookup_overrides() {
        let vars = [
            ("TASKIO_NUM_WORKERS", " 3 "),
            ("TASKIO_TASK", "condvar"),
            ("TASKIO_DEBUG", "yes"),
            ("TASKIO_CONCURRENCY_HINT", "lots"),
        ];
        let config = ServiceConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        });

        assert_eq!(config.num_workers, 3);
        assert_eq!(config.task, TaskKind::Condvar);
        assert!(config.debug_logging);
        // Unparsable values keep the default
        assert_eq!(config.concurrency_hint, defaults::CONCURRENCY_HINT);
    }

    #[test]
    fn test_lookup_empty_matches_new() {
        let config = ServiceConfig::from_lookup(|_| None);
        let defaults = ServiceConfig::new();
        assert_eq!(config.num_workers, defaults.num_workers);
        assert_eq!(config.task, defaults.task);
        assert_eq!(config.debug_logging, defaults.debug_logging);
    }
}
