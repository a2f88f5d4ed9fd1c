//! Error types for the taskio scheduler

use core::fmt;

/// Result type for scheduler operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by scheduler operations.
///
/// Running out of work is not an error (`Ok(0)`), and posting after
/// shutdown is silently discarded, so neither has a variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The task's polling step failed with an OS error (errno)
    Os(i32),

    /// The task's polling step failed for a non-OS reason
    Task(String),

    /// Invalid configuration
    Config(ConfigError),

    /// Worker thread error
    Worker(WorkerError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Os(code) => write!(f, "os error: {}", code),
            ServiceError::Task(msg) => write!(f, "task failed: {}", msg),
            ServiceError::Config(e) => write!(f, "config error: {}", e),
            ServiceError::Worker(e) => write!(f, "worker error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ServiceError {
    fn from(e: ConfigError) -> Self {
        ServiceError::Config(e)
    }
}

/// Worker thread related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Failed to spawn worker thread
    SpawnFailed,

    /// Worker thread panicked
    Panicked,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::SpawnFailed => write!(f, "failed to spawn worker thread"),
            WorkerError::Panicked => write!(f, "worker thread panicked"),
        }
    }
}

impl From<WorkerError> for ServiceError {
    fn from(e: WorkerError) -> Self {
        ServiceError::Worker(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ServiceError::Os(9);
        assert_eq!(format!("{}", e), "os error: 9");

        let e = ServiceError::Worker(WorkerError::Panicked);
        assert_eq!(format!("{}", e), "worker error: worker thread panicked");

        let e = ServiceError::Config(ConfigError::InvalidValue("num_workers must be > 0"));
        assert_eq!(
            format!("{}", e),
            "config error: invalid config: num_workers must be > 0"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: ServiceError = WorkerError::SpawnFailed.into();
        assert!(matches!(err, ServiceError::Worker(WorkerError::SpawnFailed)));

        let err: ServiceError = ConfigError::InvalidValue("x").into();
        assert!(matches!(err, ServiceError::Config(_)));
    }
}
