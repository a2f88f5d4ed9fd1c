//! Task adapters
//!
//! The task is the polling collaborator the scheduler interleaves with
//! handlers. Platform-specific implementations use the most efficient
//! wake primitive available.

mod condvar;
pub use condvar::CondvarTask;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod eventfd;
        pub use eventfd::EventFdTask;
    }
}

use crate::config::TaskKind;
use taskio_core::{ServiceResult, Task};

/// Construct the task adapter selected by `kind`
pub fn new_task(kind: TaskKind) -> ServiceResult<Box<dyn Task>> {
    match kind {
        TaskKind::Condvar => Ok(Box::new(CondvarTask::new())),
        #[cfg(target_os = "linux")]
        TaskKind::EventFd => Ok(Box::new(EventFdTask::new()?)),
        #[cfg(not(target_os = "linux"))]
        TaskKind::EventFd => {
            Err(taskio_core::ConfigError::InvalidValue("eventfd task requires Linux").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn assert_interrupt_wakes_blocked_run<T: Task + 'static>(task: Arc<T>) {
        let t = task.clone();
        let handle = thread::spawn(move || t.run(true));

        thread::sleep(Duration::from_millis(50));
        task.interrupt();

        let start = Instant::now();
        handle.join().unwrap().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_condvar_non_blocking_run_returns() {
        let task = CondvarTask::new();
        task.run(false).unwrap();
        assert_eq!(task.runs(), 1);
    }

    #[test]
    fn test_condvar_interrupt_wakes() {
        assert_interrupt_wakes_blocked_run(Arc::new(CondvarTask::new()));
    }

    #[test]
    fn test_condvar_pending_interrupt_is_consumed_once() {
        let task = CondvarTask::new();
        task.interrupt();
        task.interrupt();
        // Pending interrupt lets a blocking run return immediately
        task.run(true).unwrap();
        assert_eq!(task.interrupts(), 2);

        // ...and is consumed by it
        let task = Arc::new(task);
        assert_interrupt_wakes_blocked_run(task);
    }

    #[test]
    fn test_new_task_condvar() {
        let task = new_task(TaskKind::Condvar).unwrap();
        task.run(false).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_eventfd_interrupt_wakes() {
        assert_interrupt_wakes_blocked_run(Arc::new(EventFdTask::new().unwrap()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_eventfd_interrupts_coalesce() {
        let task = EventFdTask::new().unwrap();
        task.interrupt();
        task.interrupt();
        task.interrupt();
        task.run(true).unwrap();
        // Counter drained: a non-blocking run finds nothing
        assert!(!task.drain().unwrap());
        task.run(false).unwrap();
        assert_eq!(task.runs(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_new_task_eventfd() {
        let task = new_task(TaskKind::EventFd).unwrap();
        task.interrupt();
        task.run(true).unwrap();
    }
}
