//! Condvar-backed task
//!
//! Portable task with no I/O source of its own: a blocking run waits until
//! interrupted. Useful where only posted handlers and `Work` guards drive
//! the service, and as the fallback on non-Linux platforms.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use taskio_core::{ServiceResult, Task};

pub struct CondvarTask {
    /// true = interrupt pending
    interrupted: Mutex<bool>,
    cond: Condvar,
    runs: AtomicUsize,
    interrupts: AtomicUsize,
}

impl CondvarTask {
    pub fn new() -> Self {
        Self {
            interrupted: Mutex::new(false),
            cond: Condvar::new(),
            runs: AtomicUsize::new(0),
            interrupts: AtomicUsize::new(0),
        }
    }

    /// Number of completed `run` calls
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    /// Number of `interrupt` calls
    pub fn interrupts(&self) -> usize {
        self.interrupts.load(Ordering::Relaxed)
    }
}

impl Default for CondvarTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for CondvarTask {
    fn run(&self, may_block: bool) -> ServiceResult<()> {
        let mut pending = self
            .interrupted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if may_block {
            while !*pending {
                pending = self
                    .cond
                    .wait(pending)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        // Consume the interrupt
        *pending = false;
        self.runs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::Relaxed);
        {
            let mut pending = self
                .interrupted
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *pending = true;
        }
        self.cond.notify_all();
    }
}
