//! Task adapter trait
//!
//! The task is the external polling collaborator multiplexed into the
//! handler queue. The scheduler only needs a run step and an interrupt.

use crate::error::ServiceResult;

/// External I/O-polling collaborator driven by the scheduler.
///
/// `run` is called outside the scheduler lock, by whichever worker pops the
/// task's queue slot; at most one thread runs the task at a time. It may
/// post handlers to the scheduler as a side effect.
pub trait Task: Send + Sync {
    /// Perform one round of polling.
    ///
    /// With `may_block` set the call may wait until external events arrive
    /// or `interrupt` is called, and must return promptly once interrupted.
    /// Without it the call must not wait.
    fn run(&self, may_block: bool) -> ServiceResult<()>;

    /// Wake a blocked (or the next) `run`.
    ///
    /// Idempotent, non-blocking, callable from any thread. An interrupt that
    /// has not been observed yet does not need to be delivered twice.
    fn interrupt(&self);
}
