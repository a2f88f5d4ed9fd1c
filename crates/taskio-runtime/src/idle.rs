//! Idle thread registry
//!
//! A thread with nothing to run parks on its own `WakeupEvent`. The
//! `IdleThread` record lives on the parked call's stack; the registry only
//! holds pointers to records and is guarded by the scheduler mutex.
//!
//! Wakeup is LIFO: the most recently parked thread is woken first. A record
//! is unlinked by whoever signals it, before the signal is set, so a parked
//! thread never returns while still registered.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, MutexGuard, PoisonError};

/// Per-thread wake signal, used together with the scheduler mutex.
///
/// `signalled` is only written while that mutex is held.
pub(crate) struct WakeupEvent {
    signalled: AtomicBool,
    cond: Condvar,
}

impl WakeupEvent {
    pub(crate) fn new() -> Self {
        Self {
            signalled: AtomicBool::new(false),
            cond: Condvar::new(),
        }
    }

    /// Reset the signal. Caller holds the scheduler lock.
    #[inline]
    pub(crate) fn clear(&self) {
        self.signalled.store(false, Ordering::Relaxed);
    }

    /// Set the signal and wake the waiter. Caller holds the scheduler lock.
    #[inline]
    pub(crate) fn signal(&self) {
        self.signalled.store(true, Ordering::Relaxed);
        self.cond.notify_one();
    }

    #[inline]
    pub(crate) fn is_signalled(&self) -> bool {
        self.signalled.load(Ordering::Relaxed)
    }

    /// Release `guard` and block until signalled; returns re-locked.
    pub(crate) fn wait<'a, S>(&self, mut guard: MutexGuard<'a, S>) -> MutexGuard<'a, S> {
        while !self.is_signalled() {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        guard
    }
}

/// Stack-resident record of one parked thread
pub(crate) struct IdleThread {
    pub(crate) wakeup: WakeupEvent,
}

impl IdleThread {
    pub(crate) fn new() -> Self {
        Self {
            wakeup: WakeupEvent::new(),
        }
    }
}

/// LIFO registry of parked threads
#[derive(Default)]
pub(crate) struct IdleRegistry {
    stack: Vec<NonNull<IdleThread>>,
}

// Safety: the pointers are only dereferenced while the scheduler mutex is
// held, and every record is unlinked before its owning frame returns.
unsafe impl Send for IdleRegistry {}

impl IdleRegistry {
    pub(crate) fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Register `idle` as the most recently parked thread
    pub(crate) fn push(&mut self, idle: &IdleThread) {
        self.stack.push(NonNull::from(idle));
    }

    /// Wake the most recently parked thread. Returns false if none is parked.
    pub(crate) fn wake_one(&mut self) -> bool {
        match self.stack.pop() {
            Some(idle) => {
                // Safety: registered records outlive their registration.
                unsafe { idle.as_ref() }.wakeup.signal();
                true
            }
            None => false,
        }
    }

    /// Wake every parked thread
    pub(crate) fn wake_all(&mut self) {
        while self.wake_one() {}
    }

    /// Unlink `idle` if still registered. Returns whether it was.
    pub(crate) fn remove(&mut self, idle: &IdleThread) -> bool {
        let target = NonNull::from(idle);
        match self.stack.iter().rposition(|&p| p == target) {
            Some(pos) => {
                self.stack.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_lifo_wake_order() {
        let a = IdleThread::new();
        let b = IdleThread::new();
        let mut reg = IdleRegistry::new();
        reg.push(&a);
        reg.push(&b);

        assert!(reg.wake_one());
        assert!(b.wakeup.is_signalled());
        assert!(!a.wakeup.is_signalled());
        assert_eq!(reg.len(), 1);

        reg.wake_all();
        assert!(a.wakeup.is_signalled());
        assert!(reg.is_empty());
        assert!(!reg.wake_one());
    }

    #[test]
    fn test_remove() {
        let a = IdleThread::new();
        let mut reg = IdleRegistry::new();
        reg.push(&a);
        assert!(reg.remove(&a));
        assert!(!reg.remove(&a));
        assert!(!a.wakeup.is_signalled());
    }

    #[test]
    fn test_wait_until_signalled() {
        let lock = Arc::new(Mutex::new(()));
        let event = Arc::new(WakeupEvent::new());

        let (l, e) = (lock.clone(), event.clone());
        let waiter = thread::spawn(move || {
            let guard = l.lock().unwrap();
            let _guard = e.wait(guard);
        });

        thread::sleep(Duration::from_millis(20));
        {
            let _guard = lock.lock().unwrap();
            event.signal();
        }
        waiter.join().unwrap();
        assert!(event.is_signalled());

        let _guard = lock.lock().unwrap();
        event.clear();
        assert!(!event.is_signalled());
    }
}
