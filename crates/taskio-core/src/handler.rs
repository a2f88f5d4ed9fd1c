//! Handlers: one-shot units of work submitted to the scheduler
//!
//! A handler is consumed exactly once, either by `invoke` (run it) or by
//! `destroy` (discard it without running). `Operation` is the move-only
//! handle the queue stores; both paths take it by value, and dropping an
//! unconsumed operation destroys it.

/// A one-shot unit of work.
///
/// Closures `FnOnce() + Send + 'static` implement this directly. Implement it
/// by hand when discarding a handler must do more than drop it (e.g. to
/// report that it never ran).
pub trait Handler: Send + 'static {
    /// Run the handler. Consumes it.
    ///
    /// A panic here propagates out of the `run*` call that invoked it.
    fn invoke(self: Box<Self>);

    /// Release the handler without running it. Must not panic.
    fn destroy(self: Box<Self>) {}
}

impl<F> Handler for F
where
    F: FnOnce() + Send + 'static,
{
    #[inline]
    fn invoke(self: Box<Self>) {
        (*self)()
    }
}

/// Owned, move-only wrapper around a queued handler
pub struct Operation {
    handler: Option<Box<dyn Handler>>,
}

impl Operation {
    /// Wrap a handler for queue storage
    pub fn new<H: Handler>(handler: H) -> Self {
        Self {
            handler: Some(Box::new(handler)),
        }
    }

    /// Run the handler
    #[inline]
    pub fn invoke(mut self) {
        if let Some(handler) = self.handler.take() {
            handler.invoke();
        }
    }

    /// Discard the handler without running it
    #[inline]
    pub fn destroy(mut self) {
        if let Some(handler) = self.handler.take() {
            handler.destroy();
        }
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.destroy();
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("pending", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Probe {
        invoked: Arc<AtomicUsize>,
        destroyed: Arc<AtomicUsize>,
    }

    impl Handler for Probe {
        fn invoke(self: Box<Self>) {
            self.invoked.fetch_add(1, Ordering::SeqCst);
        }

        fn destroy(self: Box<Self>) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn probe() -> (Probe, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let invoked = Arc::new(AtomicUsize::new(0));
        let destroyed = Arc::new(AtomicUsize::new(0));
        let p = Probe {
            invoked: invoked.clone(),
            destroyed: destroyed.clone(),
        };
        (p, invoked, destroyed)
    }

    #[test]
    fn test_closure_invoke() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        Operation::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .invoke();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closure_destroy_drops_captures() {
        let token = Arc::new(());
        let t = token.clone();
        Operation::new(move || drop(t)).destroy();
        assert_eq!(Arc::strong_count(&token), 1);
    }

    #[test]
    fn test_invoke_is_not_followed_by_destroy() {
        let (p, invoked, destroyed) = probe();
        Operation::new(p).invoke();
        assert_eq!(invoked.load(Ordering::SeqCst), 1);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_destroys_unconsumed() {
        let (p, invoked, destroyed) = probe();
        drop(Operation::new(p));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }
}
