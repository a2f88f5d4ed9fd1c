//! Thread-local record of the services this thread is running inside
//!
//! Every `run*` call pushes its service key for the duration of the call;
//! `dispatch` consults it to decide between invoking inline and posting.

use std::cell::RefCell;
use std::marker::PhantomData;

thread_local! {
    static CALL_STACK: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as running inside `key` until dropped.
///
/// Dropped on every exit path, unwinding included. Not `Send`: it must be
/// dropped on the thread that created it.
pub(crate) struct CallStackGuard {
    key: usize,
    _not_send: PhantomData<*const ()>,
}

impl CallStackGuard {
    pub(crate) fn enter(key: usize) -> Self {
        CALL_STACK.with(|stack| stack.borrow_mut().push(key));
        Self {
            key,
            _not_send: PhantomData,
        }
    }
}

impl Drop for CallStackGuard {
    fn drop(&mut self) {
        CALL_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            // Guards nest, so ours is the innermost entry for this key.
            if let Some(pos) = stack.iter().rposition(|&k| k == self.key) {
                stack.remove(pos);
            }
        });
    }
}

/// Whether the current thread is inside a `run*` call of `key`
#[inline]
pub(crate) fn contains(key: usize) -> bool {
    CALL_STACK.with(|stack| stack.borrow().contains(&key))
}

/// Nesting depth of `run*` calls on this thread, across all services
#[inline]
pub fn depth() -> usize {
    CALL_STACK.with(|stack| stack.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_leave() {
        assert!(!contains(1));
        {
            let _g = CallStackGuard::enter(1);
            assert!(contains(1));
            assert!(!contains(2));
            assert_eq!(depth(), 1);
        }
        assert!(!contains(1));
        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_nested_same_key() {
        let outer = CallStackGuard::enter(7);
        {
            let _inner = CallStackGuard::enter(7);
            assert_eq!(depth(), 2);
        }
        assert!(contains(7));
        drop(outer);
        assert!(!contains(7));
    }

    #[test]
    fn test_popped_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _g = CallStackGuard::enter(9);
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!contains(9));
    }

    #[test]
    fn test_thread_local() {
        let _g = CallStackGuard::enter(5);
        let seen = std::thread::spawn(|| contains(5)).join().unwrap();
        assert!(!seen);
    }
}
