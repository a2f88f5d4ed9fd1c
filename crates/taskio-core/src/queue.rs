//! Handler queue
//!
//! FIFO of queue entries. Besides regular handlers the queue carries the
//! task's slot (`Entry::Task`): the task runs when its slot reaches the
//! front, and is re-pushed to the tail afterwards, so task runs and handler
//! runs interleave in queue order.
//!
//! The queue does no locking; the scheduler guards it with its own mutex.

use std::collections::VecDeque;

use crate::handler::Operation;

/// A queue slot
#[derive(Debug)]
pub enum Entry {
    /// The task's turn
    Task,
    /// A regular handler
    Handler(Operation),
}

/// FIFO of handlers plus the task slot
#[derive(Debug, Default)]
pub struct HandlerQueue {
    entries: VecDeque<Entry>,
}

impl HandlerQueue {
    /// Create an empty queue (no task slot)
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Create a queue holding only the task slot
    pub fn with_task() -> Self {
        let mut queue = Self::new();
        queue.push_task();
        queue
    }

    /// Append a handler
    #[inline]
    pub fn push(&mut self, op: Operation) {
        self.entries.push_back(Entry::Handler(op));
    }

    /// Append the task slot
    #[inline]
    pub fn push_task(&mut self) {
        debug_assert!(!self.contains_task(), "task slot queued twice");
        self.entries.push_back(Entry::Task);
    }

    /// Remove and return the front entry
    #[inline]
    pub fn pop(&mut self) -> Option<Entry> {
        self.entries.pop_front()
    }

    /// Peek at the front entry
    #[inline]
    pub fn front(&self) -> Option<&Entry> {
        self.entries.front()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries, task slot included
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the task slot is currently queued
    pub fn contains_task(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, Entry::Task))
    }

    /// Take every regular handler out, in queue order.
    ///
    /// The task slot stays queued if it was; a slot currently held by a
    /// running task is not re-added here. The caller destroys the returned
    /// operations outside its lock.
    pub fn take_handlers(&mut self) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(self.entries.len());
        let mut kept = VecDeque::with_capacity(1);
        for entry in self.entries.drain(..) {
            match entry {
                Entry::Handler(op) => ops.push(op),
                Entry::Task => kept.push_back(Entry::Task),
            }
        }
        self.entries = kept;
        ops
    }
}
