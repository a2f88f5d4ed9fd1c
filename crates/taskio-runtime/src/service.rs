//! Task I/O service: the scheduler core
//!
//! Any number of threads call `run`/`run_one`/`poll`/`poll_one` on a shared
//! service. Each call repeatedly dequeues one entry and executes it outside
//! the lock. The queue holds user handlers plus the task's slot; popping
//! the slot runs one step of the polling task, after which the slot goes
//! back to the tail. Task runs and handler runs therefore interleave in
//! queue order instead of the task monopolizing a thread.
//!
//! ```text
//!   post ──▶ [ H1 | H2 | TASK | H3 ] ──▶ do_one ──▶ invoke H / task.run()
//!                                ▲                        │
//!                                └── TASK re-pushed ◀─────┘
//! ```
//!
//! One mutex protects the queue, the work counter, the idle registry and
//! the state flags. It is released before any handler or task runs, so
//! handlers may post, dispatch, stop or run the service reentrantly.
//!
//! A thread with nothing to do parks on its own wake signal (see
//! `idle.rs`). It is woken by `post` (one thread), by `stop` or work
//! exhaustion (all threads).
//!
//! When the outstanding work count drops to zero the service stops itself:
//! nothing can arrive anymore, so no thread should stay blocked.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use taskio_core::{kdebug, ktrace, kwarn};
use taskio_core::{Entry, Handler, HandlerQueue, Operation, ServiceResult, Task};

use crate::call_stack::{self, CallStackGuard};
use crate::config::ServiceConfig;
use crate::idle::{IdleRegistry, IdleThread};
use crate::task::new_task;
use crate::work::Work;

static NEXT_SERVICE_ID: AtomicUsize = AtomicUsize::new(1);

/// Everything guarded by the service mutex
struct State {
    /// Ready handlers plus the task slot
    queue: HandlerQueue,
    /// Count of unfinished work; an undelivered handler counts
    outstanding_work: usize,
    /// `run*` must return promptly, no blocking
    stopped: bool,
    /// Torn down; new handlers are discarded
    shutdown: bool,
    /// The task has already been asked to wake (or is not blocking)
    task_interrupted: bool,
    /// Parked threads, most recent last
    idle: IdleRegistry,
}

pub(crate) struct Inner {
    id: usize,
    state: Mutex<State>,
    task: Box<dyn Task>,
    debug: bool,
}

/// Handle to a task I/O service.
///
/// Cheap to clone; all clones drive the same queue. The service shuts down
/// when `shutdown` is called or the last handle is dropped.
#[derive(Clone)]
pub struct TaskIoService {
    inner: Arc<Inner>,
}

/// Non-owning handle, for tasks and handlers that must not keep the
/// service alive.
#[derive(Clone)]
pub struct WeakService {
    inner: Weak<Inner>,
}

impl TaskIoService {
    /// Create a service from the environment-derived default config
    pub fn new() -> ServiceResult<Self> {
        Self::with_config(ServiceConfig::default())
    }

    /// Create a service with the task adapter chosen by `config`
    pub fn with_config(config: ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;
        let task = new_task(config.task)?;
        let service = Self::from_boxed_task(task, config.debug_logging);
        service.init(config.concurrency_hint);
        Ok(service)
    }

    /// Create a service driving a caller-supplied task
    pub fn with_task<T: Task + 'static>(task: T) -> Self {
        Self::from_boxed_task(Box::new(task), cfg!(feature = "debug-logging"))
    }

    fn from_boxed_task(task: Box<dyn Task>, debug: bool) -> Self {
        let state = State {
            queue: HandlerQueue::with_task(),
            outstanding_work: 0,
            stopped: false,
            shutdown: false,
            task_interrupted: true,
            idle: IdleRegistry::new(),
        };
        Self {
            inner: Arc::new(Inner {
                id: NEXT_SERVICE_ID.fetch_add(1, Ordering::Relaxed),
                state: Mutex::new(state),
                task,
                debug,
            }),
        }
    }

    /// Lifecycle hook. The hint is accepted for API compatibility only.
    pub fn init(&self, concurrency_hint: usize) {
        if self.inner.debug {
            kdebug!("service {} init (concurrency_hint={})", self.inner.id, concurrency_hint);
        }
    }

    /// Run handlers until stopped or out of work.
    ///
    /// Blocks while work is outstanding but nothing is ready. Returns the
    /// number of handlers executed. A handler panic or task error ends the
    /// call and propagates; bookkeeping is restored first.
    pub fn run(&self) -> ServiceResult<usize> {
        let _ctx = CallStackGuard::enter(self.key());
        let this_idle = IdleThread::new();
        let mut state = self.inner.lock();

        let mut n: usize = 0;
        loop {
            let (done, s) = self.inner.do_one(state, Some(&this_idle))?;
            state = s;
            if done == 0 {
                break;
            }
            n = n.saturating_add(1);
        }
        Ok(n)
    }

    /// Run at most one handler, blocking until one is ready or the
    /// service stops.
    pub fn run_one(&self) -> ServiceResult<usize> {
        let _ctx = CallStackGuard::enter(self.key());
        let this_idle = IdleThread::new();
        let state = self.inner.lock();

        let (done, _state) = self.inner.do_one(state, Some(&this_idle))?;
        Ok(done)
    }

    /// Run every ready handler without blocking.
    pub fn poll(&self) -> ServiceResult<usize> {
        let _ctx = CallStackGuard::enter(self.key());
        let mut state = self.inner.lock();

        let mut n: usize = 0;
        loop {
            let (done, s) = self.inner.do_one(state, None)?;
            state = s;
            if done == 0 {
                break;
            }
            n = n.saturating_add(1);
        }
        Ok(n)
    }

    /// Run at most one ready handler without blocking.
    pub fn poll_one(&self) -> ServiceResult<usize> {
        let _ctx = CallStackGuard::enter(self.key());
        let state = self.inner.lock();

        let (done, _state) = self.inner.do_one(state, None)?;
        Ok(done)
    }

    /// Stop all `run*` calls. Blocked threads wake and return; new calls
    /// return immediately until `reset`.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        if self.inner.debug {
            kdebug!("service {} stop ({} idle)", self.inner.id, state.idle.len());
        }
        self.inner.stop_all_threads(&mut state);
    }

    /// Clear the stopped flag so `run*` can be called again.
    ///
    /// Must not be called while any thread is inside `run*`.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.stopped = false;
        if self.inner.debug {
            kdebug!("service {} reset", self.inner.id);
        }
    }

    /// Whether the service is stopped
    pub fn stopped(&self) -> bool {
        self.inner.lock().stopped
    }

    /// Count one unit of outstanding work
    pub fn work_started(&self) {
        let mut state = self.inner.lock();
        state.outstanding_work += 1;
    }

    /// Release one unit of outstanding work; stops the service at zero
    pub fn work_finished(&self) {
        let mut state = self.inner.lock();
        self.inner.finish_work(&mut state);
    }

    /// RAII guard holding one unit of outstanding work
    pub fn work(&self) -> Work {
        Work::new(self)
    }

    /// Current outstanding work count (diagnostic)
    pub fn outstanding_work(&self) -> usize {
        self.inner.lock().outstanding_work
    }

    /// Number of threads parked waiting for work (diagnostic)
    pub fn idle_threads(&self) -> usize {
        self.inner.lock().idle.len()
    }

    /// Queue `handler` and return immediately.
    ///
    /// After `shutdown` the handler is destroyed without running.
    pub fn post<H: Handler>(&self, handler: H) {
        self.inner.post_operation(Operation::new(handler));
    }

    /// Invoke `handler` now if the calling thread is inside a `run*` call
    /// of this service, otherwise `post` it.
    pub fn dispatch<H: Handler>(&self, handler: H) {
        if call_stack::contains(self.key()) {
            ktrace!("service {} dispatch inline", self.inner.id);
            Operation::new(handler).invoke();
        } else {
            self.post(handler);
        }
    }

    /// Destroy every pending handler and refuse new ones.
    ///
    /// Meant to be called once, at teardown. Handlers are destroyed
    /// outside the lock, in queue order.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// The task adapter this service drives
    pub fn task(&self) -> &dyn Task {
        self.inner.task.as_ref()
    }

    /// Numeric id, used in log lines
    pub fn id(&self) -> usize {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakService {
        WeakService {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Identity used by the reentrancy call stack
    #[inline]
    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Debug for TaskIoService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskIoService")
            .field("id", &self.inner.id)
            .finish()
    }
}

impl WeakService {
    pub fn upgrade(&self) -> Option<TaskIoService> {
        self.inner.upgrade().map(|inner| TaskIoService { inner })
    }

    /// Post through the weak handle. Returns false (and destroys the
    /// handler) if the service is gone.
    pub fn post<H: Handler>(&self, handler: H) -> bool {
        match self.upgrade() {
            Some(service) => {
                service.post(handler);
                true
            }
            None => {
                Operation::new(handler).destroy();
                false
            }
        }
    }
}

impl Inner {
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        // Handlers and the task run unlocked, and the cleanup guards keep
        // the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute at most one handler. Returns 1 if a handler ran, 0 if the
    /// call should return (stopped, out of work, or nothing ready while
    /// polling). `this_idle` is `None` for the non-blocking variants.
    fn do_one<'a>(
        &'a self,
        mut state: MutexGuard<'a, State>,
        this_idle: Option<&IdleThread>,
    ) -> ServiceResult<(usize, MutexGuard<'a, State>)> {
        if state.outstanding_work == 0 && !state.stopped {
            self.stop_all_threads(&mut state);
            return Ok((0, state));
        }

        let polling = this_idle.is_none();
        let mut task_has_run = false;
        while !state.stopped {
            let entry = state.queue.pop();
            match entry {
                Some(Entry::Task) => {
                    let more_handlers = !state.queue.is_empty();
                    state.task_interrupted = more_handlers || polling;

                    // A polling call runs the task at most once; a task that
                    // keeps re-queuing itself must not spin us forever.
                    if task_has_run && polling {
                        state.queue.push_task();
                        return Ok((0, state));
                    }
                    task_has_run = true;
                    drop(state);

                    // Only block if nothing else is queued and we may block.
                    let cleanup = Cleanup::new(self, CleanupKind::Task);
                    let result = self.task.run(!more_handlers && !polling);
                    state = cleanup.finish();
                    result?;
                }
                Some(Entry::Handler(op)) => {
                    drop(state);

                    let cleanup = Cleanup::new(self, CleanupKind::Handler);
                    op.invoke();
                    return Ok((1, cleanup.finish()));
                }
                None => match this_idle {
                    Some(idle) => state = self.wait_for_work(state, idle),
                    None => return Ok((0, state)),
                },
            }
        }

        Ok((0, state))
    }

    /// Park the calling thread until `post`, `stop` or work exhaustion
    /// wakes it.
    fn wait_for_work<'a>(
        &'a self,
        mut state: MutexGuard<'a, State>,
        idle: &IdleThread,
    ) -> MutexGuard<'a, State> {
        state.idle.push(idle);
        idle.wakeup.clear();

        let registration = IdleRegistration {
            inner: self,
            idle,
            armed: true,
        };
        let state = idle.wakeup.wait(state);
        registration.complete();
        state
    }

    fn post_operation(&self, op: Operation) {
        let mut state = self.lock();

        // Silently discard after shutdown
        if state.shutdown {
            drop(state);
            op.destroy();
            return;
        }

        state.queue.push(op);
        state.outstanding_work += 1;
        ktrace!(
            "service {} post (outstanding={}, idle={})",
            self.id,
            state.outstanding_work,
            state.idle.len()
        );

        if !state.idle.wake_one() && !state.task_interrupted {
            state.task_interrupted = true;
            self.task.interrupt();
        }
    }

    fn finish_work(&self, state: &mut State) {
        match state.outstanding_work.checked_sub(1) {
            Some(n) => state.outstanding_work = n,
            None => kwarn!("service {} work_finished without outstanding work", self.id),
        }
        if state.outstanding_work == 0 {
            self.stop_all_threads(state);
        }
    }

    /// Stop the task and wake every idle thread
    fn stop_all_threads(&self, state: &mut State) {
        state.stopped = true;
        state.idle.wake_all();
        if !state.task_interrupted {
            state.task_interrupted = true;
            self.task.interrupt();
        }
    }

    fn shutdown(&self) {
        let ops = {
            let mut state = self.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            state.queue.take_handlers()
        };

        if self.debug {
            kdebug!("service {} shutdown, destroying {} handler(s)", self.id, ops.len());
        }
        for op in ops {
            op.destroy();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Clone, Copy)]
enum CleanupKind {
    /// Re-queue the task slot after the task ran
    Task,
    /// Retire the work unit of the handler that ran
    Handler,
}

/// Re-locks and fixes up the state after a task or handler ran, on every
/// exit path. `finish` hands back the re-acquired guard; on unwind the
/// fixup happens in `drop`.
struct Cleanup<'a> {
    inner: &'a Inner,
    kind: CleanupKind,
    armed: bool,
}

impl<'a> Cleanup<'a> {
    fn new(inner: &'a Inner, kind: CleanupKind) -> Self {
        Self {
            inner,
            kind,
            armed: true,
        }
    }

    fn finish(mut self) -> MutexGuard<'a, State> {
        self.armed = false;
        let inner = self.inner;
        let mut state = inner.lock();
        self.apply(&mut state);
        state
    }

    fn apply(&self, state: &mut State) {
        match self.kind {
            CleanupKind::Task => {
                state.task_interrupted = true;
                state.queue.push_task();
            }
            CleanupKind::Handler => self.inner.finish_work(state),
        }
    }
}

impl Drop for Cleanup<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.inner.lock();
            self.apply(&mut state);
        }
    }
}

/// Unlinks a parked thread's record if its wait is abandoned without a
/// wakeup.
struct IdleRegistration<'a> {
    inner: &'a Inner,
    idle: &'a IdleThread,
    armed: bool,
}

impl IdleRegistration<'_> {
    fn complete(mut self) {
        // The waker already unlinked us.
        self.armed = false;
    }
}

impl Drop for IdleRegistration<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.lock().idle.remove(self.idle);
        }
    }
}
