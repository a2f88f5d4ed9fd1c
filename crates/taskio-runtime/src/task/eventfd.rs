//! Linux eventfd-backed task
//!
//! `run` waits in poll(2) on an eventfd; `interrupt` writes to it.
//! Coalescing comes from eventfd counter semantics: any number of
//! interrupts before the next run produce a single wakeup, and `run`
//! drains the counter with one read.

use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicUsize, Ordering};

use nix::errno::Errno;
use taskio_core::{ServiceError, ServiceResult, Task};

pub struct EventFdTask {
    fd: RawFd,
    runs: AtomicUsize,
}

impl EventFdTask {
    /// Create a new non-blocking eventfd and wrap it.
    ///
    /// The task owns the fd and closes it on drop.
    pub fn new() -> ServiceResult<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(ServiceError::Os(Errno::last() as i32));
        }
        Ok(Self {
            fd,
            runs: AtomicUsize::new(0),
        })
    }

    /// Number of completed `run` calls
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    /// Read and reset the eventfd counter. Ok(false) if it was zero.
    pub(crate) fn drain(&self) -> ServiceResult<bool> {
        let mut val: u64 = 0;
        let ret = unsafe {
            libc::read(
                self.fd,
                &mut val as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if ret < 0 {
            return match Errno::last() {
                Errno::EAGAIN => Ok(false),
                errno => Err(ServiceError::Os(errno as i32)),
            };
        }
        Ok(val > 0)
    }
}

impl Task for EventFdTask {
    fn run(&self, may_block: bool) -> ServiceResult<()> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout: libc::c_int = if may_block { -1 } else { 0 };

        let ret = unsafe { libc::poll(&mut pfd, 1, timeout) };
        if ret < 0 {
            let errno = Errno::last();
            // A signal cut the wait short; the caller re-queues the task.
            if errno != Errno::EINTR {
                return Err(ServiceError::Os(errno as i32));
            }
        } else if ret > 0 && (pfd.revents & libc::POLLIN) != 0 {
            self.drain()?;
        }

        self.runs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn interrupt(&self) {
        let val: u64 = 1;
        let ret = unsafe {
            libc::write(
                self.fd,
                &val as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        // EAGAIN means the counter is saturated, so a wakeup is already pending.
        if ret < 0 {
            let errno = Errno::last();
            if errno != Errno::EAGAIN {
                taskio_core::kwarn!("eventfd interrupt failed: {}", errno);
            }
        }
    }
}

impl Drop for EventFdTask {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }
}
