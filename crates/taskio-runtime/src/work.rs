//! Outstanding-work guard
//!
//! A `Work` keeps the service's outstanding work count above zero for as
//! long as it lives, so `run` keeps blocking for new handlers instead of
//! returning once the queue drains.

use crate::service::TaskIoService;

/// Holds one unit of outstanding work on a service.
///
/// Cloning takes another unit; dropping releases it.
pub struct Work {
    service: TaskIoService,
}

impl Work {
    pub fn new(service: &TaskIoService) -> Self {
        service.work_started();
        Self {
            service: service.clone(),
        }
    }

    /// The service this guard keeps busy
    pub fn service(&self) -> &TaskIoService {
        &self.service
    }
}

impl Clone for Work {
    fn clone(&self) -> Self {
        Self::new(&self.service)
    }
}

impl Drop for Work {
    fn drop(&mut self) {
        self.service.work_finished();
    }
}

impl std::fmt::Debug for Work {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Work").field("service", &self.service.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::CondvarTask;

    #[test]
    fn test_guard_counts() {
        let svc = TaskIoService::with_task(CondvarTask::new());
        let w1 = Work::new(&svc);
        assert_eq!(svc.outstanding_work(), 1);

        let w2 = w1.clone();
        assert_eq!(svc.outstanding_work(), 2);

        drop(w1);
        assert_eq!(svc.outstanding_work(), 1);
        assert!(!svc.stopped());

        drop(w2);
        assert_eq!(svc.outstanding_work(), 0);
        assert!(svc.stopped());
    }

    #[test]
    fn test_guard_keeps_run_alive_for_posts() {
        let svc = TaskIoService::with_task(CondvarTask::new());
        let work = svc.work();
        assert_eq!(work.service().id(), svc.id());

        svc.post(|| {});
        assert_eq!(svc.poll().unwrap(), 1);
        // Queue drained but the guard still holds work
        assert!(!svc.stopped());

        drop(work);
        assert_eq!(svc.run().unwrap(), 0);
    }
}
