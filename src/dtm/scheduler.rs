use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::dtm::{UnitContext, VectorTask};

/// Runs vector tasks on a bounded pool.
///
/// At most `pool_size` units execute at once; further units wait for a permit
/// inside their own task, so [`VectorScheduler::submit`] never blocks the
/// caller. Units run independently and in no particular order.
pub struct VectorScheduler {
    handle: Handle,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    context: Arc<UnitContext>,
    in_flight: Arc<AtomicUsize>,
    submitted: AtomicU64,
    accepting: AtomicBool,
    pool_size: usize,
}

impl VectorScheduler {
    pub fn new(pool_size: usize, handle: Handle, context: Arc<UnitContext>) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(pool_size)),
            tracker: TaskTracker::new(),
            context,
            in_flight: Arc::new(AtomicUsize::new(0)),
            submitted: AtomicU64::new(0),
            accepting: AtomicBool::new(true),
            pool_size,
        }
    }

    /// Queue a unit of work. Returns `false` once the scheduler is shut down.
    pub fn submit(&self, task: VectorTask) -> bool {
        if !self.accepting.load(Ordering::SeqCst) {
            warn!(kind = task.kind(), "scheduler is shut down, dropping task");
            return false;
        }

        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let permits = self.permits.clone();
        let context = self.context.clone();
        let in_flight = self.in_flight.clone();
        self.tracker.spawn_on(
            async move {
                scopeguard::defer! {
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let kind = task.kind();
                let as_number = task.as_number();
                let outcome = task.run(&context).await;
                debug!(kind, as_number, ?outcome, "vector task finished");
            },
            &self.handle,
        );
        true
    }

    /// Wait for every unit submitted so far. New submissions are still accepted.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stop accepting units and wait for the in-flight ones to finish
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Units accepted since creation
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }
}
