//! Concrete consumer backends: serial (single-threaded, deterministic),
//! thread-pool (local parallel workers), and TCP (remote workers). All three
//! share the same contract: loop popping raw items off a `crate::broker::Port`,
//! processing them, and pushing them back, reacting to a single stop signal at
//! every suspension point so shutdown never deadlocks and never blocks
//! indefinitely.

pub mod pool;
pub mod serial;
pub mod tcp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single cooperative stop flag shared by every worker in a consumer.
/// Checked before every blocking wait and before every `process()` call, per
/// the concurrency model's cancellation rule.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        StopSignal(Arc::new(AtomicBool::new(false)))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
