//! The multi-threaded consumer: a fixed pool of local worker threads, each
//! running the same `get_raw -> process -> put_processed` loop as the serial
//! consumer, but concurrently. Built on a dedicated `rayon::ThreadPool` so the
//! worker count is pinned independently of whatever global rayon pool the
//! host process may also be using for other work.

use super::StopSignal;
use crate::broker::{Broker, ProcessedItem, RawItem};
use crate::candidate::{Candidate, Individual};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// A running pool of worker threads attached to one broker. Dropping it
/// signals stop and waits for every worker to unwind.
pub struct PoolConsumer {
    stop: StopSignal,
    pool: Option<rayon::ThreadPool>,
}

impl PoolConsumer {
    /// Spawns `n_workers` threads, each registering its own port with
    /// `broker` and looping until `stop` is signalled or this `PoolConsumer`
    /// is dropped.
    pub fn spawn<I: Individual + 'static>(
        broker: &Arc<Broker<Candidate<I>>>,
        n_workers: usize,
        poll_timeout: Duration,
    ) -> Result<Self> {
        if n_workers == 0 {
            return Err(Error::config_invalid("nEvaluationThreads must be >= 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .build()
            .map_err(|e| Error::config_invalid(e.to_string()))?;
        let stop = StopSignal::new();
        for _ in 0..n_workers {
            let broker = Arc::clone(broker);
            let stop = stop.clone();
            pool.spawn(move || worker_loop(&broker, poll_timeout, &stop));
        }
        Ok(PoolConsumer { stop, pool: Some(pool) })
    }

    pub fn stop(&self) {
        self.stop.signal();
    }
}

impl Drop for PoolConsumer {
    fn drop(&mut self) {
        self.stop.signal();
        // Dropping the pool blocks until every spawned task observes `stop`
        // and returns, which bounds teardown time by `poll_timeout`.
        self.pool.take();
    }
}

fn worker_loop<I: Individual>(broker: &Arc<Broker<Candidate<I>>>, poll_timeout: Duration, stop: &StopSignal) {
    while !stop.is_stopped() {
        let Some(RawItem { courtier_id, mut payload }) = broker.get_raw(poll_timeout) else {
            continue;
        };
        if stop.is_stopped() {
            // Shutdown requested between pop and process: drop the item
            // rather than risk processing past a caller-requested deadline.
            warn!(?courtier_id, "dropping in-flight item on shutdown");
            break;
        }
        trace!(?courtier_id, "pool worker processing item");
        payload.process();
        broker.put_processed(ProcessedItem { courtier_id, payload });
    }
}
