//! The serial consumer: one thread (often the caller's own) draining a
//! broker's live ports synchronously. Useful for deterministic tests, where
//! interleaving processing with several worker threads would make
//! assertions racy.

use super::StopSignal;
use crate::broker::{Broker, ProcessedItem, RawItem};
use crate::candidate::{Candidate, Individual};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Drains `broker` until it stops yielding items within `poll_timeout`, or
/// until `stop` is signalled. Blocks the calling thread; callers that want a
/// background serial worker should run this inside their own `thread::spawn`.
pub fn run<I: Individual>(broker: &Arc<Broker<Candidate<I>>>, poll_timeout: Duration, stop: &StopSignal) {
    while !stop.is_stopped() {
        let Some(RawItem { courtier_id, mut payload }) = broker.get_raw(poll_timeout) else {
            continue;
        };
        if stop.is_stopped() {
            break;
        }
        trace!(?courtier_id, "serial consumer processing item");
        payload.process();
        broker.put_processed(ProcessedItem { courtier_id, payload });
    }
}
