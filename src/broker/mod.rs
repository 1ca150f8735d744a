//! The broker/port/consumer execution fabric: the piece that moves
//! candidates from the optimization loop out to whichever consumers are
//! attached (serial, thread-pool, or remote TCP workers) and brings
//! evaluated results back, without the loop or the consumers knowing
//! anything about each other.
//!
//! A `Broker<T>` is a process-wide registry of ports, not a single shared
//! queue pair: each `Port` owns its own raw queue (items it submitted,
//! awaiting a consumer) and its own processed queue (results addressed back
//! to it), so several independent optimization runs can safely share one
//! broker. Consumers never hold a port themselves — they pull from whichever
//! registered port currently has raw work, and the broker routes a finished
//! item back to the processed queue of the port named in its courtier id,
//! dropping it silently if that port has since been deregistered. This
//! gives FIFO ordering *within* one port's stream for free while placing no
//! ordering guarantee *across* ports, which is exactly what the
//! submission/collection engine is written against.

use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often `Broker::get_raw` re-polls the live port set while waiting for
/// work to appear.
const POLL_SLICE: Duration = Duration::from_millis(2);

/// Identifies one submitted item across resubmission attempts: which port
/// submitted it, which position within that port's generation it occupies,
/// and which attempt this is. Used by the collection engine to recognize
/// and discard a result that arrives after its item was already resubmitted
/// under a later attempt — at-most-once commit per position — and by the
/// broker to route a processed item back to its originating port.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CourtierId {
    pub port_id: u64,
    pub position: usize,
    pub attempt: u32,
}

impl CourtierId {
    pub fn new(port_id: u64, position: usize, attempt: u32) -> Self {
        CourtierId { port_id, position, attempt }
    }
}

/// One item in flight from a port to a consumer.
#[derive(Clone, Debug)]
pub struct RawItem<T> {
    pub courtier_id: CourtierId,
    pub payload: T,
}

/// One item a consumer has finished processing, on its way back to its
/// originating port.
#[derive(Clone, Debug)]
pub struct ProcessedItem<T> {
    pub courtier_id: CourtierId,
    pub payload: T,
}

/// The broker side of one registered port's channel pair: a receiver onto
/// its raw queue (so a consumer anywhere can drain it) and a sender onto its
/// processed queue (so a finished item can be routed home).
struct PortChannels<T> {
    raw_rx: Receiver<RawItem<T>>,
    processed_tx: Sender<ProcessedItem<T>>,
}

/// A process-wide registry of ports. Cheap to share: submitters and
/// consumers each hold an `Arc<Broker<T>>`, and registering or dropping a
/// port only takes a short-lived lock on the registry, never on an
/// individual queue.
pub struct Broker<T> {
    capacity: usize,
    ports: Mutex<HashMap<u64, PortChannels<T>>>,
    next_port_id: AtomicU64,
}

impl<T> Broker<T> {
    /// `capacity` bounds both queues of every port registered against this
    /// broker; a full raw queue makes a port's `submit` block, which is the
    /// back-pressure mechanism that keeps a runaway producer from outrunning
    /// every attached consumer.
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Broker { capacity: capacity.max(1), ports: Mutex::new(HashMap::new()), next_port_id: AtomicU64::new(1) })
    }

    /// Registers a new port with its own raw/processed queue pair. Each
    /// port gets a distinct id for `CourtierId::port_id`.
    pub fn register_port(self: &Arc<Self>) -> Port<T> {
        let port_id = self.next_port_id.fetch_add(1, Ordering::SeqCst);
        let (raw_tx, raw_rx) = crossbeam_channel::bounded(self.capacity);
        let (processed_tx, processed_rx) = crossbeam_channel::bounded(self.capacity);
        self.ports.lock().unwrap().insert(port_id, PortChannels { raw_rx, processed_tx });
        debug!(port_id, "port registered with broker");
        Port { port_id, raw_tx, processed_rx, broker: Arc::clone(self) }
    }

    /// Number of currently registered ports.
    pub fn active_ports(&self) -> usize {
        self.ports.lock().unwrap().len()
    }

    /// Pulls the next raw item from whichever live port has one ready,
    /// waiting up to `timeout`. A consumer never needs to know which ports
    /// exist or care which one an item came from; it polls the current
    /// port set in short slices until something is available or the
    /// deadline passes.
    pub fn get_raw(&self, timeout: Duration) -> Option<RawItem<T>> {
        let deadline = Instant::now() + timeout;
        loop {
            let receivers: Vec<Receiver<RawItem<T>>> = {
                let ports = self.ports.lock().unwrap();
                ports.values().map(|channels| channels.raw_rx.clone()).collect()
            };
            for rx in &receivers {
                if let Ok(item) = rx.try_recv() {
                    return Some(item);
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(POLL_SLICE.min(timeout));
        }
    }

    /// Routes a finished item back to the processed queue of the port named
    /// in its courtier id. If that port has since been deregistered (its
    /// owning run vanished), the item is dropped silently — per spec, a
    /// processed item with no port to receive it is simply lost rather than
    /// erroring the consumer.
    pub fn put_processed(&self, item: ProcessedItem<T>) {
        let ports = self.ports.lock().unwrap();
        if let Some(channels) = ports.get(&item.courtier_id.port_id) {
            let _ = channels.processed_tx.send(item);
        } else {
            debug!(port_id = item.courtier_id.port_id, "dropping processed item for a vanished port");
        }
    }
}

/// A submitter's handle onto its own slice of the broker: a raw queue to
/// push work into and a processed queue to pull its own results back out
/// of. Consumers never hold one of these; they talk to the `Broker`
/// directly since they must be able to service any live port.
pub struct Port<T> {
    port_id: u64,
    raw_tx: Sender<RawItem<T>>,
    processed_rx: Receiver<ProcessedItem<T>>,
    broker: Arc<Broker<T>>,
}

impl<T> Port<T> {
    pub fn port_id(&self) -> u64 {
        self.port_id
    }

    /// Enqueues an item into this port's own raw queue. Blocks if the queue
    /// is currently full.
    pub fn submit(&self, item: RawItem<T>) {
        let _ = self.raw_tx.send(item);
    }

    /// Submits without blocking past `timeout`; returns the item back to
    /// the caller if no consumer drained the queue in time.
    pub fn submit_timeout(&self, item: RawItem<T>, timeout: Duration) -> std::result::Result<(), RawItem<T>> {
        self.raw_tx.send_timeout(item, timeout).map_err(|e| e.into_inner())
    }

    /// Pulls one item from this port's own processed queue, waiting up to
    /// `timeout`. Returns `None` on timeout, which the collection engine
    /// treats as "nothing new yet", not as an error.
    pub fn get_processed(&self, timeout: Duration) -> Option<ProcessedItem<T>> {
        self.processed_rx.recv_timeout(timeout).ok()
    }

    /// Drains every processed item currently queued for this port without
    /// blocking.
    pub fn drain_processed(&self) -> Vec<ProcessedItem<T>> {
        self.processed_rx.try_iter().collect()
    }
}

impl<T> Drop for Port<T> {
    /// Ports tear down by `Drop` rather than an explicit deregister call: a
    /// port whose owning run panics still gets removed from the registry,
    /// and any processed item already in flight for it is harmlessly
    /// dropped by `put_processed` once the entry is gone.
    fn drop(&mut self) {
        self.broker.ports.lock().unwrap().remove(&self.port_id);
        debug!(port_id = self.port_id, "port deregistered from broker");
    }
}
