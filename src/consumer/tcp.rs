//! The TCP consumer: a server side that hands raw items to remote clients and
//! collects their results, and a client side that is the dual of the server's
//! protocol. Built on blocking `std::net` sockets and one thread per session,
//! which keeps the session loop a direct transliteration of the wire
//! protocol instead of an event-loop state machine.

use super::StopSignal;
use crate::broker::{Broker, ProcessedItem, RawItem};
use crate::candidate::{Candidate, Individual};
use crate::error::{Error, Result};
use crate::wire::{read_frame, write_bare_command, write_framed_command, Command, Frame, SerializationMode};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Backoff between `ready` probes after the server replies `empty`.
const EMPTY_BACKOFF: Duration = Duration::from_millis(50);
/// Poll interval while the accept loop waits for a connection or shutdown.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// The server side: accepts remote worker connections and services each with
/// the `ready / compute|empty / result` protocol against one shared port.
pub struct TcpServer {
    stop: StopSignal,
    accept_thread: Option<JoinHandle<()>>,
}

impl TcpServer {
    pub fn spawn<I: Individual + 'static>(
        broker: &Arc<Broker<Candidate<I>>>,
        addr: impl ToSocketAddrs,
        mode: SerializationMode,
        server_idle_timeout: Duration,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let stop = StopSignal::new();
        let broker = Arc::clone(broker);
        let accept_stop = stop.clone();
        let accept_thread = thread::spawn(move || {
            loop {
                if accept_stop.is_stopped() {
                    return;
                }
                match listener.accept() {
                    Ok((stream, peer)) => {
                        debug!(%peer, "tcp consumer connected");
                        let session_broker = Arc::clone(&broker);
                        let session_stop = accept_stop.clone();
                        thread::spawn(move || {
                            if let Err(err) = serve_session(stream, &session_broker, mode, server_idle_timeout, &session_stop) {
                                warn!(%err, "tcp session closed with error");
                            }
                        });
                    },
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(ACCEPT_POLL);
                    },
                    Err(e) => {
                        warn!(%e, "tcp accept failed, stopping server");
                        return;
                    },
                }
            }
        });
        Ok(TcpServer { stop, accept_thread: Some(accept_thread) })
    }

    pub fn stop(&self) {
        self.stop.signal();
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        self.stop.signal();
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

fn serve_session<I: Individual>(
    mut stream: TcpStream,
    broker: &Arc<Broker<Candidate<I>>>,
    mode: SerializationMode,
    server_idle_timeout: Duration,
    stop: &StopSignal,
) -> Result<()> {
    while !stop.is_stopped() {
        match read_frame(&mut stream)? {
            Frame::Bare(Command::Ready) => match broker.get_raw(server_idle_timeout) {
                Some(RawItem { courtier_id, payload }) => {
                    // Stamp the courtier id onto the candidate itself so the
                    // client's `result` reply carries its own provenance;
                    // the session never has to remember what it handed out.
                    let mut payload = payload;
                    payload.set_courtier_id(courtier_id);
                    let bytes = mode.encode(&payload)?;
                    write_framed_command(&mut stream, Command::Compute, &bytes)?;
                },
                None => write_bare_command(&mut stream, Command::Empty)?,
            },
            Frame::Framed(Command::Result, bytes) => {
                let candidate: Candidate<I> = mode.decode(&bytes)?;
                let courtier_id = candidate
                    .courtier_id()
                    .ok_or_else(|| Error::WireProtocolError("result candidate carries no courtier id".into()))?;
                broker.put_processed(ProcessedItem { courtier_id, payload: candidate });
            },
            _ => return Err(Error::WireProtocolError("unexpected frame from tcp worker".into())),
        }
    }
    Ok(())
}

/// The client side: the dual of the server loop, run on the calling thread.
/// Stops when `stop` is signalled, `deadline` elapses, or `max_iterations`
/// compute cycles have completed — whichever comes first.
pub fn run_client<I: Individual>(
    addr: impl ToSocketAddrs,
    mode: SerializationMode,
    deadline: Option<Duration>,
    max_iterations: Option<u64>,
    stop: &StopSignal,
) -> Result<()> {
    let mut stream = TcpStream::connect(addr)?;
    let start = Instant::now();
    let mut iterations = 0u64;
    loop {
        if stop.is_stopped() {
            return Ok(());
        }
        if let Some(d) = deadline {
            if start.elapsed() >= d {
                return Ok(());
            }
        }
        if let Some(max) = max_iterations {
            if iterations >= max {
                return Ok(());
            }
        }
        write_bare_command(&mut stream, Command::Ready)?;
        match read_frame(&mut stream)? {
            Frame::Bare(Command::Empty) => thread::sleep(EMPTY_BACKOFF),
            Frame::Framed(Command::Compute, bytes) => {
                let mut candidate: Candidate<I> = mode.decode(&bytes)?;
                candidate.process();
                let result_bytes = mode.encode(&candidate)?;
                write_framed_command(&mut stream, Command::Result, &result_bytes)?;
                iterations += 1;
            },
            _ => return Err(Error::WireProtocolError("unexpected frame from server".into())),
        }
    }
}
