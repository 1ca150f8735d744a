//! # geneva
//!
//! `geneva` is a distributed evolutionary-computation library: population-
//! based optimization algorithms (evolutionary algorithm, simulated
//! annealing, particle swarm, parameter scan, gradient descent) driven by a
//! broker/consumer execution fabric that ships candidates to thread-pool,
//! serial, or remote TCP workers for evaluation.
//!
//! The pieces compose roughly like this:
//!
//! - [`candidate`] — `Individual`, the narrow trait a problem implements,
//!   and `Candidate<I>`, the bookkeeping wrapper the kernel moves around.
//! - [`broker`] — the shared raw/processed queue pair and the `Port`
//!   handles consumers pull work from and push results to.
//! - [`consumer`] — ways to drain a `Port`: in-process serial, a `rayon`
//!   thread pool, or a TCP server/client pair for remote workers.
//! - [`engine`] — the submission/collection engine that turns "evaluate
//!   this generation" into "every position resolved or marked `Error`".
//! - [`optimize`] — the shared `OptimizationLoop` plus one `CycleLogic` per
//!   algorithm family (`ea`, `swarm`, `scan`, `gradient`).
//! - [`config`] — the recognized configuration surface and its validation.
//! - [`wire`] — the TCP consumer's framing and serialization formats.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

pub mod broker;
pub mod candidate;
pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod optimize;
pub mod personality;
pub mod random;
pub mod statistic;
pub mod wire;

pub mod prelude {
    //! Re-exports of the types most callers need to set up a run: bring
    //! this in with `use geneva::prelude::*;`.

    pub use crate::broker::{Broker, CourtierId, Port};
    pub use crate::candidate::{Candidate, Fitness, Individual, ProcessingState};
    pub use crate::config::{Config, RecombinationScheme, ScanAxis};
    pub use crate::consumer::{pool::PoolConsumer, serial, tcp, StopSignal};
    pub use crate::engine::{CompletionPolicy, SubmissionEngine, WaitFactorPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::optimize::ea::{Ea, EaMode};
    pub use crate::optimize::gradient::GradientDescent;
    pub use crate::optimize::scan::Scan;
    pub use crate::optimize::swarm::Swarm;
    pub use crate::optimize::{CycleLogic, HaltCriteria, OptimizationLoop, OptimizationResult};
    pub use crate::personality::swarm::Coefficient;
    pub use crate::personality::Personality;
    pub use crate::random::{random_seed, seed_rng, thread_prng, Prng, Seed};
    pub use crate::wire::SerializationMode;
}
