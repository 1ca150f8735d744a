//! The optimization loop shared by every algorithm family: `init -> (while
//! not halt: cycle_logic -> info -> checkpoint) -> finalize`. Each family
//! (EA/SA, swarm, parameter scan, gradient descent) plugs in its own
//! `CycleLogic` implementation; everything about halting, stall tracking,
//! and timing is common and lives here once.

pub mod ea;
pub mod gradient;
pub mod scan;
pub mod swarm;

use crate::candidate::{Candidate, Individual};
use crate::engine::SubmissionEngine;
use crate::error::Result;
use crate::random::RngCore;
use std::time::{Duration, Instant};
use tracing::info;

/// Disjunction of halt conditions, evaluated after every `cycle_logic`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct HaltCriteria {
    pub max_iterations: Option<u32>,
    pub max_duration: Option<Duration>,
    pub max_stall_iterations: Option<u32>,
}

/// One algorithm family's per-generation behavior. The loop drives this;
/// `cycle` owns reproduction/update, submission through the engine, and
/// selection, and reports the best fitness the new generation produced.
pub trait CycleLogic<I: Individual> {
    fn cycle(
        &mut self,
        population: &mut Vec<Candidate<I>>,
        engine: &mut SubmissionEngine<I>,
        rng: &mut dyn RngCore,
    ) -> Result<(f64, f64)>;

    /// Called once the stall counter reaches the loop's threshold. Default
    /// is a no-op; EA re-tunes adaptor strengths here, swarm may reshuffle.
    fn act_on_stalls(&mut self, _population: &mut Vec<Candidate<I>>) {}

    /// An algorithm-specific extra halt condition on top of the shared
    /// iteration/duration/stall ones, e.g. "parameter scan exhausted".
    /// Returning `Some(reason)` ends the run after the current generation.
    fn custom_halt(&self) -> Option<&'static str> {
        None
    }

    fn mnemonic(&self) -> &'static str;
}

/// The best candidate an optimization run produced, with the iteration it
/// was found at and why the run stopped.
#[derive(Clone, Debug)]
pub struct OptimizationResult<I: Individual> {
    pub best: Candidate<I>,
    pub iterations: u32,
    pub halt_cause: &'static str,
}

pub struct OptimizationLoop<I: Individual, L: CycleLogic<I>> {
    logic: L,
    engine: SubmissionEngine<I>,
    halt: HaltCriteria,
    maximize: bool,
    iteration: u32,
    n_stalls: u32,
    best_transformed: f64,
    started_at: Instant,
}

impl<I: Individual, L: CycleLogic<I>> OptimizationLoop<I, L> {
    pub fn new(logic: L, engine: SubmissionEngine<I>, halt: HaltCriteria, maximize: bool) -> Self {
        OptimizationLoop {
            logic,
            engine,
            halt,
            maximize,
            iteration: 0,
            n_stalls: 0,
            best_transformed: if maximize { f64::NEG_INFINITY } else { f64::INFINITY },
            started_at: Instant::now(),
        }
    }

    pub fn engine(&self) -> &SubmissionEngine<I> {
        &self.engine
    }

    /// Drives `init -> (while not halt: cycle_logic -> info -> checkpoint)
    /// -> finalize`. `population` is mutated in place across generations;
    /// the winner is read back out of it at the end.
    pub fn optimize(&mut self, population: &mut Vec<Candidate<I>>, rng: &mut dyn RngCore) -> Result<OptimizationResult<I>> {
        self.started_at = Instant::now();
        let mut halt_cause = "max_iterations";
        loop {
            let (raw, transformed) = self.logic.cycle(population, &mut self.engine, rng)?;
            self.iteration += 1;

            let improved = if self.maximize {
                transformed > self.best_transformed
            } else {
                transformed < self.best_transformed
            };
            if improved {
                self.best_transformed = transformed;
                self.n_stalls = 0;
            } else {
                self.n_stalls += 1;
            }
            info!(
                iteration = self.iteration,
                raw,
                transformed,
                n_stalls = self.n_stalls,
                algorithm = self.logic.mnemonic(),
                "generation complete"
            );

            if let Some(threshold) = self.halt.max_stall_iterations {
                if self.n_stalls >= threshold {
                    self.logic.act_on_stalls(population);
                }
            }

            if let Some(cause) = self.halt_check() {
                halt_cause = cause;
                break;
            }
            if let Some(cause) = self.logic.custom_halt() {
                halt_cause = cause;
                break;
            }
        }
        self.finalize(population, halt_cause)
    }

    fn halt_check(&self) -> Option<&'static str> {
        if let Some(max) = self.halt.max_iterations {
            if self.iteration >= max {
                return Some("max_iterations");
            }
        }
        if let Some(max_duration) = self.halt.max_duration {
            if self.started_at.elapsed() >= max_duration {
                return Some("max_duration");
            }
        }
        if let Some(threshold) = self.halt.max_stall_iterations {
            if self.n_stalls >= threshold {
                return Some("max_stall_iterations");
            }
        }
        None
    }

    fn finalize(&self, population: &[Candidate<I>], halt_cause: &'static str) -> Result<OptimizationResult<I>> {
        let best = population
            .iter()
            .max_by(|a, b| a.transformed_fitness().partial_cmp(&b.transformed_fitness()).unwrap())
            .expect("population is never empty")
            .clone();
        Ok(OptimizationResult { best, iterations: self.iteration, halt_cause })
    }
}
