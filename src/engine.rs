//! The submission/collection engine: hands a generation's worth of
//! `DO_PROCESS` candidates to the broker, waits under a wait-factor deadline,
//! resubmits stragglers, and reassembles the generation in its original slot
//! order regardless of completion order.

use crate::broker::{Broker, CourtierId, Port, ProcessedItem, RawItem};
use crate::candidate::{Candidate, Individual, ProcessingState};
use crate::error::{Error, Result};
use crate::statistic::{ProcessingTime, TrackProcessingTime};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Whether a generation that can't be fully collected within
/// `max_resubmissions` fails outright or is returned with stragglers marked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompletionPolicy {
    /// A generation with stragglers after `max_resubmissions` raises
    /// `IncompleteGeneration`.
    Strict,
    /// Stragglers are left at their pre-generation state and marked
    /// `Error`; the engine returns normally so the caller's stall-action
    /// hook can react.
    BestEffort,
}

/// The deadline policy: a multiple of the estimated per-item processing
/// time, clamped to `[min_wait_factor, max_wait_factor]` and widened by
/// `wait_factor_increment` after each unsuccessful attempt.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WaitFactorPolicy {
    pub wait_factor: f64,
    pub min_wait_factor: f64,
    pub max_wait_factor: f64,
    pub wait_factor_increment: f64,
    pub boundless_wait: bool,
}

impl Default for WaitFactorPolicy {
    fn default() -> Self {
        WaitFactorPolicy {
            wait_factor: 2.0,
            min_wait_factor: 0.5,
            max_wait_factor: 10.0,
            wait_factor_increment: 0.5,
            boundless_wait: false,
        }
    }
}

pub struct SubmissionEngine<I: Individual> {
    port: Port<Candidate<I>>,
    policy: WaitFactorPolicy,
    completion: CompletionPolicy,
    max_resubmissions: u32,
    submit_timeout: Duration,
    poll_timeout: Duration,
    /// Moving estimate of per-item processing time; updated after every
    /// generation from the observed wall time divided by item count.
    estimated_latency: Duration,
    total_processing_time: ProcessingTime,
}

impl<I: Individual> SubmissionEngine<I> {
    pub fn new(
        broker: Arc<Broker<Candidate<I>>>,
        policy: WaitFactorPolicy,
        completion: CompletionPolicy,
        max_resubmissions: u32,
        submit_timeout: Duration,
        poll_timeout: Duration,
        initial_latency_estimate: Duration,
    ) -> Self {
        let port = broker.register_port();
        SubmissionEngine {
            port,
            policy,
            completion,
            max_resubmissions,
            submit_timeout,
            poll_timeout,
            estimated_latency: initial_latency_estimate,
            total_processing_time: ProcessingTime::zero(),
        }
    }

    pub fn port_id(&self) -> u64 {
        self.port.port_id()
    }

    /// Submits every `DO_PROCESS` candidate in `population`, waits for
    /// results with resubmission, and leaves every processed position in
    /// `Processed` (or `Error` under `BestEffort`). Positions not in
    /// `DO_PROCESS` (e.g. `Ignore`d elites) are left untouched.
    pub fn submit_generation(&mut self, population: &mut [Candidate<I>]) -> Result<()> {
        let total = population.len();
        let mut pending: Vec<usize> = (0..total)
            .filter(|&p| population[p].state() == ProcessingState::DoProcess)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let mut attempt_of = vec![0u32; total];
        let mut attempt = 0u32;
        let mut wait_factor = self.policy.wait_factor.clamp(self.policy.min_wait_factor, self.policy.max_wait_factor);
        let started = Instant::now();

        loop {
            for &p in &pending {
                attempt_of[p] = attempt;
                let courtier_id = CourtierId::new(self.port.port_id(), p, attempt);
                population[p].set_courtier_id(courtier_id);
                population[p].set_server_mode(true);
                let item = RawItem { courtier_id, payload: population[p].clone() };
                self.port
                    .submit_timeout(item, self.submit_timeout)
                    .map_err(|_| Error::BrokerTimeout(self.submit_timeout))?;
            }

            let deadline = if self.policy.boundless_wait {
                None
            } else {
                Some(Instant::now() + self.estimated_latency.mul_f64(wait_factor))
            };
            self.collect_round(population, &mut pending, &attempt_of, deadline);

            if pending.is_empty() {
                break;
            }
            if attempt >= self.max_resubmissions {
                match self.completion {
                    CompletionPolicy::Strict => {
                        return Err(Error::IncompleteGeneration {
                            missing: pending.len(),
                            total,
                            attempts: attempt + 1,
                        });
                    },
                    CompletionPolicy::BestEffort => {
                        warn!(missing = pending.len(), total, "best-effort generation completed with stragglers");
                        for &p in &pending {
                            population[p].set_server_mode(false);
                            population[p].set_state(ProcessingState::Error);
                        }
                        break;
                    },
                }
            }
            attempt += 1;
            wait_factor = (wait_factor + self.policy.wait_factor_increment)
                .clamp(self.policy.min_wait_factor, self.policy.max_wait_factor);
            info!(attempt, missing = pending.len(), "resubmitting stragglers");
        }

        let elapsed = started.elapsed();
        self.total_processing_time += ProcessingTime::from_std(elapsed);
        if total > 0 {
            self.estimated_latency = elapsed / total as u32;
        }
        Ok(())
    }

    /// Drains processed items until `pending` is empty or `deadline` passes.
    /// A result whose `courtier_id.attempt` no longer matches the position's
    /// latest submission attempt is a straggler from an earlier attempt and
    /// is silently discarded — the at-most-once commit guarantee.
    fn collect_round(
        &self,
        population: &mut [Candidate<I>],
        pending: &mut Vec<usize>,
        attempt_of: &[u32],
        deadline: Option<Instant>,
    ) {
        while !pending.is_empty() {
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return;
                }
            }
            let Some(ProcessedItem { courtier_id, payload }) = self.port.get_processed(self.poll_timeout) else {
                continue;
            };
            let position = courtier_id.position;
            if position >= population.len() || attempt_of[position] != courtier_id.attempt {
                continue;
            }
            if let Some(idx) = pending.iter().position(|&p| p == position) {
                let failed = payload.state() == ProcessingState::Error;
                population[position].load_from(&payload);
                population[position].set_server_mode(false);
                population[position].set_state(if failed { ProcessingState::Error } else { ProcessingState::Processed });
                pending.swap_remove(idx);
            }
        }
    }
}

impl<I: Individual> TrackProcessingTime for SubmissionEngine<I> {
    fn processing_time(&self) -> ProcessingTime {
        self.total_processing_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use crate::consumer::{serial, StopSignal};

    #[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
    struct Number(f64);

    impl Individual for Number {
        fn adapt(&mut self, _rng: &mut dyn crate::random::RngCore) {
            self.0 += 1.0;
        }
        fn random_init(&mut self, _rng: &mut dyn crate::random::RngCore) {
            self.0 = 0.0;
        }
        fn evaluate(&self) -> (f64, Vec<f64>) {
            (self.0, Vec::new())
        }
    }

    #[test]
    fn submit_generation_collects_every_position_in_order() {
        let broker = Broker::new(16);
        let worker_broker = Arc::clone(&broker);
        let stop = StopSignal::new();
        let worker_stop = stop.clone();
        let handle = std::thread::spawn(move || {
            serial::run(&worker_broker, Duration::from_millis(20), &worker_stop);
        });

        let mut engine = SubmissionEngine::new(
            Arc::clone(&broker),
            WaitFactorPolicy::default(),
            CompletionPolicy::Strict,
            3,
            Duration::from_secs(1),
            Duration::from_millis(20),
            Duration::from_millis(5),
        );
        let mut population: Vec<Candidate<Number>> = (0..10)
            .map(|i| Candidate::new(Number(i as f64), false))
            .collect();
        engine.submit_generation(&mut population).unwrap();

        for (i, candidate) in population.iter_mut().enumerate() {
            assert_eq!(candidate.state(), ProcessingState::Processed);
            assert_eq!(candidate.fitness(0).unwrap(), i as f64);
        }
        drop(engine);
        stop.signal();
        let _ = handle.join();
    }
}
