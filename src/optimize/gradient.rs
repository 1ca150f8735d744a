//! Gradient descent via finite differences: another algorithm the original
//! optimizer supports that the distilled operation list dropped, wired onto
//! the same `CycleLogic`/engine plumbing as EA and swarm so it costs little
//! to carry. Each walker occupies a fixed block of `dims + 1` population
//! slots: slot 0 is its current point, slots `1..=dims` are scratch probes
//! perturbed by `finite_diff_eps` along one coordinate each and evaluated
//! alongside it so every coordinate's partial derivative is estimated from
//! the same generation's broker round-trip.

use super::CycleLogic;
use crate::candidate::{Candidate, Individual, ProcessingState};
use crate::engine::SubmissionEngine;
use crate::error::Result;
use crate::random::RngCore;

pub struct GradientDescent<I: Individual> {
    n_walkers: usize,
    dims: usize,
    step_size: f64,
    finite_diff_eps: f64,
    convergence_epsilon: f64,
    maximize: bool,
    converged: bool,
    _marker: std::marker::PhantomData<I>,
}

impl<I: Individual> GradientDescent<I> {
    pub fn new(n_walkers: usize, dims: usize, step_size: f64, finite_diff_eps: f64, convergence_epsilon: f64, maximize: bool) -> Self {
        GradientDescent {
            n_walkers,
            dims,
            step_size,
            finite_diff_eps,
            convergence_epsilon,
            maximize,
            converged: false,
            _marker: std::marker::PhantomData,
        }
    }

    fn block_len(&self) -> usize {
        self.dims + 1
    }

    /// Expected population length: `n_walkers * (dims + 1)`.
    pub fn population_len(&self) -> usize {
        self.n_walkers * self.block_len()
    }
}

impl<I: Individual> CycleLogic<I> for GradientDescent<I> {
    fn cycle(
        &mut self,
        population: &mut Vec<Candidate<I>>,
        engine: &mut SubmissionEngine<I>,
        _rng: &mut dyn RngCore,
    ) -> Result<(f64, f64)> {
        let block = self.block_len();
        for walker in 0..self.n_walkers {
            let base_idx = walker * block;
            let base_values = population[base_idx].individual().parameter_vector();
            for k in 0..self.dims {
                let probe_idx = base_idx + 1 + k;
                let mut perturbed = base_values.clone();
                perturbed[k] += self.finite_diff_eps;
                population[probe_idx].individual_mut().assign_parameter_vector(&perturbed);
                population[probe_idx].set_state(ProcessingState::DoProcess);
            }
            population[base_idx].set_state(ProcessingState::DoProcess);
        }

        engine.submit_generation(population)?;

        let mut best_raw = sentinel(self.maximize);
        let mut best_transformed = f64::NEG_INFINITY;
        let mut all_converged = true;

        for walker in 0..self.n_walkers {
            let base_idx = walker * block;
            let base_raw = population[base_idx].fitness(0)?;
            let base_transformed = population[base_idx].transformed_fitness();
            if base_transformed > best_transformed {
                best_transformed = base_transformed;
                best_raw = base_raw;
            }

            let bounds = population[base_idx].individual().parameter_bounds();
            let mut gradient = vec![0.0; self.dims];
            for k in 0..self.dims {
                let probe_idx = base_idx + 1 + k;
                let probe_transformed = population[probe_idx].transformed_fitness();
                gradient[k] = (probe_transformed - base_transformed) / self.finite_diff_eps;
            }
            let gradient_norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
            if gradient_norm > self.convergence_epsilon {
                all_converged = false;
            }

            let mut next = population[base_idx].individual().parameter_vector();
            for k in 0..self.dims {
                next[k] += self.step_size * gradient[k];
                if let Some((lo, hi)) = bounds.get(k) {
                    next[k] = next[k].clamp(*lo, *hi);
                }
            }
            population[base_idx].individual_mut().assign_parameter_vector(&next);
            population[base_idx].set_state(ProcessingState::DoProcess);
        }

        self.converged = all_converged;
        Ok((best_raw, best_transformed))
    }

    fn custom_halt(&self) -> Option<&'static str> {
        if self.converged {
            Some("gradient converged")
        } else {
            None
        }
    }

    fn mnemonic(&self) -> &'static str {
        "gd"
    }
}

fn sentinel(maximize: bool) -> f64 {
    if maximize {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use crate::consumer::{serial, StopSignal};
    use crate::engine::{CompletionPolicy, SubmissionEngine, WaitFactorPolicy};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
    struct Point(Vec<f64>);

    impl Individual for Point {
        fn adapt(&mut self, _rng: &mut dyn RngCore) {}
        fn random_init(&mut self, _rng: &mut dyn RngCore) {}
        fn evaluate(&self) -> (f64, Vec<f64>) {
            (self.0.iter().map(|v| v * v).sum(), Vec::new())
        }
        fn parameter_vector(&self) -> Vec<f64> {
            self.0.clone()
        }
        fn assign_parameter_vector(&mut self, values: &[f64]) {
            self.0 = values.to_vec();
        }
        fn parameter_bounds(&self) -> Vec<(f64, f64)> {
            vec![(-100.0, 100.0); self.0.len()]
        }
    }

    #[test]
    fn descent_moves_the_walker_toward_the_minimum() {
        let dims = 2;
        let mut gd: GradientDescent<Point> = GradientDescent::new(1, dims, 0.1, 1e-3, 1e-6, false);

        let broker = Broker::new(16);
        let worker_broker = Arc::clone(&broker);
        let stop = StopSignal::new();
        let worker_stop = stop.clone();
        let handle = std::thread::spawn(move || serial::run(&worker_broker, Duration::from_millis(10), &worker_stop));
        let mut engine = SubmissionEngine::new(
            Arc::clone(&broker),
            WaitFactorPolicy::default(),
            CompletionPolicy::Strict,
            3,
            Duration::from_secs(1),
            Duration::from_millis(10),
            Duration::from_millis(1),
        );

        let mut population: Vec<Candidate<Point>> =
            (0..gd.population_len()).map(|_| Candidate::new(Point(vec![5.0; dims]), false)).collect();

        let mut rng = crate::random::seed_rng([3u8; 32]);
        let mut last_raw = f64::INFINITY;
        for _ in 0..20 {
            let (raw, _) = gd.cycle(&mut population, &mut engine, &mut rng).unwrap();
            assert!(raw <= last_raw + 1e-9);
            last_raw = raw;
        }
        assert!(last_raw < 50.0);

        stop.signal();
        let _ = handle.join();
    }
}
