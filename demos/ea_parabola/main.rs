//! Minimizes `f(x) = sum(x_i^2)` over a configurable number of dimensions
//! with the mu,lambda EA, running entirely in-process via the serial
//! consumer. A classic smoke test for the optimization loop: the minimum is
//! at the origin and every algorithm family in this crate should find it.

use geneva::prelude::*;
use geneva::random::{Rng, RngCore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Parabola {
    x: Vec<f64>,
}

impl Individual for Parabola {
    fn adapt(&mut self, rng: &mut dyn RngCore) {
        for v in &mut self.x {
            *v += rng.gen_range(-0.3..0.3);
        }
    }

    fn random_init(&mut self, rng: &mut dyn RngCore) {
        for v in &mut self.x {
            *v = rng.gen_range(-10.0..10.0);
        }
    }

    fn evaluate(&self) -> (f64, Vec<f64>) {
        (self.x.iter().map(|v| v * v).sum(), Vec::new())
    }

    fn amalgamate(&self, peer: &Self, _rng: &mut dyn RngCore) -> Self {
        Parabola { x: self.x.iter().zip(&peer.x).map(|(a, b)| (a + b) / 2.0).collect() }
    }

    fn parameter_vector(&self) -> Vec<f64> {
        self.x.clone()
    }

    fn assign_parameter_vector(&mut self, values: &[f64]) {
        self.x = values.to_vec();
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        vec![(-10.0, 10.0); self.x.len()]
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let dims = 5;
    let mu = 5;
    let lambda = 20;

    let broker: Arc<Broker<Candidate<Parabola>>> = Broker::new(64);
    let worker_broker = Arc::clone(&broker);
    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let worker = std::thread::spawn(move || {
        serial::run(&worker_broker, Duration::from_millis(10), &worker_stop);
    });

    let engine = SubmissionEngine::new(
        Arc::clone(&broker),
        WaitFactorPolicy::default(),
        CompletionPolicy::Strict,
        5,
        Duration::from_secs(1),
        Duration::from_millis(10),
        Duration::from_millis(1),
    );

    let mut rng = thread_prng();
    let mut population: Vec<Candidate<Parabola>> = (0..mu + lambda)
        .map(|_| {
            let mut individual = Parabola { x: vec![0.0; dims] };
            individual.random_init(&mut rng);
            Candidate::new(individual, false)
        })
        .collect();

    let logic = Ea::new(mu, lambda, RecombinationScheme::Default, 0.2, EaMode::Ea, false);
    let halt = HaltCriteria { max_iterations: Some(200), max_duration: None, max_stall_iterations: Some(50) };
    let mut loop_ = OptimizationLoop::new(logic, engine, halt, false);

    let result = loop_.optimize(&mut population, &mut rng).unwrap();
    info!(
        iterations = result.iterations,
        halt_cause = result.halt_cause,
        best = ?result.best.individual().parameter_vector(),
        "ea parabola finished"
    );

    stop.signal();
    let _ = worker.join();
}
