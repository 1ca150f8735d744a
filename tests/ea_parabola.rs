//! End-to-end: an EA run on a 3-dimensional parabola, driven through the
//! real broker/serial-consumer/engine/optimization-loop stack rather than
//! calling `CycleLogic::cycle` directly.

use geneva::prelude::*;
use geneva::random::{Rng, RngCore};

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

#[test]
fn ea_drives_a_parabola_below_one_thousandth() {
    let dims = 3;
    let mu = 3;
    let lambda = 9;

    let broker: std::sync::Arc<Broker<Candidate<Parabola>>> = Broker::new(32);
    let worker_broker = std::sync::Arc::clone(&broker);
    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let worker = std::thread::spawn(move || {
        serial::run(&worker_broker, std::time::Duration::from_millis(10), &worker_stop);
    });

    let engine = SubmissionEngine::new(
        std::sync::Arc::clone(&broker),
        WaitFactorPolicy::default(),
        CompletionPolicy::Strict,
        5,
        std::time::Duration::from_secs(1),
        std::time::Duration::from_millis(10),
        std::time::Duration::from_millis(1),
    );

    let mut rng = seed_rng([42u8; 32]);
    let mut population: Vec<Candidate<Parabola>> = (0..mu + lambda)
        .map(|_| {
            let mut individual = Parabola { x: vec![0.0; dims] };
            individual.random_init(&mut rng);
            Candidate::new(individual, false)
        })
        .collect();

    let logic = Ea::new(mu, lambda, RecombinationScheme::Random, 0.2, EaMode::Ea, false);
    let halt = HaltCriteria { max_iterations: Some(50), max_duration: None, max_stall_iterations: None };
    let mut loop_ = OptimizationLoop::new(logic, engine, halt, false);

    let result = loop_.optimize(&mut population, &mut rng).unwrap();

    assert_eq!(result.halt_cause, "max_iterations");
    assert!(result.best.clone().fitness(0).unwrap() < 1e-3, "best = {:?}", result.best.clone().fitness(0));

    stop.signal();
    let _ = worker.join();
}
