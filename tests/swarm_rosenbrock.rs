//! End-to-end: particle-swarm optimization over the 2-D Rosenbrock function,
//! whose minimum sits at (1, 1), driven through the real broker/serial-
//! consumer/engine/optimization-loop stack.

use geneva::prelude::*;
use geneva::random::{Rng, RngCore};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Point {
    xy: [f64; 2],
}

impl Individual for Point {
    fn adapt(&mut self, _rng: &mut dyn RngCore) {}

    fn random_init(&mut self, rng: &mut dyn RngCore) {
        self.xy = [rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0)];
    }

    fn evaluate(&self) -> (f64, Vec<f64>) {
        let [x, y] = self.xy;
        let rosenbrock = (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2);
        (rosenbrock, Vec::new())
    }

    fn parameter_vector(&self) -> Vec<f64> {
        self.xy.to_vec()
    }

    fn assign_parameter_vector(&mut self, values: &[f64]) {
        self.xy = [values[0], values[1]];
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        vec![(-5.0, 5.0), (-5.0, 5.0)]
    }
}

#[test]
fn swarm_converges_near_the_rosenbrock_minimum() {
    let n_neighborhoods = 5;
    let neighborhood_size = 20;

    let broker: std::sync::Arc<Broker<Candidate<Point>>> = Broker::new(128);
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

    let mut rng = seed_rng([7u8; 32]);
    let mut population: Vec<Candidate<Point>> = (0..n_neighborhoods * neighborhood_size)
        .map(|_| {
            let mut individual = Point { xy: [0.0, 0.0] };
            individual.random_init(&mut rng);
            Candidate::new(individual, false)
        })
        .collect();

    let swarm: Swarm<Point> = Swarm::new(
        n_neighborhoods,
        neighborhood_size,
        Coefficient::Fixed(2.0),
        Coefficient::Fixed(2.0),
        Coefficient::Fixed(0.4),
        false,
    );
    swarm.label_initial_population(&mut population);

    let halt = HaltCriteria { max_iterations: Some(300), max_duration: None, max_stall_iterations: None };
    let mut loop_ = OptimizationLoop::new(swarm, engine, halt, false);

    let result = loop_.optimize(&mut population, &mut rng).unwrap();

    let best = result.best.individual().parameter_vector();
    let distance = ((best[0] - 1.0).powi(2) + (best[1] - 1.0).powi(2)).sqrt();
    assert!(distance < 1.0, "best position {best:?} is too far from (1, 1): distance {distance}");

    stop.signal();
    let _ = worker.join();
}
