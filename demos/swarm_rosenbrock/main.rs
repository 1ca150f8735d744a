//! Particle-swarm optimization against the 2-D Rosenbrock function, whose
//! curved valley makes it a standard benchmark for swarm convergence: the
//! global minimum sits at `(1, 1)` but gradient-following methods tend to
//! crawl along the valley floor rather than descending straight to it.

use geneva::prelude::*;
use geneva::random::{Rng, RngCore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Point {
    xy: [f64; 2],
}

impl Individual for Point {
    fn adapt(&mut self, rng: &mut dyn RngCore) {
        for v in &mut self.xy {
            *v += rng.gen_range(-0.1..0.1);
        }
    }

    fn random_init(&mut self, rng: &mut dyn RngCore) {
        for v in &mut self.xy {
            *v = rng.gen_range(-5.0..5.0);
        }
    }

    fn evaluate(&self) -> (f64, Vec<f64>) {
        let [x, y] = self.xy;
        let value = (1.0 - x).powi(2) + 100.0 * (y - x * x).powi(2);
        (value, Vec::new())
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

fn main() {
    tracing_subscriber::fmt::init();

    let n_neighborhoods = 5;
    let neighborhood_size = 20;

    let broker: Arc<Broker<Candidate<Point>>> = Broker::new(128);
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
    let mut population: Vec<Candidate<Point>> = (0..n_neighborhoods * neighborhood_size)
        .map(|_| {
            let mut individual = Point { xy: [0.0, 0.0] };
            individual.random_init(&mut rng);
            Candidate::new(individual, false)
        })
        .collect();

    let mut swarm: Swarm<Point> = Swarm::new(
        n_neighborhoods,
        neighborhood_size,
        Coefficient::Fixed(2.0),
        Coefficient::Fixed(2.0),
        Coefficient::Fixed(0.4),
        false,
    );
    swarm.label_initial_population(&mut population);

    let halt = HaltCriteria { max_iterations: Some(300), max_duration: None, max_stall_iterations: Some(80) };
    let mut loop_ = OptimizationLoop::new(swarm, engine, halt, false);

    let result = loop_.optimize(&mut population, &mut rng).unwrap();
    info!(
        iterations = result.iterations,
        halt_cause = result.halt_cause,
        best = ?result.best.individual().parameter_vector(),
        "swarm rosenbrock finished"
    );

    stop.signal();
    let _ = worker.join();
}
