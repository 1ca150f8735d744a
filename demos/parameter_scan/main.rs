//! Exhaustive parameter scan over a 2-D grid, driven as an odometer one
//! batch of population slots at a time until every cell has been visited.
//! Useful for sensitivity sweeps where the experimenter wants every
//! combination evaluated rather than a search toward a single optimum.

use geneva::prelude::*;
use geneva::random::RngCore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Plane {
    xy: [f64; 2],
}

impl Individual for Plane {
    fn adapt(&mut self, _rng: &mut dyn RngCore) {}
    fn random_init(&mut self, _rng: &mut dyn RngCore) {}

    fn evaluate(&self) -> (f64, Vec<f64>) {
        let [x, y] = self.xy;
        ((x - 0.3).powi(2) + (y - 0.7).powi(2), Vec::new())
    }

    fn parameter_vector(&self) -> Vec<f64> {
        self.xy.to_vec()
    }

    fn assign_parameter_vector(&mut self, values: &[f64]) {
        self.xy = [values[0], values[1]];
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let axes = vec![
        ScanAxis::Double { parameter_index: 0, lo: 0.0, hi: 1.0, steps: 21 },
        ScanAxis::Double { parameter_index: 1, lo: 0.0, hi: 1.0, steps: 21 },
    ];
    let batch = 21;

    let broker: Arc<Broker<Candidate<Plane>>> = Broker::new(64);
    let worker_broker = Arc::clone(&broker);
    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let worker = std::thread::spawn(move || {
        serial::run(&worker_broker, Duration::from_millis(10), &worker_stop);
    });

    let mut engine = SubmissionEngine::new(
        Arc::clone(&broker),
        WaitFactorPolicy::default(),
        CompletionPolicy::Strict,
        5,
        Duration::from_secs(1),
        Duration::from_millis(10),
        Duration::from_millis(1),
    );

    let mut rng = thread_prng();
    let mut scan: Scan<Plane> = Scan::new(axes, false, false, &mut rng);
    let mut population: Vec<Candidate<Plane>> =
        (0..batch).map(|_| Candidate::new(Plane { xy: [0.0, 0.0] }, false)).collect();

    let mut best_raw = f64::INFINITY;
    let mut cycles = 0;
    loop {
        let (raw, _transformed) = scan.cycle(&mut population, &mut engine, &mut rng).unwrap();
        if raw < best_raw {
            best_raw = raw;
        }
        cycles += 1;
        if scan.custom_halt().is_some() {
            break;
        }
    }

    info!(cycles, best_raw, "parameter scan finished");

    stop.signal();
    let _ = worker.join();
}
