//! End-to-end: an 11x11 parameter-scan grid over two axes, driven through
//! the real broker/serial-consumer/engine stack, checking every grid cell
//! is visited exactly once and the loop halts with the scan-exhausted
//! cause.

use geneva::prelude::*;
use geneva::random::RngCore;
use std::collections::HashSet;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Pair {
    xy: [f64; 2],
}

impl Individual for Pair {
    fn adapt(&mut self, _rng: &mut dyn RngCore) {}
    fn random_init(&mut self, _rng: &mut dyn RngCore) {}

    fn evaluate(&self) -> (f64, Vec<f64>) {
        let [x, y] = self.xy;
        (x + y, Vec::new())
    }

    fn parameter_vector(&self) -> Vec<f64> {
        self.xy.to_vec()
    }

    fn assign_parameter_vector(&mut self, values: &[f64]) {
        self.xy = [values[0], values[1]];
    }
}

#[test]
fn scan_visits_every_grid_cell_exactly_once() {
    let axes = vec![
        ScanAxis::Double { parameter_index: 0, lo: 0.0, hi: 1.0, steps: 11 },
        ScanAxis::Double { parameter_index: 1, lo: 0.0, hi: 1.0, steps: 11 },
    ];

    let broker: std::sync::Arc<Broker<Candidate<Pair>>> = Broker::new(32);
    let worker_broker = std::sync::Arc::clone(&broker);
    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let worker = std::thread::spawn(move || {
        serial::run(&worker_broker, std::time::Duration::from_millis(10), &worker_stop);
    });

    let mut engine = SubmissionEngine::new(
        std::sync::Arc::clone(&broker),
        WaitFactorPolicy::default(),
        CompletionPolicy::Strict,
        5,
        std::time::Duration::from_secs(1),
        std::time::Duration::from_millis(10),
        std::time::Duration::from_millis(1),
    );

    let mut rng = seed_rng([3u8; 32]);
    let mut scan: Scan<Pair> = Scan::new(axes, false, false, &mut rng);
    let batch = 11;
    let mut population: Vec<Candidate<Pair>> =
        (0..batch).map(|_| Candidate::new(Pair { xy: [0.0, 0.0] }, false)).collect();

    let mut seen = HashSet::new();
    let mut halt_cause = None;
    for _ in 0..20 {
        scan.cycle(&mut population, &mut engine, &mut rng).unwrap();
        for candidate in population.iter() {
            if candidate.state() == ProcessingState::Processed {
                let v = candidate.individual().parameter_vector();
                seen.insert((v[0].to_bits(), v[1].to_bits()));
            }
        }
        if let Some(cause) = scan.custom_halt() {
            halt_cause = Some(cause);
            break;
        }
    }

    assert_eq!(halt_cause, Some("scan exhausted"));
    assert_eq!(seen.len(), 121);

    stop.signal();
    let _ = worker.join();
}
