//! Property tests for two of the quantified invariants: a parameter-scan
//! grid is enumerated exactly once per cell regardless of axis shape or
//! visitation order, and a single port observes its raw items in the exact
//! order they were submitted.

use geneva::prelude::*;
use geneva::random::RngCore;
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Pair {
    xy: [f64; 2],
}

impl Individual for Pair {
    fn adapt(&mut self, _rng: &mut dyn RngCore) {}
    fn random_init(&mut self, _rng: &mut dyn RngCore) {}
    fn evaluate(&self) -> (f64, Vec<f64>) {
        (self.xy[0] + self.xy[1], Vec::new())
    }
    fn parameter_vector(&self) -> Vec<f64> {
        self.xy.to_vec()
    }
    fn assign_parameter_vector(&mut self, values: &[f64]) {
        self.xy = [values[0], values[1]];
    }
}

fn run_scan_to_exhaustion(axes: Vec<ScanAxis>, randomly: bool, batch: usize) -> usize {
    let broker: std::sync::Arc<Broker<Candidate<Pair>>> = Broker::new(32);
    let worker_broker = std::sync::Arc::clone(&broker);
    let stop = StopSignal::new();
    let worker_stop = stop.clone();
    let worker = std::thread::spawn(move || {
        serial::run(&worker_broker, Duration::from_millis(5), &worker_stop);
    });

    let mut engine = SubmissionEngine::new(
        std::sync::Arc::clone(&broker),
        WaitFactorPolicy::default(),
        CompletionPolicy::Strict,
        5,
        Duration::from_secs(1),
        Duration::from_millis(5),
        Duration::from_millis(1),
    );
    let mut rng = seed_rng([5u8; 32]);
    let mut scan: Scan<Pair> = Scan::new(axes, randomly, false, &mut rng);
    let mut population: Vec<Candidate<Pair>> =
        (0..batch).map(|_| Candidate::new(Pair { xy: [0.0, 0.0] }, false)).collect();

    let mut seen = HashSet::new();
    for _ in 0..200 {
        scan.cycle(&mut population, &mut engine, &mut rng).unwrap();
        for candidate in population.iter() {
            if candidate.state() == ProcessingState::Processed {
                let v = candidate.individual().parameter_vector();
                seen.insert((v[0].to_bits(), v[1].to_bits()));
            }
        }
        if scan.custom_halt().is_some() {
            break;
        }
    }

    stop.signal();
    let _ = worker.join();
    seen.len()
}

proptest! {
    #[test]
    fn scan_enumerates_the_full_grid_exactly_once(
        x_steps in 1usize..6,
        y_steps in 1usize..6,
        randomly in any::<bool>(),
        batch in 1usize..7,
    ) {
        let axes = vec![
            ScanAxis::Double { parameter_index: 0, lo: 0.0, hi: 1.0, steps: x_steps },
            ScanAxis::Double { parameter_index: 1, lo: -1.0, hi: 1.0, steps: y_steps },
        ];
        let expected = x_steps * y_steps;
        let seen = run_scan_to_exhaustion(axes, randomly, batch);
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn a_port_observes_submissions_in_fifo_order(values in prop::collection::vec(any::<i32>(), 0..50)) {
        let broker: std::sync::Arc<Broker<i32>> = Broker::new(values.len().max(1));
        let port = broker.register_port();
        for (position, &value) in values.iter().enumerate() {
            let id = CourtierId::new(port.port_id(), position, 0);
            port.submit(geneva::broker::RawItem { courtier_id: id, payload: value });
        }
        for &expected in &values {
            let item = broker.get_raw(Duration::from_secs(1)).expect("item available");
            prop_assert_eq!(item.payload, expected);
        }
    }
}
