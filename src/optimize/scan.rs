//! Parameter scan: walks a Cartesian-product grid over one or more
//! parameter axes like an odometer, assigning the next unvisited cell to
//! each population slot every cycle until the grid is exhausted. Not named
//! in the distilled operation list but present in the original optimizer
//! this crate generalizes, and cheap to support given the same
//! `CycleLogic`/engine plumbing EA and swarm already use.

use super::CycleLogic;
use crate::candidate::{Candidate, Individual, ProcessingState};
use crate::config::ScanAxis;
use crate::engine::SubmissionEngine;
use crate::error::Result;
use crate::personality::scan::ScanTraits;
use crate::personality::Personality;
use crate::random::{Rng, RngCore};

pub struct Scan<I: Individual> {
    axes: Vec<ScanAxis>,
    total: usize,
    cursor: usize,
    /// Precomputed permutation of grid indices when the axes are visited in
    /// random rather than lexicographic order. `order[logical] = physical`.
    order: Option<Vec<usize>>,
    maximize: bool,
    exhausted: bool,
    _marker: std::marker::PhantomData<I>,
}

impl<I: Individual> Scan<I> {
    pub fn new(axes: Vec<ScanAxis>, randomly: bool, maximize: bool, rng: &mut dyn RngCore) -> Self {
        let total = axes.iter().map(|axis| axis.len()).product::<usize>().max(1);
        let order = if randomly {
            let mut indices: Vec<usize> = (0..total).collect();
            for i in (1..indices.len()).rev() {
                let j = rng.gen_range(0..=i);
                indices.swap(i, j);
            }
            Some(indices)
        } else {
            None
        };
        Scan { axes, total, cursor: 0, order, maximize, exhausted: false, _marker: std::marker::PhantomData }
    }

    /// Converts a flattened grid index into one digit per axis, least
    /// significant (fastest-changing) axis last, like a mechanical odometer.
    /// Decomposes `grid_index` into one digit per axis, axis 0 fastest-
    /// changing: advance axis 0 through its full range before axis 1 rolls
    /// over, and so on, matching a positional odometer read least-
    /// significant digit first.
    fn digits_for(&self, grid_index: usize) -> Vec<usize> {
        let mut remaining = grid_index;
        let mut digits = vec![0usize; self.axes.len()];
        for i in 0..self.axes.len() {
            let len = self.axes[i].len();
            digits[i] = remaining % len;
            remaining /= len;
        }
        digits
    }

    /// Writes the grid point at logical position `cursor` into `candidate`
    /// and returns the physical grid index that was applied (the one
    /// recorded on `ScanTraits`, so a random-order run can still report
    /// which cell a result belongs to).
    fn apply_grid_point(&self, candidate: &mut Candidate<I>, logical_index: usize) -> usize {
        let physical_index = self.order.as_ref().map(|order| order[logical_index]).unwrap_or(logical_index);
        let digits = self.digits_for(physical_index);
        let mut values = candidate.individual().parameter_vector();
        for (axis, digit) in self.axes.iter().zip(digits) {
            if let Some(slot) = values.get_mut(axis.parameter_index()) {
                *slot = axis.value_at(digit);
            }
        }
        candidate.individual_mut().assign_parameter_vector(&values);
        candidate.set_personality(Personality::Scan(ScanTraits::new(physical_index)));
        candidate.set_state(ProcessingState::DoProcess);
        physical_index
    }
}

impl<I: Individual> CycleLogic<I> for Scan<I> {
    fn cycle(
        &mut self,
        population: &mut Vec<Candidate<I>>,
        engine: &mut SubmissionEngine<I>,
        _rng: &mut dyn RngCore,
    ) -> Result<(f64, f64)> {
        let mut assigned_any = false;
        for candidate in population.iter_mut() {
            if self.cursor >= self.total {
                candidate.set_state(ProcessingState::Ignore);
                continue;
            }
            self.apply_grid_point(candidate, self.cursor);
            self.cursor += 1;
            assigned_any = true;
        }

        if !assigned_any {
            self.exhausted = true;
            return Ok((sentinel(self.maximize), f64::NEG_INFINITY));
        }

        engine.submit_generation(population)?;
        if self.cursor >= self.total {
            self.exhausted = true;
        }

        let best = population
            .iter_mut()
            .filter(|c| c.state() == ProcessingState::Processed)
            .max_by(|a, b| a.transformed_fitness().partial_cmp(&b.transformed_fitness()).unwrap());
        match best {
            Some(candidate) => Ok((candidate.fitness(0)?, candidate.transformed_fitness())),
            None => Ok((sentinel(self.maximize), f64::NEG_INFINITY)),
        }
    }

    fn custom_halt(&self) -> Option<&'static str> {
        if self.exhausted {
            Some("scan exhausted")
        } else {
            None
        }
    }

    fn mnemonic(&self) -> &'static str {
        "ps"
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

    #[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
    struct Pair(f64, f64);

    impl Individual for Pair {
        fn adapt(&mut self, _rng: &mut dyn RngCore) {}
        fn random_init(&mut self, _rng: &mut dyn RngCore) {}
        fn evaluate(&self) -> (f64, Vec<f64>) {
            (self.0 + self.1, Vec::new())
        }
        fn parameter_vector(&self) -> Vec<f64> {
            vec![self.0, self.1]
        }
        fn assign_parameter_vector(&mut self, values: &[f64]) {
            self.0 = values[0];
            self.1 = values[1];
        }
    }

    #[test]
    fn lexicographic_odometer_enumerates_every_combination_once() {
        let axes = vec![
            ScanAxis::Int { parameter_index: 0, lo: 0, hi: 1 },
            ScanAxis::Double { parameter_index: 1, lo: 0.0, hi: 1.0, steps: 3 },
        ];
        let mut rng = crate::random::seed_rng([1u8; 32]);
        let scan: Scan<Pair> = Scan::new(axes, false, false, &mut rng);
        assert_eq!(scan.total, 6);

        let mut seen = std::collections::HashSet::new();
        for grid_index in 0..scan.total {
            let digits = scan.digits_for(grid_index);
            seen.insert(digits);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn random_order_is_a_permutation_of_the_grid() {
        let axes = vec![ScanAxis::Int { parameter_index: 0, lo: 0, hi: 9 }];
        let mut rng = crate::random::seed_rng([2u8; 32]);
        let scan: Scan<Pair> = Scan::new(axes, true, true, &mut rng);
        let order = scan.order.clone().unwrap();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..scan.total).collect::<Vec<_>>());
    }
}
