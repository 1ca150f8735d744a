//! Particle-swarm dynamics: neighborhoods of particles sharing a local best,
//! velocity updates toward the local and global bests, and neighborhood
//! repair after every generation so a size drift (from surplus discard,
//! never from growth elsewhere) is corrected before the next iteration.

use super::CycleLogic;
use crate::candidate::{Candidate, Individual, ProcessingState};
use crate::engine::SubmissionEngine;
use crate::error::Result;
use crate::personality::swarm::{self, BestSnapshot, Coefficient, SwarmTraits};
use crate::personality::Personality;
use crate::random::RngCore;
use std::sync::Arc;

pub struct Swarm<I: Individual> {
    n_neighborhoods: usize,
    neighborhood_size: usize,
    c_local: Coefficient,
    c_global: Coefficient,
    c_delta: Coefficient,
    maximize: bool,
    global_best: Option<Arc<BestSnapshot>>,
    local_bests: Vec<Option<Arc<BestSnapshot>>>,
    _marker: std::marker::PhantomData<I>,
}

impl<I: Individual> Swarm<I> {
    pub fn new(n_neighborhoods: usize, neighborhood_size: usize, c_local: Coefficient, c_global: Coefficient, c_delta: Coefficient, maximize: bool) -> Self {
        Swarm {
            n_neighborhoods,
            neighborhood_size,
            c_local,
            c_global,
            c_delta,
            maximize,
            global_best: None,
            local_bests: vec![None; n_neighborhoods],
            _marker: std::marker::PhantomData,
        }
    }

    /// Assigns every particle in a freshly built `N*K` population to a
    /// neighborhood in round-robin order and installs its swarm traits. Call
    /// once before the first `cycle`.
    pub fn label_initial_population(&self, population: &mut [Candidate<I>]) {
        for (idx, particle) in population.iter_mut().enumerate() {
            let neighborhood_id = idx % self.n_neighborhoods.max(1);
            let traits = SwarmTraits::new(neighborhood_id, self.c_local.clone(), self.c_global.clone(), self.c_delta.clone());
            particle.set_personality(Personality::Swarm(traits));
            particle.set_state(ProcessingState::DoProcess);
        }
    }

    fn update_best(&mut self, neighborhood_id: usize, candidate: &Candidate<I>) {
        let transformed_fitness = candidate.transformed_fitness();
        let improved_local = match &self.local_bests[neighborhood_id] {
            None => true,
            Some(snapshot) => transformed_fitness > snapshot.transformed_fitness,
        };
        if !improved_local {
            return;
        }
        let snapshot = Arc::new(BestSnapshot {
            parameter_vector: candidate.individual().parameter_vector(),
            transformed_fitness,
        });
        self.local_bests[neighborhood_id] = Some(Arc::clone(&snapshot));
        let improved_global = self.global_best.as_ref().map_or(true, |g| transformed_fitness > g.transformed_fitness);
        if improved_global {
            self.global_best = Some(snapshot);
        }
    }
}

impl<I: Individual> CycleLogic<I> for Swarm<I> {
    fn cycle(
        &mut self,
        population: &mut Vec<Candidate<I>>,
        engine: &mut SubmissionEngine<I>,
        rng: &mut dyn RngCore,
    ) -> Result<(f64, f64)> {
        for particle in population.iter_mut() {
            let bounds = particle.individual().parameter_bounds();
            let mut position = particle.individual().parameter_vector();
            let neighborhood_id = particle.personality().as_swarm()?.neighborhood_id();
            let local_best = self.local_bests.get(neighborhood_id).cloned().flatten();
            let global_best = self.global_best.clone();
            {
                let traits = particle.personality_mut().as_swarm_mut()?;
                if let (Some(local), Some(global)) = (local_best, global_best) {
                    traits.register_local_best(local);
                    traits.register_global_best(global);
                }
                if !traits.check_no_position_update_and_reset() {
                    swarm::update_velocity_and_position(traits, &mut position, &bounds, rng);
                    particle.individual_mut().assign_parameter_vector(&position);
                }
            }
            particle.set_state(ProcessingState::DoProcess);
        }

        engine.submit_generation(population)?;

        let mut new_population = Vec::with_capacity(self.n_neighborhoods * self.neighborhood_size);
        let mut best_raw = if self.maximize { f64::NEG_INFINITY } else { f64::INFINITY };
        let mut best_transformed = f64::NEG_INFINITY;

        for neighborhood_id in 0..self.n_neighborhoods {
            let mut members: Vec<Candidate<I>> = population
                .iter()
                .filter(|c| c.personality().as_swarm().map(|t| t.neighborhood_id() == neighborhood_id).unwrap_or(false))
                .cloned()
                .collect();
            members.sort_by(|a, b| b.transformed_fitness().partial_cmp(&a.transformed_fitness()).unwrap());

            if let Some(best_in_neighborhood) = members.first() {
                self.update_best(neighborhood_id, best_in_neighborhood);
                if best_in_neighborhood.transformed_fitness() > best_transformed {
                    best_transformed = best_in_neighborhood.transformed_fitness();
                    best_raw = best_in_neighborhood
                        .clone()
                        .fitness(0)
                        .unwrap_or(if self.maximize { f64::NEG_INFINITY } else { f64::INFINITY });
                }
            }

            while members.len() > self.neighborhood_size {
                members.pop();
            }
            while members.len() < self.neighborhood_size {
                let mut newcomer = members.first().expect("neighborhood never empty after evaluation").clone();
                newcomer.random_init(rng);
                newcomer.set_state(ProcessingState::DoProcess);
                if let Ok(traits) = newcomer.personality_mut().as_swarm_mut() {
                    traits.set_neighborhood_id(neighborhood_id);
                    traits.set_no_position_update();
                }
                members.push(newcomer);
            }
            new_population.extend(members);
        }

        *population = new_population;
        Ok((best_raw, best_transformed))
    }

    fn mnemonic(&self) -> &'static str {
        "swarm"
    }
}
