//! Personality traits for the swarm algorithm: neighborhood membership,
//! read-only snapshots of the local and global bests, and the per-particle
//! velocity-update coefficients.

use std::sync::Arc;

/// A swarm coefficient sampled once per velocity update, either a fixed
/// value or drawn uniformly from a configured range.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Coefficient {
    Fixed(f64),
    Range(f64, f64),
}

impl Coefficient {
    pub fn sample(&self, rng: &mut dyn crate::random::RngCore) -> f64 {
        match *self {
            Coefficient::Fixed(value) => value,
            Coefficient::Range(lo, hi) => {
                let unit = (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
                lo + unit * (hi - lo)
            },
        }
    }
}

/// A read-only, deep-cloned snapshot of a candidate captured at the moment
/// it became a local or global best. Swarm traits never hold a live
/// reference into the population: the population is reordered and resized
/// between iterations, so a snapshot avoids dangling or aliasing references
/// entirely, at the cost of a clone each time a best improves (which is rare
/// relative to the number of reads).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BestSnapshot {
    pub parameter_vector: Vec<f64>,
    pub transformed_fitness: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SwarmTraits {
    neighborhood_id: usize,
    local_best: Option<Arc<BestSnapshot>>,
    global_best: Option<Arc<BestSnapshot>>,
    no_position_update: bool,
    velocity: Vec<f64>,
    pub c_local: Coefficient,
    pub c_global: Coefficient,
    pub c_delta: Coefficient,
}

impl SwarmTraits {
    pub fn new(neighborhood_id: usize, c_local: Coefficient, c_global: Coefficient, c_delta: Coefficient) -> Self {
        SwarmTraits {
            neighborhood_id,
            local_best: None,
            global_best: None,
            no_position_update: false,
            velocity: Vec::new(),
            c_local,
            c_global,
            c_delta,
        }
    }

    pub fn neighborhood_id(&self) -> usize {
        self.neighborhood_id
    }

    pub fn set_neighborhood_id(&mut self, id: usize) {
        self.neighborhood_id = id;
    }

    pub fn register_local_best(&mut self, best: Arc<BestSnapshot>) {
        self.local_best = Some(best);
    }

    pub fn register_global_best(&mut self, best: Arc<BestSnapshot>) {
        self.global_best = Some(best);
    }

    pub fn local_best(&self) -> Option<&Arc<BestSnapshot>> {
        self.local_best.as_ref()
    }

    pub fn global_best(&self) -> Option<&Arc<BestSnapshot>> {
        self.global_best.as_ref()
    }

    pub fn set_no_position_update(&mut self) {
        self.no_position_update = true;
    }

    /// Reads the one-shot "skip this update" flag and clears it in the same
    /// call, so a freshly randomized particle consumes exactly one velocity
    /// step's worth of suppression.
    pub fn check_no_position_update_and_reset(&mut self) -> bool {
        std::mem::replace(&mut self.no_position_update, false)
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn velocity_mut(&mut self) -> &mut Vec<f64> {
        &mut self.velocity
    }
}

/// Applies one velocity-update step (design §4.C2) to a particle's
/// parameter vector in place, clamping each coordinate to its declared
/// bounds. Does nothing and leaves `velocity` untouched if the particle has
/// no local/global best registered yet (iteration 0).
pub fn update_velocity_and_position(
    traits: &mut SwarmTraits,
    position: &mut [f64],
    bounds: &[(f64, f64)],
    rng: &mut dyn crate::random::RngCore,
) {
    let (local_best, global_best) = match (traits.local_best.clone(), traits.global_best.clone()) {
        (Some(l), Some(g)) => (l, g),
        _ => return,
    };
    if traits.velocity.len() != position.len() {
        traits.velocity = vec![0.0; position.len()];
    }
    let c_delta = traits.c_delta.sample(rng);
    let c_local = traits.c_local.sample(rng);
    let c_global = traits.c_global.sample(rng);
    for k in 0..position.len() {
        let u_local = uniform01(rng);
        let u_global = uniform01(rng);
        let local_term = c_local * u_local * (local_best.parameter_vector[k] - position[k]);
        let global_term = c_global * u_global * (global_best.parameter_vector[k] - position[k]);
        traits.velocity[k] = c_delta * traits.velocity[k] + local_term + global_term;
        let mut next = position[k] + traits.velocity[k];
        if let Some((lo, hi)) = bounds.get(k) {
            next = next.clamp(*lo, *hi);
        }
        position[k] = next;
    }
}

fn uniform01(rng: &mut dyn crate::random::RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
