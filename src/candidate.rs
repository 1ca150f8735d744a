//! A `Candidate` represents one point in parameter space as it moves through
//! the optimization kernel: it wraps a user-supplied `Individual`, caches its
//! fitness, and tracks the bookkeeping (processing state, staleness,
//! personality) that the broker/consumer fabric and the optimization loop
//! both need but the individual's own parameter-object hierarchy should never
//! have to know about.

use crate::broker::CourtierId;
use crate::error::{Error, Result};
use crate::personality::Personality;
use crate::random::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The narrow interface the optimization kernel requires from a candidate
/// solution's parameter-object hierarchy. Everything about *how* parameters
/// are represented, bounded, or mutated is this trait's implementor's
/// business; the kernel only ever clones, adapts, evaluates, streamlines to
/// and from flat value vectors, and optionally amalgamates two individuals.
/// `Serialize`/`DeserializeOwned` are required so a `Candidate<I>` can cross
/// the TCP consumer's wire boundary without this crate knowing anything
/// about the implementor's own shape.
pub trait Individual: Clone + fmt::Debug + Send + Sync + Serialize + for<'de> Deserialize<'de> {
    /// Applies a random mutation. Must leave the individual's fitness stale.
    fn adapt(&mut self, rng: &mut dyn RngCore);

    /// Replaces the individual's parameters with a fresh random draw.
    fn random_init(&mut self, rng: &mut dyn RngCore);

    /// Computes the primary fitness and, for multi-objective problems, the
    /// secondary fitness values. Must be a pure function of the individual's
    /// current parameters.
    fn evaluate(&self) -> (f64, Vec<f64>);

    /// Produces a child by combining this individual with `peer`, e.g. a
    /// crossover over parameter vectors. The default clones `self`, which
    /// makes amalgamation a no-op for individuals that don't support it.
    fn amalgamate(&self, peer: &Self, _rng: &mut dyn RngCore) -> Self {
        let _ = peer;
        self.clone()
    }

    /// Flattens the individual's parameters into one vector of doubles, in a
    /// stable order matching `parameter_bounds` and `assign_parameter_vector`.
    fn parameter_vector(&self) -> Vec<f64> {
        Vec::new()
    }

    /// Writes `values` back into the individual's parameters, in the order
    /// produced by `parameter_vector`. Used by swarm velocity updates and
    /// parameter-scan grid assignment.
    fn assign_parameter_vector(&mut self, values: &[f64]) {
        let _ = values;
    }

    /// Declared `(lo, hi)` bounds for each coordinate of `parameter_vector`,
    /// used to clamp swarm velocity updates.
    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        Vec::new()
    }

    /// Number of secondary fitness values this individual registers. The
    /// default of 0 fits single-objective problems.
    fn secondary_len(&self) -> usize {
        0
    }
}

/// Where a candidate is in its processing lifecycle within one generation.
/// A candidate enters a generation as `DoProcess` and must leave as either
/// `Processed` or `Error` before the generation is considered complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingState {
    /// Excluded from processing this generation (e.g. an elite parent that
    /// is known-good and carried over untouched).
    Ignore,
    DoProcess,
    Processed,
    Error,
}

/// The dirty-flag-plus-cache pattern expressed as a sum type: a candidate's
/// fitness is either `Stale` (parameters changed since the last evaluation,
/// not comparable) or `Evaluated` with the values that backed the comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Fitness {
    Stale,
    Evaluated { primary: f64, secondary: Vec<f64> },
}

impl Fitness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Fitness::Stale)
    }

    pub fn primary(&self) -> Option<f64> {
        match self {
            Fitness::Stale => None,
            Fitness::Evaluated { primary, .. } => Some(*primary),
        }
    }

    pub fn secondary(&self) -> &[f64] {
        match self {
            Fitness::Stale => &[],
            Fitness::Evaluated { secondary, .. } => secondary,
        }
    }
}

/// Reduces a candidate's secondary fitness values to a single scalar, for
/// problems that want to rank multi-objective candidates on one axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SecondaryCombiner {
    Sum,
    AbsSum,
    SumOfSquares,
    WeightedSumOfSquares(Vec<f64>),
}

impl SecondaryCombiner {
    pub fn combine(&self, secondary: &[f64]) -> Result<f64> {
        Ok(match self {
            SecondaryCombiner::Sum => secondary.iter().sum(),
            SecondaryCombiner::AbsSum => secondary.iter().map(|v| v.abs()).sum(),
            SecondaryCombiner::SumOfSquares => secondary.iter().map(|v| v * v).sum::<f64>().sqrt(),
            SecondaryCombiner::WeightedSumOfSquares(weights) => {
                if weights.len() != secondary.len() {
                    return Err(Error::shape_mismatch(secondary.len(), weights.len()));
                }
                weights
                    .iter()
                    .zip(secondary)
                    .map(|(w, v)| w * v * v)
                    .sum::<f64>()
                    .sqrt()
            },
        })
    }
}

/// One point in parameter space as it flows through the kernel: the opaque
/// `Individual`, its cached fitness, and the bookkeeping the broker/consumer
/// fabric and optimization loop rely on.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "I: Individual")]
pub struct Candidate<I: Individual> {
    individual: I,
    state: ProcessingState,
    dirty: bool,
    fitness: Fitness,
    maximize: bool,
    assigned_iteration: u32,
    n_stalls: u32,
    best_known_fitness: f64,
    personality: Personality,
    courtier_id: Option<CourtierId>,
    server_mode: bool,
}

impl<I: Individual> Candidate<I> {
    pub fn new(individual: I, maximize: bool) -> Self {
        Candidate {
            individual,
            state: ProcessingState::DoProcess,
            dirty: true,
            fitness: Fitness::Stale,
            maximize,
            assigned_iteration: 0,
            n_stalls: 0,
            best_known_fitness: if maximize { f64::NEG_INFINITY } else { f64::INFINITY },
            personality: Personality::Unset,
            courtier_id: None,
            server_mode: false,
        }
    }

    pub fn individual(&self) -> &I {
        &self.individual
    }

    pub fn individual_mut(&mut self) -> &mut I {
        &mut self.individual
    }

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn set_state(&mut self, state: ProcessingState) {
        self.state = state;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn maximize(&self) -> bool {
        self.maximize
    }

    pub fn assigned_iteration(&self) -> u32 {
        self.assigned_iteration
    }

    pub fn set_assigned_iteration(&mut self, iteration: u32) {
        self.assigned_iteration = iteration;
    }

    pub fn n_stalls(&self) -> u32 {
        self.n_stalls
    }

    pub fn set_n_stalls(&mut self, n_stalls: u32) {
        self.n_stalls = n_stalls;
    }

    pub fn best_known_fitness(&self) -> f64 {
        self.best_known_fitness
    }

    pub fn set_best_known_fitness(&mut self, value: f64) {
        self.best_known_fitness = value;
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn personality_mut(&mut self) -> &mut Personality {
        &mut self.personality
    }

    pub fn set_personality(&mut self, personality: Personality) {
        self.personality = personality;
    }

    pub fn courtier_id(&self) -> Option<CourtierId> {
        self.courtier_id
    }

    pub fn set_courtier_id(&mut self, id: CourtierId) {
        self.courtier_id = Some(id);
    }

    /// Applies a mutation and marks the candidate's fitness stale.
    pub fn adapt(&mut self, rng: &mut dyn RngCore) {
        self.individual.adapt(rng);
        self.dirty = true;
    }

    /// Replaces the candidate's parameters with a fresh random draw.
    pub fn random_init(&mut self, rng: &mut dyn RngCore) {
        self.individual.random_init(rng);
        self.dirty = true;
    }

    /// Gate on re-evaluation: `true` while submitted for processing, so that
    /// `fitness()` doesn't race a consumer that is about to evaluate the same
    /// candidate. Returns the previous value.
    pub fn set_server_mode(&mut self, server_mode: bool) -> bool {
        std::mem::replace(&mut self.server_mode, server_mode)
    }

    pub fn server_mode(&self) -> bool {
        self.server_mode
    }

    /// Read-only access to the cached fitness. Evaluates and caches first if
    /// the candidate is dirty and server mode is off; fails with
    /// `EvaluationForbidden` if dirty while in server mode, since that
    /// indicates a derived algorithm read a fitness value it should have
    /// waited for the broker to deliver.
    pub fn fitness(&mut self, id: usize) -> Result<f64> {
        if self.dirty {
            if self.server_mode {
                return Err(Error::EvaluationForbidden);
            }
            self.evaluate_and_cache();
        }
        if id == 0 {
            Ok(self.fitness.primary().expect("just cached"))
        } else {
            self.fitness
                .secondary()
                .get(id - 1)
                .copied()
                .ok_or_else(|| Error::shape_mismatch(id, self.fitness.secondary().len()))
        }
    }

    /// The "is better than" axis every comparison in the kernel uses: larger
    /// is always better after this transform, regardless of `maximize`.
    pub fn transformed_fitness(&self) -> f64 {
        let primary = self.fitness.primary().unwrap_or(if self.maximize {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
        if self.maximize {
            primary
        } else {
            -primary
        }
    }

    pub fn is_better_than(&self, other: &Self) -> bool {
        self.transformed_fitness() > other.transformed_fitness()
    }

    /// The form called by consumers: forces evaluation regardless of server
    /// mode and sets `processing_state` to `Processed` on success or `Error`
    /// on failure. A panicking `Individual::evaluate` is caught rather than
    /// unwinding through the consumer loop, so one bad individual can't take
    /// down a whole worker; the candidate is left dirty and tagged `Error`
    /// for the collector to see.
    pub fn process(&mut self) {
        let individual = &self.individual;
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| individual.evaluate()));
        match outcome {
            Ok((primary, secondary)) => {
                self.fitness = Fitness::Evaluated { primary, secondary };
                self.dirty = false;
                self.state = ProcessingState::Processed;
            }
            Err(_) => {
                self.state = ProcessingState::Error;
            }
        }
    }

    fn evaluate_and_cache(&mut self) {
        let (primary, secondary) = self.individual.evaluate();
        self.fitness = Fitness::Evaluated { primary, secondary };
        self.dirty = false;
    }

    /// External assignment used when a remote worker returns a result
    /// payload that already carries precomputed fitness.
    pub fn set_fitness(&mut self, primary: f64, secondary: Vec<f64>) -> Result<()> {
        let expected = self.individual.secondary_len();
        if secondary.len() != expected {
            return Err(Error::shape_mismatch(expected, secondary.len()));
        }
        self.fitness = Fitness::Evaluated { primary, secondary };
        self.dirty = false;
        Ok(())
    }

    /// Deep-copies a peer's parameters, cached fitness, personality, and
    /// bookkeeping scalars into `self`. Self-assignment (`peer` pointing at
    /// `self`) is a no-op, checked up front so no partial write can tear
    /// state.
    pub fn load_from(&mut self, peer: &Self) {
        if std::ptr::eq(self, peer) {
            return;
        }
        self.individual = peer.individual.clone();
        self.state = peer.state;
        self.dirty = peer.dirty;
        self.fitness = peer.fitness.clone();
        self.maximize = peer.maximize;
        self.assigned_iteration = peer.assigned_iteration;
        self.n_stalls = peer.n_stalls;
        self.best_known_fitness = peer.best_known_fitness;
        self.personality = peer.personality.clone();
        self.courtier_id = peer.courtier_id;
        self.server_mode = peer.server_mode;
    }

    /// Structural similarity used by tests: parameter vectors match within
    /// `floating_tolerance` and cached fitness (if both present) agrees.
    pub fn compare(&self, peer: &Self, floating_tolerance: f64) -> bool {
        let own = self.individual.parameter_vector();
        let other = peer.individual.parameter_vector();
        if own.len() != other.len() {
            return false;
        }
        own.iter()
            .zip(&other)
            .all(|(a, b)| (a - b).abs() <= floating_tolerance)
    }
}
