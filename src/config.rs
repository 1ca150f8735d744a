//! The recognized configuration surface (spec.md §6): every tunable named
//! there as one `Config` struct, plus `validate()` implementing every
//! `ConfigInvalid` condition named in §7/§8. No file-format reader lives
//! here — `Config` derives `serde::{Serialize, Deserialize}` so a downstream
//! crate can plug in whatever loader (TOML, YAML, env) it prefers.

use crate::engine::{CompletionPolicy, WaitFactorPolicy};
use crate::error::{Error, Result};
use crate::personality::swarm::Coefficient;
use crate::wire::SerializationMode;
use serde::{Deserialize, Serialize};

/// Which duplication scheme the EA/SA reproduction step uses to pick a
/// child's parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecombinationScheme {
    /// Library default: `Random` in iteration 0, `Value` afterward.
    Default,
    Random,
    Value,
}

/// One axis of a parameter-scan grid, e.g. `d(0,-10,10,100)` (a double axis
/// over parameter index 0) or `i(1,0,100)` (an integer axis with a step of
/// 1 implied). The textual grammar itself is out of scope; this is the
/// structured form a caller builds after parsing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScanAxis {
    Double { parameter_index: usize, lo: f64, hi: f64, steps: usize },
    Int { parameter_index: usize, lo: i64, hi: i64 },
}

impl ScanAxis {
    /// Number of distinct values this axis contributes to the Cartesian
    /// product grid.
    pub fn len(&self) -> usize {
        match self {
            ScanAxis::Double { steps, .. } => (*steps).max(1),
            ScanAxis::Int { lo, hi, .. } => (hi - lo + 1).max(1) as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Which slot of `Individual::parameter_vector` this axis drives.
    pub fn parameter_index(&self) -> usize {
        match self {
            ScanAxis::Double { parameter_index, .. } => *parameter_index,
            ScanAxis::Int { parameter_index, .. } => *parameter_index,
        }
    }

    /// The value this axis takes at odometer digit `digit` (`0..self.len()`).
    pub fn value_at(&self, digit: usize) -> f64 {
        match self {
            ScanAxis::Double { lo, hi, steps, .. } => {
                if *steps <= 1 {
                    *lo
                } else {
                    lo + (digit as f64) * (hi - lo) / (*steps as f64 - 1.0)
                }
            },
            ScanAxis::Int { lo, .. } => (*lo + digit as i64) as f64,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ScanAxis::Double { lo, hi, steps, .. } => {
                if lo >= hi {
                    return Err(Error::config_invalid(format!("scan axis lo {lo} >= hi {hi}")));
                }
                if *steps == 0 {
                    return Err(Error::config_invalid("scan axis steps must be >= 1"));
                }
            },
            ScanAxis::Int { lo, hi, .. } => {
                if lo >= hi {
                    return Err(Error::config_invalid(format!("scan axis lo {lo} >= hi {hi}")));
                }
            },
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Whether larger primary fitness is better.
    pub maximize: bool,
    /// Total population `D = mu + lambda` (EA/SA) or `N * K` (swarm).
    pub size: usize,
    /// Parent count `mu`, for EA/SA.
    pub n_parents: usize,
    pub amalgamation_likelihood: f64,
    pub recombination_scheme: RecombinationScheme,

    pub max_iterations: Option<u32>,
    pub max_minutes: Option<u32>,
    pub max_stall_iterations: Option<u32>,

    /// Swarm neighborhood count `N`.
    pub n_neighborhoods: usize,
    /// Swarm neighborhood size `K`.
    pub n_neighborhood_members: usize,
    pub c_local: Coefficient,
    pub c_global: Coefficient,
    pub c_delta: Coefficient,

    pub scan_randomly: bool,
    pub parameter_options: Vec<ScanAxis>,

    pub wait_factor_policy: WaitFactorPolicy,
    pub max_resubmissions: u32,
    pub completion_policy: CompletionPolicy,

    pub serialization_mode: SerializationMode,
    pub n_producer_threads: usize,
    pub n_evaluation_threads: usize,
    pub n_btc_consumer_threads: usize,

    pub ip: String,
    pub port: u16,
}

impl Config {
    /// Validates every `ConfigInvalid` condition named in spec.md §7/§8.
    /// Conditions not relevant to the algorithm actually selected (e.g.
    /// neighborhood sizing for an EA run) are still checked, since `Config`
    /// carries the full recognized surface regardless of which algorithm a
    /// caller ultimately drives.
    pub fn validate(&self) -> Result<()> {
        if self.n_parents == 0 {
            return Err(Error::config_invalid("nParents must be >= 1"));
        }
        if self.size <= self.n_parents {
            return Err(Error::config_invalid(format!(
                "size ({}) must exceed nParents ({}); lambda == 0 is not a valid population",
                self.size, self.n_parents
            )));
        }
        if 2 * self.n_parents > self.size {
            return Err(Error::config_invalid(format!(
                "2 * nParents ({}) must not exceed size ({})",
                2 * self.n_parents,
                self.size
            )));
        }
        if !(0.0..=1.0).contains(&self.amalgamation_likelihood) {
            return Err(Error::config_invalid(format!(
                "amalgamationLikelihood {} is out of range [0, 1]",
                self.amalgamation_likelihood
            )));
        }
        if self.n_neighborhoods < 1 {
            return Err(Error::config_invalid("nNeighborhoods must be >= 1"));
        }
        if self.n_neighborhood_members < 2 {
            return Err(Error::config_invalid("nNeighborhoodMembers must be >= 2"));
        }
        for axis in &self.parameter_options {
            axis.validate()?;
        }
        let policy = &self.wait_factor_policy;
        if policy.min_wait_factor > policy.max_wait_factor {
            return Err(Error::config_invalid("minWaitFactor must not exceed maxWaitFactor"));
        }
        if policy.wait_factor_increment < 0.0 {
            return Err(Error::config_invalid("waitFactorIncrement must be >= 0"));
        }
        if self.n_producer_threads == 0 || self.n_evaluation_threads == 0 {
            return Err(Error::config_invalid("thread pool sizes must be >= 1"));
        }
        Ok(())
    }
}
