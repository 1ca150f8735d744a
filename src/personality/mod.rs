//! Per-algorithm scratch bound to a candidate. Every algorithm family in
//! `crate::optimize` needs to stash a little state on each candidate between
//! generations — which parent it descends from, which neighborhood it
//! belongs to, where the scan odometer left it — and none of that state
//! means anything to another algorithm family. Rather than give every
//! `Candidate` one field per algorithm (most of them always empty) or reach
//! for runtime type identification, `Personality` is a single tagged union;
//! algorithms match on the discriminant once per generation, not once per
//! parameter.

pub mod par_child;
pub mod scan;
pub mod swarm;

pub use par_child::ParChildTraits;
pub use scan::ScanTraits;
pub use swarm::SwarmTraits;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Personality {
    Unset,
    ParChild(ParChildTraits),
    Swarm(SwarmTraits),
    Scan(ScanTraits),
}

impl Personality {
    /// A short algorithm tag used in log lines and diagnostics.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Personality::Unset => "none",
            Personality::ParChild(traits) => traits.mnemonic(),
            Personality::Swarm(_) => "swarm",
            Personality::Scan(_) => "ps",
        }
    }

    pub fn as_par_child(&self) -> Result<&ParChildTraits> {
        match self {
            Personality::ParChild(traits) => Ok(traits),
            _ => Err(Error::PersonalityUnset),
        }
    }

    pub fn as_par_child_mut(&mut self) -> Result<&mut ParChildTraits> {
        match self {
            Personality::ParChild(traits) => Ok(traits),
            _ => Err(Error::PersonalityUnset),
        }
    }

    pub fn as_swarm(&self) -> Result<&SwarmTraits> {
        match self {
            Personality::Swarm(traits) => Ok(traits),
            _ => Err(Error::PersonalityUnset),
        }
    }

    pub fn as_swarm_mut(&mut self) -> Result<&mut SwarmTraits> {
        match self {
            Personality::Swarm(traits) => Ok(traits),
            _ => Err(Error::PersonalityUnset),
        }
    }

    pub fn as_scan(&self) -> Result<&ScanTraits> {
        match self {
            Personality::Scan(traits) => Ok(traits),
            _ => Err(Error::PersonalityUnset),
        }
    }

    pub fn as_scan_mut(&mut self) -> Result<&mut ScanTraits> {
        match self {
            Personality::Scan(traits) => Ok(traits),
            _ => Err(Error::PersonalityUnset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_unset_personality_fails() {
        let personality = Personality::Unset;
        assert!(matches!(personality.as_swarm(), Err(Error::PersonalityUnset)));
    }

    #[test]
    fn mnemonic_reflects_active_variant() {
        assert_eq!(Personality::Unset.mnemonic(), "none");
        assert_eq!(
            Personality::ParChild(ParChildTraits::new_child(0)).mnemonic(),
            "ea"
        );
    }
}
