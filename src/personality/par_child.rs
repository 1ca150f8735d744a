//! Personality traits for the parent/child algorithm family: the
//! evolutionary algorithm and, reusing the same reproduction scheme,
//! simulated annealing.

/// Which parent/child algorithm installed these traits, purely for the
/// `mnemonic()` tag used in logs — the reproduction and selection code in
/// `crate::optimize::ea` treats both the same way.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ParChildKind {
    Ea,
    Sa,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ParChildTraits {
    kind: ParChildKind,
    /// `0` marks a child; `>0` marks a parent, incremented once per
    /// generation the slot remains a parent.
    parent_counter: u32,
    population_position: usize,
    parent_id: Option<usize>,
    /// Set only when this child was produced by `amalgamate` rather than a
    /// plain clone: the position of the second parent it was combined with.
    amalgamation_peer_id: Option<usize>,
}

impl ParChildTraits {
    pub fn new_child(population_position: usize) -> Self {
        ParChildTraits {
            kind: ParChildKind::Ea,
            parent_counter: 0,
            population_position,
            parent_id: None,
            amalgamation_peer_id: None,
        }
    }

    pub fn new_parent(population_position: usize) -> Self {
        ParChildTraits {
            kind: ParChildKind::Ea,
            parent_counter: 1,
            population_position,
            parent_id: None,
            amalgamation_peer_id: None,
        }
    }

    pub fn with_kind(mut self, kind: ParChildKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn mnemonic(&self) -> &'static str {
        match self.kind {
            ParChildKind::Ea => "ea",
            ParChildKind::Sa => "sa",
        }
    }

    pub fn is_parent(&self) -> bool {
        self.parent_counter > 0
    }

    pub fn parent_counter(&self) -> u32 {
        self.parent_counter
    }

    pub fn promote_to_parent(&mut self) {
        self.parent_counter = self.parent_counter.max(1);
    }

    pub fn mark_as_child(&mut self) {
        self.parent_counter = 0;
    }

    /// Called once per generation a slot remains a parent.
    pub fn tick_as_parent(&mut self) {
        if self.parent_counter > 0 {
            self.parent_counter += 1;
        }
    }

    pub fn population_position(&self) -> usize {
        self.population_position
    }

    pub fn set_population_position(&mut self, position: usize) {
        self.population_position = position;
    }

    pub fn parent_id(&self) -> Option<usize> {
        self.parent_id
    }

    pub fn set_parent_id(&mut self, parent_id: usize) {
        self.parent_id = Some(parent_id);
    }

    pub fn amalgamation_peer_id(&self) -> Option<usize> {
        self.amalgamation_peer_id
    }

    pub fn set_amalgamation_peer_id(&mut self, peer_id: usize) {
        self.amalgamation_peer_id = Some(peer_id);
    }
}
