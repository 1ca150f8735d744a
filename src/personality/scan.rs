//! Personality traits for the parameter-scan algorithm: just the candidate's
//! slot into the scan grid, since the odometer state itself lives in
//! `crate::optimize::scan::Scan` rather than on each candidate.

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScanTraits {
    grid_index: usize,
}

impl ScanTraits {
    pub fn new(grid_index: usize) -> Self {
        ScanTraits { grid_index }
    }

    pub fn grid_index(&self) -> usize {
        self.grid_index
    }
}
