//! The `statistic` module provides functionality to collect and display
//! statistics about an optimization run: how much wall-clock and processing
//! time each stage of a generation consumed.

use chrono::{Duration, Local};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, AddAssign};

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ProcessingTime(Duration);

impl ProcessingTime {
    pub fn zero() -> Self {
        ProcessingTime(Duration::zero())
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Builds a `ProcessingTime` from a `std::time::Duration`, for callers
    /// timing a loop that mutates its own state (and so can't be expressed
    /// as the `Fn` closure `timed` requires).
    pub fn from_std(d: std::time::Duration) -> Self {
        ProcessingTime(Duration::from_std(d).unwrap_or_else(|_| Duration::max_value()))
    }
}

impl Add for ProcessingTime {
    type Output = ProcessingTime;
    fn add(self, other: Self) -> Self::Output {
        ProcessingTime(self.0 + other.0)
    }
}

impl AddAssign for ProcessingTime {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0 + other.0
    }
}

impl Debug for ProcessingTime {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for ProcessingTime {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

pub struct Timed<F, U> where F: Fn() -> U {
    function: F,
}

pub struct TimedResult<U> {
    pub result: U,
    pub time: ProcessingTime
}

pub fn timed<F, U>(op: F) -> Timed<F, U> where F: Fn() -> U {
    Timed {
        function: op,
    }
}

impl<F, U> Timed<F, U> where F: Fn() -> U {
    pub fn run(&self) -> TimedResult<U> {
        let started_at = Local::now();
        let result = (self.function)();
        let time = Local::now().signed_duration_since(started_at);
        TimedResult {
            result,
            time: ProcessingTime(time),
        }
    }
}

/// Implemented by anything that can report how much processing time it has
/// accumulated so far, e.g. a `crate::engine::SubmissionEngine` or an
/// `crate::optimize::CycleLogic`.
pub trait TrackProcessingTime {
    fn processing_time(&self) -> ProcessingTime;
}
