//! The error taxonomy shared by every component of the optimization kernel
//! and its execution fabric. Each variant corresponds to one of the kinds
//! named in the design's error-handling section, not to a particular module,
//! so that callers can match on *why* something failed regardless of which
//! component raised it.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Out-of-range or contradictory configuration. Raised at init; fatal.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Re-evaluation attempted while a candidate is in server mode. Always a
    /// logic bug in a derived algorithm, never a transient condition.
    #[error("fitness() called on a dirty candidate in server mode")]
    EvaluationForbidden,

    /// A broker queue operation did not complete within its timeout.
    #[error("broker operation timed out after {0:?}")]
    BrokerTimeout(std::time::Duration),

    /// A generation could not be completed within `max_resubmissions` under
    /// the strict completion policy.
    #[error("generation incomplete: {missing} of {total} positions unresolved after {attempts} attempts")]
    IncompleteGeneration {
        missing: usize,
        total: usize,
        attempts: u32,
    },

    /// Personality traits were read before being set for the active
    /// algorithm. A programmer contract violation; fatal.
    #[error("personality traits have not been set for this candidate")]
    PersonalityUnset,

    /// A combiner or transfer operation received a vector of the wrong
    /// length, e.g. secondary-fitness weights that don't match the number of
    /// secondary values.
    #[error("shape mismatch: expected length {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// Framing or deserialization of a wire message failed. The offending
    /// session is closed and any in-flight item is returned to the broker.
    #[error("wire protocol error: {0}")]
    WireProtocolError(String),

    /// The underlying socket failed. Handled identically to
    /// `WireProtocolError` by consumers.
    #[error("transport error: {0}")]
    TransportError(#[from] std::io::Error),
}

impl Error {
    pub fn config_invalid(detail: impl fmt::Display) -> Self {
        Error::ConfigInvalid(detail.to_string())
    }

    pub fn shape_mismatch(expected: usize, got: usize) -> Self {
        Error::ShapeMismatch { expected, got }
    }

    /// True for the two kinds that a consumer loop recovers from locally
    /// (close the session, requeue the item) rather than propagating.
    pub fn is_recoverable_at_consumer(&self) -> bool {
        matches!(self, Error::WireProtocolError(_) | Error::TransportError(_))
    }
}
