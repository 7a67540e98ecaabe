use thiserror::Error;

use crate::state::{FilterKind, StreamId};

/// Everything that can go wrong when filtering.
///
/// Every check runs before the filter touches its state, so an `Err` always leaves the caller's
/// [`FilterState`](crate::FilterState) exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The output buffer does not have the same length as the input.
    #[error("output buffer holds {output} samples but the input holds {input}")]
    LengthMismatch {
        /// Length of the input signal.
        input: usize,
        /// Length of the output buffer.
        output: usize,
    },

    /// A negative signal length (only reachable through the C API).
    #[error("invalid signal length: {0}")]
    InvalidLength(i64),

    /// A filter coefficient outside the open interval (0, 1).
    #[error("coefficient {name} = {value} is outside the open interval (0, 1)")]
    InvalidCoefficient {
        /// Which coefficient, `C_HP` or `C_LP`.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A state produced by one filter variant was handed to the other.
    #[error("a {found} state cannot continue a {expected} filter")]
    KindMismatch {
        /// The variant doing the filtering.
        expected: FilterKind,
        /// The variant that produced the state.
        found: FilterKind,
    },

    /// A segment does not start where the previous one ended.
    #[error("segment starts at sample {found} but stream {stream} is at sample {expected}")]
    Discontinuity {
        /// The stream being continued.
        stream: StreamId,
        /// Number of samples the state has consumed.
        expected: u64,
        /// Starting offset claimed by the caller.
        found: u64,
    },

    /// A state from a different stream was supplied.
    #[error("state belongs to stream {found}, expected stream {expected}")]
    StreamMismatch {
        /// The stream the caller wanted to continue.
        expected: StreamId,
        /// The stream the state actually belongs to.
        found: StreamId,
    },
}

/// Shorthand for results with our [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
