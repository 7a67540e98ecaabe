//! The memory carried by a recursive filter from one segment to the next.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Which of the two filter variants a state belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// The two-pole high-pass filter.
    Highpass,
    /// The high-pass filter cascaded into a two-pole low-pass filter.
    Bandpass,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Highpass => f.write_str("high-pass"),
            FilterKind::Bandpass => f.write_str("band-pass"),
        }
    }
}

/// Identifies one logical stream of samples.
///
/// Every fresh [`FilterState`] draws a new random id, and every state derived from it by filtering
/// keeps that id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(Uuid);

impl StreamId {
    fn new() -> StreamId {
        StreamId(Uuid::new_v4())
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The state of a recursive filter between two calls.
///
/// If you filter a long signal one segment at a time and pass the state returned by each call to
/// the next one, the output will be exactly the same as though you had filtered the whole signal
/// in one call.
///
/// All accumulators are kept in `f64`, whatever the precision of the coefficients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    kind: FilterKind,
    stream: StreamId,
    /// Number of samples consumed since the state was fresh.
    position: u64,
    pub(crate) hp_stage1: f64,
    pub(crate) hp_stage2: f64,
    pub(crate) lp_stage1: f64,
    pub(crate) lp_stage2: f64,
    pub(crate) prev_input_sample: f64,
}

impl FilterState {
    /// Creates the state for the first segment of a new stream.
    pub fn fresh(kind: FilterKind) -> FilterState {
        FilterState {
            kind,
            stream: StreamId::new(),
            position: 0,
            hp_stage1: 0.0,
            hp_stage2: 0.0,
            lp_stage1: 0.0,
            lp_stage2: 0.0,
            prev_input_sample: 0.0,
        }
    }

    /// The filter variant this state belongs to.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// The stream this state belongs to.
    pub fn stream(&self) -> StreamId {
        self.stream
    }

    /// How many samples have been filtered with this state.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns true if no sample has been filtered with this state yet.
    pub fn is_fresh(&self) -> bool {
        self.position == 0
    }

    /// The last raw input sample consumed.
    pub fn prev_input_sample(&self) -> f64 {
        self.prev_input_sample
    }

    /// The two high-pass accumulators.
    pub fn highpass_stages(&self) -> [f64; 2] {
        [self.hp_stage1, self.hp_stage2]
    }

    /// The two low-pass accumulators. They stay at zero for a high-pass state.
    pub fn lowpass_stages(&self) -> [f64; 2] {
        [self.lp_stage1, self.lp_stage2]
    }

    /// Returns true if every accumulator and the last input sample are finite.
    ///
    /// A NaN or infinite input sample poisons the state for the rest of the stream.
    pub fn is_finite(&self) -> bool {
        [
            self.hp_stage1,
            self.hp_stage2,
            self.lp_stage1,
            self.lp_stage2,
            self.prev_input_sample,
        ]
        .iter()
        .all(|x| x.is_finite())
    }

    pub(crate) fn check_kind(&self, expected: FilterKind) -> Result<()> {
        if self.kind != expected {
            return Err(Error::KindMismatch {
                expected,
                found: self.kind,
            });
        }
        Ok(())
    }

    pub(crate) fn check_position(&self, offset: u64) -> Result<()> {
        if offset != self.position {
            return Err(Error::Discontinuity {
                stream: self.stream,
                expected: self.position,
                found: offset,
            });
        }
        Ok(())
    }

    pub(crate) fn check_stream(&self, expected: StreamId) -> Result<()> {
        if self.stream != expected {
            return Err(Error::StreamMismatch {
                expected,
                found: self.stream,
            });
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, samples: usize) {
        self.position += samples as u64;
    }
}

/// How a filtering call should start: from scratch, or where an earlier call left off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Continuation<'a> {
    /// The first segment of a new stream.
    Fresh,
    /// The segment immediately following the one that produced this state.
    Continuing(&'a FilterState),
}

impl<'a> Continuation<'a> {
    /// Produces the state to filter with, checking that a continued state belongs to `kind`.
    ///
    /// The caller's state is cloned, so it survives untouched if filtering fails.
    pub(crate) fn resolve(self, kind: FilterKind) -> Result<FilterState> {
        match self {
            Continuation::Fresh => Ok(FilterState::fresh(kind)),
            Continuation::Continuing(state) => {
                state.check_kind(kind)?;
                Ok(state.clone())
            }
        }
    }
}

impl<'a> From<Option<&'a FilterState>> for Continuation<'a> {
    fn from(state: Option<&'a FilterState>) -> Continuation<'a> {
        match state {
            None => Continuation::Fresh,
            Some(state) => Continuation::Continuing(state),
        }
    }
}

impl<'a> From<&'a FilterState> for Continuation<'a> {
    fn from(state: &'a FilterState) -> Continuation<'a> {
        Continuation::Continuing(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_states_are_zeroed_and_distinct() {
        let a = FilterState::fresh(FilterKind::Highpass);
        let b = FilterState::fresh(FilterKind::Highpass);
        assert!(a.is_fresh());
        assert_eq!(a.highpass_stages(), [0.0; 2]);
        assert_eq!(a.lowpass_stages(), [0.0; 2]);
        assert_eq!(a.prev_input_sample(), 0.0);
        assert_ne!(a.stream(), b.stream());
    }

    #[test]
    fn continuing_with_the_wrong_kind_fails() {
        let state = FilterState::fresh(FilterKind::Bandpass);
        let err = Continuation::Continuing(&state)
            .resolve(FilterKind::Highpass)
            .unwrap_err();
        assert_eq!(
            err,
            Error::KindMismatch {
                expected: FilterKind::Highpass,
                found: FilterKind::Bandpass,
            }
        );
    }

    #[test]
    fn position_check() {
        let mut state = FilterState::fresh(FilterKind::Highpass);
        state.advance(10);
        assert!(state.check_position(10).is_ok());
        assert!(matches!(
            state.check_position(12),
            Err(Error::Discontinuity {
                expected: 10,
                found: 12,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_values_are_detected() {
        let mut state = FilterState::fresh(FilterKind::Bandpass);
        assert!(state.is_finite());
        state.lp_stage2 = f64::INFINITY;
        assert!(!state.is_finite());
        state.lp_stage2 = 0.0;
        state.hp_stage1 = f64::NAN;
        assert!(!state.is_finite());

        // JSON writes NaN as null, which does not read back.
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"hp_stage1\":null"));
        assert!(serde_json::from_str::<FilterState>(&json).is_err());
    }

    #[test]
    fn serde_keeps_everything() {
        let mut state = FilterState::fresh(FilterKind::Bandpass);
        state.hp_stage1 = 0.125;
        state.lp_stage2 = -3.5;
        state.prev_input_sample = 7.0;
        state.advance(3);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"bandpass\""));
        let back: FilterState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
