use log::{debug, warn};

use crate::recursive::Design;
use crate::state::{FilterState, StreamId};
use crate::Result;

/// A filter together with the state of the stream it is filtering.
///
/// This is the convenient entry point if you receive a signal one buffer at a time: feed each
/// buffer to [`RecursiveFilter::process`] and the concatenated output will not depend on how the
/// signal was split.
///
/// # Example
///
/// ```rust
/// # use rec_filter::{Highpass, RecursiveFilter};
/// // A slow ramp with a small oscillation on top.
/// let trace: Vec<f64> = (0..10_000)
///     .map(|i| 0.01 * i as f64 + (i as f64 * 0.3).sin())
///     .collect();
/// let mut filter = RecursiveFilter::new(Highpass::new(0.94).unwrap().into());
/// let mut output = Vec::new();
/// let mut out_buf = [0.0; 512];
/// for chunk in trace.chunks(512) {
///     let out = &mut out_buf[..chunk.len()];
///     filter.process(out, chunk).unwrap();
///     output.extend_from_slice(out);
/// }
/// assert_eq!(filter.position(), 10_000);
/// ```
#[derive(Clone, Debug)]
pub struct RecursiveFilter {
    design: Design,
    state: FilterState,
}

impl RecursiveFilter {
    /// Starts a new stream.
    pub fn new(design: Design) -> RecursiveFilter {
        RecursiveFilter {
            design,
            state: FilterState::fresh(design.kind()),
        }
    }

    /// Continues a stream from a state returned by an earlier filter.
    ///
    /// Fails if the state was produced by the other filter variant.
    pub fn resume(design: Design, state: FilterState) -> Result<RecursiveFilter> {
        state.check_kind(design.kind())?;
        debug!(
            "resuming {} stream {} at sample {}",
            state.kind(),
            state.stream(),
            state.position()
        );
        Ok(RecursiveFilter { design, state })
    }

    /// Like [`RecursiveFilter::resume`], but also checks that the state belongs to `stream`.
    pub fn resume_stream(
        design: Design,
        state: FilterState,
        stream: StreamId,
    ) -> Result<RecursiveFilter> {
        if let Err(e) = state.check_stream(stream) {
            warn!("refusing to resume: {}", e);
            return Err(e);
        }
        RecursiveFilter::resume(design, state)
    }

    /// The filter being applied.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// The current state. Clone it if you want to resume the stream elsewhere later.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Gives up the filter, returning its state.
    pub fn into_state(self) -> FilterState {
        self.state
    }

    /// The stream this filter is working on.
    pub fn stream(&self) -> StreamId {
        self.state.stream()
    }

    /// How many samples have gone through this stream so far.
    pub fn position(&self) -> u64 {
        self.state.position()
    }

    /// Throws away the history and starts a new stream.
    pub fn reset(&mut self) {
        self.state = FilterState::fresh(self.design.kind());
    }

    /// Filters the next segment of the stream.
    ///
    /// `output` must have the same length as `input`.
    pub fn process(&mut self, output: &mut [f64], input: &[f64]) -> Result<()> {
        self.design.filter(output, &mut self.state, input)?;
        debug!(
            "stream {}: filtered {} samples, now at {}",
            self.state.stream(),
            input.len(),
            self.state.position()
        );
        Ok(())
    }

    /// Filters the next segment of the stream in place.
    pub fn process_in_place(&mut self, data: &mut [f64]) -> Result<()> {
        self.design.filter_in_place(data, &mut self.state)
    }

    /// Filters a segment that the caller says starts at sample `offset` of the stream.
    ///
    /// If the stream is not at `offset` (because a segment was skipped, repeated or reordered), the
    /// segment is rejected instead of silently producing a discontinuity.
    pub fn process_at(&mut self, offset: u64, output: &mut [f64], input: &[f64]) -> Result<()> {
        if let Err(e) = self.state.check_position(offset) {
            warn!("{}", e);
            return Err(e);
        }
        self.process(output, input)
    }

    /// Filters a single sample.
    pub fn step(&mut self, x: f64) -> f64 {
        self.design.step(&mut self.state, x)
    }
}
