//! An adaptation of our filters to dasp Signals.

use dasp::frame::Frame;
use dasp::sample::Sample;
use dasp::signal::Signal;

use crate::{Design, RecursiveFilter};

/// Applies a recursive filter to every channel of a `Signal` (from the `dasp` crate).
///
/// Each channel gets its own stream state. The filtered `Signal` will be in floating-point, even if
/// the original signal wasn't.
///
/// # Example
/// ```rust
/// use rec_filter::dasp::signal::{self, Signal};
/// use rec_filter::{FilteredSignal, Highpass};
///
/// let drift = signal::from_iter((0..10_000).map(|i| 0.001 * i as f64));
/// let filtered = FilteredSignal::new(drift, Highpass::new(0.99).unwrap().into());
/// for x in filtered.take(10_000) {
/// // ... do something with the drift-free signal.
/// }
/// ```
#[derive(Clone)]
pub struct FilteredSignal<S: Signal> {
    input: S,
    filters: Vec<RecursiveFilter>,
    out_buf: Vec<f64>,
}

impl<S: Signal> FilteredSignal<S> {
    /// Creates a new `FilteredSignal`, starting a fresh stream on each channel.
    pub fn new(input: S, design: Design) -> FilteredSignal<S> {
        FilteredSignal {
            input,
            filters: (0..S::Frame::CHANNELS)
                .map(|_| RecursiveFilter::new(design))
                .collect(),
            out_buf: vec![0.0; S::Frame::CHANNELS],
        }
    }

    /// The per-channel filters, for example to save their states.
    pub fn filters(&self) -> &[RecursiveFilter] {
        &self.filters
    }
}

impl<S: Signal> Signal for FilteredSignal<S> {
    type Frame = <<S as Signal>::Frame as Frame>::Float;

    fn is_exhausted(&self) -> bool {
        self.input.is_exhausted()
    }

    fn next(&mut self) -> Self::Frame {
        let frame = self.input.next().to_float_frame();
        for ((samp, filter), y) in frame
            .channels()
            .zip(&mut self.filters)
            .zip(&mut self.out_buf)
        {
            *y = filter.step(samp.to_sample::<f64>());
        }
        let out = &self.out_buf;
        Frame::from_fn(|ch| out[ch].to_sample())
    }
}
