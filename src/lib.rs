#![deny(missing_docs)]

//! `rec-filter` applies recursive high-pass and band-pass filters to sampled time series, such
//! as seismic traces. A long signal can be filtered one segment at a time: the [`FilterState`]
//! returned by each call continues the next one, and the result is identical to filtering the
//! whole signal at once.
//!
//! The one-shot entry points are [`apply_highpass`] and [`apply_bandpass`]. For streams,
//! [`RecursiveFilter`] keeps the state for you.
//!
//! The coefficients are supplied by the caller. A common choice, for a corner period `T` and a
//! sample interval `dt`, is `w = T / (2π)`, `C_HP = w / (w + dt)` and `C_LP = dt / (w + dt)`.

#[cfg(any(cargo_c, feature = "capi"))]
mod capi;

mod error;
mod recursive;
#[cfg(feature = "dasp")]
mod signal;
mod state;
mod stream;

pub use error::{Error, Result};
pub use recursive::{Bandpass, Coefficient, Design, Highpass};
#[cfg(feature = "dasp")]
pub use signal::FilteredSignal;
pub use state::{Continuation, FilterKind, FilterState, StreamId};
pub use stream::RecursiveFilter;

#[cfg(feature = "dasp")]
pub use dasp;

/// High-pass filters `signal`.
///
/// Pass [`Continuation::Fresh`] for the first segment of a stream and
/// `Continuation::Continuing(&state)` with the state returned for the previous segment after
/// that. On error, nothing is filtered and the caller's state is untouched.
///
/// # Example
///
/// ```rust
/// # use rec_filter::{apply_highpass, Continuation};
/// let signal = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0];
/// let (first, state) = apply_highpass(&signal[..3], 0.9, Continuation::Fresh).unwrap();
/// let (second, _) = apply_highpass(&signal[3..], 0.9, Continuation::Continuing(&state)).unwrap();
///
/// let (whole, _) = apply_highpass(&signal, 0.9, Continuation::Fresh).unwrap();
/// assert_eq!([first, second].concat(), whole);
/// ```
pub fn apply_highpass(
    signal: &[f64],
    c_hp: f32,
    state: Continuation<'_>,
) -> Result<(Vec<f64>, FilterState)> {
    let hp = Highpass::new(c_hp)?;
    let mut state = state.resolve(FilterKind::Highpass)?;
    let mut filtered = vec![0.0; signal.len()];
    hp.filter(&mut filtered, &mut state, signal)?;
    Ok((filtered, state))
}

/// Band-pass filters `signal`: a high-pass with `c_hp` followed by a low-pass with `c_lp`.
///
/// States work as in [`apply_highpass`], but a high-pass state cannot continue a band-pass
/// stream, or the other way around.
pub fn apply_bandpass(
    signal: &[f64],
    c_hp: f32,
    c_lp: f32,
    state: Continuation<'_>,
) -> Result<(Vec<f64>, FilterState)> {
    let bp = Bandpass::new(c_hp, c_lp)?;
    let mut state = state.resolve(FilterKind::Bandpass)?;
    let mut filtered = vec![0.0; signal.len()];
    bp.filter(&mut filtered, &mut state, signal)?;
    Ok((filtered, state))
}
