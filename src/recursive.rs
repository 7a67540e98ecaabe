//! The recursive high-pass and band-pass filters.

use crate::state::{FilterKind, FilterState};
use crate::{Error, Result};

/// A filter coefficient in the open interval (0, 1), widened to `f64`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficient(f64);

impl Coefficient {
    /// Checks that `value` lies strictly between 0 and 1. `name` only shows up in the error.
    pub fn new(name: &'static str, value: f32) -> Result<Coefficient> {
        // Written this way round to reject NaNs too.
        if !(value > 0.0 && value < 1.0) {
            return Err(Error::InvalidCoefficient { name, value });
        }
        Ok(Coefficient(f64::from(value)))
    }

    /// The widened value.
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Advances the high-pass sections by one sample and returns their output.
#[inline]
fn highpass_step(c_hp: f64, state: &mut FilterState, x: f64) -> f64 {
    let diff = x - state.prev_input_sample;
    state.prev_input_sample = x;
    let h1 = state.hp_stage1;
    state.hp_stage1 = c_hp * (h1 + diff);
    state.hp_stage2 = c_hp * (state.hp_stage2 + state.hp_stage1 - h1);
    state.hp_stage2
}

/// Advances the low-pass sections by one sample and returns their output.
#[inline]
fn lowpass_step(c_lp: f64, state: &mut FilterState, h: f64) -> f64 {
    state.lp_stage1 += c_lp * (h - state.lp_stage1);
    state.lp_stage2 += c_lp * (state.lp_stage1 - state.lp_stage2);
    state.lp_stage2
}

/// A two-pole recursive high-pass filter.
///
/// With input `x` and coefficient `c`, the two sections compute
/// ```text
/// h1[n] = c * (h1[n-1] + x[n] - x[n-1])
/// h2[n] = c * (h2[n-1] + h1[n] - h1[n-1])
/// ```
/// and the output is `h2`. Before the first sample of a stream, `x`, `h1` and `h2` are all zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Highpass {
    c_hp: Coefficient,
}

impl Highpass {
    /// Creates a high-pass filter, rejecting coefficients outside (0, 1).
    pub fn new(c_hp: f32) -> Result<Highpass> {
        Ok(Highpass {
            c_hp: Coefficient::new("C_HP", c_hp)?,
        })
    }

    /// The high-pass coefficient.
    pub fn c_hp(&self) -> Coefficient {
        self.c_hp
    }

    /// Apply this filter to `input`, putting the result in `output`.
    ///
    /// `state` carries the filter's memory from one call to the next. If you call this function
    /// multiple times with the same `state`, the output will be as though you had called it once
    /// with a longer `input`. The first time you call `filter` on a given signal, `state` should be
    /// fresh.
    pub fn filter(&self, output: &mut [f64], state: &mut FilterState, input: &[f64]) -> Result<()> {
        check_lengths(input, output)?;
        state.check_kind(FilterKind::Highpass)?;
        let c_hp = self.c_hp.get();
        for (&x, y) in input.iter().zip(output) {
            *y = highpass_step(c_hp, state, x);
        }
        state.advance(input.len());
        Ok(())
    }

    /// Apply this filter to `data`, modifying it in place.
    ///
    /// See [`Highpass::filter`] for more details.
    pub fn filter_in_place(&self, data: &mut [f64], state: &mut FilterState) -> Result<()> {
        state.check_kind(FilterKind::Highpass)?;
        let c_hp = self.c_hp.get();
        for x in data.iter_mut() {
            *x = highpass_step(c_hp, state, *x);
        }
        state.advance(data.len());
        Ok(())
    }
}

/// A recursive band-pass filter: [`Highpass`] followed by a two-pole low-pass filter.
///
/// With `h` the high-pass output and `c` the low-pass coefficient,
/// ```text
/// l1[n] = l1[n-1] + c * (h[n] - l1[n-1])
/// l2[n] = l2[n-1] + c * (l1[n] - l2[n-1])
/// ```
/// and the output is `l2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bandpass {
    c_hp: Coefficient,
    c_lp: Coefficient,
}

impl Bandpass {
    /// Creates a band-pass filter, rejecting coefficients outside (0, 1).
    pub fn new(c_hp: f32, c_lp: f32) -> Result<Bandpass> {
        Ok(Bandpass {
            c_hp: Coefficient::new("C_HP", c_hp)?,
            c_lp: Coefficient::new("C_LP", c_lp)?,
        })
    }

    /// The high-pass coefficient.
    pub fn c_hp(&self) -> Coefficient {
        self.c_hp
    }

    /// The low-pass coefficient.
    pub fn c_lp(&self) -> Coefficient {
        self.c_lp
    }

    /// Apply this filter to `input`, putting the result in `output`.
    ///
    /// See [`Highpass::filter`] for how `state` works.
    pub fn filter(&self, output: &mut [f64], state: &mut FilterState, input: &[f64]) -> Result<()> {
        check_lengths(input, output)?;
        state.check_kind(FilterKind::Bandpass)?;
        let c_hp = self.c_hp.get();
        let c_lp = self.c_lp.get();
        for (&x, y) in input.iter().zip(output) {
            let h = highpass_step(c_hp, state, x);
            *y = lowpass_step(c_lp, state, h);
        }
        state.advance(input.len());
        Ok(())
    }

    /// Apply this filter to `data`, modifying it in place.
    pub fn filter_in_place(&self, data: &mut [f64], state: &mut FilterState) -> Result<()> {
        state.check_kind(FilterKind::Bandpass)?;
        let c_hp = self.c_hp.get();
        let c_lp = self.c_lp.get();
        for x in data.iter_mut() {
            let h = highpass_step(c_hp, state, *x);
            *x = lowpass_step(c_lp, state, h);
        }
        state.advance(data.len());
        Ok(())
    }
}

/// Either of the two filters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Design {
    /// See [`Highpass`].
    Highpass(Highpass),
    /// See [`Bandpass`].
    Bandpass(Bandpass),
}

impl Design {
    /// The kind of state this design works with.
    pub fn kind(&self) -> FilterKind {
        match self {
            Design::Highpass(_) => FilterKind::Highpass,
            Design::Bandpass(_) => FilterKind::Bandpass,
        }
    }

    /// Dispatches to [`Highpass::filter`] or [`Bandpass::filter`].
    pub fn filter(&self, output: &mut [f64], state: &mut FilterState, input: &[f64]) -> Result<()> {
        match self {
            Design::Highpass(hp) => hp.filter(output, state, input),
            Design::Bandpass(bp) => bp.filter(output, state, input),
        }
    }

    /// Dispatches to [`Highpass::filter_in_place`] or [`Bandpass::filter_in_place`].
    pub fn filter_in_place(&self, data: &mut [f64], state: &mut FilterState) -> Result<()> {
        match self {
            Design::Highpass(hp) => hp.filter_in_place(data, state),
            Design::Bandpass(bp) => bp.filter_in_place(data, state),
        }
    }

    // The caller guarantees that `state` has our kind.
    pub(crate) fn step(&self, state: &mut FilterState, x: f64) -> f64 {
        debug_assert_eq!(state.kind(), self.kind());
        let y = match self {
            Design::Highpass(hp) => highpass_step(hp.c_hp.get(), state, x),
            Design::Bandpass(bp) => {
                let h = highpass_step(bp.c_hp.get(), state, x);
                lowpass_step(bp.c_lp.get(), state, h)
            }
        };
        state.advance(1);
        y
    }
}

impl From<Highpass> for Design {
    fn from(hp: Highpass) -> Design {
        Design::Highpass(hp)
    }
}

impl From<Bandpass> for Design {
    fn from(bp: Bandpass) -> Design {
        Design::Bandpass(bp)
    }
}

fn check_lengths(input: &[f64], output: &[f64]) -> Result<()> {
    if input.len() != output.len() {
        return Err(Error::LengthMismatch {
            input: input.len(),
            output: output.len(),
        });
    }
    Ok(())
}
