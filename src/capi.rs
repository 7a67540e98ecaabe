use std::boxed::Box;
use std::os::raw::{c_double, c_float, c_int, c_longlong};

use crate::{Bandpass, Design, Error, Highpass};

pub struct RecFilter(crate::RecursiveFilter);

fn create(design: crate::Result<Design>) -> *mut RecFilter {
    match design {
        Ok(design) => Box::into_raw(Box::new(RecFilter(crate::RecursiveFilter::new(design)))),
        Err(e) => {
            log::warn!("{}", e);
            std::ptr::null_mut()
        }
    }
}

/// Create a high-pass filter starting a fresh stream
///
/// Returns NULL if `c_hp` is not strictly between 0 and 1. Use `rec_filter_destroy` to
/// deallocate it.
#[no_mangle]
pub unsafe extern "C" fn rec_filter_create_highpass(c_hp: c_float) -> *mut RecFilter {
    create(Highpass::new(c_hp).map(Design::from))
}

/// Create a band-pass filter starting a fresh stream
///
/// Returns NULL if either coefficient is not strictly between 0 and 1. Use
/// `rec_filter_destroy` to deallocate it.
#[no_mangle]
pub unsafe extern "C" fn rec_filter_create_bandpass(c_hp: c_float, c_lp: c_float) -> *mut RecFilter {
    create(Bandpass::new(c_hp, c_lp).map(Design::from))
}

/// Deallocate and destroy a filter
///
/// Use it only on pointers returned by `rec_filter_create_highpass` or
/// `rec_filter_create_bandpass`.
#[no_mangle]
pub unsafe extern "C" fn rec_filter_destroy(st: *mut RecFilter) {
    if !st.is_null() {
        let _ = Box::from_raw(st);
    }
}

/// Filters the next `npts` samples of the stream.
///
/// `signal` and `filt_signal` must both hold `npts` doubles. Returns 0 on success, and -1
/// (leaving the filter untouched) if a pointer is NULL or `npts` is negative.
#[no_mangle]
pub unsafe extern "C" fn rec_filter_process(
    st: *mut RecFilter,
    signal: *const c_double,
    filt_signal: *mut c_double,
    npts: c_int,
) -> c_int {
    let state = match st.as_mut() {
        Some(state) => state,
        None => return -1,
    };
    if npts < 0 {
        log::warn!("{}", Error::InvalidLength(i64::from(npts)));
        return -1;
    }
    if npts == 0 {
        return 0;
    }
    if signal.is_null() || filt_signal.is_null() {
        return -1;
    }
    let input = std::slice::from_raw_parts(signal, npts as usize);
    let output = std::slice::from_raw_parts_mut(filt_signal, npts as usize);

    match state.0.process(output, input) {
        Ok(()) => 0,
        Err(e) => {
            log::warn!("{}", e);
            -1
        }
    }
}

/// Forget the filter history and start a fresh stream
#[no_mangle]
pub unsafe extern "C" fn rec_filter_reset(st: *mut RecFilter) {
    if let Some(state) = st.as_mut() {
        state.0.reset();
    }
}

/// Return the number of samples filtered since the stream started, or -1 for NULL
#[no_mangle]
pub unsafe extern "C" fn rec_filter_position(st: *const RecFilter) -> c_longlong {
    match st.as_ref() {
        Some(state) => state.0.position() as c_longlong,
        None => -1,
    }
}
