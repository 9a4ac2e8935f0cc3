//! # sdr_spectrum
//!
//! Power-spectrum accumulation: the FFT magnitude accumulator (§4.8) and
//! the RTSA persistence histogram (§4.9), sharing a fast polynomial
//! `log2` on the hot path.

pub mod fft_accum;
pub mod log2;
pub mod rtsa;

pub use fft_accum::FftAccumulator;
pub use log2::fast_log2;
pub use rtsa::{RtsaAccumulator, RtsaSettings, rtsa_calc_depth};
