//! Split-precision log2 power accumulator.
//!
//! Accumulating raw power across millions of FFT frames in a plain `f32`
//! either saturates or loses the low bits long before the dynamic range
//! a spectrum analyzer needs is exhausted. Storing each bin as
//! `mantissa * 2^exponent` and re-normalizing the mantissa back into
//! `[0.5, 2.0)` after every add keeps full precision indefinitely.

use num_complex::Complex32;

use crate::log2::fast_log2;

const DEFAULT_NOISE_FLOOR: f32 = 0.001;

/// Accumulates power spectra across frames and normalizes to dB.
#[derive(Debug, Clone)]
pub struct FftAccumulator {
    mantissas: Vec<f32>,
    exponents: Vec<i32>,
    noise_floor: f32,
}

impl FftAccumulator {
    /// Allocates an accumulator for `size` bins, zeroed and ready for `add`.
    pub fn init(size: usize) -> Self {
        FftAccumulator {
            mantissas: vec![0.0; size],
            exponents: vec![0; size],
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }

    pub fn size(&self) -> usize {
        self.mantissas.len()
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Integrates one frame's complex spectrum into the running accumulation.
    ///
    /// `spectrum.len()` must equal [`Self::size`]; panics on mismatch, since
    /// a size mismatch here means the caller mixed up two FFT configurations.
    pub fn add(&mut self, spectrum: &[Complex32]) {
        assert_eq!(spectrum.len(), self.size(), "spectrum length must match accumulator size");
        for ((mantissa, exponent), bin) in self.mantissas.iter_mut().zip(self.exponents.iter_mut()).zip(spectrum) {
            let p = (bin.re * bin.re + bin.im * bin.im).max(self.noise_floor);
            *mantissa += p * 2f32.powi(-*exponent);
            renormalize(mantissa, exponent);
        }
    }

    /// Produces `out[i] = scale * log2(mantissa[i]) + scale * exponent[i] + correction`.
    ///
    /// `out.len()` must equal [`Self::size`].
    pub fn norm(&self, scale: f32, correction: f32, out: &mut [f32]) {
        assert_eq!(out.len(), self.size(), "output length must match accumulator size");
        for (i, value) in out.iter_mut().enumerate() {
            let mantissa = self.mantissas[i].max(self.noise_floor);
            *value = scale * fast_log2(mantissa) + scale * self.exponents[i] as f32 + correction;
        }
    }
}

/// Keeps `mantissa` within `[0.5, 2.0)`, adjusting `exponent` to compensate.
#[inline]
fn renormalize(mantissa: &mut f32, exponent: &mut i32) {
    while *mantissa >= 2.0 {
        *mantissa *= 0.5;
        *exponent += 1;
    }
    while *mantissa < 0.5 && *mantissa > 0.0 {
        *mantissa *= 2.0;
        *exponent -= 1;
    }
}
