//! Real-time spectrum analyzer persistence histogram.
//!
//! For each FFT bin, a vertical column of `depth` cells tracks how often
//! that power level has been observed recently: the bucket matching the
//! current frame's power is "charged" toward saturation, every other
//! bucket in the column "decays" toward zero. Repeated frames converge
//! the display to a stable persistence image instead of flickering.

use num_complex::Complex32;

use sdr_core::cpu::vcap_align;

use crate::log2::fast_log2;

/// Tunables for one RTSA accumulator, matching the hardware's register fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtsaSettings {
    pub upper_pwr_db: f32,
    pub lower_pwr_db: f32,
    pub divs_per_db: f32,
    pub raise: f32,
    pub decay: f32,
    pub averaging: f32,
}

/// Computes the persistence column depth for `settings`, rounded up to a
/// full vector of `u16` lanes for the host's detected SIMD rank.
pub fn rtsa_calc_depth(settings: &RtsaSettings) -> usize {
    let raw = ((settings.upper_pwr_db - settings.lower_pwr_db) * settings.divs_per_db).ceil() as usize;
    let lanes = vcap_align(sdr_core::cpu::vcap_get()) / 2;
    raw.div_ceil(lanes) * lanes
}

/// The persistence histogram itself: `depth` cells per FFT bin.
#[derive(Debug, Clone)]
pub struct RtsaAccumulator {
    settings: RtsaSettings,
    depth: usize,
    fft_size: usize,
    pwr_grid: Vec<u16>,
}

impl RtsaAccumulator {
    /// Allocates a zeroed histogram for `fft_size` bins using `settings`'s derived depth.
    pub fn init(settings: RtsaSettings, fft_size: usize) -> Self {
        let depth = rtsa_calc_depth(&settings);
        RtsaAccumulator {
            settings,
            depth,
            fft_size,
            pwr_grid: vec![0u16; depth * fft_size],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cell(&self, bin: usize, row: usize) -> u16 {
        self.pwr_grid[row * self.fft_size + bin]
    }

    /// Charges the bucket matching each bin's current power and decays every other bucket.
    pub fn update(&mut self, spectrum: &[Complex32]) {
        assert_eq!(spectrum.len(), self.fft_size, "spectrum length must match fft_size");
        let settings = self.settings;
        for (bin, sample) in spectrum.iter().enumerate() {
            let p = (sample.re * sample.re + sample.im * sample.im).max(1e-12);
            let pwr_db = (10.0 * fast_log2(p)).clamp(settings.lower_pwr_db, settings.upper_pwr_db);
            let bucket = (((settings.upper_pwr_db - pwr_db) * settings.divs_per_db) as usize).min(self.depth - 1);

            for row in 0..self.depth {
                let cell = &mut self.pwr_grid[row * self.fft_size + bin];
                if row == bucket {
                    let headroom = u16::MAX - *cell;
                    let delta = (headroom as f32 * settings.raise * settings.averaging) as u16;
                    *cell = cell.saturating_add(delta);
                } else {
                    *cell = (*cell as f32 / settings.decay) as u16;
                }
            }
        }
    }
}
