//! TX burst controller: ring-buffer timestamp descriptors and the
//! front-end mode register, grounded on `sfe_tx_4.c`.
//!
//! `ctl`'s `mimo` flag and the channel-map-derived mute pattern are two
//! independent inputs that happen to converge on related hardware state
//! (see `DESIGN.md`, Open Question 2): `ctl` always programs the
//! ring-buffer mode register exactly as the original does, while a
//! channel map passed through `option_set("chmap", ..)` separately
//! derives the swap/mute pattern for the legacy core's fallback path.

use sdr_core::error::{Result, StreamError};
use sdr_core::{CH_NULL, ChannelMap};

use crate::registers::tx_ctl;

/// When a stream should start transmitting relative to the device clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Send as soon as the hardware can, ignoring the 64-bit time field.
    Immediate,
    At(u64),
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        if value < 0 { Timestamp::Immediate } else { Timestamp::At(value as u64) }
    }
}

/// Validates a stream configuration against the TX front-end's one
/// supported wire format: complex 16-bit samples, either a single
/// channel at lane 0 or two channels at lanes 0 and 1.
pub fn check_format(sample_bits: u8, complex: bool, channels: &ChannelMap) -> Result<()> {
    if sample_bits != 16 || !complex {
        return Err(StreamError::InvalidArg("TX front-end requires complex 16-bit samples".into()));
    }

    let lanes: Vec<u8> = channels.iter().filter(|c| !c.is_null()).map(|c| c.physical).collect();

    let ok = match lanes.as_slice() {
        [0] => true,
        [0, 1] | [1, 0] => true,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(StreamError::InvalidArg(
            "TX front-end accepts only channel 0 alone, or channels 0 and 1 together".into(),
        ))
    }
}

/// Maximum number of bytes the TX ring buffer's FIFO can hold.
pub fn mtu_get() -> usize {
    tx_ctl::MAX_TX_FIFO_BYTES
}

/// Encodes a `(sample count, timestamp)` descriptor as the two 32-bit
/// words the ring-buffer command register expects.
pub fn push_ring_buffer_words(samples: u32, timestamp: Timestamp) -> [u32; 2] {
    let (ts, late_bit) = match timestamp {
        Timestamp::Immediate => (-1i64, 0x4000_0000u32),
        Timestamp::At(t) => (t as i64, 0u32),
    };

    let word0 = ((ts >> 32) as u32 & 0x7fff) | (((samples - 1) & 0x7fff) << 15) | late_bit;
    let word1 = ts as u32;
    [word0, word1]
}

/// Derives the 2-word `ctl` register sequence for the simple TX core.
/// `ctl` always writes 0 first; if `start` is false that's the entire
/// sequence (stop/disarm). Otherwise it asserts `RESET_BUFS`, then
/// writes the final command with `SISO` (when `mimo`) or `MODE_MUTE_B`
/// (when not), `MODE_REP` when `repeat`, OR'd with the arm bits.
pub fn ctl(mimo: bool, repeat: bool, start: bool) -> Vec<u32> {
    if !start {
        return vec![0];
    }

    let mut cmd = if mimo { 1 << tx_ctl::MODE_SISO } else { 1 << tx_ctl::MODE_MUTE_B };
    if repeat {
        cmd |= 1 << tx_ctl::MODE_REP;
    }

    vec![0, 1 << tx_ctl::RESET_BUFS, cmd | tx_ctl::ARM_BITS]
}

/// The swap/mute pattern the legacy TX core (no shuffle stages) derives
/// from a 2-channel map: swap A/B when channel 1 is mapped ahead of
/// channel 0, and mute whichever lane has no channel mapped to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMute {
    pub swap_ab: bool,
    pub mute_a: bool,
    pub mute_b: bool,
}

pub fn derive_swap_mute(channels: &ChannelMap) -> SwapMute {
    let lane0 = channels.get(0).map(|c| c.physical).unwrap_or(CH_NULL);
    let lane1 = channels.get(1).map(|c| c.physical).unwrap_or(CH_NULL);

    let active_count = channels.active_count();

    if active_count >= 2 {
        SwapMute {
            swap_ab: lane0 == 1 && lane1 == 0,
            mute_a: false,
            mute_b: false,
        }
    } else if lane0 == 0 {
        SwapMute { swap_ab: false, mute_a: false, mute_b: true }
    } else {
        SwapMute { swap_ab: false, mute_a: true, mute_b: false }
    }
}
