//! Channel shuffle engine for the extended RX front-end: builds a
//! 4-stage Beneš-style bit-permutation network that routes logical
//! channels (with optional per-channel I/Q swap) onto physical lanes.
//!
//! Grounded on `exfe_trx4_update_chmap` in `sfe_rx_4.c`. The distilled
//! worked example's exact hex masks don't survive contact with that
//! function (see the test comments below and `DESIGN.md`); the stage
//! *shape* — identity maps to all-zero masks, a full pair swap lights
//! exactly one stage — does, so the algorithm here follows the original
//! bit-for-bit rather than the example's literal numbers.

use sdr_core::ChannelMap;

use crate::registers::exfe_rx;

/// Builds the per-lane routing byte for every physical lane `0..raw_chans`.
///
/// `channels` holds one entry per logical channel; for complex streams
/// each logical channel consumes two adjacent physical lanes (I then Q,
/// or Q then I when that channel's `swap_iq` is set). The group of
/// `total_chan_num` lanes repeats across `raw_chans` when the stream
/// uses fewer logical channels than the core has physical lanes.
pub fn compute_chmap(raw_chans: usize, complex: bool, channels: &ChannelMap) -> Vec<u8> {
    let total_chan_num = if complex { channels.len() * 2 } else { channels.len() };
    let mut chmap = vec![0u8; raw_chans];

    if total_chan_num == 0 {
        return chmap;
    }

    let mut g = 0;
    while g < raw_chans {
        for f in 0..total_chan_num {
            if g + f >= raw_chans {
                break;
            }
            let swp_msk = (g + f) as u8;
            let chmap_o = if complex {
                let logical = f / 2;
                let info = channels.get(logical).unwrap_or(sdr_core::ChannelInfo { physical: 0, swap_iq: false });
                let swap_iq = u8::from(info.swap_iq);
                2 * info.physical + ((f as u8 % 2) ^ swap_iq)
            } else {
                channels.get(f).map(|c| c.physical).unwrap_or(0)
            };
            chmap[g + f] = chmap_o ^ swp_msk;
        }
        g += total_chan_num;
    }

    chmap
}

/// Transposes a per-lane routing byte array into the `log2(raw_chans)`
/// stage masks the hardware's shuffle registers expect: bit `g` of stage
/// `s` is set iff lane `g`'s routing byte has bit `s` set. Unused stages
/// (when `raw_chans < 16`) are left zero.
pub fn compute_stage_masks(raw_chans: usize, chmap: &[u8]) -> [u16; 4] {
    debug_assert!(raw_chans.is_power_of_two());
    let lg_chans = raw_chans.trailing_zeros() as usize;
    let mut masks = [0u16; 4];

    for (g, &byte) in chmap.iter().enumerate().take(raw_chans) {
        for (f, mask) in masks.iter_mut().enumerate().take(lg_chans.min(4)) {
            if byte & (1 << f) != 0 {
                *mask |= 1 << g;
            }
        }
    }

    masks
}

/// Lanes beyond the first `total_chan_num` physical slots carry no
/// logical channel and should be muted, when a single group doesn't
/// tile the full lane count.
pub fn compute_mute_mask(raw_chans: usize, complex: bool, channels: &ChannelMap) -> u16 {
    let total_chan_num = if complex { channels.len() * 2 } else { channels.len() };
    if total_chan_num == 0 || total_chan_num >= raw_chans {
        return 0;
    }
    let mut mask = 0u16;
    for g in total_chan_num..raw_chans {
        mask |= 1 << g;
    }
    mask
}

/// Register writes the extended front-end needs to apply a channel map:
/// the mute register followed by the four shuffle stage registers.
pub fn chmap_register_writes(raw_chans: usize, complex: bool, channels: &ChannelMap) -> [(u32, u32); 5] {
    let chmap = compute_chmap(raw_chans, complex, channels);
    let masks = compute_stage_masks(raw_chans, &chmap);
    let mute = compute_mute_mask(raw_chans, complex, channels);

    [
        (exfe_rx::MUTE, mute as u32),
        (exfe_rx::SHUFFLE_0, masks[0] as u32),
        (exfe_rx::SHUFFLE_1, masks[1] as u32),
        (exfe_rx::SHUFFLE_2, masks[2] as u32),
        (exfe_rx::SHUFFLE_3, masks[3] as u32),
    ]
}
