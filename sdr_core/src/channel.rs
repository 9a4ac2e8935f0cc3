//! Logical-to-physical channel maps.

use crate::error::{Result, StreamError};

/// Marks a channel map slot as unused.
pub const CH_NULL: u8 = 255;
/// Marks a channel map slot as "any physical channel may be assigned here".
pub const CH_ANY: u8 = 254;
/// OR'd into a physical channel index to request I/Q swap on that channel.
pub const CH_SWAP_IQ: u8 = 0x80;

/// Maximum number of logical channels a single stream may address.
pub const MAX_CHANNELS: usize = 64;

/// One logical channel's routing: which physical channel it reads from or
/// writes to, and whether I and Q are swapped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub physical: u8,
    pub swap_iq: bool,
}

impl ChannelInfo {
    /// Decodes a raw map byte, splitting off the [`CH_SWAP_IQ`] flag bit.
    pub fn from_raw(raw: u8) -> Self {
        ChannelInfo {
            physical: raw & !CH_SWAP_IQ,
            swap_iq: raw & CH_SWAP_IQ != 0,
        }
    }

    /// Re-encodes into a raw map byte.
    pub fn to_raw(self) -> u8 {
        self.physical | if self.swap_iq { CH_SWAP_IQ } else { 0 }
    }

    pub fn is_null(self) -> bool {
        self.physical == CH_NULL
    }

    pub fn is_any(self) -> bool {
        self.physical == CH_ANY
    }
}

/// A fixed-capacity logical-channel routing table.
///
/// Mirrors the hardware's channel map registers: up to [`MAX_CHANNELS`]
/// slots, each either `CH_NULL` (unused), `CH_ANY` (don't-care), or a
/// physical channel index optionally OR'd with [`CH_SWAP_IQ`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    slots: Vec<ChannelInfo>,
}

impl ChannelMap {
    /// Builds a channel map from raw register bytes (see [`ChannelInfo::from_raw`]).
    pub fn from_raw_slice(raw: &[u8]) -> Result<Self> {
        if raw.len() > MAX_CHANNELS {
            return Err(StreamError::InvalidArg(format!(
                "channel map has {} entries, max is {MAX_CHANNELS}",
                raw.len()
            )));
        }
        Ok(ChannelMap {
            slots: raw.iter().copied().map(ChannelInfo::from_raw).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, logical: usize) -> Option<ChannelInfo> {
        self.slots.get(logical).copied()
    }

    /// Number of slots that resolve to a concrete physical channel (neither
    /// `CH_NULL` nor `CH_ANY`).
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|c| !c.is_null() && !c.is_any()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChannelInfo> + '_ {
        self.slots.iter().copied()
    }
}
