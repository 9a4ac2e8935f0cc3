//! Register field layout constants for the simple ("SFE") and extended
//! ("EXFE") front-end cores, and the TX burst controller.
//!
//! These mirror the bitfields programmed by `sfe_rx_4.c`/`sfe_tx_4.c`
//! exactly; nothing here is a design choice, it's wire format.

/// `FE_CMD_REG_ROUTE` sub-register selectors for the simple RX front-end.
pub mod sfe_rx {
    pub const BURST_SAMPLES: u32 = 0;
    pub const BURST_FORMAT: u32 = 1;
    pub const BURST_THROTTLE: u32 = 2;
    pub const RESET: u32 = 3;

    pub const CMD_REG_ROUTE_OFF: u32 = 28;

    pub const IFMT_OFF: u32 = 0;
    pub const IFMT_WIDTH: u32 = 2;
    pub const CHFMT_OFF: u32 = IFMT_OFF + IFMT_WIDTH;
    pub const CHFMT_WIDTH: u32 = 3;
    /// Width of the "words per burst minus one" field, in bits.
    pub const BWORDS_WIDTH: u32 = 13;
    pub const BWORDS_OFF: u32 = CHFMT_OFF + CHFMT_WIDTH;
    /// Width of the "FIFO capacity in bursts" field, in bits.
    pub const BTOTAL_WIDTH: u32 = 10;
    pub const BTOTAL_OFF: u32 = BWORDS_OFF + BWORDS_WIDTH;
    pub const BTOTAL_MASK: u32 = (1 << BTOTAL_WIDTH) - 1;

    pub const RST_DSP_OFF: u32 = 8;
    pub const RST_DDR_OFF: u32 = 13;
    pub const RST_RXSA_OFF: u32 = 14;
    pub const RST_BURSTER_OFF: u32 = 15;

    pub const THRT_SKIP_OFF: u32 = 0;
    pub const THRT_BURST_NUM_OFF: u32 = 8;
    pub const THRT_ENABLE_OFF: u32 = 16;

    pub const SCMD_IDLE: u32 = 0;
    pub const SCMD_START_AT: u32 = 1;
    pub const SCMD_START_IMM: u32 = 2;
    pub const SCMD_STOP_AT: u32 = 3;
    pub const SCMD_STOP_IMM: u32 = 4;

    pub const MAX_BURSTS_IN_BUFF: usize = 32;

    /// `FE_CMD_REG_FREQ_CORDIC` / `FE_CMD_REG_CFG_CORDIC`: unlike
    /// `BURST_SAMPLES..RESET` above (sub-registers reached by routing
    /// through `FE_CMD_REG_ROUTE`), these address the CORDIC NCO's own
    /// top-level registers directly and carry the real hardware offsets,
    /// which is why they don't continue the 0..=3 sequence.
    pub const FREQ_CORDIC: u32 = 4;
    pub const CFG_CORDIC: u32 = 5;

    /// `FE_CMD_REG_EVENT`, a top-level register declared alongside
    /// `FE_CMD_REG_FREQ_CORDIC`/`FE_CMD_REG_CFG_CORDIC` but never written
    /// by any indexed call site. Used here to carry the low 32 bits of a
    /// `StartAt` schedule time ahead of `SCMD_START_AT`; see `DESIGN.md`
    /// for why this is an inference rather than a literal grounding.
    pub const EVENT: u32 = 6;
}

/// `FE_CMD_REG_ROUTE` sub-register selectors for the extended front-end
/// (adds per-channel shuffle stages and a wider mute register).
pub mod exfe_rx {
    pub const SHUFFLE_0: u32 = 0x10;
    pub const SHUFFLE_1: u32 = 0x11;
    pub const SHUFFLE_2: u32 = 0x12;
    pub const SHUFFLE_3: u32 = 0x13;
    pub const MUTE: u32 = 0x0f;
}

/// TX ring-buffer control register bit offsets (`GP_PORT_TXDMA_CTRL_*`).
pub mod tx_ctl {
    pub const MODE_REP: u32 = 2;
    pub const MODE_SISO: u32 = 3;
    pub const RESET_BUFS: u32 = 7;
    pub const MODE_MUTE_B: u32 = 8;

    /// Bits `0b11` armed unconditionally once `ctl(.., start=true)` commits.
    pub const ARM_BITS: u32 = 0b11;

    pub const MAX_TX_FIFO_BYTES: usize = 126_976;

    /// The TX front-end's single addressable control register
    /// (`cfg_base + 2` in `sfe_tx4_ctl`); there is no separate reset
    /// register on this core, unlike RX's `FE_CMD_RESET`.
    pub const CTL_REG: u32 = 0;
}

/// Recognized channel-pattern codes for the simple front-end (`sfe_chfmt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFormat {
    Ch3210 = 0,
    ChXx10 = 1,
    ChXxx0 = 2,
    ChXx1x = 3,
    ChX2x0 = 4,
    Ch32xx = 5,
    ChX2xx = 6,
    Ch3xxx = 7,
}

/// Per-sample bit-width codes for the simple front-end (`sfe_ifmt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaceFormat {
    Dsp = 0,
    Bits8 = 1,
    Bits12 = 2,
    Bits16 = 3,
}
