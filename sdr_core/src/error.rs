//! Error types shared across the streaming-core workspace.

/// Errors produced by the streaming core.
///
/// Planner/config errors are local and fatal to the operation that raised
/// them; transport errors are propagated verbatim. Lost-packet and
/// underrun conditions are *not* represented here — they are reported
/// through statistics counters (`stats.dropped`, `stat.underruns`)
/// instead, per the design's error handling section.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Unrecognized format, bad channel map, or an out-of-range length.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Operation not valid for the handle's kind (e.g. `recv` on a TX handle).
    #[error("operation unsupported on this stream handle")]
    Unsupported,

    /// Propagated verbatim from the transport; the stream enters no special state.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// A DMA wait or ring wait expired before data arrived.
    #[error("operation timed out")]
    Timeout,

    /// Firmware revision older than the minimum required for the requested operation.
    #[error("firmware revision {found:#010x} older than required {required:#010x}")]
    InvariantFirmware { found: u32, required: u32 },
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Io(err.to_string())
    }
}

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Minimum firmware revision accepted by TX streams created with the
/// "check firmware" flag set (see `spec.md` §7).
pub const MIN_TX_FIRMWARE_REV: u32 = 0xd2b1_0c09;

/// Evaluates the firmware-revision invariant used by `create_stream`.
pub fn check_firmware(found: u32) -> Result<()> {
    if found < MIN_TX_FIRMWARE_REV {
        Err(StreamError::InvariantFirmware {
            found,
            required: MIN_TX_FIRMWARE_REV,
        })
    } else {
        Ok(())
    }
}
