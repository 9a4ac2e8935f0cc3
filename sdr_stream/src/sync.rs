//! Cross-stream start-trigger arming: `sync(type, streams)`.
//!
//! Grounded on `sfetrx4_stream_sync` in `stream_sfetrx4_dma32.c`. Every
//! sync type maps to a command word written to the shared retimer
//! register with bit 31 set as a write-strobe; `"all"` is the one type
//! that inspects the bound streams to decide between RX-only, TX-only,
//! or both.

use sdr_core::error::{Result, StreamError};

use crate::handle::{StreamHandle, StreamKind};
use crate::transport::DmaTransport;

/// Command words written into bits `[30:16]` of the retimer register.
mod cmd {
    pub const STOP: u32 = 0;
    pub const ONEPPS: u32 = 1;
    pub const ADCACT: u32 = 2;
    pub const DACACT: u32 = 3;
    pub const ADCANDDACACT: u32 = 4;
    pub const ADCORDACACT: u32 = 5;
    pub const SYSREF_GEN: u32 = 8;
    pub const FREERUN: u32 = 7;
}

const STROBE_BIT: u32 = 1 << 31;
const CMD_OFF: u32 = 16;

/// Recognized sync type strings, matching the original's string
/// dispatch exactly (including the `"sysref"`/`"1pps"` alias and the
/// `"none"`/missing-string default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncType {
    None,
    Sysref,
    OnePps,
    SysrefGen,
    Rx,
    Tx,
    Any,
    All,
    Off,
}

impl std::str::FromStr for SyncType {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(SyncType::None),
            "sysref" => Ok(SyncType::Sysref),
            "1pps" => Ok(SyncType::OnePps),
            "sysref+gen" => Ok(SyncType::SysrefGen),
            "rx" => Ok(SyncType::Rx),
            "tx" => Ok(SyncType::Tx),
            "any" => Ok(SyncType::Any),
            "all" => Ok(SyncType::All),
            "off" => Ok(SyncType::Off),
            other => Err(StreamError::InvalidArg(format!("unrecognized sync type `{other}`"))),
        }
    }
}

/// Resolves a sync type and the kinds of the named streams to a single
/// retimer command word. `"all"` requires between 1 and 2 streams and
/// picks `ADCANDDACACT`/`ADCACT`/`DACACT`/`FREERUN` depending on which
/// kinds are present among them.
fn resolve_command(sync_type: SyncType, kinds: &[StreamKind]) -> Result<u32> {
    let word = match sync_type {
        SyncType::None => cmd::FREERUN,
        SyncType::Sysref | SyncType::OnePps => cmd::ONEPPS,
        SyncType::SysrefGen => cmd::ONEPPS | cmd::SYSREF_GEN,
        SyncType::Rx => cmd::ADCACT,
        SyncType::Tx => cmd::DACACT,
        SyncType::Any => cmd::ADCORDACACT,
        SyncType::Off => cmd::STOP,
        SyncType::All => {
            if kinds.is_empty() || kinds.len() > 2 {
                return Err(StreamError::InvalidArg("sync(\"all\", ..) requires 1 or 2 streams".into()));
            }
            let rx = kinds.contains(&StreamKind::Rx);
            let tx = kinds.contains(&StreamKind::Tx);
            match (rx, tx) {
                (true, true) => cmd::ADCANDDACACT,
                (true, false) => cmd::ADCACT,
                (false, true) => cmd::DACACT,
                (false, false) => cmd::FREERUN,
            }
        }
    };
    Ok(STROBE_BIT | (word << CMD_OFF))
}

/// Arms every named stream to the same start trigger by writing the
/// resolved command word to each stream's retimer register through its
/// own transport binding (the hardware retimer is shared, but each
/// handle only has a route to its own transport instance).
pub fn sync<T: DmaTransport>(sync_type: SyncType, streams: &mut [&mut StreamHandle<T>], retimer_reg: u32) -> Result<()> {
    let kinds: Vec<StreamKind> = streams.iter().map(|s| s.kind()).collect();
    let value = resolve_command(sync_type, &kinds)?;
    for stream in streams.iter_mut() {
        stream.reg_write_raw(retimer_reg, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_resolves_to_freerun() {
        let v = resolve_command(SyncType::None, &[]).unwrap();
        assert_eq!(v & STROBE_BIT, STROBE_BIT);
        assert_eq!((v >> CMD_OFF) & 0x7fff, cmd::FREERUN);
    }

    #[test]
    fn onepps_and_sysref_alias_to_same_command() {
        let a = resolve_command(SyncType::OnePps, &[]).unwrap();
        let b = resolve_command(SyncType::Sysref, &[]).unwrap();
        assert_eq!(a, b);
        assert_eq!((a >> CMD_OFF) & 0x7fff, cmd::ONEPPS);
    }

    #[test]
    fn sysref_gen_ors_in_generator_bit() {
        let v = resolve_command(SyncType::SysrefGen, &[]).unwrap();
        assert_eq!((v >> CMD_OFF) & 0x7fff, cmd::ONEPPS | cmd::SYSREF_GEN);
    }

    #[test]
    fn all_with_both_kinds_picks_combined_command() {
        let v = resolve_command(SyncType::All, &[StreamKind::Rx, StreamKind::Tx]).unwrap();
        assert_eq!((v >> CMD_OFF) & 0x7fff, cmd::ADCANDDACACT);
    }

    #[test]
    fn all_with_rx_only_picks_adcact() {
        let v = resolve_command(SyncType::All, &[StreamKind::Rx]).unwrap();
        assert_eq!((v >> CMD_OFF) & 0x7fff, cmd::ADCACT);
    }

    #[test]
    fn all_rejects_empty_or_oversized_stream_lists() {
        assert!(resolve_command(SyncType::All, &[]).is_err());
        assert!(resolve_command(SyncType::All, &[StreamKind::Rx, StreamKind::Rx, StreamKind::Tx]).is_err());
    }

    #[test]
    fn off_resolves_to_stop() {
        let v = resolve_command(SyncType::Off, &[]).unwrap();
        assert_eq!((v >> CMD_OFF) & 0x7fff, cmd::STOP);
    }

    #[test]
    fn parses_recognized_strings() {
        use std::str::FromStr;
        assert_eq!(SyncType::from_str("all").unwrap(), SyncType::All);
        assert_eq!(SyncType::from_str("sysref+gen").unwrap(), SyncType::SysrefGen);
        assert!(SyncType::from_str("bogus").is_err());
    }
}
