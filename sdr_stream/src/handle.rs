//! The application-facing stream handle: binds a DMA channel, a
//! converter, front-end state, and statistics counters together behind
//! `recv`/`send`/`op`/`stat`/`option_get`/`option_set`.
//!
//! Grounded on `stream_sfetrx_dma32_t` and its `s_sfetr4_dma32_ops` table
//! in `stream_sfetrx4_dma32.c`; the DMA-completion doorbell register,
//! OOB decode, lost-packet accounting, and chunked `send` all mirror
//! `_sfetrx4_stream_recv`/`_sfetrx4_stream_send` directly.

use log::{info, warn};
use sdr_convert::{Kind, Transform, get_transform};
use sdr_core::ChannelMap;
use sdr_core::error::{Result, StreamError, check_firmware};
use sdr_core::format::{SampleFormat, parse_data_format};

use crate::planner::{PlannerLimits, burst_fe_calculate, plan_to_register_writes};
use crate::registers::{ChannelFormat, IfaceFormat, sfe_rx, tx_ctl};
use crate::transport::{CoreId, DmaTransport, StreamId, StreamParams};
use crate::txctl::Timestamp;

/// The DMA doorbell register offset used to post a "ready for the next
/// burst" token; distinct from the `sfe_rx`/`tx_ctl` front-end registers.
const READY_REG: u32 = 1;

fn format_to_kind(fmt: &SampleFormat) -> Result<Kind> {
    match (fmt.bits, fmt.complex) {
        (8, false) => Ok(Kind::I8),
        (8, true) => Ok(Kind::Ci8),
        (12, false) => Ok(Kind::I12),
        (12, true) => Ok(Kind::Ci12),
        (16, false) => Ok(Kind::I16),
        (16, true) => Ok(Kind::Ci16),
        (32, false) => Ok(Kind::F32),
        (32, true) => Ok(Kind::Cf32),
        _ => Err(StreamError::InvalidArg(format!("sample format {fmt:?} has no matching converter kind"))),
    }
}

/// Binds a DMA channel, validates the requested format, and returns a
/// ready-to-use handle with stats zeroed and its converter selected.
///
/// Mirrors `parse_sfetrx4` + the `create_stream` construction sequence
/// described in `spec.md` §3: parse the format, validate against the
/// bound core (burst planner for RX, `check_format` for TX), acquire the
/// DMA channel, install the configuration, select the converter.
#[allow(clippy::too_many_arguments)]
pub fn create_stream<T: DmaTransport>(
    transport: T,
    core_id: CoreId,
    kind: StreamKind,
    dformat: &str,
    channels: &ChannelMap,
    pkt_symbols: u32,
    planner_limits: &PlannerLimits,
    chfmt: ChannelFormat,
    require_firmware: Option<u32>,
) -> Result<StreamHandle<T>> {
    let parsed = parse_data_format(dformat)?;
    let wire_fmt = parsed.wire.as_ref().unwrap_or(&parsed.host);

    if let Some(found) = require_firmware {
        check_firmware(found)?;
    }

    let (samples_per_burst, bursts, bytes_per_burst) = match kind {
        StreamKind::Rx => {
            let plan = burst_fe_calculate(planner_limits, chfmt, wire_fmt.bits as usize, pkt_symbols as usize)?;
            let iface_fmt = match wire_fmt.bits {
                8 => IfaceFormat::Bits8,
                12 => IfaceFormat::Bits12,
                16 => IfaceFormat::Bits16,
                _ => IfaceFormat::Dsp,
            };
            let params = StreamParams {
                core_id,
                bytes_per_burst: plan.bwords_per_burst * planner_limits.data_lanes_bytes,
                bursts_per_block: plan.bursts,
            };
            let id = transport.stream_initialize(&params)?;
            for (reg, value) in plan_to_register_writes(&plan, iface_fmt, chfmt) {
                transport.reg_write(id, reg, value)?;
            }
            return finish_create(transport, id, kind, channels, plan.samples_per_burst as u32, &parsed, wire_fmt, plan.bursts);
        }
        StreamKind::Tx => {
            crate::txctl::check_format(wire_fmt.bits, wire_fmt.complex, channels)?;
            let bytes_per_burst = channels.len().max(1) * pkt_symbols as usize * wire_fmt.bits as usize / 8;
            (pkt_symbols, 1, bytes_per_burst)
        }
    };

    let params = StreamParams { core_id, bytes_per_burst, bursts_per_block: bursts };
    let id = transport.stream_initialize(&params)?;
    finish_create(transport, id, kind, channels, samples_per_burst, &parsed, wire_fmt, bursts)
}

#[allow(clippy::too_many_arguments)]
fn finish_create<T: DmaTransport>(
    transport: T,
    id: StreamId,
    kind: StreamKind,
    channels: &ChannelMap,
    samples_per_burst: u32,
    parsed: &sdr_core::format::ParsedDataFormat,
    wire_fmt: &SampleFormat,
    bursts: usize,
) -> Result<StreamHandle<T>> {
    let wire_kind = format_to_kind(wire_fmt)?;
    let host_kind = format_to_kind(&parsed.host)?;
    let out_vecs = if parsed.demux { channels.active_count().max(1) as u8 } else { 1 };
    let convert = get_transform(wire_kind, host_kind, 1, out_vecs);

    let wire_bytes_per_burst = samples_per_burst as usize * channels.len().max(1) * wire_fmt.bits as usize / 8;

    Ok(StreamHandle::new(
        transport,
        id,
        kind,
        channels.len().max(1),
        samples_per_burst,
        wire_bytes_per_burst,
        wire_fmt.bits as usize,
        convert,
        0,
        bursts,
        -1,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Rx,
    Tx,
}

/// `op`'s command argument: `START`/`START_AT(tm)`/`STOP` in `spec.md`
/// §4.7. `StartAt` differs from `Start` only in that it schedules against
/// a future device time rather than arming immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCommand {
    Start,
    StartAt(u64),
    Stop,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    pub wirebytes: u64,
    pub symbols: u64,
    pub pktok: u64,
    pub dropped: u64,
    pub burst_mask_mismatches: u64,
    pub underruns: u32,
    pub fifo_used: u32,
}

/// Result of one `recv` call.
#[derive(Debug, Clone, Copy)]
pub struct RecvInfo {
    pub fsymtime: u64,
    pub totsyms: u32,
    pub totlost: u64,
}

/// Result of one `send` call, when the transport reports tag FIFO state.
#[derive(Debug, Clone, Copy)]
pub struct SendReport {
    pub host_time: u64,
    pub known_time: u64,
    pub underruns: u32,
    pub fifo_used: u32,
}

/// Snapshot returned by `stat`.
#[derive(Debug, Clone, Copy)]
pub struct StreamInfo {
    pub kind: StreamKind,
    pub channels: usize,
    pub pkt_host_bytes_per_channel: usize,
    pub pkt_symbols: u32,
    pub burst_count: usize,
}

pub struct StreamHandle<T: DmaTransport> {
    transport: T,
    id: StreamId,
    kind: StreamKind,
    channels: usize,
    pkt_symbols: u32,
    wire_bytes_per_burst: usize,
    host_bytes_per_burst: usize,
    bps: usize,
    convert: Transform,
    burst_mask: u32,
    burst_count: usize,
    rcnt: u64,
    r_ts: u64,
    stats: StreamStats,
    fd: i64,
}

impl<T: DmaTransport> StreamHandle<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: T,
        id: StreamId,
        kind: StreamKind,
        channels: usize,
        pkt_symbols: u32,
        wire_bytes_per_burst: usize,
        bps: usize,
        convert: Transform,
        burst_mask: u32,
        burst_count: usize,
        fd: i64,
    ) -> Self {
        let host_bytes_per_burst = (convert.size)(wire_bytes_per_burst, false);
        StreamHandle {
            transport,
            id,
            kind,
            channels,
            pkt_symbols,
            wire_bytes_per_burst,
            host_bytes_per_burst,
            bps,
            convert,
            burst_mask,
            burst_count,
            rcnt: 0,
            r_ts: 0,
            stats: StreamStats::default(),
            fd,
        }
    }

    /// Tears down the underlying DMA channel. Equivalent to the C API's
    /// `destroy(handle)`: callers drop the handle afterward.
    pub fn destroy(self) -> Result<()> {
        self.transport.stream_deinitialize(self.id)
    }

    /// Arms or disarms the stream, routing through the RX reset register
    /// (`FE_CMD_RESET`/`SCMD_*`) or the TX control register
    /// (`sfe_tx4_ctl`'s `cfg_base+2` sequence), per `cmd`.
    ///
    /// Mirrors `_sfetrx4_op`: the stop-stats log fires unconditionally on
    /// stop, for either kind, before the per-kind register programming.
    pub fn op(&mut self, cmd: OpCommand) -> Result<()> {
        let start = !matches!(cmd, OpCommand::Stop);
        if !start {
            info!(
                "stream[{}] stop; stats bytes={} samples={} dropped={}/{}",
                self.id, self.stats.wirebytes, self.stats.symbols, self.stats.dropped, self.stats.pktok
            );
        }

        match self.kind {
            StreamKind::Rx => {
                if let OpCommand::StartAt(tm) = cmd {
                    self.transport.reg_write(self.id, sfe_rx::EVENT, tm as u32)?;
                }
                let scmd = match cmd {
                    OpCommand::Start => sfe_rx::SCMD_START_IMM,
                    OpCommand::StartAt(_) => sfe_rx::SCMD_START_AT,
                    OpCommand::Stop => sfe_rx::SCMD_STOP_IMM,
                };
                self.transport.reg_write(self.id, sfe_rx::RESET, scmd)
            }
            StreamKind::Tx => {
                let mimo = self.channels > 1;
                for value in crate::txctl::ctl(mimo, false, start) {
                    self.transport.reg_write(self.id, tx_ctl::CTL_REG, value)?;
                }
                Ok(())
            }
        }
    }

    /// Enables or disables the CORDIC-based on-chip frequency shifter.
    /// `sfe_rf4_nco_enable`'s enable sequence writes the armed command
    /// then the latched command; disable is a single zero write.
    pub fn nco_enable(&mut self, enable: bool, iq_accum_bits: u32) -> Result<()> {
        if self.kind != StreamKind::Rx {
            return Err(StreamError::Unsupported);
        }
        if enable {
            let armed = ((iq_accum_bits & 7) << 2) | 3;
            let latched = ((iq_accum_bits & 7) << 2) | 1;
            self.transport.reg_write(self.id, sfe_rx::CFG_CORDIC, armed)?;
            self.transport.reg_write(self.id, sfe_rx::CFG_CORDIC, latched)
        } else {
            self.transport.reg_write(self.id, sfe_rx::CFG_CORDIC, 0)
        }
    }

    /// Programs the CORDIC frequency shift. `freq` is signed 32-bit,
    /// scaled so that `±i32::MAX` maps to `±F_s/2`.
    pub fn nco_freq(&mut self, freq: i32) -> Result<()> {
        if self.kind != StreamKind::Rx {
            return Err(StreamError::Unsupported);
        }
        self.transport.reg_write(self.id, sfe_rx::FREQ_CORDIC, freq as u32)
    }

    pub fn recv(&mut self, outputs: &mut [&mut [u8]], timeout_ms: i32) -> Result<RecvInfo> {
        if self.kind != StreamKind::Rx {
            return Err(StreamError::Unsupported);
        }

        if self.rcnt == 0 {
            self.transport.reg_write(self.id, READY_REG, 4)?;
        }

        let completion = self.transport.recv_dma_wait(self.id, timeout_ms)?;
        let lost = completion.oob & 0xff_ffff;
        let mask_field = (completion.oob >> 32) as u32;

        if lost != 0 {
            self.stats.dropped += lost;
            self.r_ts += self.pkt_symbols as u64 * lost;
            info!("stream[{}] recv lost {lost} symbols' worth of bursts", self.id);
        } else if mask_field != self.burst_mask {
            self.stats.burst_mask_mismatches += 1;
            warn!("stream[{}] burst mask {mask_field:#010x} != expected {:#010x}", self.id, self.burst_mask);
        }

        self.stats.pktok += 1;
        self.stats.wirebytes += self.wire_bytes_per_burst as u64;
        self.stats.symbols += self.pkt_symbols as u64;

        (self.convert.convert)(
            &[completion.data],
            self.wire_bytes_per_burst,
            outputs,
            self.host_bytes_per_burst,
        );

        self.rcnt += 1;
        let fsymtime = self.r_ts;
        let totsyms = self.pkt_symbols;
        self.r_ts += self.pkt_symbols as u64;

        self.transport.recv_dma_release(self.id, completion.buffer);

        Ok(RecvInfo { fsymtime, totsyms, totlost: self.stats.dropped })
    }

    pub fn send(&mut self, inputs: &[&[u8]], samples: usize, timestamp: Timestamp, timeout_ms: i32) -> Result<Option<SendReport>> {
        if self.kind != StreamKind::Tx {
            return Err(StreamError::Unsupported);
        }

        if (self.pkt_symbols as usize) < samples {
            // Matches `_sfetrx4_stream_send`'s chunk loop exactly: the
            // per-channel pointer advance is based on one full packet's
            // worth of host bytes, applied unconditionally each
            // iteration (including the final, possibly shorter, chunk).
            let host_off = (self.convert.size)(self.pkt_symbols as usize * self.bps / 8, true) / self.channels;
            let mut offsets = vec![0usize; inputs.len()];
            let mut remaining = samples;
            let mut ts = timestamp;
            let mut last_report = None;

            while remaining > 0 {
                let ns = remaining.min(self.pkt_symbols as usize);
                let chunk: Vec<&[u8]> = inputs.iter().zip(&offsets).map(|(buf, &off)| &buf[off..]).collect();
                last_report = self.send(&chunk, ns, ts, timeout_ms)?;

                for off in &mut offsets {
                    *off += host_off;
                }
                if let Timestamp::At(t) = ts {
                    ts = Timestamp::At(t + ns as u64);
                }
                remaining -= ns;
            }

            return Ok(last_report);
        }

        let slot = self.transport.send_dma_get(self.id, timeout_ms)?;

        let wire_bytes = self.channels * samples * self.bps / 8;
        let host_bytes = (self.convert.size)(wire_bytes, true);

        self.stats.wirebytes += wire_bytes as u64;
        self.stats.symbols += samples as u64;
        self.stats.underruns = slot.underruns;
        self.stats.fifo_used = slot.fifo_used;

        (self.convert.convert)(inputs, host_bytes, &mut [slot.data], wire_bytes);
        self.rcnt += 1;

        // The zero-copy DMA send path tags each commit with the raw
        // timestamp word rather than the ring-descriptor encoding
        // `txctl::push_ring_buffer_words` builds for the simple TX
        // core's register-driven path; "immediate" is `i64::MAX`, the
        // original's `timestamp < INT64_MAX` sentinel for "don't advance".
        let oob = match timestamp {
            Timestamp::Immediate => i64::MAX as u64,
            Timestamp::At(t) => t,
        };

        self.transport.send_dma_commit(self.id, slot.buffer, wire_bytes, oob)?;
        self.stats.pktok += 1;

        Ok(Some(SendReport {
            host_time: slot.host_time,
            known_time: slot.known_time,
            underruns: slot.underruns,
            fifo_used: slot.fifo_used,
        }))
    }

    pub fn stat(&self) -> StreamInfo {
        StreamInfo {
            kind: self.kind,
            channels: self.channels,
            pkt_host_bytes_per_channel: self.host_bytes_per_burst / self.channels,
            pkt_symbols: self.pkt_symbols,
            burst_count: self.burst_count,
        }
    }

    pub fn option_get(&self, name: &str) -> Result<i64> {
        match name {
            "fd" => Ok(self.fd),
            "ready" => Ok(if self.rcnt > 0 { 1 } else { 0 }),
            _ => Err(StreamError::InvalidArg(format!("unrecognized option `{name}`"))),
        }
    }

    pub fn option_set(&mut self, name: &str, value: i64) -> Result<()> {
        match name {
            "ready" => {
                if self.kind != StreamKind::Rx {
                    return Err(StreamError::Unsupported);
                }
                self.transport.reg_write(self.id, READY_REG, 4)
            }
            "throttle" => {
                if self.kind != StreamKind::Rx {
                    return Err(StreamError::Unsupported);
                }
                let enable = (value & (1 << 16)) != 0;
                let send = ((value >> 8) & 0xff) as u32;
                let skip = (value & 0xff) as u32;
                let (reg, packed) = crate::planner::throttle_register(enable, skip, send);
                self.transport.reg_write(self.id, reg, packed)
            }
            "stats" => Err(StreamError::Unsupported),
            other => Err(StreamError::InvalidArg(format!("unrecognized option `{other}`"))),
        }
    }

    /// Applies a new channel map to the extended front-end's shuffle
    /// stages (`option_set("chmap", ..)` in the original C API, which
    /// passes the map by pointer cast through an `int64_t`; taken here
    /// as a typed `&ChannelMap` instead).
    pub fn apply_channel_map(&mut self, raw_chans: usize, complex: bool, channels: &sdr_core::ChannelMap) -> Result<()> {
        for (reg, value) in crate::shuffle::chmap_register_writes(raw_chans, complex, channels) {
            self.transport.reg_write(self.id, reg, value)?;
        }
        Ok(())
    }

    /// Programs the legacy TX core's mute/swap register directly
    /// (`option_set("mute", ..)` on a core without shuffle stages).
    pub fn set_tx_mute(&mut self, reg: u32, mute: crate::txctl::SwapMute) -> Result<()> {
        if self.kind != StreamKind::Tx {
            return Err(StreamError::Unsupported);
        }
        let value = (u32::from(mute.mute_a)) | (u32::from(mute.mute_b) << 1) | (u32::from(mute.swap_ab) << 2);
        self.transport.reg_write(self.id, reg, value)
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn burst_mask(&self) -> u32 {
        self.burst_mask
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Writes directly to a register on this stream's transport binding,
    /// bypassing the front-end's own register map. Used by `sync` to
    /// reach the shared retimer register through each bound stream.
    pub fn reg_write_raw(&self, reg: u32, value: u32) -> Result<()> {
        self.transport.reg_write(self.id, reg, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn identity_transform() -> Transform {
        fn convert(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], _out_bytes: usize) {
            outputs[0][..in_bytes].copy_from_slice(&inputs[0][..in_bytes]);
        }
        fn size(n: usize, _reverse: bool) -> usize {
            n
        }
        Transform { convert, size, name: "identity" }
    }

    fn make_rx_handle(blocks: Vec<Vec<u8>>) -> StreamHandle<MockTransport> {
        let transport = MockTransport::new(blocks, 16);
        StreamHandle::new(transport, 1, StreamKind::Rx, 1, 4, 16, 16, identity_transform(), 0, 1, -1)
    }

    #[test]
    fn recv_copies_bytes_through_identity_converter() {
        let mut handle = make_rx_handle(vec![vec![0xab; 16]]);
        let mut out = vec![0u8; 16];
        {
            let mut outputs: [&mut [u8]; 1] = [&mut out];
            handle.recv(&mut outputs, 0).unwrap();
        }
        assert_eq!(out, vec![0xab; 16]);
        assert_eq!(handle.stats().pktok, 1);
    }

    #[test]
    fn recv_counts_lost_packets_from_oob() {
        let mut handle = make_rx_handle(vec![vec![0u8; 16]]);
        handle.transport.set_next_oob(3);
        let mut out = vec![0u8; 16];
        let mut outputs: [&mut [u8]; 1] = [&mut out];
        let info = handle.recv(&mut outputs, 0).unwrap();
        assert_eq!(handle.stats().dropped, 3);
        assert_eq!(info.totlost, 3);
    }

    #[test]
    fn recv_mismatched_burst_mask_does_not_error() {
        let mut handle = make_rx_handle(vec![vec![0u8; 16]]);
        handle.transport.set_next_oob(0xdead_beef_0000_0000);
        let mut out = vec![0u8; 16];
        let mut outputs: [&mut [u8]; 1] = [&mut out];
        assert!(handle.recv(&mut outputs, 0).is_ok());
        assert_eq!(handle.stats().burst_mask_mismatches, 1);
    }

    #[test]
    fn recv_past_last_block_times_out() {
        let mut handle = make_rx_handle(vec![vec![0u8; 16]]);
        let mut out = vec![0u8; 16];
        {
            let mut outputs: [&mut [u8]; 1] = [&mut out];
            handle.recv(&mut outputs, 0).unwrap();
        }
        let mut outputs: [&mut [u8]; 1] = [&mut out];
        assert!(matches!(handle.recv(&mut outputs, 0), Err(StreamError::Timeout)));
    }

    #[test]
    fn send_chunks_when_samples_exceed_packet_size() {
        let transport = MockTransport::new(vec![], 16);
        let mut handle = StreamHandle::new(transport, 1, StreamKind::Tx, 1, 4, 16, 16, identity_transform(), 0, 1, -1);
        let data = vec![0xabu8; 32];
        let inputs: [&[u8]; 1] = [&data];
        let result = handle.send(&inputs, 8, Timestamp::At(100), 0);
        assert!(result.is_ok());
        assert_eq!(handle.stats().symbols, 8);
    }

    #[test]
    fn recv_on_tx_handle_is_unsupported() {
        let transport = MockTransport::new(vec![], 16);
        let mut handle = StreamHandle::new(transport, 1, StreamKind::Tx, 1, 4, 16, 16, identity_transform(), 0, 1, -1);
        let mut out = vec![0u8; 16];
        let mut outputs: [&mut [u8]; 1] = [&mut out];
        assert!(matches!(handle.recv(&mut outputs, 0), Err(StreamError::Unsupported)));
    }

    #[test]
    fn option_get_fd_returns_configured_value() {
        let handle = make_rx_handle(vec![]);
        assert_eq!(handle.option_get("fd").unwrap(), -1);
    }

    #[test]
    fn option_set_throttle_packs_fields() {
        let mut handle = make_rx_handle(vec![]);
        handle.option_set("throttle", (1 << 16) | (1 << 8) | 2).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(writes.last().unwrap().1, 0x01_01_02);
    }

    #[test]
    fn apply_channel_map_writes_five_registers() {
        use sdr_core::{ChannelInfo, ChannelMap};
        let mut handle = make_rx_handle(vec![]);
        let raw = [ChannelInfo { physical: 0, swap_iq: false }.to_raw(), ChannelInfo { physical: 1, swap_iq: false }.to_raw()];
        let channels = ChannelMap::from_raw_slice(&raw).unwrap();
        handle.apply_channel_map(4, true, &channels).unwrap();
        assert_eq!(handle.transport.reg_writes.lock().unwrap().len(), 5);
    }

    #[test]
    fn op_start_writes_start_imm_to_reset_register() {
        let mut handle = make_rx_handle(vec![]);
        handle.op(OpCommand::Start).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(*writes.last().unwrap(), (sfe_rx::RESET, sfe_rx::SCMD_START_IMM));
    }

    #[test]
    fn op_start_at_programs_event_register_before_reset() {
        let mut handle = make_rx_handle(vec![]);
        handle.op(OpCommand::StartAt(0x1234)).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(writes[writes.len() - 2], (sfe_rx::EVENT, 0x1234));
        assert_eq!(*writes.last().unwrap(), (sfe_rx::RESET, sfe_rx::SCMD_START_AT));
    }

    #[test]
    fn op_stop_writes_stop_imm_and_logs_unconditionally() {
        let mut handle = make_rx_handle(vec![]);
        handle.op(OpCommand::Stop).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(*writes.last().unwrap(), (sfe_rx::RESET, sfe_rx::SCMD_STOP_IMM));
    }

    #[test]
    fn op_on_tx_handle_routes_through_ctl_register() {
        let transport = MockTransport::new(vec![], 16);
        let mut handle = StreamHandle::new(transport, 1, StreamKind::Tx, 2, 4, 16, 16, identity_transform(), 0, 1, -1);
        handle.op(OpCommand::Start).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(writes.len(), 3);
        assert!(writes.iter().all(|(reg, _)| *reg == tx_ctl::CTL_REG));
    }

    #[test]
    fn nco_enable_writes_armed_then_latched_command() {
        let mut handle = make_rx_handle(vec![]);
        handle.nco_enable(true, 3).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(writes[writes.len() - 2], (sfe_rx::CFG_CORDIC, ((3 & 7) << 2) | 3));
        assert_eq!(*writes.last().unwrap(), (sfe_rx::CFG_CORDIC, ((3 & 7) << 2) | 1));
    }

    #[test]
    fn nco_disable_writes_zero() {
        let mut handle = make_rx_handle(vec![]);
        handle.nco_enable(false, 0).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(*writes.last().unwrap(), (sfe_rx::CFG_CORDIC, 0));
    }

    #[test]
    fn nco_freq_writes_signed_value_to_freq_register() {
        let mut handle = make_rx_handle(vec![]);
        handle.nco_freq(-1000).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(*writes.last().unwrap(), (sfe_rx::FREQ_CORDIC, (-1000i32) as u32));
    }

    #[test]
    fn set_tx_mute_rejects_rx_handle() {
        let mut handle = make_rx_handle(vec![]);
        let mute = crate::txctl::SwapMute { swap_ab: false, mute_a: false, mute_b: true };
        assert!(matches!(handle.set_tx_mute(0, mute), Err(StreamError::Unsupported)));
    }

    #[test]
    fn set_tx_mute_packs_bits_for_tx_handle() {
        let transport = MockTransport::new(vec![], 16);
        let mut handle = StreamHandle::new(transport, 1, StreamKind::Tx, 1, 4, 16, 16, identity_transform(), 0, 1, -1);
        let mute = crate::txctl::SwapMute { swap_ab: true, mute_a: false, mute_b: true };
        handle.set_tx_mute(5, mute).unwrap();
        let writes = handle.transport.reg_writes.lock().unwrap();
        assert_eq!(*writes.last().unwrap(), (5, 0b110));
    }

    #[test]
    fn create_stream_programs_planner_registers_and_binds_converter() {
        use sdr_core::ChannelMap;

        let transport = MockTransport::new(vec![vec![0u8; 32]], 32);
        let channels = ChannelMap::from_raw_slice(&[0]).unwrap();
        let limits = PlannerLimits {
            max_bursts: 32,
            limit_samples_mod: 1,
            limit_burst_samples: usize::MAX,
            limit_burst_words: 1024,
            fifo_ram_bytes: 524_288,
            data_lanes_bytes: 8,
        };

        let mut handle = create_stream(
            transport,
            crate::transport::CoreId::SfeRx,
            StreamKind::Rx,
            "i16",
            &channels,
            4096,
            &limits,
            ChannelFormat::ChXxx0,
            None,
        )
        .unwrap();

        assert_eq!(handle.stat().pkt_symbols, 4096);
        let writes = handle.transport.reg_writes.lock().unwrap().len();
        assert_eq!(writes, 4);
        assert!(handle.destroy().is_ok());
    }

    #[test]
    fn create_stream_rejects_firmware_below_minimum() {
        let transport = MockTransport::new(vec![], 32);
        let channels = ChannelMap::from_raw_slice(&[0]).unwrap();
        let limits = PlannerLimits {
            max_bursts: 32,
            limit_samples_mod: 1,
            limit_burst_samples: usize::MAX,
            limit_burst_words: 1024,
            fifo_ram_bytes: 524_288,
            data_lanes_bytes: 8,
        };
        let result = create_stream(
            transport,
            crate::transport::CoreId::SfeTx,
            StreamKind::Tx,
            "i16",
            &channels,
            4096,
            &limits,
            ChannelFormat::ChXxx0,
            Some(0x1000_0000),
        );
        assert!(matches!(result, Err(StreamError::InvariantFirmware { .. })));
    }
}
