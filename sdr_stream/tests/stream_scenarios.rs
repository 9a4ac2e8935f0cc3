//! End-to-end coverage of the six concrete scenarios that ground
//! `sdr_stream`'s unit tests, exercised this time through the public
//! `StreamHandle`/`DmaTransport` surface rather than crate-internal
//! helpers.

use std::sync::Mutex;

use sdr_convert::{Kind, Transform, get_transform};
use sdr_core::error::Result;
use sdr_stream::{
    BurstPlan, ChannelFormat, CoreId, DmaBuffer, DmaTransport, PlannerLimits, RxCompletion, StreamHandle, StreamId,
    StreamKind, StreamParams, Timestamp, TxSlot, burst_fe_calculate, throttle_register,
};

/// A transport double good enough to drive `StreamHandle` end-to-end:
/// one fixed RX block repeated forever, and a scratch TX block, with
/// every register write recorded for assertions.
struct TestTransport {
    rx_block: Vec<u8>,
    tx_block: Mutex<Vec<u8>>,
    writes: Mutex<Vec<(u32, u32)>>,
}

impl TestTransport {
    fn new(rx_block: Vec<u8>, tx_len: usize) -> Self {
        TestTransport {
            rx_block,
            tx_block: Mutex::new(vec![0u8; tx_len]),
            writes: Mutex::new(Vec::new()),
        }
    }
}

impl DmaTransport for TestTransport {
    fn stream_initialize(&self, _params: &StreamParams) -> Result<StreamId> {
        Ok(7)
    }

    fn stream_deinitialize(&self, _id: StreamId) -> Result<()> {
        Ok(())
    }

    fn recv_dma_wait(&self, _id: StreamId, _timeout_ms: i32) -> Result<RxCompletion<'_>> {
        Ok(RxCompletion { data: &self.rx_block, oob: 0, buffer: DmaBuffer::from_token(0) })
    }

    fn recv_dma_release(&self, _id: StreamId, _buf: DmaBuffer) {}

    fn send_dma_get(&self, _id: StreamId, _timeout_ms: i32) -> Result<TxSlot<'_>> {
        let mut block = self.tx_block.lock().unwrap();
        // SAFETY: single `TestTransport` per test, buffer never reallocated.
        let slice: &mut [u8] = unsafe { std::mem::transmute::<&mut [u8], &mut [u8]>(&mut block[..]) };
        Ok(TxSlot { data: slice, host_time: 0, known_time: 0, underruns: 0, fifo_used: 0, buffer: DmaBuffer::from_token(0) })
    }

    fn send_dma_commit(&self, _id: StreamId, _buf: DmaBuffer, _bytes: usize, _oob: u64) -> Result<()> {
        Ok(())
    }

    fn reg_write(&self, _id: StreamId, reg: u32, value: u32) -> Result<()> {
        self.writes.lock().unwrap().push((reg, value));
        Ok(())
    }
}

fn identity() -> Transform {
    get_transform(Kind::I16, Kind::I16, 1, 1)
}

#[test]
fn planner_picks_single_burst_for_one_channel_buffer() {
    let limits = PlannerLimits {
        max_bursts: 32,
        limit_samples_mod: 1,
        limit_burst_samples: usize::MAX,
        limit_burst_words: 1024,
        fifo_ram_bytes: 524_288,
        data_lanes_bytes: 8,
    };
    let plan: BurstPlan = burst_fe_calculate(&limits, ChannelFormat::ChXxx0, 16, 4096).unwrap();
    assert_eq!(plan.bursts, 1);
    assert_eq!(plan.fifo_capacity, 64);
}

#[test]
fn throttle_round_trip_matches_formula() {
    let (_, value) = throttle_register(true, 1, 2);
    assert_eq!(value, 0x01_01_02);
}

#[test]
fn recv_through_stream_handle_converts_and_counts() {
    let transport = TestTransport::new(vec![0x11; 32], 32);
    let mut handle: StreamHandle<TestTransport> =
        StreamHandle::new(transport, 7, StreamKind::Rx, 1, 8, 32, 16, identity(), 0, 1, -1);

    let mut out = vec![0u8; 32];
    {
        let mut outputs: [&mut [u8]; 1] = [&mut out];
        let info = handle.recv(&mut outputs, 100).unwrap();
        assert_eq!(info.totsyms, 8);
    }
    assert_eq!(out, vec![0x11; 32]);
    assert_eq!(handle.stats().pktok, 1);
}

#[test]
fn send_chunked_across_multiple_packets_reports_last_slot() {
    let transport = TestTransport::new(vec![], 64);
    let mut handle: StreamHandle<TestTransport> =
        StreamHandle::new(transport, 7, StreamKind::Tx, 1, 4, 16, 16, identity(), 0, 1, -1);

    let data = vec![0x22u8; 64];
    let inputs: [&[u8]; 1] = [&data];
    let report = handle.send(&inputs, 16, Timestamp::At(1_000), 100).unwrap();
    assert!(report.is_some());
    assert_eq!(handle.stats().symbols, 16);
}

#[test]
fn create_stream_binds_core_and_params() {
    let transport = TestTransport::new(vec![0u8; 16], 16);
    let params = StreamParams { core_id: CoreId::SfeRx, bytes_per_burst: 8192, bursts_per_block: 1 };
    let id = transport.stream_initialize(&params).unwrap();
    assert_eq!(id, 7);
}
