//! The DMA transport interface. This crate depends only on this trait;
//! the concrete PCIe/USB/network backend that implements it lives outside
//! this repository's scope (see `spec.md` §1, "out of scope").

use sdr_core::error::Result;

pub type StreamId = u32;

/// Which hardware IP block a stream binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreId {
    SfeRx,
    ExfeRx,
    SfeTx,
    ExfeTx,
}

#[derive(Debug, Clone)]
pub struct StreamParams {
    pub core_id: CoreId,
    pub bytes_per_burst: usize,
    pub bursts_per_block: usize,
}

/// An opaque handle to one DMA buffer, returned by a wait/get call and
/// consumed by the matching release/commit call. Never constructed
/// directly by `sdr_stream`.
#[derive(Debug)]
pub struct DmaBuffer {
    token: u64,
}

impl DmaBuffer {
    pub fn from_token(token: u64) -> Self {
        DmaBuffer { token }
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// One completed RX DMA transfer: the wire-format bytes plus the
/// out-of-band status word (`lost_packets` in the low 24 bits,
/// `burst_mask` in the upper 32, per `spec.md` §4.7).
pub struct RxCompletion<'a> {
    pub data: &'a [u8],
    pub oob: u64,
    pub buffer: DmaBuffer,
}

/// One host-side TX buffer ready to be filled, plus the status words the
/// hardware reports alongside it.
pub struct TxSlot<'a> {
    pub data: &'a mut [u8],
    pub host_time: u64,
    pub known_time: u64,
    pub underruns: u32,
    pub fifo_used: u32,
    pub buffer: DmaBuffer,
}

/// The external collaborator every `StreamHandle` is generic over.
///
/// Implementations are expected to be internally synchronized (the
/// completion callback may run on the transport's own thread) — every
/// method takes `&self`.
pub trait DmaTransport: Send + Sync {
    fn stream_initialize(&self, params: &StreamParams) -> Result<StreamId>;
    fn stream_deinitialize(&self, id: StreamId) -> Result<()>;
    fn recv_dma_wait(&self, id: StreamId, timeout_ms: i32) -> Result<RxCompletion<'_>>;
    fn recv_dma_release(&self, id: StreamId, buf: DmaBuffer);
    fn send_dma_get(&self, id: StreamId, timeout_ms: i32) -> Result<TxSlot<'_>>;
    fn send_dma_commit(&self, id: StreamId, buf: DmaBuffer, bytes: usize, oob: u64) -> Result<()>;
    fn reg_write(&self, id: StreamId, reg: u32, value: u32) -> Result<()>;
}
