//! # sdr_stream
//!
//! RX/TX front-end register programming, burst planning, channel
//! shuffling, and the application-facing stream handle that ties a DMA
//! transport binding to a converter and per-stream statistics.
//!
//! This crate never talks to hardware directly: every register write and
//! buffer exchange goes through the [`transport::DmaTransport`] trait,
//! which a collaborator elsewhere in the host stack implements against
//! the actual PCIe/USB/network transport.

pub mod handle;
pub mod planner;
pub mod registers;
pub mod shuffle;
pub mod sync;
pub mod transport;
pub mod txctl;

pub use handle::{OpCommand, RecvInfo, SendReport, StreamHandle, StreamInfo, StreamKind, StreamStats, create_stream};
pub use planner::{BurstPlan, PlannerLimits, burst_fe_calculate, plan_to_register_writes, throttle_register};
pub use registers::{ChannelFormat, IfaceFormat};
pub use shuffle::{chmap_register_writes, compute_chmap, compute_mute_mask, compute_stage_masks};
pub use sync::{SyncType, sync};
pub use transport::{CoreId, DmaBuffer, DmaTransport, RxCompletion, StreamId, StreamParams, TxSlot};
pub use txctl::{SwapMute, Timestamp, check_format, ctl, derive_swap_mute, mtu_get, push_ring_buffer_words};
