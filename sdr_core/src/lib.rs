//! # sdr_core
//!
//! Foundational types shared across the streaming-core workspace: the
//! error type, CPU capability probing, sample format descriptors,
//! channel maps, and the blocking SPSC ring used between DMA callback
//! threads and application-facing stream handles.

pub mod channel;
pub mod cpu;
pub mod error;
pub mod format;
pub mod spsc;

pub use channel::{CH_ANY, CH_NULL, CH_SWAP_IQ, ChannelInfo, ChannelMap};
pub use cpu::{Rank, vcap_align, vcap_get};
pub use error::{Result, StreamError};
pub use format::{ParsedDataFormat, SampleFormat, parse_data_format};
pub use spsc::{Consumer, Producer, Timeout, ring};
