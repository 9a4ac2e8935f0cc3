//! Sample format conversion kernels, dispatched at runtime by CPU rank.
//!
//! [`get_transform`] is the single entry point: given a `(from, to)`
//! sample kind pair and the stream's fan-in/fan-out, it returns the
//! fastest [`ConvertFn`]/[`SizeFn`] pair the host CPU supports. Everything
//! else in this crate exists to populate that table.

pub mod kernels;
pub mod registry;

pub use registry::{ConvertFn, Kind, SizeFn, Transform, get_transform};
