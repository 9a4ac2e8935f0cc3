//! Kernel implementations, grouped by the instruction set they require.
//!
//! [`generic`] is always compiled and is correct (if not maximally fast)
//! on every target; the other modules add runtime-dispatched fast paths
//! the [`crate::registry`] table prefers when the host CPU supports them.

pub mod generic;

#[cfg(target_arch = "x86_64")]
pub mod avx2;
#[cfg(target_arch = "x86_64")]
pub mod sse4;

#[cfg(target_arch = "aarch64")]
pub mod neon;
