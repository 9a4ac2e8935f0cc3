//! Runtime CPU feature detection.
//!
//! The converter registry and the spectrum accumulators pick their
//! fastest available kernel by comparing a kernel's required [`Rank`]
//! against the host's detected rank. Detection happens once per process
//! and is cached in a [`OnceLock`]; nothing in this module mutates after
//! that first query.

use std::sync::OnceLock;

/// Total order of SIMD capability levels.
///
/// `Generic` is always supported. Variant order is the dispatch order:
/// the registry picks the highest-ranked kernel with `rank <= vcap_get()`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Generic = 0,
    Sse2 = 1,
    Ssse3 = 2,
    Sse4 = 3,
    Avx = 4,
    Avx2 = 5,
    Neon = 6,
}

static VCAP: OnceLock<Rank> = OnceLock::new();

/// Returns the highest [`Rank`] the host CPU supports, detecting it on
/// first call and caching the result for the lifetime of the process.
pub fn vcap_get() -> Rank {
    *VCAP.get_or_init(detect)
}

#[cfg(target_arch = "x86_64")]
fn detect() -> Rank {
    if is_x86_feature_detected!("avx2") {
        Rank::Avx2
    } else if is_x86_feature_detected!("avx") {
        Rank::Avx
    } else if is_x86_feature_detected!("sse4.1") {
        Rank::Sse4
    } else if is_x86_feature_detected!("ssse3") {
        Rank::Ssse3
    } else if is_x86_feature_detected!("sse2") {
        Rank::Sse2
    } else {
        Rank::Generic
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> Rank {
    // NEON is part of the aarch64 baseline; no runtime probe is needed.
    Rank::Neon
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> Rank {
    Rank::Generic
}

/// Byte alignment required by the widest vector register a [`Rank`] uses.
pub const fn vcap_align(rank: Rank) -> usize {
    match rank {
        Rank::Generic => 8,
        Rank::Sse2 | Rank::Ssse3 | Rank::Sse4 | Rank::Neon => 16,
        Rank::Avx | Rank::Avx2 => 32,
    }
}
