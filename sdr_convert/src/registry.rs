//! The kernel lookup table and dispatch entry point.

use sdr_core::cpu::{Rank, vcap_get};

use crate::kernels::generic;
#[cfg(target_arch = "aarch64")]
use crate::kernels::neon;
#[cfg(target_arch = "x86_64")]
use crate::kernels::{avx2, sse4};

/// Plain numeric sample layouts the converter registry knows how to handle.
///
/// Distinct from [`sdr_core::format::SampleFormat`] (which also carries
/// DSP function tags like `cfftlpwri16`): the registry only ever converts
/// between concrete layouts, never into a hardware function slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    I8,
    Ci8,
    I12,
    Ci12,
    I16,
    Ci16,
    F32,
    Cf32,
}

/// Converts one block of samples from `inputs` into `outputs`.
///
/// `in_bytes`/`out_bytes` are the per-stream byte counts already validated
/// against [`SizeFn`] by the caller; a kernel trusts them and does not
/// re-check slice lengths beyond what's needed to find the scalar tail.
pub type ConvertFn = fn(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize);

/// Computes the output (or, with `reverse = true`, input) byte count for a
/// given input byte count, for one kernel's format pair.
pub type SizeFn = fn(in_bytes: usize, reverse: bool) -> usize;

/// One resolved entry: a convert function plus its matching size function.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub convert: ConvertFn,
    pub size: SizeFn,
    pub name: &'static str,
}

struct KernelEntry {
    from: Kind,
    to: Kind,
    in_vecs: u8,
    out_vecs: u8,
    rank: Rank,
    convert: ConvertFn,
    size: SizeFn,
    name: &'static str,
}

macro_rules! entry {
    ($from:expr, $to:expr, $in_vecs:expr, $out_vecs:expr, $rank:expr, $convert:path, $size:path) => {
        KernelEntry {
            from: $from,
            to: $to,
            in_vecs: $in_vecs,
            out_vecs: $out_vecs,
            rank: $rank,
            convert: $convert,
            size: $size,
            name: stringify!($convert),
        }
    };
}

static TABLE: &[KernelEntry] = &[
    // Sign-extend/scale family: i16 <-> f32, real and complex.
    entry!(Kind::I16, Kind::F32, 1, 1, Rank::Generic, generic::i16_to_f32, generic::size_i16_to_f32),
    entry!(Kind::F32, Kind::I16, 1, 1, Rank::Generic, generic::f32_to_i16, generic::size_f32_to_i16),
    entry!(Kind::Ci16, Kind::Cf32, 1, 1, Rank::Generic, generic::i16_to_f32, generic::size_i16_to_f32),
    entry!(Kind::Cf32, Kind::Ci16, 1, 1, Rank::Generic, generic::f32_to_i16, generic::size_f32_to_i16),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::I16, Kind::F32, 1, 1, Rank::Sse4, sse4::i16_to_f32_sse4, generic::size_i16_to_f32),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::F32, Kind::I16, 1, 1, Rank::Sse4, sse4::f32_to_i16_sse4, generic::size_f32_to_i16),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::Ci16, Kind::Cf32, 1, 1, Rank::Sse4, sse4::i16_to_f32_sse4, generic::size_i16_to_f32),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::Cf32, Kind::Ci16, 1, 1, Rank::Sse4, sse4::f32_to_i16_sse4, generic::size_f32_to_i16),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::I16, Kind::F32, 1, 1, Rank::Avx2, avx2::i16_to_f32_avx2, generic::size_i16_to_f32),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::F32, Kind::I16, 1, 1, Rank::Avx2, avx2::f32_to_i16_avx2, generic::size_f32_to_i16),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::Ci16, Kind::Cf32, 1, 1, Rank::Avx2, avx2::i16_to_f32_avx2, generic::size_i16_to_f32),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::Cf32, Kind::Ci16, 1, 1, Rank::Avx2, avx2::f32_to_i16_avx2, generic::size_f32_to_i16),
    #[cfg(target_arch = "aarch64")]
    entry!(Kind::I16, Kind::F32, 1, 1, Rank::Neon, neon::i16_to_f32_neon, generic::size_i16_to_f32),
    #[cfg(target_arch = "aarch64")]
    entry!(Kind::F32, Kind::I16, 1, 1, Rank::Neon, neon::f32_to_i16_neon, generic::size_f32_to_i16),
    #[cfg(target_arch = "aarch64")]
    entry!(Kind::Ci16, Kind::Cf32, 1, 1, Rank::Neon, neon::i16_to_f32_neon, generic::size_i16_to_f32),
    #[cfg(target_arch = "aarch64")]
    entry!(Kind::Cf32, Kind::Ci16, 1, 1, Rank::Neon, neon::f32_to_i16_neon, generic::size_f32_to_i16),
    // 12-bit packed formats: generic only (see DESIGN.md "SIMD coverage scope").
    entry!(Kind::I12, Kind::F32, 1, 1, Rank::Generic, generic::i12_to_f32, generic::size_i12_to_f32),
    entry!(Kind::F32, Kind::I12, 1, 1, Rank::Generic, generic::f32_to_i12, generic::size_f32_to_i12),
    entry!(Kind::Ci12, Kind::Cf32, 1, 1, Rank::Generic, generic::i12_to_f32, generic::size_i12_to_f32),
    entry!(Kind::Cf32, Kind::Ci12, 1, 1, Rank::Generic, generic::f32_to_i12, generic::size_f32_to_i12),
    entry!(Kind::I12, Kind::I16, 1, 1, Rank::Generic, generic::i12_to_i16, generic::size_i12_to_i16),
    entry!(Kind::I16, Kind::I12, 1, 1, Rank::Generic, generic::i16_to_i12, generic::size_i16_to_i12),
    entry!(Kind::Ci12, Kind::Ci16, 1, 1, Rank::Generic, generic::i12_to_i16, generic::size_i12_to_i16),
    entry!(Kind::Ci16, Kind::Ci12, 1, 1, Rank::Generic, generic::i16_to_i12, generic::size_i16_to_i12),
    // Demultiplex-with-convert: one interleaved wire stream -> N host streams.
    entry!(Kind::Ci16, Kind::Cf32, 1, 2, Rank::Generic, generic::demux2_ci16_to_cf32, generic::size_i16_to_f32),
    entry!(Kind::Ci16, Kind::Cf32, 1, 4, Rank::Generic, generic::demux4_ci16_to_cf32, generic::size_i16_to_f32),
    entry!(Kind::Ci12, Kind::Cf32, 1, 2, Rank::Generic, generic::demux2_ci12_to_cf32, generic::size_i12_to_f32),
    entry!(Kind::Ci12, Kind::Cf32, 1, 4, Rank::Generic, generic::demux4_ci12_to_cf32, generic::size_i12_to_f32),
    // Multiplex-with-convert: N host streams -> one interleaved wire stream.
    entry!(Kind::Cf32, Kind::Ci16, 2, 1, Rank::Generic, generic::mux2_cf32_to_ci16, generic::size_f32_to_i16),
    entry!(Kind::Cf32, Kind::Ci16, 4, 1, Rank::Generic, generic::mux4_cf32_to_ci16, generic::size_f32_to_i16),
    entry!(Kind::Cf32, Kind::Ci12, 2, 1, Rank::Generic, generic::mux2_cf32_to_ci12, generic::size_f32_to_i12),
    entry!(Kind::Cf32, Kind::Ci12, 4, 1, Rank::Generic, generic::mux4_cf32_to_ci12, generic::size_f32_to_i12),
    // Zero-cost lane demultiplex: same wire format, just split across streams.
    entry!(Kind::Ci16, Kind::Ci16, 1, 2, Rank::Generic, generic::demux2_lanes::<2>, generic::size_identity),
    entry!(Kind::Ci16, Kind::Ci16, 1, 4, Rank::Generic, generic::demux2_lanes::<4>, generic::size_identity),
    entry!(Kind::Ci16, Kind::Ci16, 2, 1, Rank::Generic, generic::mux2_lanes::<2>, generic::size_identity),
    entry!(Kind::Ci16, Kind::Ci16, 4, 1, Rank::Generic, generic::mux2_lanes::<4>, generic::size_identity),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::Ci16, Kind::Ci16, 1, 2, Rank::Avx2, avx2::demux2_lanes_avx2, generic::size_identity),
    #[cfg(target_arch = "x86_64")]
    entry!(Kind::Ci16, Kind::Ci16, 2, 1, Rank::Avx2, avx2::mux2_lanes_avx2, generic::size_identity),
    #[cfg(target_arch = "aarch64")]
    entry!(Kind::Ci16, Kind::Ci16, 1, 2, Rank::Neon, neon::demux2_lanes_neon, generic::size_identity),
    #[cfg(target_arch = "aarch64")]
    entry!(Kind::Ci16, Kind::Ci16, 2, 1, Rank::Neon, neon::mux2_lanes_neon, generic::size_identity),
];

fn identity_convert(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], _out_bytes: usize) {
    outputs[0][..in_bytes].copy_from_slice(&inputs[0][..in_bytes]);
}

/// Looks up the fastest available kernel for `(from, to)` at the given
/// fan-in/fan-out. Falls back to a byte-identity copy (`size = |n| n`) if
/// no kernel is registered for the pair at all, matching the documented
/// "dummy transform" fallback.
pub fn get_transform(from: Kind, to: Kind, in_vecs: u8, out_vecs: u8) -> Transform {
    let cap = vcap_get();
    TABLE
        .iter()
        .filter(|e| e.from == from && e.to == to && e.in_vecs == in_vecs && e.out_vecs == out_vecs && e.rank <= cap)
        .max_by_key(|e| e.rank)
        .map(|e| Transform {
            convert: e.convert,
            size: e.size,
            name: e.name,
        })
        .unwrap_or(Transform {
            convert: identity_convert,
            size: generic::size_identity,
            name: "identity",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_pair_falls_back_to_identity() {
        let t = get_transform(Kind::I8, Kind::Ci8, 1, 1);
        assert_eq!(t.name, "identity");
        let input: &[u8] = &[1, 2, 3, 4];
        let mut out = vec![0u8; 4];
        let inputs: [&[u8]; 1] = [input];
        let mut outputs: [&mut [u8]; 1] = [&mut out];
        (t.convert)(&inputs, 4, &mut outputs, 4);
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn registered_pair_resolves_to_generic_at_minimum() {
        let t = get_transform(Kind::I16, Kind::F32, 1, 1);
        assert_ne!(t.name, "identity");
    }

    #[test]
    fn dispatch_never_exceeds_host_capability() {
        let cap = vcap_get();
        for entry in TABLE {
            if entry.from == Kind::I16 && entry.to == Kind::F32 && entry.in_vecs == 1 && entry.out_vecs == 1 {
                assert!(entry.rank <= cap || cap < entry.rank);
            }
        }
    }
}
