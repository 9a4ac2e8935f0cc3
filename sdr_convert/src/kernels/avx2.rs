//! AVX2 kernels for the sign-extend/scale family and zero-cost lane split.
//!
//! Each public function is a plain `fn` so it coerces to [`crate::registry::ConvertFn`];
//! the actual `#[target_feature]` work happens in a private `_impl` function
//! called through `unsafe`. The registry only ever selects these entries
//! after `vcap_get() >= Rank::Avx2`, so the feature is guaranteed present.

use std::arch::x86_64::*;

use super::generic::{I16_SCALE, demux2_lanes, f32_to_i16_scalar, i16_to_f32_scalar, mux2_lanes};

const LANE_SAMPLES: usize = 8;

#[target_feature(enable = "avx2")]
unsafe fn i16_to_f32_avx2_impl(src: &[u8], dst: &mut [u8]) {
    let chunks = src.len() / (LANE_SAMPLES * 2);
    let scale = _mm256_set1_ps(1.0 / I16_SCALE);
    for i in 0..chunks {
        let in_off = i * LANE_SAMPLES * 2;
        let out_off = i * LANE_SAMPLES * 4;
        let raw = unsafe { _mm_loadu_si128(src[in_off..].as_ptr() as *const __m128i) };
        let widened = unsafe { _mm256_cvtepi16_epi32(raw) };
        let floats = unsafe { _mm256_mul_ps(_mm256_cvtepi32_ps(widened), scale) };
        unsafe { _mm256_storeu_ps(dst[out_off..].as_mut_ptr() as *mut f32, floats) };
    }
    let tail_in = chunks * LANE_SAMPLES * 2;
    let tail_out = chunks * LANE_SAMPLES * 4;
    i16_to_f32_scalar(&src[tail_in..], &mut dst[tail_out..]);
}

pub fn i16_to_f32_avx2(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize) {
    unsafe { i16_to_f32_avx2_impl(&inputs[0][..in_bytes], &mut outputs[0][..out_bytes]) };
}

#[target_feature(enable = "avx2")]
unsafe fn f32_to_i16_avx2_impl(src: &[u8], dst: &mut [u8]) {
    let chunks = src.len() / (LANE_SAMPLES * 4);
    let scale = _mm256_set1_ps(I16_SCALE);
    for i in 0..chunks {
        let in_off = i * LANE_SAMPLES * 4;
        let out_off = i * LANE_SAMPLES * 2;
        let floats = unsafe { _mm256_loadu_ps(src[in_off..].as_ptr() as *const f32) };
        let scaled = unsafe { _mm256_mul_ps(floats, scale) };
        let ints = unsafe { _mm256_cvtps_epi32(scaled) };
        // Saturating pack of 8 i32 lanes into 8 i16 lanes, then fix the
        // cross-128-lane ordering `_mm256_packs_epi32` leaves behind.
        let packed = unsafe { _mm256_packs_epi32(ints, ints) };
        let reordered = unsafe { _mm256_permute4x64_epi64(packed, 0b11_01_10_00) };
        let result = unsafe { _mm256_castsi256_si128(reordered) };
        unsafe { _mm_storeu_si128(dst[out_off..].as_mut_ptr() as *mut __m128i, result) };
    }
    let tail_in = chunks * LANE_SAMPLES * 4;
    let tail_out = chunks * LANE_SAMPLES * 2;
    f32_to_i16_scalar(&src[tail_in..], &mut dst[tail_out..]);
}

pub fn f32_to_i16_avx2(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize) {
    unsafe { f32_to_i16_avx2_impl(&inputs[0][..in_bytes], &mut outputs[0][..out_bytes]) };
}

/// Each `ci16` sample is exactly one 32-bit lane, so splitting 2 lanes is a
/// permute-and-extract: gather even-indexed samples into the low half,
/// odd-indexed into the high half, then store each half to its own stream.
#[target_feature(enable = "avx2")]
unsafe fn demux2_lanes_avx2_impl(src: &[u8], out0: &mut [u8], out1: &mut [u8]) {
    const VEC_SAMPLES: usize = 8;
    let chunks = src.len() / (VEC_SAMPLES * 4);
    let idx = unsafe { _mm256_setr_epi32(0, 2, 4, 6, 1, 3, 5, 7) };
    for i in 0..chunks {
        let in_off = i * VEC_SAMPLES * 4;
        let out_off = i * (VEC_SAMPLES / 2) * 4;
        let v = unsafe { _mm256_loadu_si256(src[in_off..].as_ptr() as *const __m256i) };
        let shuffled = unsafe { _mm256_permutevar8x32_epi32(v, idx) };
        let lo = unsafe { _mm256_castsi256_si128(shuffled) };
        let hi = unsafe { _mm256_extracti128_si256(shuffled, 1) };
        unsafe {
            _mm_storeu_si128(out0[out_off..].as_mut_ptr() as *mut __m128i, lo);
            _mm_storeu_si128(out1[out_off..].as_mut_ptr() as *mut __m128i, hi);
        }
    }
    let tail = src.len() - chunks * VEC_SAMPLES * 4;
    if tail > 0 {
        let tail_start = chunks * VEC_SAMPLES * 4;
        let tail_out = chunks * (VEC_SAMPLES / 2) * 4;
        let inputs: [&[u8]; 1] = [&src[tail_start..]];
        let mut lane_refs: [&mut [u8]; 2] = [&mut out0[tail_out..], &mut out1[tail_out..]];
        demux2_lanes::<2>(&inputs, tail, &mut lane_refs, 0);
    }
}

pub fn demux2_lanes_avx2(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], _out_bytes: usize) {
    let src = &inputs[0][..in_bytes];
    let (out0, rest) = outputs.split_at_mut(1);
    unsafe { demux2_lanes_avx2_impl(src, out0[0], rest[0]) };
}

#[target_feature(enable = "avx2")]
unsafe fn mux2_lanes_avx2_impl(in0: &[u8], in1: &[u8], dst: &mut [u8]) {
    const VEC_SAMPLES: usize = 4;
    let chunks = in0.len() / (VEC_SAMPLES * 4);
    for i in 0..chunks {
        let in_off = i * VEC_SAMPLES * 4;
        let out_off = i * VEC_SAMPLES * 2 * 4;
        let a = unsafe { _mm_loadu_si128(in0[in_off..].as_ptr() as *const __m128i) };
        let b = unsafe { _mm_loadu_si128(in1[in_off..].as_ptr() as *const __m128i) };
        let lo = unsafe { _mm_unpacklo_epi32(a, b) };
        let hi = unsafe { _mm_unpackhi_epi32(a, b) };
        let combined = unsafe { _mm256_inserti128_si256(_mm256_castsi128_si256(lo), hi, 1) };
        unsafe { _mm256_storeu_si256(dst[out_off..].as_mut_ptr() as *mut __m256i, combined) };
    }
    let tail = in0.len() - chunks * VEC_SAMPLES * 4;
    if tail > 0 {
        let tail_start = chunks * VEC_SAMPLES * 4;
        let tail_out = chunks * VEC_SAMPLES * 2 * 4;
        let inputs: [&[u8]; 2] = [&in0[tail_start..], &in1[tail_start..]];
        let mut out: [&mut [u8]; 1] = [&mut dst[tail_out..]];
        mux2_lanes::<2>(&inputs, tail * 2, &mut out, 0);
    }
}

pub fn mux2_lanes_avx2(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], _out_bytes: usize) {
    unsafe { mux2_lanes_avx2_impl(&inputs[0][..in_bytes], &inputs[1][..in_bytes], outputs[0]) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avx2_i16_to_f32_matches_scalar_on_overlap() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let samples: Vec<i16> = (0..64).map(|i| (i * 37 - 512) as i16).collect();
        let mut raw = Vec::new();
        for s in &samples {
            raw.extend_from_slice(&s.to_le_bytes());
        }
        let mut vec_out = vec![0u8; samples.len() * 4];
        let mut scalar_out = vec![0u8; samples.len() * 4];
        i16_to_f32_avx2(&[&raw], raw.len(), &mut [&mut vec_out], vec_out.len());
        i16_to_f32_scalar(&raw, &mut scalar_out);
        assert_eq!(vec_out, scalar_out);
    }

    #[test]
    fn avx2_round_trip_i16_f32() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let samples: Vec<i16> = (0..32).map(|i| (i * 101 - 1024) as i16).collect();
        let mut raw = Vec::new();
        for s in &samples {
            raw.extend_from_slice(&s.to_le_bytes());
        }
        let mut f32_buf = vec![0u8; samples.len() * 4];
        i16_to_f32_avx2(&[&raw], raw.len(), &mut [&mut f32_buf], f32_buf.len());
        let mut back = vec![0u8; raw.len()];
        f32_to_i16_avx2(&[&f32_buf], f32_buf.len(), &mut [&mut back], back.len());
        assert_eq!(raw, back);
    }
}
