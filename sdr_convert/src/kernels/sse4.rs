//! SSE4.1 kernels for the sign-extend/scale family: the fallback tier for
//! hosts with AVX2 disabled or unavailable but SSE4.1 present.

use std::arch::x86_64::*;

use super::generic::{I16_SCALE, f32_to_i16_scalar, i16_to_f32_scalar};

const LANE_SAMPLES: usize = 4;

#[target_feature(enable = "sse4.1")]
unsafe fn i16_to_f32_sse4_impl(src: &[u8], dst: &mut [u8]) {
    let chunks = src.len() / (LANE_SAMPLES * 2);
    let scale = unsafe { _mm_set1_ps(1.0 / I16_SCALE) };
    for i in 0..chunks {
        let in_off = i * LANE_SAMPLES * 2;
        let out_off = i * LANE_SAMPLES * 4;
        let raw = unsafe { _mm_loadl_epi64(src[in_off..].as_ptr() as *const __m128i) };
        let widened = unsafe { _mm_cvtepi16_epi32(raw) };
        let floats = unsafe { _mm_mul_ps(_mm_cvtepi32_ps(widened), scale) };
        unsafe { _mm_storeu_ps(dst[out_off..].as_mut_ptr() as *mut f32, floats) };
    }
    let tail_in = chunks * LANE_SAMPLES * 2;
    let tail_out = chunks * LANE_SAMPLES * 4;
    i16_to_f32_scalar(&src[tail_in..], &mut dst[tail_out..]);
}

pub fn i16_to_f32_sse4(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize) {
    unsafe { i16_to_f32_sse4_impl(&inputs[0][..in_bytes], &mut outputs[0][..out_bytes]) };
}

#[target_feature(enable = "sse4.1")]
unsafe fn f32_to_i16_sse4_impl(src: &[u8], dst: &mut [u8]) {
    let chunks = src.len() / (LANE_SAMPLES * 4);
    let scale = unsafe { _mm_set1_ps(I16_SCALE) };
    for i in 0..chunks {
        let in_off = i * LANE_SAMPLES * 4;
        let out_off = i * LANE_SAMPLES * 2;
        let floats = unsafe { _mm_loadu_ps(src[in_off..].as_ptr() as *const f32) };
        let scaled = unsafe { _mm_mul_ps(floats, scale) };
        let ints = unsafe { _mm_cvtps_epi32(scaled) };
        let packed = unsafe { _mm_packs_epi32(ints, ints) };
        unsafe { _mm_storel_epi64(dst[out_off..].as_mut_ptr() as *mut __m128i, packed) };
    }
    let tail_in = chunks * LANE_SAMPLES * 4;
    let tail_out = chunks * LANE_SAMPLES * 2;
    f32_to_i16_scalar(&src[tail_in..], &mut dst[tail_out..]);
}

pub fn f32_to_i16_sse4(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize) {
    unsafe { f32_to_i16_sse4_impl(&inputs[0][..in_bytes], &mut outputs[0][..out_bytes]) };
}
