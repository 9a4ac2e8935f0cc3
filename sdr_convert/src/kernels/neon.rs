//! NEON kernels. NEON is part of the aarch64 baseline (see
//! `sdr_core::cpu`), so these are always eligible once compiled for
//! `aarch64` — there is no separate runtime probe the way `x86_64` needs one.

use std::arch::aarch64::*;

use super::generic::{I16_SCALE, demux2_lanes, f32_to_i16_scalar, i16_to_f32_scalar, mux2_lanes};

const LANE_SAMPLES: usize = 4;

#[target_feature(enable = "neon")]
unsafe fn i16_to_f32_neon_impl(src: &[u8], dst: &mut [u8]) {
    let chunks = src.len() / (LANE_SAMPLES * 2);
    let scale = unsafe { vdupq_n_f32(1.0 / I16_SCALE) };
    for i in 0..chunks {
        let in_off = i * LANE_SAMPLES * 2;
        let out_off = i * LANE_SAMPLES * 4;
        let raw = unsafe { vld1_s16(src[in_off..].as_ptr() as *const i16) };
        let widened = unsafe { vmovl_s16(raw) };
        let floats = unsafe { vmulq_f32(vcvtq_f32_s32(widened), scale) };
        unsafe { vst1q_f32(dst[out_off..].as_mut_ptr() as *mut f32, floats) };
    }
    let tail_in = chunks * LANE_SAMPLES * 2;
    let tail_out = chunks * LANE_SAMPLES * 4;
    i16_to_f32_scalar(&src[tail_in..], &mut dst[tail_out..]);
}

pub fn i16_to_f32_neon(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize) {
    unsafe { i16_to_f32_neon_impl(&inputs[0][..in_bytes], &mut outputs[0][..out_bytes]) };
}

#[target_feature(enable = "neon")]
unsafe fn f32_to_i16_neon_impl(src: &[u8], dst: &mut [u8]) {
    let chunks = src.len() / (LANE_SAMPLES * 4);
    let scale = unsafe { vdupq_n_f32(I16_SCALE) };
    for i in 0..chunks {
        let in_off = i * LANE_SAMPLES * 4;
        let out_off = i * LANE_SAMPLES * 2;
        let floats = unsafe { vld1q_f32(src[in_off..].as_ptr() as *const f32) };
        let scaled = unsafe { vmulq_f32(floats, scale) };
        let ints = unsafe { vcvtq_s32_f32(scaled) };
        let narrowed = unsafe { vqmovn_s32(ints) };
        unsafe { vst1_s16(dst[out_off..].as_mut_ptr() as *mut i16, narrowed) };
    }
    let tail_in = chunks * LANE_SAMPLES * 4;
    let tail_out = chunks * LANE_SAMPLES * 2;
    f32_to_i16_scalar(&src[tail_in..], &mut dst[tail_out..]);
}

pub fn f32_to_i16_neon(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], out_bytes: usize) {
    unsafe { f32_to_i16_neon_impl(&inputs[0][..in_bytes], &mut outputs[0][..out_bytes]) };
}

/// `vld2q_u32` deinterleaves two streams of `u32` directly — each `ci16`
/// sample is one `u32` lane, so this is exactly the round-robin split we want.
#[target_feature(enable = "neon")]
unsafe fn demux2_lanes_neon_impl(src: &[u8], out0: &mut [u8], out1: &mut [u8]) {
    const VEC_SAMPLES: usize = 8;
    let chunks = src.len() / (VEC_SAMPLES * 4);
    for i in 0..chunks {
        let in_off = i * VEC_SAMPLES * 4;
        let out_off = i * (VEC_SAMPLES / 2) * 4;
        let deinterleaved = unsafe { vld2q_u32(src[in_off..].as_ptr() as *const u32) };
        unsafe {
            vst1q_u32(out0[out_off..].as_mut_ptr() as *mut u32, deinterleaved.0);
            vst1q_u32(out1[out_off..].as_mut_ptr() as *mut u32, deinterleaved.1);
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

pub fn demux2_lanes_neon(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], _out_bytes: usize) {
    let src = &inputs[0][..in_bytes];
    let (out0, rest) = outputs.split_at_mut(1);
    unsafe { demux2_lanes_neon_impl(src, out0[0], rest[0]) };
}

#[target_feature(enable = "neon")]
unsafe fn mux2_lanes_neon_impl(in0: &[u8], in1: &[u8], dst: &mut [u8]) {
    const VEC_SAMPLES: usize = 4;
    let chunks = in0.len() / (VEC_SAMPLES * 4);
    for i in 0..chunks {
        let in_off = i * VEC_SAMPLES * 4;
        let out_off = i * VEC_SAMPLES * 2 * 4;
        let a = unsafe { vld1q_u32(in0[in_off..].as_ptr() as *const u32) };
        let b = unsafe { vld1q_u32(in1[in_off..].as_ptr() as *const u32) };
        unsafe { vst2q_u32(dst[out_off..].as_mut_ptr() as *mut u32, uint32x4x2_t(a, b)) };
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

pub fn mux2_lanes_neon(inputs: &[&[u8]], in_bytes: usize, outputs: &mut [&mut [u8]], _out_bytes: usize) {
    unsafe { mux2_lanes_neon_impl(&inputs[0][..in_bytes], &inputs[1][..in_bytes], outputs[0]) };
}
