//! CPU reference for the grayscale compute kernel.
//!
//! The device kernel computes `u32((r + g + b) / 3.0)` in `f32` and keeps
//! alpha. The functions here do the same arithmetic on the host so device
//! results can be checked bit for bit.

use rayon::prelude::*;

use crate::packed::{HEADER_WORDS, pack_pixel, unpack_pixel};
use crate::surface::{PixelSurface, Rgba8};

/// Invocations per workgroup along each grid axis.
pub const WORKGROUP_SIZE: u32 = 16;

/// Unweighted channel mean, truncated toward zero.
#[inline]
pub fn gray_level(r: u8, g: u8, b: u8) -> u8 {
    let sum = r as f32 + g as f32 + b as f32;
    (sum / 3.0) as u32 as u8
}

/// Grayscale of one pixel; alpha passes through.
#[inline]
pub fn grayscale_pixel(p: Rgba8) -> Rgba8 {
    Rgba8::gray(gray_level(p.r, p.g, p.b), p.a)
}

/// Grayscale of one packed payload word.
#[inline]
pub fn grayscale_packed_word(word: u32) -> u32 {
    pack_pixel(grayscale_pixel(unpack_pixel(word)))
}

/// Grayscale of a whole surface on the CPU.
pub fn reference_grayscale(surface: &PixelSurface) -> PixelSurface {
    let mut out = surface.clone();
    out.pixels_mut().par_iter_mut().for_each(|p| *p = grayscale_pixel(*p));
    out
}

/// Runs every invocation of a `groups.0 x groups.1` dispatch against word buffers.
///
/// Mirrors the device kernel: dimensions come from `input[0..2]`,
/// invocations outside the image return without touching `output`, and
/// the header words of `output` are never written.
pub fn apply_kernel_reference(input: &[u32], output: &mut [u32], groups: (u32, u32)) {
    let (Some(&width), Some(&height)) = (input.first(), input.get(1)) else {
        return;
    };
    let grid_w = groups.0 * WORKGROUP_SIZE;
    let grid_h = groups.1 * WORKGROUP_SIZE;

    for y in 0..grid_h {
        for x in 0..grid_w {
            if x >= width || y >= height {
                continue;
            }
            let idx = y as usize * width as usize + x as usize + HEADER_WORDS;
            if let (Some(&src), Some(dst)) = (input.get(idx), output.get_mut(idx)) {
                *dst = grayscale_packed_word(src);
            }
        }
    }
}
