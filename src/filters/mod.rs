//! The four ordered filter stages of the editing pipeline.
//!
//! Each stage is a pure function `(buffer, settings) -> buffer` over an
//! RGBA `(height, width, 4)` u8 array. The orchestrator folds them in
//! fixed order:
//!
//! 1. [`color`] - brightness, exposure, contrast, grayscale, saturation,
//!    temperature
//! 2. [`tone`] - temperature layer, vibrance, highlights/shadows, seeded
//!    luminance noise
//! 3. [`glitch`] - gated spatial glitch effects (scanline shift, chromatic
//!    offsets, RGB split, invert, VHS, block shuffle, wave)
//! 4. [`spatial`] - grain, error-diffusion dither, kaleidoscope, vortex,
//!    Sobel edge detection
//!
//! Stages are not reorderable; each consumes the previous stage's output.
//! All per-channel arithmetic clamps to 0-255, and spatial effects clamp
//! sampled coordinates to the buffer edge (no wraparound). Alpha is
//! preserved throughout.

use ndarray::{Array3, ArrayView3};

pub mod color;
pub mod glitch;
pub mod spatial;
pub mod tone;

/// Round and clamp a float channel value into 0-255.
#[inline]
pub(crate) fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Sample a channel with edge-clamped coordinates.
#[inline]
pub(crate) fn sample_clamped(src: &ArrayView3<u8>, x: isize, y: isize, c: usize) -> u8 {
    let (height, width, _) = src.dim();
    let sx = x.clamp(0, width as isize - 1) as usize;
    let sy = y.clamp(0, height as isize - 1) as usize;
    src[[sy, sx, c]]
}

/// Reassemble row-major RGBA bytes produced by a row-parallel pass.
#[inline]
pub(crate) fn rows_to_array(rows: Vec<u8>, height: usize, width: usize) -> Array3<u8> {
    Array3::from_shape_vec((height, width, 4), rows).expect("row buffer matches dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_clamp_u8_bounds() {
        assert_eq!(clamp_u8(-10.0), 0);
        assert_eq!(clamp_u8(0.0), 0);
        assert_eq!(clamp_u8(128.4), 128);
        assert_eq!(clamp_u8(300.0), 255);
    }

    #[test]
    fn test_sample_clamped_edges() {
        let mut img = Array3::<u8>::zeros((2, 2, 4));
        img[[0, 0, 0]] = 11;
        img[[1, 1, 0]] = 99;
        let view = img.view();
        assert_eq!(sample_clamped(&view, -5, -5, 0), 11);
        assert_eq!(sample_clamped(&view, 10, 10, 0), 99);
    }
}
