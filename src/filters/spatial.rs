//! Stage 4: complex spatial filters.
//!
//! Pixel grain, Floyd-Steinberg error diffusion, kaleidoscope, vortex
//! twist and Sobel edge detection, each gated by its own setting and
//! applied in that fixed order.
//!
//! The coordinate remaps (kaleidoscope, vortex) sample nearest-neighbor
//! from the effect's source snapshot; edge detection runs per channel
//! independently, which yields colored rather than grayscale edges -
//! that is the intended look and is preserved.

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use super::{clamp_u8, rows_to_array, sample_clamped};
use crate::noise::NoiseSeed;
use crate::settings::Settings;

/// Apply the complex spatial stage.
pub fn complex_spatial(
    input: ArrayView3<u8>,
    settings: &Settings,
    seed: &mut NoiseSeed,
) -> Array3<u8> {
    let mut buf = input.to_owned();

    if settings.pixel_grain > 0.0 {
        grain(&mut buf, settings.pixel_grain / 100.0, seed);
    }
    if settings.pixel_dither > 0.0 {
        dither(&mut buf, settings.pixel_dither / 100.0);
    }
    let segments = settings.kaleidoscope_segments.round() as i32;
    if segments >= 2 {
        kaleidoscope(&mut buf, segments.min(32) as u32, settings.kaleidoscope_offset);
    }
    if settings.vortex_twist > 0.0 {
        vortex(&mut buf, settings.vortex_twist / 100.0);
    }
    if settings.edge_detect > 0.0 {
        edge_detect(&mut buf, settings.edge_detect / 100.0);
    }

    buf
}

/// Uniform seeded additive noise, drawn independently per channel.
///
/// Unlike the tone stage's luminance noise this is not monochrome and
/// not gated by brightness.
fn grain(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    let amplitude = intensity * 80.0;
    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                let n = (seed.next() - 0.5) * amplitude;
                buf[[y, x, c]] = clamp_u8(buf[[y, x, c]] as f32 + n);
            }
        }
    }
}

/// Floyd-Steinberg error diffusion across the three color channels.
///
/// Intensity controls how coarse the quantization is: faint settings
/// keep 8 levels per channel, full intensity collapses to 2.
fn dither(buf: &mut Array3<u8>, intensity: f32) {
    let (height, width, _) = buf.dim();
    let levels = (8.0 - intensity * 6.0).round().max(2.0);
    let step = levels - 1.0;

    // Working copy in floats so diffused error survives between pixels.
    let mut work = buf.mapv(|v| v as f32);

    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                let old = work[[y, x, c]];
                let new = ((old / 255.0 * step).round() / step * 255.0).clamp(0.0, 255.0);
                let err = old - new;
                work[[y, x, c]] = new;

                if x + 1 < width {
                    work[[y, x + 1, c]] += err * 7.0 / 16.0;
                }
                if y + 1 < height {
                    if x > 0 {
                        work[[y + 1, x - 1, c]] += err * 3.0 / 16.0;
                    }
                    work[[y + 1, x, c]] += err * 5.0 / 16.0;
                    if x + 1 < width {
                        work[[y + 1, x + 1, c]] += err * 1.0 / 16.0;
                    }
                }
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                buf[[y, x, c]] = clamp_u8(work[[y, x, c]]);
            }
        }
    }
}

/// Radial mirror-and-rotate: N angular segments around the center with
/// alternating mirror flips, sampled nearest-neighbor from the source.
fn kaleidoscope(buf: &mut Array3<u8>, segments: u32, offset_degrees: f32) {
    let (height, width, _) = buf.dim();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let segment_angle = std::f32::consts::TAU / segments as f32;
    let offset = offset_degrees.to_radians();

    let src = buf.clone();
    let src = src.view();
    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f32 - cy;
            for x in 0..width {
                let dx = x as f32 - cx;
                let radius = (dx * dx + dy * dy).sqrt();
                let angle = (dy.atan2(dx) - offset).rem_euclid(std::f32::consts::TAU);

                let index = (angle / segment_angle).floor();
                let mut local = angle - index * segment_angle;
                if (index as i32) % 2 == 1 {
                    local = segment_angle - local;
                }
                let source_angle = local + offset;

                let sx = (cx + radius * source_angle.cos()).round() as isize;
                let sy = (cy + radius * source_angle.sin()).round() as isize;
                for c in 0..4 {
                    row[x * 4 + c] = sample_clamped(&src, sx, sy, c);
                }
            }
        });
    *buf = rows_to_array(rows, height, width);
}

/// Polar remap: the angle offset grows with distance from the center
/// and with intensity, up to a full turn at the corners.
fn vortex(buf: &mut Array3<u8>, intensity: f32) {
    let (height, width, _) = buf.dim();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let max_radius = (cx * cx + cy * cy).sqrt().max(1.0);

    let src = buf.clone();
    let src = src.view();
    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f32 - cy;
            for x in 0..width {
                let dx = x as f32 - cx;
                let radius = (dx * dx + dy * dy).sqrt();
                let twist = intensity * (radius / max_radius) * std::f32::consts::TAU;
                let angle = dy.atan2(dx) + twist;

                let sx = (cx + radius * angle.cos()).round() as isize;
                let sy = (cy + radius * angle.sin()).round() as isize;
                for c in 0..4 {
                    row[x * 4 + c] = sample_clamped(&src, sx, sy, c);
                }
            }
        });
    *buf = rows_to_array(rows, height, width);
}

/// Sobel edge detection, per channel.
///
/// Magnitude `sqrt(gx^2 + gy^2)` scaled by intensity replaces each
/// channel value. Border pixels have no full 3x3 neighborhood and are
/// set to zero, alpha preserved.
fn edge_detect(buf: &mut Array3<u8>, intensity: f32) {
    let (height, width, _) = buf.dim();
    const KERNEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
    const KERNEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

    let src = buf.clone();
    let src = src.view();
    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let interior = y > 0 && y + 1 < height && x > 0 && x + 1 < width;
                for c in 0..3 {
                    if !interior {
                        row[x * 4 + c] = 0;
                        continue;
                    }
                    let mut gx = 0i32;
                    let mut gy = 0i32;
                    for ky in 0..3 {
                        for kx in 0..3 {
                            let v = src[[y + ky - 1, x + kx - 1, c]] as i32;
                            gx += v * KERNEL_X[ky][kx];
                            gy += v * KERNEL_Y[ky][kx];
                        }
                    }
                    let magnitude = ((gx * gx + gy * gy) as f32).sqrt() * intensity;
                    row[x * 4 + c] = clamp_u8(magnitude);
                }
                row[x * 4 + 3] = src[[y, x, 3]];
            }
        });
    *buf = rows_to_array(rows, height, width);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Array3<u8> {
        let mut img = Array3::<u8>::zeros((height, width, 4));
        for y in 0..height {
            for x in 0..width {
                for c in 0..4 {
                    img[[y, x, c]] = rgba[c];
                }
            }
        }
        img
    }

    fn gradient(width: usize, height: usize) -> Array3<u8> {
        let mut img = Array3::<u8>::zeros((height, width, 4));
        for y in 0..height {
            for x in 0..width {
                img[[y, x, 0]] = (x * 255 / width.max(1)) as u8;
                img[[y, x, 1]] = (y * 255 / height.max(1)) as u8;
                img[[y, x, 2]] = ((x + y) * 10 % 256) as u8;
                img[[y, x, 3]] = 255;
            }
        }
        img
    }

    #[test]
    fn test_all_gates_closed_is_identity() {
        let img = gradient(10, 10);
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &Settings::default(), &mut seed);
        assert_eq!(result, img);
    }

    #[test]
    fn test_grain_deterministic_and_clamped() {
        let img = solid(6, 6, [200, 30, 128, 255]);
        let mut s = Settings::default();
        s.pixel_grain = 100.0;
        let mut seed_a = NoiseSeed::new(8.0);
        let mut seed_b = NoiseSeed::new(8.0);
        let a = complex_spatial(img.view(), &s, &mut seed_a);
        let b = complex_spatial(img.view(), &s, &mut seed_b);
        assert_eq!(a, b);
        // Something actually changed.
        assert_ne!(a, img);
        // Alpha untouched.
        assert_eq!(a[[3, 3, 3]], 255);
    }

    #[test]
    fn test_dither_full_intensity_is_two_level() {
        let img = solid(8, 8, [128, 128, 128, 255]);
        let mut s = Settings::default();
        s.pixel_dither = 100.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        let mut saw_black = false;
        let mut saw_white = false;
        for y in 0..8 {
            for x in 0..8 {
                for c in 0..3 {
                    let v = result[[y, x, c]];
                    assert!(v == 0 || v == 255, "got intermediate level {v}");
                    saw_black |= v == 0;
                    saw_white |= v == 255;
                }
            }
        }
        // Mid gray must diffuse into a mix of both extremes.
        assert!(saw_black && saw_white);
    }

    #[test]
    fn test_kaleidoscope_uniform_stays_uniform() {
        let img = solid(9, 9, [10, 200, 60, 255]);
        let mut s = Settings::default();
        s.kaleidoscope_segments = 6.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        assert_eq!(result, img);
    }

    #[test]
    fn test_kaleidoscope_two_segments_mirrors_lower_half() {
        let img = gradient(8, 8);
        let mut s = Settings::default();
        s.kaleidoscope_segments = 2.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        // With two segments the lower half (positive angles) maps to
        // itself and the upper half is its mirror across the center row.
        for y in 4..8 {
            for x in 0..8 {
                for c in 0..3 {
                    assert_eq!(result[[y, x, c]], img[[y, x, c]], "lower half moved");
                    assert_eq!(result[[7 - y, x, c]], img[[y, x, c]], "mirror broken");
                }
            }
        }
    }

    #[test]
    fn test_vortex_uniform_stays_uniform() {
        let img = solid(12, 12, [77, 77, 200, 255]);
        let mut s = Settings::default();
        s.vortex_twist = 100.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        assert_eq!(result, img);
    }

    #[test]
    fn test_vortex_moves_structured_pixels() {
        let img = gradient(16, 16);
        let mut s = Settings::default();
        s.vortex_twist = 100.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        assert_ne!(result, img);
    }

    #[test]
    fn test_edge_detect_uniform_is_all_zero() {
        let img = solid(8, 8, [180, 90, 45, 255]);
        let mut s = Settings::default();
        s.edge_detect = 100.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        for y in 0..8 {
            for x in 0..8 {
                for c in 0..3 {
                    assert_eq!(result[[y, x, c]], 0);
                }
                assert_eq!(result[[y, x, 3]], 255);
            }
        }
    }

    #[test]
    fn test_edge_detect_finds_vertical_edge() {
        let mut img = solid(8, 8, [0, 0, 0, 255]);
        for y in 0..8 {
            for x in 4..8 {
                img[[y, x, 0]] = 255;
                img[[y, x, 1]] = 255;
                img[[y, x, 2]] = 255;
            }
        }
        let mut s = Settings::default();
        s.edge_detect = 100.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = complex_spatial(img.view(), &s, &mut seed);
        // Strong response along the boundary column, none far from it.
        assert!(result[[4, 4, 0]] > 0);
        assert_eq!(result[[4, 6, 0]], 0);
    }
}
