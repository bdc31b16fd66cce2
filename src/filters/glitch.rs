//! Stage 3: spatial glitch effects.
//!
//! A family of independently gated effects, each enabled by its own
//! intensity setting (0 = no-op, otherwise intensity = value/100). They
//! run in a fixed sequence; each effect reads a snapshot of the buffer
//! as it stood when that effect started and writes into the live buffer,
//! so one effect's output becomes the next one's input.
//!
//! Every sampled coordinate is clamped to the buffer edge - displaced
//! reads never wrap around.
//!
//! This is the performance-dominant stage (each effect is O(w*h) over
//! the full-resolution buffer), so the effects whose noise is a pure
//! function of pixel coordinates and the stage-entry seed are
//! row-parallel; effects that draw from the seed sequentially stay
//! single-threaded to keep output byte-identical.

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use super::{clamp_u8, rows_to_array, sample_clamped};
use crate::noise::NoiseSeed;
use crate::settings::Settings;

/// Rows per scanline band.
const SCANLINE_BAND: usize = 4;
/// Edge length of a shuffle block in pixels.
const SHUFFLE_BLOCK: usize = 16;

/// Apply the spatial glitch stage.
pub fn spatial_glitch(
    input: ArrayView3<u8>,
    settings: &Settings,
    seed: &mut NoiseSeed,
) -> Array3<u8> {
    let mut buf = input.to_owned();

    if settings.glitch_scanline > 0.0 {
        scanline_shift(&mut buf, settings.glitch_scanline / 100.0, seed);
    }
    if settings.glitch_chromatic > 0.0 {
        chromatic_offset(&mut buf, settings.glitch_chromatic / 100.0, Direction::Horizontal);
    }
    if settings.glitch_rgb_split > 0.0 {
        rgb_split(&mut buf, settings.glitch_rgb_split / 100.0, seed);
    }
    if settings.glitch_invert > 0.0 {
        invert_rows(&mut buf, settings.glitch_invert / 100.0, seed);
    }
    if settings.glitch_vhs > 0.0 {
        vhs(&mut buf, settings.glitch_vhs / 100.0, seed);
    }
    if settings.glitch_chromatic_vertical > 0.0 {
        chromatic_offset(
            &mut buf,
            settings.glitch_chromatic_vertical / 100.0,
            Direction::Vertical,
        );
    }
    if settings.glitch_chromatic_diagonal > 0.0 {
        chromatic_offset(
            &mut buf,
            settings.glitch_chromatic_diagonal / 100.0,
            Direction::Diagonal,
        );
    }
    if settings.glitch_pixel_shuffle > 0.0 {
        pixel_shuffle(&mut buf, settings.glitch_pixel_shuffle / 100.0, seed);
    }
    if settings.glitch_wave > 0.0 {
        wave(&mut buf, settings.glitch_wave / 100.0, seed);
    }

    buf
}

/// Band-wise horizontal displacement gated by seeded probability.
///
/// Each band of [`SCANLINE_BAND`] rows rolls its own gate; bands that
/// fire are shifted as a unit.
fn scanline_shift(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    let src = buf.clone();
    let src = src.view();

    let bands = height.div_ceil(SCANLINE_BAND);
    for band in 0..bands {
        let gate = seed.next();
        if gate >= intensity * 0.4 {
            continue;
        }
        let offset = ((seed.next() - 0.5) * intensity * width as f32 * 0.3).round() as isize;
        let y_end = ((band + 1) * SCANLINE_BAND).min(height);
        for y in band * SCANLINE_BAND..y_end {
            for x in 0..width {
                for c in 0..3 {
                    buf[[y, x, c]] = sample_clamped(&src, x as isize - offset, y as isize, c);
                }
            }
        }
    }
}

/// Axis along which a chromatic offset displaces the R and B channels.
#[derive(Clone, Copy)]
enum Direction {
    Horizontal,
    Vertical,
    Diagonal,
}

/// Chromatic aberration: R and B sampled at mirrored offsets, G fixed.
///
/// The offset is proportional to intensity and to the image width, so
/// the fringe width stays consistent across resolutions.
fn chromatic_offset(buf: &mut Array3<u8>, intensity: f32, direction: Direction) {
    let (height, width, _) = buf.dim();
    let offset = (intensity * width as f32 * 0.02).round().max(1.0) as isize;
    let (dx, dy) = match direction {
        Direction::Horizontal => (offset, 0),
        Direction::Vertical => (0, offset),
        Direction::Diagonal => (offset, offset),
    };

    let src = buf.clone();
    let src = src.view();
    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let yi = y as isize;
            for x in 0..width {
                let xi = x as isize;
                row[x * 4] = sample_clamped(&src, xi - dx, yi - dy, 0);
                row[x * 4 + 1] = src[[y, x, 1]];
                row[x * 4 + 2] = sample_clamped(&src, xi + dx, yi + dy, 2);
                row[x * 4 + 3] = src[[y, x, 3]];
            }
        });
    *buf = rows_to_array(rows, height, width);
}

/// Independent per-pixel, per-channel random horizontal offsets.
fn rgb_split(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    let cursor = *seed;
    let src = buf.clone();
    let src = src.view();

    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let index = (y * width + x) * 3;
                for c in 0..3 {
                    let n = cursor.at((index + c) as f32 * 0.173);
                    let dx = ((n - 0.5) * intensity * 24.0).round() as isize;
                    row[x * 4 + c] = sample_clamped(&src, x as isize + dx, y as isize, c);
                }
                row[x * 4 + 3] = src[[y, x, 3]];
            }
        });
    *buf = rows_to_array(rows, height, width);
    seed.advance(1.0);
}

/// Row-gated full color invert.
fn invert_rows(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    for y in 0..height {
        let gate = seed.next();
        if gate >= intensity * 0.2 {
            continue;
        }
        for x in 0..width {
            for c in 0..3 {
                buf[[y, x, c]] = 255 - buf[[y, x, c]];
            }
        }
    }
}

/// VHS tracking: jittered row shift plus banded darkening.
fn vhs(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    let phase = seed.next() * std::f32::consts::TAU;
    let cursor = *seed;
    let src = buf.clone();
    let src = src.view();

    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let yf = y as f32;
            let wobble = (yf * 0.25 + phase).sin() * intensity * 8.0;
            let jitter = (cursor.at(yf * 1.37) - 0.5) * intensity * 6.0;
            let shift = (wobble + jitter).round() as isize;
            // Every other band drops brightness like worn tape.
            let darken = if (y / SCANLINE_BAND) % 2 == 0 {
                1.0 - 0.25 * intensity
            } else {
                1.0
            };
            for x in 0..width {
                for c in 0..3 {
                    let v = sample_clamped(&src, x as isize - shift, y as isize, c);
                    row[x * 4 + c] = clamp_u8(v as f32 * darken);
                }
                row[x * 4 + 3] = src[[y, x, 3]];
            }
        });
    *buf = rows_to_array(rows, height, width);
    seed.advance(1.0);
}

/// Grid of blocks randomly displaced as whole units.
fn pixel_shuffle(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    let src = buf.clone();
    let src = src.view();

    let reach = intensity * SHUFFLE_BLOCK as f32 * 4.0;
    for by in 0..height.div_ceil(SHUFFLE_BLOCK) {
        for bx in 0..width.div_ceil(SHUFFLE_BLOCK) {
            let gate = seed.next();
            if gate >= intensity * 0.5 {
                continue;
            }
            let dx = ((seed.next() - 0.5) * reach).round() as isize;
            let dy = ((seed.next() - 0.5) * reach).round() as isize;

            let y_end = ((by + 1) * SHUFFLE_BLOCK).min(height);
            let x_end = ((bx + 1) * SHUFFLE_BLOCK).min(width);
            for y in by * SHUFFLE_BLOCK..y_end {
                for x in bx * SHUFFLE_BLOCK..x_end {
                    for c in 0..3 {
                        buf[[y, x, c]] =
                            sample_clamped(&src, x as isize + dx, y as isize + dy, c);
                    }
                }
            }
        }
    }
}

/// Sinusoidal horizontal displacement as a function of row.
fn wave(buf: &mut Array3<u8>, intensity: f32, seed: &mut NoiseSeed) {
    let (height, width, _) = buf.dim();
    let phase = seed.next() * std::f32::consts::TAU;
    let amplitude = intensity * width as f32 * 0.04;
    let src = buf.clone();
    let src = src.view();

    let mut rows = vec![0u8; height * width * 4];
    rows.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let shift = ((y as f32 * 0.08 + phase).sin() * amplitude).round() as isize;
            for x in 0..width {
                for c in 0..3 {
                    row[x * 4 + c] = sample_clamped(&src, x as isize - shift, y as isize, c);
                }
                row[x * 4 + 3] = src[[y, x, 3]];
            }
        });
    *buf = rows_to_array(rows, height, width);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Array3<u8> {
        let mut img = Array3::<u8>::zeros((height, width, 4));
        for y in 0..height {
            for x in 0..width {
                img[[y, x, 0]] = (x * 255 / width.max(1)) as u8;
                img[[y, x, 1]] = (y * 255 / height.max(1)) as u8;
                img[[y, x, 2]] = 128;
                img[[y, x, 3]] = 255;
            }
        }
        img
    }

    #[test]
    fn test_all_gates_closed_is_identity() {
        let img = gradient(16, 16);
        let mut seed = NoiseSeed::new(1.0);
        let result = spatial_glitch(img.view(), &Settings::default(), &mut seed);
        assert_eq!(result, img);
        assert_eq!(seed.value(), 1.0);
    }

    #[test]
    fn test_stage_is_deterministic() {
        let img = gradient(24, 24);
        let mut s = Settings::default();
        s.glitch_scanline = 80.0;
        s.glitch_rgb_split = 50.0;
        s.glitch_vhs = 60.0;
        s.glitch_pixel_shuffle = 70.0;
        s.glitch_wave = 40.0;

        let mut seed_a = NoiseSeed::new(9.0);
        let mut seed_b = NoiseSeed::new(9.0);
        let a = spatial_glitch(img.view(), &s, &mut seed_a);
        let b = spatial_glitch(img.view(), &s, &mut seed_b);
        assert_eq!(a, b);
        assert_eq!(seed_a.value(), seed_b.value());
    }

    #[test]
    fn test_different_seed_diverges() {
        let img = gradient(24, 24);
        let mut s = Settings::default();
        s.glitch_rgb_split = 90.0;
        let mut seed_a = NoiseSeed::new(1.0);
        let mut seed_b = NoiseSeed::new(200.0);
        let a = spatial_glitch(img.view(), &s, &mut seed_a);
        let b = spatial_glitch(img.view(), &s, &mut seed_b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chromatic_swaps_red_blue_fringe() {
        let img = gradient(32, 8);
        let mut s = Settings::default();
        s.glitch_chromatic = 100.0;
        let mut seed = NoiseSeed::new(0.0);
        let result = spatial_glitch(img.view(), &s, &mut seed);
        // Green never moves.
        for y in 0..8 {
            for x in 0..32 {
                assert_eq!(result[[y, x, 1]], img[[y, x, 1]]);
                assert_eq!(result[[y, x, 3]], 255);
            }
        }
        // Red is displaced along the horizontal gradient.
        assert_ne!(result.index_axis(ndarray::Axis(2), 0), img.index_axis(ndarray::Axis(2), 0));
    }

    #[test]
    fn test_invert_rows_full_intensity_inverts_some_rows() {
        let img = gradient(8, 64);
        let mut s = Settings::default();
        s.glitch_invert = 100.0;
        let mut seed = NoiseSeed::new(4.0);
        let result = spatial_glitch(img.view(), &s, &mut seed);
        // Blue is uniformly 128, so inverted rows read exactly 127.
        let mut inverted_rows = 0;
        for y in 0..64 {
            if result[[y, 0, 2]] == 127 {
                inverted_rows += 1;
            } else {
                assert_eq!(result[[y, 0, 2]], 128);
            }
        }
        // Gate probability is 0.2 at full intensity; 64 rows should fire a few.
        assert!(inverted_rows > 0);
        assert!(inverted_rows < 64);
    }

    #[test]
    fn test_wave_preserves_row_content_on_uniform_rows() {
        // Rows are uniform horizontally, so a pure horizontal shift with
        // edge clamping cannot change them.
        let mut img = Array3::<u8>::zeros((16, 16, 4));
        for y in 0..16 {
            for x in 0..16 {
                img[[y, x, 0]] = (y * 16) as u8;
                img[[y, x, 3]] = 255;
            }
        }
        let mut s = Settings::default();
        s.glitch_wave = 100.0;
        let mut seed = NoiseSeed::new(2.0);
        let result = spatial_glitch(img.view(), &s, &mut seed);
        assert_eq!(result, img);
    }

    #[test]
    fn test_effects_never_panic_on_tiny_buffers() {
        let img = gradient(1, 1);
        let mut s = Settings::default();
        for key in Settings::KEYS.iter().filter(|k| k.starts_with("glitch-")) {
            s.set(key, 100.0);
        }
        let mut seed = NoiseSeed::new(0.0);
        let result = spatial_glitch(img.view(), &s, &mut seed);
        assert_eq!(result.dim(), (1, 1, 4));
    }
}
