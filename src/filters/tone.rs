//! Stage 2: tone, vibrance and seeded noise.
//!
//! Runs after the basic color stage: a second temperature pass, vibrance
//! (push channels away from the pixel average), a highlights/shadows
//! split at the mid luminance, and monochrome seeded noise.
//!
//! Temperature is applied again here with the same formula as stage 1;
//! the two passes layer on top of each other and that layering is part
//! of the effect's look, so it is kept rather than unified.
//!
//! The noise amplitude is multiplied by a resolution scale factor so a
//! downscaled preview shows the same apparent grain as the full-size
//! render.

use ndarray::{Array3, ArrayView3};

use super::clamp_u8;
use super::color::percent_factor;
use crate::noise::NoiseSeed;
use crate::settings::Settings;

/// Apply the tone/vibrance/noise stage.
///
/// Advances `seed` once per pixel while noise is enabled, so a following
/// stage never re-draws the same values.
pub fn tone_vibrance_noise(
    input: ArrayView3<u8>,
    settings: &Settings,
    seed: &mut NoiseSeed,
    noise_scale: f32,
) -> Array3<u8> {
    let (height, width, _) = input.dim();
    let mut output = Array3::<u8>::zeros((height, width, 4));

    let temperature_factor = (settings.temperature - 100.0) / 100.0;
    let vibrance = settings.vibrance / 100.0;
    let highlights_factor = percent_factor(settings.highlights);
    let shadows_factor = percent_factor(settings.shadows);
    let noise_amplitude = settings.noise * noise_scale;

    for y in 0..height {
        for x in 0..width {
            let mut r = input[[y, x, 0]] as f32;
            let mut g = input[[y, x, 1]] as f32;
            let mut b = input[[y, x, 2]] as f32;

            r += temperature_factor * 50.0;
            b -= temperature_factor * 50.0;

            let avg = (r + g + b) / 3.0;
            r += (r - avg) * vibrance;
            g += (g - avg) * vibrance;
            b += (b - avg) * vibrance;

            let factor = if avg > 128.0 {
                highlights_factor
            } else {
                shadows_factor
            };
            r *= factor;
            g *= factor;
            b *= factor;

            if noise_amplitude != 0.0 {
                // Luminance noise: one draw per pixel, added to all three
                // channels identically.
                let n = (seed.next() - 0.5) * noise_amplitude;
                r += n;
                g += n;
                b += n;
            }

            output[[y, x, 0]] = clamp_u8(r);
            output[[y, x, 1]] = clamp_u8(g);
            output[[y, x, 2]] = clamp_u8(b);
            output[[y, x, 3]] = input[[y, x, 3]];
        }
    }
    output
}
