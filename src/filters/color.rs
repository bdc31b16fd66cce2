//! Stage 1: basic color correction.
//!
//! Pixel-wise adjustments with no spatial context: brightness, exposure,
//! contrast, grayscale mix, saturation and temperature, applied in that
//! exact order within a single pass over the buffer. All parameters are
//! percentages where 100 is neutral, except `grayscale` (0-100, 0 = off).
//!
//! Luminance weights are the BT.601 coefficients (R 0.2989, G 0.5870,
//! B 0.1140); the grayscale and saturation blends share the same gray.

use ndarray::{Array3, ArrayView3};

use super::clamp_u8;
use crate::settings::Settings;

/// BT.601 luminance weights used for the gray blends.
pub const LUMA_R: f32 = 0.2989;
pub const LUMA_G: f32 = 0.5870;
pub const LUMA_B: f32 = 0.1140;

/// Convert a percentage slider (100 = neutral) into a multiplier.
#[inline]
pub(crate) fn percent_factor(value: f32) -> f32 {
    (value - 100.0) / 100.0 + 1.0
}

/// Apply the basic color stage.
///
/// Deterministic given settings; the only side effect is producing the
/// output buffer. Alpha is copied through unchanged.
pub fn basic_color(input: ArrayView3<u8>, settings: &Settings) -> Array3<u8> {
    let (height, width, _) = input.dim();
    let mut output = Array3::<u8>::zeros((height, width, 4));

    let gain = percent_factor(settings.brightness) * percent_factor(settings.exposure);
    let contrast_factor = percent_factor(settings.contrast);
    let gray_mix = (settings.grayscale / 100.0).clamp(0.0, 1.0);
    let saturation_factor = percent_factor(settings.saturation);
    let temperature_factor = (settings.temperature - 100.0) / 100.0;

    for y in 0..height {
        for x in 0..width {
            let mut r = input[[y, x, 0]] as f32;
            let mut g = input[[y, x, 1]] as f32;
            let mut b = input[[y, x, 2]] as f32;

            // Brightness and exposure are a single combined gain.
            r *= gain;
            g *= gain;
            b *= gain;

            r = ((r / 255.0 - 0.5) * contrast_factor + 0.5) * 255.0;
            g = ((g / 255.0 - 0.5) * contrast_factor + 0.5) * 255.0;
            b = ((b / 255.0 - 0.5) * contrast_factor + 0.5) * 255.0;

            let gray = LUMA_R * r + LUMA_G * g + LUMA_B * b;
            r += (gray - r) * gray_mix;
            g += (gray - g) * gray_mix;
            b += (gray - b) * gray_mix;

            // Saturation blends in the opposite direction: factor 1 keeps
            // the pixel, factor 0 collapses onto the gray.
            r = gray + (r - gray) * saturation_factor;
            g = gray + (g - gray) * saturation_factor;
            b = gray + (b - gray) * saturation_factor;

            r += temperature_factor * 50.0;
            b -= temperature_factor * 50.0;

            output[[y, x, 0]] = clamp_u8(r);
            output[[y, x, 1]] = clamp_u8(g);
            output[[y, x, 2]] = clamp_u8(b);
            output[[y, x, 3]] = input[[y, x, 3]];
        }
    }
    output
}
