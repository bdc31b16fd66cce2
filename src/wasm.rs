//! WebAssembly exports for the filter pipeline.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images
//! cross the boundary as flat RGBA byte arrays (length =
//! width * height * 4) straight out of an `ImageData`; settings cross
//! as a JSON object keyed by the kebab-case slider names, with missing
//! keys falling back to their neutral defaults.

use ndarray::Array3;
use wasm_bindgen::prelude::*;

use crate::filters::{color, glitch, spatial, tone};
use crate::noise::NoiseSeed;
use crate::pipeline::apply_filters;
use crate::settings::Settings;

fn to_array(data: &[u8], width: usize, height: usize) -> Array3<u8> {
    Array3::from_shape_vec((height, width, 4), data.to_vec()).expect("Invalid dimensions")
}

fn parse_settings(settings_json: &str) -> Settings {
    serde_json::from_str(settings_json).expect("Invalid settings JSON")
}

// ============================================================================
// Full pipeline
// ============================================================================

/// Run all four filter stages over a flat RGBA u8 image.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `settings_json` - JSON object of kebab-case slider values
/// * `seed` - Noise seed; the same seed reproduces the frame exactly
/// * `noise_scale` - Noise amplitude factor for reduced-size previews
///
/// # Returns
/// Flat array of RGBA bytes with all stages applied
#[wasm_bindgen]
pub fn apply_filters_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    settings_json: &str,
    seed: f32,
    noise_scale: f32,
) -> Vec<u8> {
    let input = to_array(data, width, height);
    let settings = parse_settings(settings_json);
    let mut seed = NoiseSeed::new(seed);

    let result = apply_filters(input.view(), &settings, &mut seed, noise_scale);
    result.into_raw_vec_and_offset().0
}

// ============================================================================
// Individual stages
// ============================================================================

/// Stage 1 only: brightness, exposure, contrast, grayscale, saturation,
/// temperature.
#[wasm_bindgen]
pub fn basic_color_wasm(data: &[u8], width: usize, height: usize, settings_json: &str) -> Vec<u8> {
    let input = to_array(data, width, height);
    let settings = parse_settings(settings_json);

    let result = color::basic_color(input.view(), &settings);
    result.into_raw_vec_and_offset().0
}

/// Stage 2 only: temperature layer, vibrance, highlights/shadows and
/// seeded luminance noise.
#[wasm_bindgen]
pub fn tone_vibrance_noise_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    settings_json: &str,
    seed: f32,
    noise_scale: f32,
) -> Vec<u8> {
    let input = to_array(data, width, height);
    let settings = parse_settings(settings_json);
    let mut seed = NoiseSeed::new(seed);

    let result = tone::tone_vibrance_noise(input.view(), &settings, &mut seed, noise_scale);
    result.into_raw_vec_and_offset().0
}

/// Stage 3 only: the gated glitch effects.
#[wasm_bindgen]
pub fn spatial_glitch_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    settings_json: &str,
    seed: f32,
) -> Vec<u8> {
    let input = to_array(data, width, height);
    let settings = parse_settings(settings_json);
    let mut seed = NoiseSeed::new(seed);

    let result = glitch::spatial_glitch(input.view(), &settings, &mut seed);
    result.into_raw_vec_and_offset().0
}

/// Stage 4 only: grain, dither, kaleidoscope, vortex, edge detect.
#[wasm_bindgen]
pub fn complex_spatial_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    settings_json: &str,
    seed: f32,
) -> Vec<u8> {
    let input = to_array(data, width, height);
    let settings = parse_settings(settings_json);
    let mut seed = NoiseSeed::new(seed);

    let result = spatial::complex_spatial(input.view(), &settings, &mut seed);
    result.into_raw_vec_and_offset().0
}

// ============================================================================
// Resampling
// ============================================================================

/// Bilinear resample of a flat RGBA u8 image, for display compositing
/// and export scaling.
#[wasm_bindgen]
pub fn resample_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    new_width: usize,
    new_height: usize,
) -> Vec<u8> {
    let input = to_array(data, width, height);

    let result = crate::buffer::resample(input.view(), new_width, new_height)
        .expect("Invalid target dimensions");
    result.into_raw_vec_and_offset().0
}
