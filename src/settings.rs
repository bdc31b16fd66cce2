//! The settings record driving all filter stages.
//!
//! One `f32` field per slider, so every key is always present and a
//! partial record cannot exist. Neutral values are not uniformly zero:
//! multiplicative color adjustments sit at 100 (meaning "1.0x, no
//! change") while additive effects sit at 0 (meaning "off").
//!
//! Wire names are kebab-case (`glitch-rgb-split`), matching the slider
//! identifiers the UI layer uses. Lookups through [`Settings::get`] and
//! [`Settings::set`] ignore unknown keys.

use serde::{Deserialize, Serialize};

/// Neutral value for multiplicative color adjustments.
pub const NEUTRAL: f32 = 100.0;

/// Complete set of filter parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    // Stage 1: basic color (percent, 100 = neutral; grayscale 0-100, 0 = off)
    pub brightness: f32,
    pub contrast: f32,
    pub grayscale: f32,
    pub saturation: f32,
    pub exposure: f32,
    pub temperature: f32,

    // Stage 2: tone/vibrance/noise
    pub vibrance: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub noise: f32,

    // Stage 3: spatial glitch (0 = off, otherwise intensity = value/100)
    pub glitch_scanline: f32,
    pub glitch_chromatic: f32,
    pub glitch_rgb_split: f32,
    pub glitch_invert: f32,
    pub glitch_vhs: f32,
    pub glitch_chromatic_vertical: f32,
    pub glitch_chromatic_diagonal: f32,
    pub glitch_pixel_shuffle: f32,
    pub glitch_wave: f32,

    // Stage 4: complex spatial
    pub pixel_grain: f32,
    pub pixel_dither: f32,
    pub kaleidoscope_segments: f32,
    pub kaleidoscope_offset: f32,
    pub vortex_twist: f32,
    pub edge_detect: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: NEUTRAL,
            contrast: NEUTRAL,
            grayscale: 0.0,
            saturation: NEUTRAL,
            exposure: NEUTRAL,
            temperature: NEUTRAL,
            vibrance: 0.0,
            highlights: NEUTRAL,
            shadows: NEUTRAL,
            noise: 0.0,
            glitch_scanline: 0.0,
            glitch_chromatic: 0.0,
            glitch_rgb_split: 0.0,
            glitch_invert: 0.0,
            glitch_vhs: 0.0,
            glitch_chromatic_vertical: 0.0,
            glitch_chromatic_diagonal: 0.0,
            glitch_pixel_shuffle: 0.0,
            glitch_wave: 0.0,
            pixel_grain: 0.0,
            pixel_dither: 0.0,
            kaleidoscope_segments: 0.0,
            kaleidoscope_offset: 0.0,
            vortex_twist: 0.0,
            edge_detect: 0.0,
        }
    }
}

impl Settings {
    /// Every settings key, in pipeline order.
    pub const KEYS: [&'static str; 25] = [
        "brightness",
        "contrast",
        "grayscale",
        "saturation",
        "exposure",
        "temperature",
        "vibrance",
        "highlights",
        "shadows",
        "noise",
        "glitch-scanline",
        "glitch-chromatic",
        "glitch-rgb-split",
        "glitch-invert",
        "glitch-vhs",
        "glitch-chromatic-vertical",
        "glitch-chromatic-diagonal",
        "glitch-pixel-shuffle",
        "glitch-wave",
        "pixel-grain",
        "pixel-dither",
        "kaleidoscope-segments",
        "kaleidoscope-offset",
        "vortex-twist",
        "edge-detect",
    ];

    /// Look up a parameter by its wire name.
    ///
    /// Returns `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<f32> {
        let v = match key {
            "brightness" => self.brightness,
            "contrast" => self.contrast,
            "grayscale" => self.grayscale,
            "saturation" => self.saturation,
            "exposure" => self.exposure,
            "temperature" => self.temperature,
            "vibrance" => self.vibrance,
            "highlights" => self.highlights,
            "shadows" => self.shadows,
            "noise" => self.noise,
            "glitch-scanline" => self.glitch_scanline,
            "glitch-chromatic" => self.glitch_chromatic,
            "glitch-rgb-split" => self.glitch_rgb_split,
            "glitch-invert" => self.glitch_invert,
            "glitch-vhs" => self.glitch_vhs,
            "glitch-chromatic-vertical" => self.glitch_chromatic_vertical,
            "glitch-chromatic-diagonal" => self.glitch_chromatic_diagonal,
            "glitch-pixel-shuffle" => self.glitch_pixel_shuffle,
            "glitch-wave" => self.glitch_wave,
            "pixel-grain" => self.pixel_grain,
            "pixel-dither" => self.pixel_dither,
            "kaleidoscope-segments" => self.kaleidoscope_segments,
            "kaleidoscope-offset" => self.kaleidoscope_offset,
            "vortex-twist" => self.vortex_twist,
            "edge-detect" => self.edge_detect,
            _ => return None,
        };
        Some(v)
    }

    /// Set a parameter by its wire name.
    ///
    /// Unknown keys are ignored. Returns `true` if the key matched.
    pub fn set(&mut self, key: &str, value: f32) -> bool {
        let slot = match key {
            "brightness" => &mut self.brightness,
            "contrast" => &mut self.contrast,
            "grayscale" => &mut self.grayscale,
            "saturation" => &mut self.saturation,
            "exposure" => &mut self.exposure,
            "temperature" => &mut self.temperature,
            "vibrance" => &mut self.vibrance,
            "highlights" => &mut self.highlights,
            "shadows" => &mut self.shadows,
            "noise" => &mut self.noise,
            "glitch-scanline" => &mut self.glitch_scanline,
            "glitch-chromatic" => &mut self.glitch_chromatic,
            "glitch-rgb-split" => &mut self.glitch_rgb_split,
            "glitch-invert" => &mut self.glitch_invert,
            "glitch-vhs" => &mut self.glitch_vhs,
            "glitch-chromatic-vertical" => &mut self.glitch_chromatic_vertical,
            "glitch-chromatic-diagonal" => &mut self.glitch_chromatic_diagonal,
            "glitch-pixel-shuffle" => &mut self.glitch_pixel_shuffle,
            "glitch-wave" => &mut self.glitch_wave,
            "pixel-grain" => &mut self.pixel_grain,
            "pixel-dither" => &mut self.pixel_dither,
            "kaleidoscope-segments" => &mut self.kaleidoscope_segments,
            "kaleidoscope-offset" => &mut self.kaleidoscope_offset,
            "vortex-twist" => &mut self.vortex_twist,
            "edge-detect" => &mut self.edge_detect,
            _ => return false,
        };
        *slot = value;
        true
    }
}
