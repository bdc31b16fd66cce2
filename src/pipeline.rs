//! Pipeline orchestration: the stage fold and the editor facade.
//!
//! [`apply_filters`] is the pure composition of the four filter stages.
//! [`Editor`] wraps it with the state a frontend needs: the untouched
//! source image, the filtered full-resolution working buffer, a
//! downscaled display buffer, the current settings and the undo/redo
//! history.

use ndarray::{Array3, ArrayView3};
use tracing::debug;

use crate::buffer;
use crate::error::EditorError;
use crate::filters::{color, glitch, spatial, tone};
use crate::history::EditHistory;
use crate::noise::NoiseSeed;
use crate::settings::Settings;

/// Minimum export scale, percent.
pub const MIN_EXPORT_SCALE: f32 = 10.0;
/// Maximum export scale, percent.
pub const MAX_EXPORT_SCALE: f32 = 100.0;

/// Run the four filter stages in their fixed order.
///
/// The stages are an ordered composition, each consuming the previous
/// stage's output; `seed` carries noise state across stages within this
/// single run. `noise_scale` damps noise amplitudes for reduced-size
/// renders so grain looks the same at preview and full resolution.
pub fn apply_filters(
    input: ArrayView3<u8>,
    settings: &Settings,
    seed: &mut NoiseSeed,
    noise_scale: f32,
) -> Array3<u8> {
    let out = color::basic_color(input, settings);
    let out = tone::tone_vibrance_noise(out.view(), settings, seed, noise_scale);
    let out = glitch::spatial_glitch(out.view(), settings, seed);
    spatial::complex_spatial(out.view(), settings, seed)
}

/// Stateful editing session over one source image.
#[derive(Debug)]
pub struct Editor {
    source: Array3<u8>,
    working: Array3<u8>,
    display: Array3<u8>,
    display_width: usize,
    display_height: usize,
    settings: Settings,
    seed_base: f32,
    history: EditHistory,
}

impl Editor {
    /// Open an editing session on `source` with neutral settings.
    ///
    /// # Errors
    /// `InvalidDimensions` if the source has a zero dimension.
    pub fn new(source: Array3<u8>, seed: f32) -> Result<Self, EditorError> {
        let (height, width, _) = source.dim();
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        let settings = Settings::default();
        let history = EditHistory::new(settings.clone(), source.clone());
        Ok(Self {
            working: source.clone(),
            display: source.clone(),
            display_width: width,
            display_height: height,
            source,
            settings,
            seed_base: seed,
            history,
        })
    }

    /// Replace the source image and restart the session: settings back
    /// to neutral, history reset to the single fresh state.
    pub fn load(&mut self, source: Array3<u8>) -> Result<(), EditorError> {
        let (height, width, _) = source.dim();
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        self.settings = Settings::default();
        self.display_width = width;
        self.display_height = height;
        self.working = source.clone();
        self.display = source.clone();
        self.history.reset(self.settings.clone(), source.clone());
        self.source = source;
        debug!(width, height, "loaded new source image");
        Ok(())
    }

    /// Restore neutral settings and re-render; history restarts from the
    /// original state.
    pub fn reset_edits(&mut self) -> Result<(), EditorError> {
        self.settings = Settings::default();
        self.history.reset(self.settings.clone(), self.source.clone());
        self.redraw(false)
    }

    /// Adjust one parameter by its wire name. Unknown keys are ignored
    /// and leave the settings untouched.
    pub fn set_setting(&mut self, key: &str, value: f32) -> bool {
        self.settings.set(key, value)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fix the display buffer size: the largest size that fits within
    /// `max_dim` on both axes while preserving aspect ratio.
    pub fn preview_size(&mut self, max_dim: usize) {
        let (height, width, _) = self.source.dim();
        let largest = width.max(height).max(1);
        let scale = (max_dim.max(1) as f32 / largest as f32).min(1.0);
        self.display_width = ((width as f32 * scale).round() as usize).max(1);
        self.display_height = ((height as f32 * scale).round() as usize).max(1);
    }

    /// Change the noise seed for subsequent renders.
    pub fn reseed(&mut self, seed: f32) {
        self.seed_base = seed;
    }

    /// Re-render the full pipeline from the source image.
    ///
    /// The working buffer is rebuilt at full resolution and downscaled
    /// into the display buffer. With `commit` the resulting state is
    /// recorded in history (skipped if the settings did not change).
    ///
    /// # Errors
    /// `InvalidDimensions` if the source has a zero dimension; no state
    /// is mutated on error.
    pub fn redraw(&mut self, commit: bool) -> Result<(), EditorError> {
        let (height, width, _) = self.source.dim();
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }

        let mut seed = NoiseSeed::new(self.seed_base);
        let working = apply_filters(self.source.view(), &self.settings, &mut seed, 1.0);
        let display = buffer::resample(working.view(), self.display_width, self.display_height)?;
        self.working = working;
        self.display = display;
        debug!(
            width,
            height,
            display_width = self.display_width,
            display_height = self.display_height,
            commit,
            "pipeline render complete"
        );

        if commit {
            self.history.commit(&self.settings, &self.working);
        }
        Ok(())
    }

    /// Render a reduced-size preview without touching editor state.
    ///
    /// The source is downscaled first and the pipeline runs at display
    /// resolution, with noise amplitude damped by the same factor, so
    /// drag feedback is cheap but visually faithful.
    pub fn render_preview(&self) -> Result<Array3<u8>, EditorError> {
        let (_, width, _) = self.source.dim();
        let small = buffer::resample(self.source.view(), self.display_width, self.display_height)?;
        let noise_scale = (self.display_width as f32 / width as f32).min(1.0);
        let mut seed = NoiseSeed::new(self.seed_base);
        Ok(apply_filters(small.view(), &self.settings, &mut seed, noise_scale))
    }

    /// Render the current settings at full resolution and resample for
    /// export. `scale_percent` is clamped into 10-100.
    pub fn export(&self, scale_percent: f32) -> Result<Array3<u8>, EditorError> {
        let scale = scale_percent.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE) / 100.0;
        let (height, width, _) = self.source.dim();
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        let mut seed = NoiseSeed::new(self.seed_base);
        let full = apply_filters(self.source.view(), &self.settings, &mut seed, 1.0);
        let out_width = ((width as f32 * scale).round() as usize).max(1);
        let out_height = ((height as f32 * scale).round() as usize).max(1);
        buffer::resample(full.view(), out_width, out_height)
    }

    /// Step back one committed state, restoring its settings and buffer.
    /// Returns `false` when already at the oldest state.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let Some(entry) = self.history.undo() else {
            return Ok(false);
        };
        let settings = entry.settings.clone();
        let working = entry.buffer.clone();
        self.display = buffer::resample(working.view(), self.display_width, self.display_height)?;
        self.settings = settings;
        self.working = working;
        Ok(true)
    }

    /// Step forward one undone state. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let Some(entry) = self.history.redo() else {
            return Ok(false);
        };
        let settings = entry.settings.clone();
        let working = entry.buffer.clone();
        self.display = buffer::resample(working.view(), self.display_width, self.display_height)?;
        self.settings = settings;
        self.working = working;
        Ok(true)
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn working(&self) -> ArrayView3<u8> {
        self.working.view()
    }

    pub fn display(&self) -> ArrayView3<u8> {
        self.display.view()
    }

    pub fn display_size(&self) -> (usize, usize) {
        (self.display_width, self.display_height)
    }
}
