//! Glitch photo-editor core.
//!
//! The image transform pipeline and history engine behind an in-browser
//! raster editor: four ordered filter stages (basic color, tone/vibrance/
//! noise, spatial glitch, complex spatial) over RGBA pixel buffers, plus
//! a bounded undo/redo history of settings + rendered snapshots.
//!
//! ## Image Format
//! Images are `ndarray::Array3<u8>` with shape `(height, width, 4)`,
//! RGBA, channel values 0-255. Flat `width * height * 4` byte surfaces
//! (e.g. an `ImageData` buffer) convert at the boundary via [`buffer`].
//!
//! ## Determinism
//! Every stochastic effect draws from a seeded sine-hash generator
//! ([`noise`]); the same (image, settings, seed) triple always produces
//! a byte-identical frame, which is what makes undo snapshots and
//! preview/full-res rendering agree.
//!
//! WASM bindings for JavaScript are behind the `wasm` feature. Native
//! builds additionally get a background preview renderer ([`preview`])
//! with latest-wins scheduling.

pub mod buffer;
pub mod error;
pub mod filters;
pub mod history;
pub mod noise;
pub mod pipeline;
pub mod settings;

#[cfg(not(target_arch = "wasm32"))]
pub mod preview;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::EditorError;
pub use history::{EditHistory, HistoryEntry};
pub use noise::{sine_hash, NoiseSeed};
pub use pipeline::{apply_filters, Editor};
pub use settings::Settings;

#[cfg(not(target_arch = "wasm32"))]
pub use preview::{PreviewFrame, PreviewRenderer, RenderRequest};
