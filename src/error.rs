//! Error types for buffer handling and pipeline runs.
//!
//! Per-pixel arithmetic is total (every channel is clamped), so stages
//! themselves never fail. Errors only arise at the buffer boundary: a
//! zero-sized surface or a flat slice whose length disagrees with the
//! declared dimensions. Undo/redo at the history boundary is a silent
//! no-op, not an error.

use thiserror::Error;

/// Errors surfaced by buffer accessors and the pipeline orchestrator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Source or target surface has a zero width or height.
    ///
    /// Fatal to the failing call; no partial draw occurs.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// A flat RGBA slice does not match `width * height * 4` bytes.
    #[error("invalid surface: expected {expected} bytes, got {actual}")]
    InvalidSurface { expected: usize, actual: usize },

    /// The background preview worker has shut down.
    #[error("preview renderer disconnected")]
    RendererDisconnected,
}
