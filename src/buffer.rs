//! Pixel buffer accessors: flat RGBA slices in, `Array3<u8>` out.
//!
//! Images are `(height, width, 4)` RGBA arrays, channel values 0-255.
//! The invariant enforced here is that a flat surface is exactly
//! `width * height * 4` bytes; anything that changes size reallocates,
//! it never partially overwrites a mismatched buffer.

use ndarray::{Array3, ArrayView3};

use crate::error::EditorError;

/// Read a flat RGBA byte surface into an image array.
///
/// # Errors
/// `InvalidDimensions` if `width` or `height` is 0, `InvalidSurface`
/// if the slice length is not `width * height * 4`.
pub fn from_raw(data: &[u8], width: usize, height: usize) -> Result<Array3<u8>, EditorError> {
    if width == 0 || height == 0 {
        return Err(EditorError::InvalidDimensions { width, height });
    }
    let expected = width * height * 4;
    if data.len() != expected {
        return Err(EditorError::InvalidSurface {
            expected,
            actual: data.len(),
        });
    }
    // Length was checked above, so this cannot fail.
    Ok(Array3::from_shape_vec((height, width, 4), data.to_vec())
        .expect("length matches dimensions"))
}

/// Write an image array back out as a flat RGBA byte vector.
pub fn into_raw(buffer: Array3<u8>) -> Vec<u8> {
    let std = buffer.as_standard_layout().to_owned();
    std.into_raw_vec_and_offset().0
}

/// Resample an image to new dimensions with bilinear interpolation.
///
/// Used for compositing the full-resolution working buffer into the
/// display buffer and for export scaling. Always allocates a fresh
/// buffer of the target size.
///
/// # Errors
/// `InvalidDimensions` if either target dimension is 0.
pub fn resample(
    input: ArrayView3<u8>,
    new_width: usize,
    new_height: usize,
) -> Result<Array3<u8>, EditorError> {
    let (height, width, channels) = input.dim();
    if new_width == 0 || new_height == 0 || width == 0 || height == 0 {
        return Err(EditorError::InvalidDimensions {
            width: new_width,
            height: new_height,
        });
    }

    let mut output = Array3::<u8>::zeros((new_height, new_width, channels));

    let x_ratio = width as f32 / new_width as f32;
    let y_ratio = height as f32 / new_height as f32;

    for y in 0..new_height {
        // Map the destination pixel center back into source space.
        let sy = ((y as f32 + 0.5) * y_ratio - 0.5).clamp(0.0, height as f32 - 1.0);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let fy = sy - y0 as f32;

        for x in 0..new_width {
            let sx = ((x as f32 + 0.5) * x_ratio - 0.5).clamp(0.0, width as f32 - 1.0);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(width - 1);
            let fx = sx - x0 as f32;

            for c in 0..channels {
                let top = input[[y0, x0, c]] as f32 * (1.0 - fx) + input[[y0, x1, c]] as f32 * fx;
                let bottom =
                    input[[y1, x0, c]] as f32 * (1.0 - fx) + input[[y1, x1, c]] as f32 * fx;
                let v = top * (1.0 - fy) + bottom * fy;
                output[[y, x, c]] = v.clamp(0.0, 255.0).round() as u8;
            }
        }
    }

    Ok(output)
}
