//! Rectangular and circular cropping of decoded images.
//!
//! Crop rectangles are integer pixel [`Bounds`] with exclusive right and
//! bottom edges. A rectangle chosen against the stored image is mapped onto
//! a downsampled bitmap with [`scale_rect`] before cropping.
//!
//! # Example
//!
//! ```ignore
//! let rect = scale_rect(Bounds::new(400, 300, 2400, 2300), image.sample_factor);
//! let cropped = apply_crop(&image, rect);
//! let round = apply_circle_mask(&cropped, [255, 255, 255]);
//! ```

use crate::decode::{Bounds, DecodedImage};

/// Extract `rect` from `image`.
///
/// # Behavior
///
/// - The rectangle is clamped to the image
/// - Minimum output dimension is 1x1 pixels
/// - A rectangle covering the whole image returns a copy
/// - An empty image is returned unchanged
pub fn apply_crop(image: &DecodedImage, rect: Bounds) -> DecodedImage {
    if image.is_empty() {
        return image.clone();
    }
    let (left, top, right, bottom) = clamp_rect(rect, image.width, image.height);

    if left == 0 && top == 0 && right == image.width && bottom == image.height {
        return image.clone();
    }

    let out_width = right - left;
    let out_height = bottom - top;
    let stride = image.width as usize * 3;
    let mut output = Vec::with_capacity(out_width as usize * out_height as usize * 3);

    for y in top..bottom {
        let row_start = y as usize * stride;
        let start = row_start + left as usize * 3;
        let end = row_start + right as usize * 3;
        output.extend_from_slice(&image.pixels[start..end]);
    }

    DecodedImage::new(out_width, out_height, output)
}

/// Clamp `rect` to a non-empty `width` x `height` image, keeping at least
/// one pixel.
fn clamp_rect(rect: Bounds, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let clamp_axis = |low: i32, high: i32, size: u32| -> (u32, u32) {
        let max_start = size.saturating_sub(1);
        let start = (low.max(0) as u32).min(max_start);
        let end = (high.max(0) as u32).min(size).max(start + 1);
        (start, end)
    };
    let (left, right) = clamp_axis(rect.left, rect.right, width);
    let (top, bottom) = clamp_axis(rect.top, rect.bottom, height);
    (left, top, right, bottom)
}

/// Paint everything outside the circle inscribed in `image` with `fill`.
///
/// The saved format carries no alpha, so a circular crop is a square crop
/// with its corners filled.
pub fn apply_circle_mask(image: &DecodedImage, fill: [u8; 3]) -> DecodedImage {
    let mut output = image.clone();
    if image.is_empty() {
        return output;
    }
    let cx = image.width as f64 / 2.0;
    let cy = image.height as f64 / 2.0;
    let radius = image.width.min(image.height) as f64 / 2.0;
    let radius_sq = radius * radius;

    for (i, pixel) in output.pixels.chunks_exact_mut(3).enumerate() {
        let x = (i as u32 % image.width) as f64 + 0.5;
        let y = (i as u32 / image.width) as f64 + 0.5;
        let (dx, dy) = (x - cx, y - cy);
        if dx * dx + dy * dy > radius_sq {
            pixel.copy_from_slice(&fill);
        }
    }

    output
}

/// Map `rect` from stored-image coordinates onto a bitmap downsampled by
/// `factor`. Edges round outwards so the scaled rectangle still covers the
/// requested region.
pub fn scale_rect(rect: Bounds, factor: u32) -> Bounds {
    let factor = factor.max(1) as i32;
    let floor = |v: i32| v.div_euclid(factor);
    let ceil = |v: i32| -(-v).div_euclid(factor);
    Bounds::new(
        floor(rect.left),
        floor(rect.top),
        ceil(rect.right),
        ceil(rect.bottom),
    )
}

/// Largest square centered in a `width` x `height` image.
pub fn centered_square(width: u32, height: u32) -> Bounds {
    let side = width.min(height);
    let left = (width - side) / 2;
    let top = (height - side) / 2;
    Bounds::from_size(side, side).offset(left, top)
}
