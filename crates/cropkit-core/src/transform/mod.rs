//! Pixel operations applied between loading and saving.
//!
//! # Coordinate System
//!
//! - Rectangles are integer pixels, right and bottom exclusive
//! - Origin is the top-left corner of the upright image
//! - Rectangles chosen on the stored image are scaled by the bitmap's sample
//!   factor before use

mod crop;

pub use crop::{apply_circle_mask, apply_crop, centered_square, scale_rect};
