//! Image loading pipeline.
//!
//! This module provides functionality for:
//! - Probing stored image bounds from the header alone
//! - Choosing a power-of-two downsample factor that keeps a bitmap within a
//!   side length
//! - Decoding a bounded bitmap through a content backend, at reduced DCT
//!   scale for JPEG and row by row for PNG
//! - Resolving orientation from the photo index, then from EXIF
//!
//! # Architecture
//!
//! [`ImageLoader`] never sees files directly. It opens streams and queries
//! metadata through [`ContentAccess`](crate::backend::ContentAccess), so the
//! same code runs against a real photo index or an in-memory fake. All
//! operations are synchronous.
//!
//! # Examples
//!
//! ```ignore
//! use cropkit_core::decode::ImageLoader;
//!
//! let loader = ImageLoader::new(&index);
//! let bounds = loader.load_bounds(&id);
//! if let Some(image) = loader.load_constrained_bitmap(&id, 2048, false)? {
//!     println!("Loaded {}x{} at 1/{}", image.width, image.height, image.sample_factor);
//! }
//! ```

#[cfg(test)]
pub(crate) mod fixtures;
mod jpeg;
mod loader;
mod mime;
mod orientation;
mod png_rows;
mod resize;
mod sample;
mod types;

pub use loader::ImageLoader;
pub use mime::{extension_of, mime_type_for_extension, resolve_mime_type, JPEG_MIME_TYPE};
pub use orientation::{
    apply_orientation, orient_image, ExifOrientation, IndexOrientation, OrientationResolver,
    OrientationSource,
};
pub use resize::{downsample, sampled_dimensions};
pub use sample::{constraining_side, downsample_factor};
pub use types::{Bounds, DecodeError, DecodedImage, FilterType, LoadError, Orientation};
