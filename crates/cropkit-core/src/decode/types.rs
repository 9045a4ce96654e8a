//! Core types for image loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::ContentError;
use crate::identifier::IdentifierError;

/// Errors raised immediately by the loader for unusable arguments.
///
/// Anything that goes wrong while reading or decoding the image itself is
/// reported as an absent result instead.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A size or factor argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The identifier could not be parsed.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// Error types for decode operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image data is corrupted or incomplete.
    #[error("Corrupted or incomplete image: {0}")]
    CorruptedFile(String),

    /// I/O error while reading the stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream could not be opened.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(_) => DecodeError::InvalidFormat,
            image::ImageError::IoError(e) => DecodeError::Io(e),
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

/// Filter type for downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slowest, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal, then rotate 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal, then rotate 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl Orientation {
    /// Orientation for an EXIF tag value. Unknown values are `Normal`.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }

    /// Orientation for a photo index `orientation` column, which stores
    /// clockwise degrees. Only exact 90/180/270 map to a rotation.
    pub fn from_index_degrees(degrees: i64) -> Self {
        match degrees {
            90 => Orientation::Rotate90CW,
            180 => Orientation::Rotate180,
            270 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }

    /// The EXIF tag value.
    pub fn exif_value(self) -> u32 {
        self as u32
    }

    /// Clockwise rotation in degrees. Flips and transposes carry no pure
    /// rotation and report 0.
    pub fn rotation_degrees(self) -> u32 {
        match self {
            Orientation::Rotate90CW => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270CW => 270,
            _ => 0,
        }
    }

    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        Orientation::from_exif(value)
    }
}

/// Integer rectangle in pixel coordinates, `right`/`bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    /// Zero-area bounds, meaning "no decodable image".
    pub const EMPTY: Bounds = Bounds {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Bounds of a `width` x `height` image at the origin. Dimensions past
    /// `i32::MAX` saturate.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(
            0,
            0,
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        )
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// True if either dimension is `<= 0`.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Swap the x and y axes, as a 90 or 270 degree rotation does to
    /// image dimensions.
    pub fn transposed(self) -> Bounds {
        Bounds::new(self.top, self.left, self.bottom, self.right)
    }

    /// Move by (`dx`, `dy`), saturating.
    pub fn offset(self, dx: u32, dy: u32) -> Bounds {
        let dx = i32::try_from(dx).unwrap_or(i32::MAX);
        let dy = i32::try_from(dy).unwrap_or(i32::MAX);
        Bounds::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.right.saturating_add(dx),
            self.bottom.saturating_add(dy),
        )
    }
}

/// A decoded image with RGB pixel data, owned by the caller.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
    /// Bounds of the stored image before downsampling.
    pub original: Bounds,
    /// Power-of-two divisor applied during decode; 1 for full size.
    pub sample_factor: u32,
}

impl DecodedImage {
    /// Create a full-size image with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
            original: Bounds::from_size(width, height),
            sample_factor: 1,
        }
    }

    /// Create a full-size image from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Attach the pre-downsample bounds and factor.
    pub fn with_source(mut self, original: Bounds, sample_factor: u32) -> Self {
        self.original = original;
        self.sample_factor = sample_factor;
        self
    }

    /// Convert to an image::RgbImage for further processing.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Consume into an image::RgbImage without copying.
    pub fn into_rgb_image(self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Replace the pixels, keeping the source bounds and factor.
    pub fn replace_pixels(&self, img: image::RgbImage) -> Self {
        DecodedImage::from_rgb_image(img).with_source(self.original, self.sample_factor)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
