//! JPEG decoding at a reduced DCT scale.
//!
//! The JPEG decoder can run its inverse DCT at 1/2, 1/4 or 1/8 size, so a
//! sampled load never materializes the full-size pixels.

use std::io::Read;

use image::{DynamicImage, GrayImage, RgbImage};
use jpeg_decoder::{Decoder, PixelFormat};
use log::debug;

use super::resize::{resize_to, sampled_dimensions};
use super::{DecodeError, FilterType};

impl From<jpeg_decoder::Error> for DecodeError {
    fn from(err: jpeg_decoder::Error) -> Self {
        match err {
            jpeg_decoder::Error::Unsupported(_) => DecodeError::InvalidFormat,
            jpeg_decoder::Error::Io(e) => DecodeError::Io(e),
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

/// Decode a JPEG from `reader` with both dimensions divided by `factor`.
///
/// Returns `Ok(None)` for pixel formats this path does not handle (CMYK and
/// 16-bit gray), leaving the caller to fall back to a general decode.
pub(super) fn decode_sampled<R: Read>(
    reader: R,
    factor: u32,
    filter: FilterType,
) -> Result<Option<RgbImage>, DecodeError> {
    let mut decoder = Decoder::new(reader);
    decoder.read_info()?;
    let info = decoder
        .info()
        .ok_or_else(|| DecodeError::CorruptedFile("missing JPEG frame header".into()))?;
    if !matches!(info.pixel_format, PixelFormat::RGB24 | PixelFormat::L8) {
        debug!("No scaled decode for {:?} JPEG", info.pixel_format);
        return Ok(None);
    }

    let (target_width, target_height) =
        sampled_dimensions(info.width as u32, info.height as u32, factor);
    // Picks the smallest DCT scale at least as large as the target
    let (width, height) = decoder.scale(target_width as u16, target_height as u16)?;
    let pixels = decoder.decode()?;
    let (width, height) = (width as u32, height as u32);

    let img = match info.pixel_format {
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels)
            .map(|gray| DynamicImage::ImageLuma8(gray).into_rgb8()),
        _ => RgbImage::from_raw(width, height, pixels),
    }
    .ok_or_else(|| DecodeError::CorruptedFile("JPEG pixel data too short".into()))?;

    Ok(Some(resize_to(img, target_width, target_height, filter)))
}
