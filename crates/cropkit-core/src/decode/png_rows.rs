//! Row-streaming PNG decode.

use std::io::Read;

use image::RgbImage;
use png::{BitDepth, Decoder, Transformations};

use super::resize::RowSampler;
use super::DecodeError;

impl From<png::DecodingError> for DecodeError {
    fn from(err: png::DecodingError) -> Self {
        match err {
            png::DecodingError::IoError(e) => DecodeError::Io(e),
            other => DecodeError::CorruptedFile(other.to_string()),
        }
    }
}

/// Decode a PNG scanline by scanline, box-sampling by `factor` as rows
/// arrive. Memory stays at one source row plus the sampled output.
///
/// Returns `Ok(None)` for interlaced images, whose rows arrive in passes.
pub(super) fn decode_sampled<R: Read>(
    reader: R,
    factor: u32,
) -> Result<Option<RgbImage>, DecodeError> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let (width, height, interlaced) = {
        let info = reader.info();
        (info.width, info.height, info.interlaced)
    };
    let (color, depth) = reader.output_color_type();
    if interlaced || depth != BitDepth::Eight {
        return Ok(None);
    }

    let mut sampler = RowSampler::new(width, height, factor, color.samples());
    while let Some(row) = reader.next_row()? {
        sampler.push_row(row.data())?;
    }
    sampler.finish().map(Some)
}
