//! Power-of-two downsampling.
//!
//! Two strategies live here. [`RowSampler`] box-averages scanlines as a
//! decoder produces them, so only one output row is ever accumulated.
//! [`downsample`] resizes an already decoded image and is used for formats
//! without a streaming decoder.

use image::{imageops, DynamicImage, RgbImage};

use super::{DecodeError, FilterType};

/// Dimensions of a `width` x `height` image sampled by `factor`, rounded
/// down and never below 1x1.
///
/// # Arguments
///
/// * `width` - Source width in pixels
/// * `height` - Source height in pixels
/// * `factor` - Sample factor, at least 1
pub fn sampled_dimensions(width: u32, height: u32, factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    ((width / factor).max(1), (height / factor).max(1))
}

/// Downsample `img` by `factor`.
///
/// A factor of 1 returns the image untouched.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for a zero factor or an empty image.
pub fn downsample(
    img: DynamicImage,
    factor: u32,
    filter: FilterType,
) -> Result<DynamicImage, DecodeError> {
    if factor == 0 || img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::InvalidFormat);
    }
    if factor == 1 {
        return Ok(img);
    }

    let (width, height) = sampled_dimensions(img.width(), img.height(), factor);
    Ok(img.resize_exact(width, height, filter.to_image_filter()))
}

/// Resize `img` to exactly `width` x `height`, skipping the work when it
/// already has that size.
pub(crate) fn resize_to(img: RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img;
    }
    imageops::resize(&img, width, height, filter.to_image_filter())
}

/// Box-averaging downsampler fed one decoded scanline at a time.
///
/// Each output pixel is the mean of a `factor` x `factor` block of source
/// pixels (the whole axis when it is shorter than `factor`). Trailing
/// source rows and columns that do not fill a block are dropped, matching
/// [`sampled_dimensions`].
pub(crate) struct RowSampler {
    channels: usize,
    block_width: usize,
    block_height: usize,
    out_width: usize,
    out_height: usize,
    rows_seen: usize,
    sums: Vec<u64>,
    pixels: Vec<u8>,
}

impl RowSampler {
    /// A sampler for `width` x `height` scanlines of `channels` bytes per
    /// pixel (1 gray, 2 gray + alpha, 3 RGB, 4 RGBA).
    pub(crate) fn new(width: u32, height: u32, factor: u32, channels: usize) -> Self {
        let (out_width, out_height) = sampled_dimensions(width, height, factor);
        let factor = factor.max(1);
        let out_width = out_width as usize;
        let out_height = out_height as usize;
        Self {
            channels,
            block_width: width.min(factor) as usize,
            block_height: height.min(factor) as usize,
            out_width,
            out_height,
            rows_seen: 0,
            sums: vec![0; out_width * 3],
            pixels: Vec::with_capacity(out_width * out_height * 3),
        }
    }

    /// Add the next scanline.
    pub(crate) fn push_row(&mut self, row: &[u8]) -> Result<(), DecodeError> {
        let out_row = self.rows_seen / self.block_height;
        self.rows_seen += 1;
        if out_row >= self.out_height {
            return Ok(());
        }

        let needed = self.out_width * self.block_width * self.channels;
        if row.len() < needed {
            return Err(DecodeError::CorruptedFile(format!(
                "scanline of {} bytes, expected at least {}",
                row.len(),
                needed
            )));
        }

        for (out_x, sum) in self.sums.chunks_exact_mut(3).enumerate() {
            let start = out_x * self.block_width * self.channels;
            let block = &row[start..start + self.block_width * self.channels];
            for px in block.chunks_exact(self.channels) {
                let (r, g, b) = match self.channels {
                    1 | 2 => (px[0], px[0], px[0]),
                    _ => (px[0], px[1], px[2]),
                };
                sum[0] += r as u64;
                sum[1] += g as u64;
                sum[2] += b as u64;
            }
        }

        if self.rows_seen % self.block_height == 0 {
            let area = (self.block_width * self.block_height) as u64;
            for sum in self.sums.iter_mut() {
                self.pixels.push(((*sum + area / 2) / area) as u8);
                *sum = 0;
            }
        }
        Ok(())
    }

    /// The sampled image, once every needed row has been pushed.
    pub(crate) fn finish(self) -> Result<RgbImage, DecodeError> {
        RgbImage::from_raw(self.out_width as u32, self.out_height as u32, self.pixels)
            .ok_or_else(|| DecodeError::CorruptedFile("image ended before its last row".into()))
    }
}
