//! Memory-bounded, orientation-aware image loading.

use std::io::{BufRead, BufReader, Seek};

use image::{ImageFormat, ImageReader, Limits, RgbImage};
use log::debug;

use super::mime::resolve_mime_type;
use super::orientation::OrientationResolver;
use super::resize::downsample;
use super::{jpeg, png_rows};
use super::sample::{constraining_side, downsample_factor};
use super::{Bounds, DecodeError, DecodedImage, FilterType, LoadError, Orientation};
use crate::backend::{ContentAccess, ContentStream};
use crate::closable::Scoped;
use crate::identifier::ImageIdentifier;

/// Allocation headroom beyond the decoded pixels for a general decode.
const DECODE_ALLOC_SLACK: u64 = 64 * 1024 * 1024;

/// Largest bytes per pixel any supported decoder produces (RGBA f32).
const MAX_BYTES_PER_PIXEL: u64 = 16;

/// Loads images through a [`ContentAccess`] backend.
///
/// Failures to open or decode an image never surface as errors: bounds come
/// back empty and bitmaps come back as `None`. Only unusable arguments are
/// rejected with [`LoadError::InvalidArgument`]. Every stream opened is
/// closed before the call returns.
pub struct ImageLoader<'a> {
    content: &'a dyn ContentAccess,
    orientation: OrientationResolver,
    filter: FilterType,
}

impl<'a> ImageLoader<'a> {
    /// A loader with the default orientation chain (index, then EXIF).
    pub fn new(content: &'a dyn ContentAccess) -> Self {
        Self {
            content,
            orientation: OrientationResolver::default(),
            filter: FilterType::default(),
        }
    }

    /// Replace the orientation resolver chain.
    pub fn with_orientation_resolver(mut self, resolver: OrientationResolver) -> Self {
        self.orientation = resolver;
        self
    }

    /// Filter used when downsampling.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Parse an identifier string, reporting failures as invalid arguments.
    pub fn parse_identifier(input: &str) -> Result<ImageIdentifier, LoadError> {
        Ok(ImageIdentifier::parse(input)?)
    }

    /// Bounds of the stored image, read from its header only.
    ///
    /// Returns [`Bounds::EMPTY`] when the image cannot be opened or its
    /// header is not recognised.
    pub fn load_bounds(&self, id: &ImageIdentifier) -> Bounds {
        match self.read_dimensions(id) {
            Ok((width, height)) => Bounds::from_size(width, height),
            Err(e) => {
                debug!("No bounds for {}: {}", id, e);
                Bounds::EMPTY
            }
        }
    }

    /// Load `id` downsampled by a power of two so that its constraining side
    /// (the shorter one with `use_min`, else the longer) is at most
    /// `max_side_length`.
    ///
    /// The result carries the stored bounds and the factor used. Returns
    /// `None` if the image cannot be decoded or would shrink to nothing.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidArgument` when `max_side_length` is 0.
    pub fn load_constrained_bitmap(
        &self,
        id: &ImageIdentifier,
        max_side_length: u32,
        use_min: bool,
    ) -> Result<Option<DecodedImage>, LoadError> {
        if max_side_length == 0 {
            return Err(LoadError::InvalidArgument("max side length must be positive"));
        }

        let original = self.load_bounds(id);
        if original.is_empty() {
            return Ok(None);
        }
        // Non-empty bounds have positive dimensions
        let (width, height) = (original.width() as u32, original.height() as u32);

        let side = constraining_side(width, height, use_min);
        let factor = downsample_factor(side, max_side_length);
        if factor == 0 || width.min(height) / factor == 0 {
            debug!(
                "Sample factor {} too large for {}x{} image {}",
                factor, width, height, id
            );
            return Ok(None);
        }

        Ok(self.decode_sampled(id, factor, original))
    }

    /// Load `id` with both dimensions divided by `sample_factor`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidArgument` when `sample_factor` is 0.
    pub fn load_downsampled_bitmap(
        &self,
        id: &ImageIdentifier,
        sample_factor: u32,
    ) -> Result<Option<DecodedImage>, LoadError> {
        if sample_factor == 0 {
            return Err(LoadError::InvalidArgument("sample factor must be positive"));
        }

        let original = self.load_bounds(id);
        if original.is_empty() {
            return Ok(None);
        }
        Ok(self.decode_sampled(id, sample_factor, original))
    }

    /// Orientation of `id`, from the resolver chain.
    pub fn resolve_orientation(&self, id: &ImageIdentifier) -> Orientation {
        self.orientation.resolve(self.content, id)
    }

    /// Clockwise rotation of `id`: one of 0, 90, 180 or 270.
    pub fn resolve_rotation_degrees(&self, id: &ImageIdentifier) -> u32 {
        self.resolve_orientation(id).rotation_degrees()
    }

    /// MIME type of `id` by extension.
    pub fn resolve_mime_type(&self, id: &ImageIdentifier) -> Option<&'static str> {
        resolve_mime_type(id)
    }

    fn open(&self, id: &ImageIdentifier) -> Result<Scoped<Box<dyn ContentStream>>, DecodeError> {
        Ok(Scoped::new(self.content.open_stream(id)?))
    }

    fn read_dimensions(&self, id: &ImageIdentifier) -> Result<(u32, u32), DecodeError> {
        let mut stream = self.open(id)?;
        let dimensions = ImageReader::new(BufReader::new(&mut stream))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(dimensions)
    }

    fn decode_sampled(
        &self,
        id: &ImageIdentifier,
        factor: u32,
        original: Bounds,
    ) -> Option<DecodedImage> {
        match self.try_decode_sampled(id, factor, original) {
            Ok(img) => Some(DecodedImage::from_rgb_image(img).with_source(original, factor)),
            Err(e) => {
                debug!("Failed to decode {} at 1/{}: {}", id, factor, e);
                None
            }
        }
    }

    /// JPEG and non-interlaced 8-bit PNG are sampled while decoding. Other
    /// images decode in full under limits sized from their header, then
    /// shrink.
    fn try_decode_sampled(
        &self,
        id: &ImageIdentifier,
        factor: u32,
        original: Bounds,
    ) -> Result<RgbImage, DecodeError> {
        let mut stream = self.open(id)?;
        let reader = ImageReader::new(BufReader::new(&mut stream)).with_guessed_format()?;
        let sampled = match reader.format() {
            Some(ImageFormat::Jpeg) => {
                jpeg::decode_sampled(reader.into_inner(), factor, self.filter)?
            }
            Some(ImageFormat::Png) => png_rows::decode_sampled(reader.into_inner(), factor)?,
            _ => Some(self.decode_limited(reader, factor, original)?),
        };
        stream.close();

        match sampled {
            Some(img) => Ok(img),
            None => {
                debug!("Falling back to full decode of {}", id);
                let mut stream = self.open(id)?;
                let reader = ImageReader::new(BufReader::new(&mut stream)).with_guessed_format()?;
                let img = self.decode_limited(reader, factor, original)?;
                stream.close();
                Ok(img)
            }
        }
    }

    fn decode_limited<R: BufRead + Seek>(
        &self,
        mut reader: ImageReader<R>,
        factor: u32,
        original: Bounds,
    ) -> Result<RgbImage, DecodeError> {
        reader.limits(decode_limits(original));
        Ok(downsample(reader.decode()?, factor, self.filter)?.into_rgb8())
    }
}

/// Limits admitting exactly an image of `original` size.
fn decode_limits(original: Bounds) -> Limits {
    let (width, height) = (original.width() as u32, original.height() as u32);
    let mut limits = Limits::default();
    limits.max_image_width = Some(width);
    limits.max_image_height = Some(height);
    limits.max_alloc =
        Some(width as u64 * height as u64 * MAX_BYTES_PER_PIXEL + DECODE_ALLOC_SLACK);
    limits
}
