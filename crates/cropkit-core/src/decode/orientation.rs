//! Orientation resolution and correction.
//!
//! An image's orientation is resolved by asking an ordered list of
//! [`OrientationSource`]s. Each answers found, not found, or unavailable;
//! the first found answer wins and `Normal` is the final fallback. The
//! default chain asks the photo index first and the file's EXIF block
//! second.

use std::io::BufReader;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use log::{debug, warn};

use super::mime::{resolve_mime_type, JPEG_MIME_TYPE};
use super::{DecodeError, DecodedImage, Orientation};
use crate::backend::{columns, ContentAccess, Lookup, MetadataError};
use crate::closable::Scoped;
use crate::identifier::ImageIdentifier;

/// One strategy for finding an image's orientation.
pub trait OrientationSource {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn lookup(&self, content: &dyn ContentAccess, id: &ImageIdentifier) -> Lookup<Orientation>;
}

/// The photo index `orientation` column, in clockwise degrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexOrientation;

impl OrientationSource for IndexOrientation {
    fn name(&self) -> &'static str {
        "index"
    }

    fn lookup(&self, content: &dyn ContentAccess, id: &ImageIdentifier) -> Lookup<Orientation> {
        let result = content.query_row(id, &[columns::ORIENTATION]);
        Lookup::from_query(result, |row| {
            row.get_i64(columns::ORIENTATION)
                .map(Orientation::from_index_degrees)
        })
    }
}

/// The EXIF orientation tag of a local JPEG file.
///
/// Anything that is not a file identifier with a JPEG extension is not
/// found without opening a stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifOrientation;

impl OrientationSource for ExifOrientation {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn lookup(&self, content: &dyn ContentAccess, id: &ImageIdentifier) -> Lookup<Orientation> {
        if !id.is_file() || resolve_mime_type(id) != Some(JPEG_MIME_TYPE) {
            return Lookup::NotFound;
        }

        let stream = match content.open_stream(id) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to read EXIF orientation of {}: {}", id, e);
                return Lookup::Unavailable(MetadataError::Backend(e.to_string()));
            }
        };
        let mut stream = Scoped::new(stream);

        match Reader::new().read_from_container(&mut BufReader::new(&mut stream)) {
            Ok(exif) => exif
                .get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
                .map_or(Lookup::NotFound, |value| {
                    Lookup::Found(Orientation::from_exif(value))
                }),
            Err(exif::Error::NotFound(_)) => Lookup::NotFound,
            Err(e) => {
                warn!("Failed to read EXIF orientation of {}: {}", id, e);
                Lookup::Unavailable(MetadataError::Backend(e.to_string()))
            }
        }
    }
}

/// Ordered chain of orientation sources.
pub struct OrientationResolver {
    sources: Vec<Box<dyn OrientationSource>>,
}

impl OrientationResolver {
    pub fn new(sources: Vec<Box<dyn OrientationSource>>) -> Self {
        Self { sources }
    }

    /// Walk the chain and return the first orientation found, or
    /// `Normal`. Unavailable sources are logged and skipped.
    pub fn resolve(&self, content: &dyn ContentAccess, id: &ImageIdentifier) -> Orientation {
        for source in &self.sources {
            match source.lookup(content, id) {
                Lookup::Found(orientation) => {
                    debug!("{} orientation of {}: {:?}", source.name(), id, orientation);
                    return orientation;
                }
                Lookup::NotFound => {}
                Lookup::Unavailable(e) => {
                    debug!("{} orientation unavailable for {}: {}", source.name(), id, e)
                }
            }
        }
        Orientation::Normal
    }
}

impl Default for OrientationResolver {
    fn default() -> Self {
        Self::new(vec![Box::new(IndexOrientation), Box::new(ExifOrientation)])
    }
}

/// Transform decoded pixels so they display upright without metadata.
pub fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

/// Orientation-correct a decoded bitmap, keeping its source bounds (in
/// upright axes) and sample factor.
pub fn orient_image(
    image: DecodedImage,
    orientation: Orientation,
) -> Result<DecodedImage, DecodeError> {
    if orientation == Orientation::Normal {
        return Ok(image);
    }

    let original = if orientation.swaps_dimensions() {
        image.original.transposed()
    } else {
        image.original
    };
    let factor = image.sample_factor;
    let rgb = image
        .into_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("pixel buffer size mismatch".to_string()))?;

    let upright = apply_orientation(DynamicImage::ImageRgb8(rgb), orientation).into_rgb8();
    Ok(DecodedImage::from_rgb_image(upright).with_source(original, factor))
}
