//! Cropkit Core - image cropping library
//!
//! This crate provides the pieces behind an interactive crop: the vector
//! geometry that drives crop handles, a memory-bounded loader that resolves
//! image orientation, pixel crop operations, JPEG encoding, and the logic
//! that links a saved crop back into a photo index.
//!
//! The host supplies storage through the traits in [`backend`]. Reference
//! implementations over the local filesystem and a JSON-file index are
//! included.

pub mod backend;
pub mod closable;
pub mod config;
pub mod decode;
pub mod encode;
pub mod geometry;
pub mod identifier;
pub mod save;
pub mod transform;

pub use backend::{ContentAccess, Filesystem, JsonPhotoIndex, LocalFilesystem, PhotoIndex};
pub use config::{ConfigError, CropConfig};
pub use decode::{Bounds, DecodedImage, ImageLoader, LoadError, Orientation};
pub use encode::{encode_image, EncodeError};
pub use identifier::{IdentifierError, ImageIdentifier, Scheme};
pub use save::{OutputReconciler, SaveError, SaveRecord};
pub use transform::{apply_circle_mask, apply_crop, scale_rect};
