//! Encoding of cropped output.
//!
//! Saved crops are always JPEG; pixels arrive orientation-corrected, so no
//! EXIF orientation is written.
//!
//! # Examples
//!
//! ```ignore
//! use cropkit_core::encode::{encode_image, DEFAULT_COMPRESS_QUALITY};
//!
//! let jpeg_bytes = encode_image(&cropped, DEFAULT_COMPRESS_QUALITY)?;
//! std::fs::write(&output_path, jpeg_bytes)?;
//! ```

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, encode_jpeg_to, EncodeError, DEFAULT_COMPRESS_QUALITY};
