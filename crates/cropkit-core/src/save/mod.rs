//! Saving cropped output into the photo index.
//!
//! This module provides functionality for:
//! - Building the index record of a saved file, carrying capture time and
//!   location over from the source image
//! - Deciding whether a save replaces the source's index row or inserts a
//!   new one, and applying that decision
//! - Choosing the output directory and timestamped file name
//!
//! # Examples
//!
//! ```ignore
//! use cropkit_core::backend::{JsonPhotoIndex, LocalFilesystem};
//! use cropkit_core::save::OutputReconciler;
//!
//! let index = JsonPhotoIndex::open("photo-index.json")?;
//! let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
//! let id = reconciler.reconcile(&source, &output, now_millis, false)?;
//! ```

mod reconcile;
mod record;
mod target;

use std::io;

use thiserror::Error;

use crate::backend::IndexError;

pub use reconcile::{decide_save_action, resolve_local_file, OutputReconciler, SaveAction};
pub use record::{build_save_record, query_provenance, GeoLocation, Provenance, SaveRecord};
pub use target::{output_file_name, DEFAULT_SAVE_DIRECTORY};

/// Errors surfaced by a save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The index insert or update failed; the save did not complete.
    #[error("Photo index update failed: {0}")]
    Index(#[from] IndexError),

    /// Creating the output directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
