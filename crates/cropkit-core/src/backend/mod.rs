//! Capabilities the core consumes from its host.
//!
//! The core never talks to a concrete photo store or filesystem. It is
//! handed implementations of three narrow traits:
//!
//! - [`ContentAccess`]: open a byte stream for an identifier, query one
//!   metadata row for an identifier
//! - [`PhotoIndex`]: insert or update a saved-image record (plus queries,
//!   shared with [`ContentAccess`])
//! - [`Filesystem`]: existence, size, deletion and directory creation
//!
//! Metadata queries fail softly. A query returns
//! `Result<Option<Row>, MetadataError>` and callers fold it into a
//! [`Lookup`], which keeps "not found" and "store unavailable" apart
//! without any error escaping to the caller.
//!
//! Reference implementations live in [`local`] ([`LocalFilesystem`]) and
//! [`json_index`] ([`JsonPhotoIndex`]).

#[cfg(test)]
pub(crate) mod fake;
pub mod json_index;
pub mod local;
mod row;

use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::closable::Closable;
use crate::identifier::ImageIdentifier;
use crate::save::SaveRecord;

pub use json_index::JsonPhotoIndex;
pub use local::LocalFilesystem;
pub use row::{columns, Row, Value};

/// Failure to open a content stream.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Nothing is stored under the identifier.
    #[error("No content found for {0}")]
    NotFound(String),

    /// The backend cannot serve this kind of identifier.
    #[error("Unsupported identifier: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Soft failure of a metadata query.
///
/// Never returned to callers of the loader or reconciler; it only decides
/// which fallback runs next.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetadataError {
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Column {column} is not {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("Metadata store unavailable: {0}")]
    Backend(String),
}

/// Failure to mutate the photo index. This is the one failure class that
/// propagates out of a save.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No index row for {0}")]
    NotFound(String),

    #[error("Index rejected the record: {0}")]
    Rejected(String),

    #[error("Index I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Index lock poisoned")]
    Poisoned,
}

/// Outcome of a metadata lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// The store answered but holds nothing for the identifier.
    NotFound,
    /// The store could not answer (missing column, malformed store, ...).
    Unavailable(MetadataError),
}

impl<T> Lookup<T> {
    /// Fold a single-row query result through `extract`.
    ///
    /// An extraction error is treated like a failed query.
    pub fn from_query<F>(result: Result<Option<Row>, MetadataError>, extract: F) -> Self
    where
        F: FnOnce(&Row) -> Result<T, MetadataError>,
    {
        match result {
            Ok(Some(row)) => match extract(&row) {
                Ok(value) => Lookup::Found(value),
                Err(e) => Lookup::Unavailable(e),
            },
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::Unavailable(e),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// A readable, seekable stream that must be closed after use.
pub trait ContentStream: Read + Seek + Closable {}

impl<T: Read + Seek + Closable> ContentStream for T {}

/// Read access to image bytes and their indexed metadata.
pub trait ContentAccess {
    /// Open the bytes stored under `id`.
    fn open_stream(&self, id: &ImageIdentifier) -> Result<Box<dyn ContentStream>, ContentError>;

    /// Query the single metadata row for `id`, restricted to `columns`.
    ///
    /// `Ok(None)` means the store has no row for `id`. A requested column
    /// the store does not know is an error, not an absent value.
    fn query_row(
        &self,
        id: &ImageIdentifier,
        columns: &[&str],
    ) -> Result<Option<Row>, MetadataError>;
}

/// The photo index: a row store of saved images addressed by identifier.
pub trait PhotoIndex: ContentAccess {
    /// Insert a new row and return its identifier.
    fn insert(&self, record: &SaveRecord) -> Result<ImageIdentifier, IndexError>;

    /// Overwrite the fields of an existing row with `record`.
    fn update(&self, id: &ImageIdentifier, record: &SaveRecord) -> Result<(), IndexError>;
}

/// Filesystem operations used when saving.
pub trait Filesystem {
    fn exists(&self, path: &Path) -> bool;

    fn delete(&self, path: &Path) -> io::Result<()>;

    fn file_size(&self, path: &Path) -> io::Result<u64>;

    fn create_directories(&self, path: &Path) -> io::Result<()>;

    /// True if `path` is a directory new files can be written into.
    fn is_writable(&self, path: &Path) -> bool;

    fn parent_directory(&self, path: &Path) -> Option<PathBuf> {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    fn absolute_path(&self, path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }
}
