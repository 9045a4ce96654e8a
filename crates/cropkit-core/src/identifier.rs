//! Image identifiers.
//!
//! An [`ImageIdentifier`] is a URI-like locator. Its [`Scheme`] decides how
//! metadata is resolved and which save strategy applies:
//!
//! | Input                                   | Scheme           |
//! |-----------------------------------------|------------------|
//! | `file:///sdcard/DCIM/a.jpg`             | `File`           |
//! | `/sdcard/DCIM/a.jpg` (bare path)        | `File`           |
//! | `content://media/external/images/1`     | `IndexedContent` |
//! | `content://downloads/7`, `https://...`  | `Other`          |

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authority of the photo index content provider.
pub const MEDIA_AUTHORITY: &str = "media";

/// Scheme tag of an [`ImageIdentifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// A plain file on the local filesystem.
    File,
    /// A row in the photo index (`content://media/...`).
    IndexedContent,
    /// Anything else; no backing file can be resolved.
    Other,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Empty image identifier")]
    Empty,

    #[error("Malformed image identifier: {0}")]
    Malformed(String),
}

/// Opaque locator of a source or saved image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageIdentifier {
    scheme_name: String,
    authority: String,
    path: String,
}

impl ImageIdentifier {
    /// Parse `input` as `scheme://authority/path`. Inputs without `://`
    /// are treated as local file paths.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let Some((scheme, rest)) = input.split_once("://") else {
            return Ok(Self::from_path(input));
        };

        let valid_scheme = scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c));
        if scheme.is_empty() || !valid_scheme {
            return Err(IdentifierError::Malformed(input.to_string()));
        }

        let (authority, path) = if scheme.eq_ignore_ascii_case("file") {
            // file:// carries no authority; relative paths stay relative
            if rest.is_empty() {
                return Err(IdentifierError::Malformed(input.to_string()));
            }
            ("", rest)
        } else {
            match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, ""),
            }
        };

        Ok(Self {
            scheme_name: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }

    /// Identifier for a local file.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            scheme_name: "file".to_string(),
            authority: String::new(),
            path: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Identifier of a row in the photo index collection `collection`.
    pub fn indexed(collection: &str, id: u64) -> Self {
        Self {
            scheme_name: "content".to_string(),
            authority: MEDIA_AUTHORITY.to_string(),
            path: format!("/{}/{}", collection.trim_matches('/'), id),
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self.scheme_name.as_str() {
            "file" => Scheme::File,
            "content" if self.authority == MEDIA_AUTHORITY => Scheme::IndexedContent,
            _ => Scheme::Other,
        }
    }

    pub fn is_file(&self) -> bool {
        self.scheme() == Scheme::File
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path component, without query or fragment.
    pub fn path(&self) -> &str {
        let end = self
            .path
            .find(|c: char| c == '?' || c == '#')
            .unwrap_or(self.path.len());
        &self.path[..end]
    }

    /// Filesystem path for `File` identifiers.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.is_file().then(|| PathBuf::from(self.path()))
    }

    /// Last path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path().rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Trailing numeric segment of an indexed identifier.
    pub fn row_id(&self) -> Option<u64> {
        if self.scheme() != Scheme::IndexedContent {
            return None;
        }
        self.file_name()?.parse().ok()
    }
}

impl fmt::Display for ImageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme_name, self.authority, self.path)
    }
}

impl FromStr for ImageIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageIdentifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageIdentifier> for String {
    fn from(id: ImageIdentifier) -> Self {
        id.to_string()
    }
}
