//! A photo index persisted as a JSON file.
//!
//! Used by the command line launcher and by tests as a stand-in for a
//! platform media store. Rows are keyed by a monotonically increasing id and
//! exposed as `content://media/external/images/media/<id>`.
//!
//! The index also serves [`ContentAccess`] for both file identifiers (opened
//! directly) and its own indexed identifiers (opened through the row's
//! `_data` path).

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{
    columns, ContentAccess, ContentError, ContentStream, IndexError, MetadataError, PhotoIndex,
    Row,
};
use crate::identifier::{ImageIdentifier, Scheme};
use crate::save::SaveRecord;

/// Collection path of image rows.
pub const IMAGES_COLLECTION: &str = "external/images/media";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IndexState {
    next_id: u64,
    rows: BTreeMap<u64, Row>,
}

/// JSON-file photo index. Interior locking makes it usable through `&self`.
#[derive(Debug)]
pub struct JsonPhotoIndex {
    path: Option<PathBuf>,
    state: Mutex<IndexState>,
}

impl JsonPhotoIndex {
    /// An index that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(IndexState {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    /// Open the index stored at `path`, starting empty if the file does not
    /// exist yet. Every mutation is written back to `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, IndexError> {
        let path = path.into();
        let state = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let mut state: IndexState = serde_json::from_str(&json)?;
            let max_id = state.rows.keys().next_back().copied().unwrap_or(0);
            state.next_id = state.next_id.max(max_id + 1);
            state
        } else {
            IndexState {
                next_id: 1,
                rows: BTreeMap::new(),
            }
        };

        debug!("Opened photo index {} ({} rows)", path.display(), state.rows.len());
        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Backing file, if persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert a raw row, bypassing [`SaveRecord`]. Useful for seeding.
    pub fn insert_row(&self, row: Row) -> Result<ImageIdentifier, IndexError> {
        let mut state = self.lock()?;
        let mut next = state.clone();
        let id = next.next_id;
        next.next_id += 1;
        next.rows.insert(id, row);
        self.commit(&mut state, next)?;
        Ok(ImageIdentifier::indexed(IMAGES_COLLECTION, id))
    }

    /// Full row stored for `id`.
    pub fn row(&self, id: &ImageIdentifier) -> Option<Row> {
        let row_id = id.row_id()?;
        self.state.lock().ok()?.rows.get(&row_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexState>, IndexError> {
        self.state.lock().map_err(|_| IndexError::Poisoned)
    }

    /// Persist `next`, then make it the live state. A failed write leaves
    /// the live state untouched.
    fn commit(&self, state: &mut IndexState, next: IndexState) -> Result<(), IndexError> {
        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    fn persist(&self, state: &IndexState) -> Result<(), IndexError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn data_path(&self, id: &ImageIdentifier) -> Result<PathBuf, ContentError> {
        let row = self
            .row(id)
            .ok_or_else(|| ContentError::NotFound(id.to_string()))?;
        let data = row
            .get_text(columns::DATA)
            .map_err(|_| ContentError::NotFound(id.to_string()))?;
        Ok(PathBuf::from(data))
    }
}

impl ContentAccess for JsonPhotoIndex {
    fn open_stream(&self, id: &ImageIdentifier) -> Result<Box<dyn ContentStream>, ContentError> {
        let path = match id.scheme() {
            Scheme::File => id
                .file_path()
                .ok_or_else(|| ContentError::NotFound(id.to_string()))?,
            Scheme::IndexedContent => self.data_path(id)?,
            Scheme::Other => return Err(ContentError::Unsupported(id.to_string())),
        };

        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!("No file at {} for {}", path.display(), id);
                Err(ContentError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn query_row(
        &self,
        id: &ImageIdentifier,
        columns: &[&str],
    ) -> Result<Option<Row>, MetadataError> {
        match id.scheme() {
            // Plain files carry no index metadata
            Scheme::File => Ok(None),
            Scheme::IndexedContent => {
                let Some(row_id) = id.row_id() else {
                    return Ok(None);
                };
                let state = self
                    .state
                    .lock()
                    .map_err(|_| MetadataError::Backend("index lock poisoned".into()))?;
                state
                    .rows
                    .get(&row_id)
                    .map(|row| row.project(columns))
                    .transpose()
            }
            Scheme::Other => Err(MetadataError::Backend(format!(
                "unsupported identifier {}",
                id
            ))),
        }
    }
}

impl PhotoIndex for JsonPhotoIndex {
    fn insert(&self, record: &SaveRecord) -> Result<ImageIdentifier, IndexError> {
        self.insert_row(record.to_row())
    }

    fn update(&self, id: &ImageIdentifier, record: &SaveRecord) -> Result<(), IndexError> {
        let row_id = id
            .row_id()
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        let mut state = self.lock()?;
        let mut next = state.clone();
        next.rows
            .get_mut(&row_id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?
            .merge(record.to_row());
        self.commit(&mut state, next)
    }
}
