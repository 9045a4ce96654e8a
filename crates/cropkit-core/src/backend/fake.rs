//! In-memory content backend for tests.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{ContentAccess, ContentError, ContentStream, MetadataError, Row};
use crate::closable::Closable;
use crate::identifier::ImageIdentifier;

/// Stream that counts how often it was closed.
struct TrackedStream {
    inner: Cursor<Vec<u8>>,
    closed: Arc<AtomicUsize>,
}

impl Read for TrackedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for TrackedStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Closable for TrackedStream {
    fn close(&mut self) -> io::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Content backend serving fixed bytes and rows, recording every call.
#[derive(Default)]
pub struct FakeContent {
    streams: HashMap<String, Vec<u8>>,
    rows: HashMap<String, Row>,
    failing_queries: bool,
    closed: Arc<AtomicUsize>,
    opened: Mutex<Vec<String>>,
    queried: Mutex<Vec<String>>,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, id: &ImageIdentifier, bytes: &[u8]) -> Self {
        self.streams.insert(id.to_string(), bytes.to_vec());
        self
    }

    pub fn with_row(mut self, id: &ImageIdentifier, row: Row) -> Self {
        self.rows.insert(id.to_string(), row);
        self
    }

    /// Make every metadata query fail.
    pub fn failing_queries(mut self) -> Self {
        self.failing_queries = true;
        self
    }

    /// Identifiers passed to `open_stream`, in call order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    /// Identifiers passed to `query_row`, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    /// Streams opened successfully.
    pub fn open_count(&self) -> usize {
        self.opened()
            .iter()
            .filter(|id| self.streams.contains_key(*id))
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ContentAccess for FakeContent {
    fn open_stream(&self, id: &ImageIdentifier) -> Result<Box<dyn ContentStream>, ContentError> {
        let key = id.to_string();
        self.opened.lock().unwrap().push(key.clone());
        let bytes = self
            .streams
            .get(&key)
            .ok_or_else(|| ContentError::NotFound(key.clone()))?;
        Ok(Box::new(TrackedStream {
            inner: Cursor::new(bytes.clone()),
            closed: Arc::clone(&self.closed),
        }))
    }

    fn query_row(
        &self,
        id: &ImageIdentifier,
        columns: &[&str],
    ) -> Result<Option<Row>, MetadataError> {
        let key = id.to_string();
        self.queried.lock().unwrap().push(key.clone());
        if self.failing_queries {
            return Err(MetadataError::Backend("query failed".into()));
        }
        self.rows
            .get(&key)
            .map(|row| row.project(columns))
            .transpose()
    }
}
