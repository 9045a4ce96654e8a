//! Linking a saved output file into the photo index.
//!
//! # Decision Table
//!
//! | source is file | has backing file | delete original | action            |
//! |----------------|------------------|-----------------|-------------------|
//! | yes            | any              | any             | insert new row    |
//! | no             | no               | any             | insert new row    |
//! | no             | yes              | no              | insert new row    |
//! | no             | yes              | yes             | replace existing  |
//!
//! Replacing updates the source row in place and then removes the file it
//! used to point at. That removal is best effort: once the index has been
//! mutated, a leftover file is preferable to reporting a failed save.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::record::build_save_record;
use super::SaveError;
use crate::backend::{columns, Filesystem, Lookup, PhotoIndex};
use crate::identifier::{ImageIdentifier, Scheme};

/// What a save does to the photo index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    /// Insert a new row and return its identifier.
    InsertNew,
    /// Update the source row and delete its previous file.
    ReplaceExisting,
}

/// Pick the save action. See the module docs for the table.
pub fn decide_save_action(
    source_is_file: bool,
    has_backing_file: bool,
    delete_original: bool,
) -> SaveAction {
    match (source_is_file, has_backing_file, delete_original) {
        // A file identifier cannot be re-pointed at another file
        (true, _, _) => SaveAction::InsertNew,
        (false, false, _) => SaveAction::InsertNew,
        (false, true, false) => SaveAction::InsertNew,
        (false, true, true) => SaveAction::ReplaceExisting,
    }
}

/// Resolve the filesystem path behind `id`.
///
/// File identifiers map to their own path, indexed identifiers to their
/// `_data` column. Anything else, or a failed query, yields `None`.
pub fn resolve_local_file<I>(index: &I, id: &ImageIdentifier) -> Option<PathBuf>
where
    I: PhotoIndex + ?Sized,
{
    match id.scheme() {
        Scheme::File => id.file_path(),
        Scheme::IndexedContent => {
            let lookup = Lookup::from_query(index.query_row(id, &[columns::DATA]), |row| {
                row.get_text(columns::DATA).map(PathBuf::from)
            });
            match lookup {
                Lookup::Found(path) => Some(path),
                Lookup::NotFound => None,
                Lookup::Unavailable(e) => {
                    debug!("No backing file for {}: {}", id, e);
                    None
                }
            }
        }
        Scheme::Other => None,
    }
}

/// Saves cropped output into a photo index.
pub struct OutputReconciler<'a, I: ?Sized, F: ?Sized> {
    pub(crate) index: &'a I,
    pub(crate) fs: &'a F,
}

impl<'a, I, F> OutputReconciler<'a, I, F>
where
    I: PhotoIndex + ?Sized,
    F: Filesystem + ?Sized,
{
    pub fn new(index: &'a I, fs: &'a F) -> Self {
        Self { index, fs }
    }

    pub fn resolve_local_file(&self, id: &ImageIdentifier) -> Option<PathBuf> {
        resolve_local_file(self.index, id)
    }

    /// Link `output` into the index on behalf of `source`.
    ///
    /// # Returns
    ///
    /// The identifier that now refers to `output`: a fresh one on insert,
    /// `source` itself on replace.
    ///
    /// # Errors
    ///
    /// `SaveError::Index` if the insert or update fails. Failing to delete
    /// the replaced file is logged and ignored.
    pub fn reconcile(
        &self,
        source: &ImageIdentifier,
        output: &Path,
        timestamp_millis: i64,
        delete_original: bool,
    ) -> Result<ImageIdentifier, SaveError> {
        let old_file = self.resolve_local_file(source);
        let record = build_save_record(self.index, self.fs, source, output, timestamp_millis);

        let action = decide_save_action(source.is_file(), old_file.is_some(), delete_original);
        debug!("Saving {} for {} as {:?}", output.display(), source, action);

        match action {
            SaveAction::InsertNew => {
                let id = self.index.insert(&record)?;
                info!("Inserted {} as {}", output.display(), id);
                Ok(id)
            }
            SaveAction::ReplaceExisting => {
                self.index.update(source, &record)?;
                info!("Updated {} to point at {}", source, output.display());
                if let Some(old) = old_file {
                    self.remove_replaced(&old, &record.data_path);
                }
                Ok(source.clone())
            }
        }
    }

    fn remove_replaced(&self, old: &Path, saved: &Path) {
        // Saving over the original path leaves nothing to remove
        if self.fs.absolute_path(old).as_path() == saved || !self.fs.exists(old) {
            return;
        }
        if let Err(e) = self.fs.delete(old) {
            warn!("Could not delete replaced file {}: {}", old.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        ContentAccess, ContentError, ContentStream, IndexError, JsonPhotoIndex, LocalFilesystem,
        MetadataError, Row, Value,
    };
    use crate::save::SaveRecord;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn test_decision_table() {
        use SaveAction::*;

        let table = [
            ((true, true, true), InsertNew),
            ((true, true, false), InsertNew),
            ((true, false, true), InsertNew),
            ((true, false, false), InsertNew),
            ((false, false, true), InsertNew),
            ((false, false, false), InsertNew),
            ((false, true, false), InsertNew),
            ((false, true, true), ReplaceExisting),
        ];
        for ((is_file, has_file, delete), expected) in table {
            assert_eq!(
                decide_save_action(is_file, has_file, delete),
                expected,
                "({}, {}, {})",
                is_file,
                has_file,
                delete
            );
        }
    }

    struct Fixture {
        tmp: TempDir,
        index: JsonPhotoIndex,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tmp: TempDir::new().unwrap(),
                index: JsonPhotoIndex::in_memory(),
            }
        }

        fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
            let path = self.tmp.path().join(name);
            std::fs::write(&path, bytes).unwrap();
            path
        }

        fn indexed_source(&self, data: &Path) -> ImageIdentifier {
            self.index
                .insert_row(
                    Row::new()
                        .with(columns::DATA, Value::Text(data.to_string_lossy().into()))
                        .with(columns::DATE_TAKEN, Value::Integer(1_400_000_000))
                        .with(columns::LATITUDE, Value::Real(10.0))
                        .with(columns::LONGITUDE, Value::Real(20.0)),
                )
                .unwrap()
        }

        fn reconciler(&self) -> OutputReconciler<'_, JsonPhotoIndex, LocalFilesystem> {
            OutputReconciler::new(&self.index, &LocalFilesystem)
        }
    }

    #[test]
    fn test_resolve_local_file() {
        let fx = Fixture::new();
        let original = fx.write("orig.jpg", b"orig");
        let source = fx.indexed_source(&original);

        assert_eq!(fx.reconciler().resolve_local_file(&source), Some(original));

        let file = ImageIdentifier::from_path("/tmp/x.jpg");
        assert_eq!(
            fx.reconciler().resolve_local_file(&file),
            Some(PathBuf::from("/tmp/x.jpg"))
        );

        let other = ImageIdentifier::parse("content://downloads/1").unwrap();
        assert_eq!(fx.reconciler().resolve_local_file(&other), None);

        let missing = ImageIdentifier::parse("content://media/external/images/media/77").unwrap();
        assert_eq!(fx.reconciler().resolve_local_file(&missing), None);
    }

    #[test]
    fn test_file_source_always_inserts() {
        let fx = Fixture::new();
        let original = fx.write("orig.jpg", b"orig");
        let output = fx.write("out.jpg", b"cropped");
        let source = ImageIdentifier::from_path(&original);

        for delete_original in [false, true] {
            let id = fx
                .reconciler()
                .reconcile(&source, &output, 1_700_000_000_000, delete_original)
                .unwrap();
            assert_eq!(id.scheme(), Scheme::IndexedContent);
            assert!(original.exists(), "file sources are never deleted");
        }
        assert_eq!(fx.index.len(), 2);
    }

    #[test]
    fn test_indexed_source_with_delete_replaces() {
        let fx = Fixture::new();
        let original = fx.write("orig.jpg", b"orig");
        let output = fx.write("out.jpg", b"cropped");
        let source = fx.indexed_source(&original);

        let id = fx
            .reconciler()
            .reconcile(&source, &output, 1_700_000_000_000, true)
            .unwrap();

        assert_eq!(id, source);
        assert_eq!(fx.index.len(), 1);
        assert!(!original.exists());
        assert!(output.exists());

        let row = fx.index.row(&source).unwrap();
        assert_eq!(
            row.get_text(columns::DATA),
            Ok(output.to_string_lossy().as_ref())
        );
        assert_eq!(row.get_i64(columns::SIZE), Ok(7));
        // Provenance was copied before the row was overwritten
        assert_eq!(row.get_i64(columns::DATE_TAKEN), Ok(1_400_000_000));
        assert_eq!(row.get_f64(columns::LATITUDE), Ok(10.0));
        assert_eq!(row.get_i64(columns::DATE_ADDED), Ok(1_700_000_000));
    }

    #[test]
    fn test_indexed_source_without_delete_inserts() {
        let fx = Fixture::new();
        let original = fx.write("orig.jpg", b"orig");
        let output = fx.write("out.jpg", b"cropped");
        let source = fx.indexed_source(&original);

        let id = fx
            .reconciler()
            .reconcile(&source, &output, 1_700_000_000_000, false)
            .unwrap();

        assert_ne!(id, source);
        assert_eq!(fx.index.len(), 2);
        assert!(original.exists());

        let new_row = fx.index.row(&id).unwrap();
        assert_eq!(new_row.get_f64(columns::LONGITUDE), Ok(20.0));
        let old_row = fx.index.row(&source).unwrap();
        assert_eq!(
            old_row.get_text(columns::DATA),
            Ok(original.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_indexed_source_without_backing_file_inserts() {
        let fx = Fixture::new();
        let output = fx.write("out.jpg", b"cropped");
        let source = ImageIdentifier::parse("content://media/external/images/media/42").unwrap();

        let id = fx
            .reconciler()
            .reconcile(&source, &output, 0, true)
            .unwrap();
        assert_ne!(id, source);
        assert_eq!(fx.index.len(), 1);
    }

    #[test]
    fn test_replace_tolerates_missing_old_file() {
        let fx = Fixture::new();
        let output = fx.write("out.jpg", b"cropped");
        let source = fx.indexed_source(&fx.tmp.path().join("gone.jpg"));

        let id = fx
            .reconciler()
            .reconcile(&source, &output, 0, true)
            .unwrap();
        assert_eq!(id, source);
    }

    #[test]
    fn test_replace_in_place_keeps_output() {
        let fx = Fixture::new();
        let output = fx.write("same.jpg", b"cropped");
        let source = fx.indexed_source(&output);

        fx.reconciler()
            .reconcile(&source, &output, 0, true)
            .unwrap();
        assert!(output.exists());
    }

    /// Index whose mutations always fail; records attempts.
    #[derive(Default)]
    struct RejectingIndex {
        attempts: Mutex<Vec<&'static str>>,
        data: Option<String>,
    }

    impl ContentAccess for RejectingIndex {
        fn open_stream(
            &self,
            id: &ImageIdentifier,
        ) -> Result<Box<dyn ContentStream>, ContentError> {
            Err(ContentError::NotFound(id.to_string()))
        }

        fn query_row(
            &self,
            _id: &ImageIdentifier,
            projection: &[&str],
        ) -> Result<Option<Row>, MetadataError> {
            match &self.data {
                Some(data) => Row::new()
                    .with(columns::DATA, Value::Text(data.clone()))
                    .project(projection)
                    .map(Some),
                None => Ok(None),
            }
        }
    }

    impl PhotoIndex for RejectingIndex {
        fn insert(&self, _record: &SaveRecord) -> Result<ImageIdentifier, IndexError> {
            self.attempts.lock().unwrap().push("insert");
            Err(IndexError::Rejected("read-only".into()))
        }

        fn update(&self, _id: &ImageIdentifier, _record: &SaveRecord) -> Result<(), IndexError> {
            self.attempts.lock().unwrap().push("update");
            Err(IndexError::Rejected("read-only".into()))
        }
    }

    #[test]
    fn test_insert_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out.jpg");
        std::fs::write(&output, b"x").unwrap();

        let index = RejectingIndex::default();
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
        let source = ImageIdentifier::from_path("/tmp/src.jpg");

        let result = reconciler.reconcile(&source, &output, 0, true);
        assert!(matches!(result, Err(SaveError::Index(IndexError::Rejected(_)))));
        assert_eq!(*index.attempts.lock().unwrap(), vec!["insert"]);
    }

    #[test]
    fn test_update_failure_propagates_and_keeps_old_file() {
        let tmp = TempDir::new().unwrap();
        let original = tmp.path().join("orig.jpg");
        let output = tmp.path().join("out.jpg");
        std::fs::write(&original, b"o").unwrap();
        std::fs::write(&output, b"x").unwrap();

        let index = RejectingIndex {
            data: Some(original.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
        let source = ImageIdentifier::parse("content://media/external/images/media/1").unwrap();

        let result = reconciler.reconcile(&source, &output, 0, true);
        assert!(matches!(result, Err(SaveError::Index(_))));
        assert_eq!(*index.attempts.lock().unwrap(), vec!["update"]);
        assert!(original.exists());
    }
}
