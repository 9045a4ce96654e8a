//! Where cropped output is written.
//!
//! Output lands next to the source image when the source has a writable
//! local directory, otherwise under `<storage root>/EditedOnlinePhotos`.
//! File names are timestamped in local time: `IMG_20240131_154500.JPG`.
//! A second crop within the same second gets `IMG_20240131_154500_1.JPG`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use log::debug;

use super::reconcile::OutputReconciler;
use super::SaveError;
use crate::backend::{Filesystem, PhotoIndex};
use crate::identifier::ImageIdentifier;

/// Fallback directory name under the storage root.
pub const DEFAULT_SAVE_DIRECTORY: &str = "EditedOnlinePhotos";

const FILE_PREFIX: &str = "IMG";
const TIME_STAMP_FORMAT: &str = "_%Y%m%d_%H%M%S";
const FILE_EXTENSION: &str = ".JPG";

/// Timestamped output file name for `time`.
pub fn output_file_name<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", file_stem(time), FILE_EXTENSION)
}

fn file_stem<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", FILE_PREFIX, time.format(TIME_STAMP_FORMAT))
}

impl<'a, I, F> OutputReconciler<'a, I, F>
where
    I: PhotoIndex + ?Sized,
    F: Filesystem + ?Sized,
{
    /// Directory new output for `source` should be written into, created if
    /// missing.
    ///
    /// # Arguments
    ///
    /// * `source` - The image being cropped
    /// * `storage_root` - Root for the fallback directory
    /// * `save_directory` - Name of the fallback directory under the root
    pub fn final_save_directory(
        &self,
        source: &ImageIdentifier,
        storage_root: &Path,
        save_directory: &str,
    ) -> Result<PathBuf, SaveError> {
        let beside_source = self
            .resolve_local_file(source)
            .and_then(|file| self.fs.parent_directory(&file))
            .filter(|dir| self.fs.is_writable(dir));

        let dir = match beside_source {
            Some(dir) => dir,
            None => {
                debug!("No writable directory beside {}, using fallback", source);
                storage_root.join(save_directory)
            }
        };

        if !self.fs.exists(&dir) {
            self.fs.create_directories(&dir)?;
        }
        Ok(dir)
    }

    /// Full output path for a crop of `source` taken at `time`. An existing
    /// file is never reused; a numeric suffix is added instead.
    pub fn make_output_path<Tz: TimeZone>(
        &self,
        source: &ImageIdentifier,
        storage_root: &Path,
        save_directory: &str,
        time: &DateTime<Tz>,
    ) -> Result<PathBuf, SaveError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let dir = self.final_save_directory(source, storage_root, save_directory)?;
        let mut path = dir.join(output_file_name(time));
        let mut suffix = 1u32;
        while self.fs.exists(&path) {
            path = dir.join(format!("{}_{}{}", file_stem(time), suffix, FILE_EXTENSION));
            suffix += 1;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{columns, JsonPhotoIndex, LocalFilesystem, Row, Value};
    use chrono::Utc;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 15, 45, 0).unwrap()
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(&fixed_time()), "IMG_20240131_154500.JPG");
    }

    #[test]
    fn test_save_beside_file_source() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("DCIM/a.jpg");
        std::fs::create_dir_all(photo.parent().unwrap()).unwrap();
        std::fs::write(&photo, b"x").unwrap();

        let index = JsonPhotoIndex::in_memory();
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
        let source = ImageIdentifier::from_path(&photo);

        let path = reconciler
            .make_output_path(&source, tmp.path(), DEFAULT_SAVE_DIRECTORY, &fixed_time())
            .unwrap();
        assert_eq!(path, tmp.path().join("DCIM/IMG_20240131_154500.JPG"));
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("a.jpg");
        std::fs::write(&photo, b"x").unwrap();
        std::fs::write(tmp.path().join("IMG_20240131_154500.JPG"), b"first").unwrap();

        let index = JsonPhotoIndex::in_memory();
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
        let source = ImageIdentifier::from_path(&photo);

        let path = reconciler
            .make_output_path(&source, tmp.path(), DEFAULT_SAVE_DIRECTORY, &fixed_time())
            .unwrap();
        assert_eq!(path, tmp.path().join("IMG_20240131_154500_1.JPG"));

        std::fs::write(&path, b"second").unwrap();
        let path = reconciler
            .make_output_path(&source, tmp.path(), DEFAULT_SAVE_DIRECTORY, &fixed_time())
            .unwrap();
        assert_eq!(path, tmp.path().join("IMG_20240131_154500_2.JPG"));
    }

    #[test]
    fn test_save_beside_indexed_source() {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("album");
        std::fs::create_dir_all(&album).unwrap();

        let index = JsonPhotoIndex::in_memory();
        let source = index
            .insert_row(Row::new().with(
                columns::DATA,
                Value::Text(album.join("p.jpg").to_string_lossy().into()),
            ))
            .unwrap();
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);

        let dir = reconciler
            .final_save_directory(&source, tmp.path(), DEFAULT_SAVE_DIRECTORY)
            .unwrap();
        assert_eq!(dir, album);
    }

    #[test]
    fn test_fallback_directory_is_created() {
        let tmp = TempDir::new().unwrap();
        let index = JsonPhotoIndex::in_memory();
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
        let source = ImageIdentifier::parse("https://example.com/a.jpg").unwrap();

        let dir = reconciler
            .final_save_directory(&source, tmp.path(), DEFAULT_SAVE_DIRECTORY)
            .unwrap();
        assert_eq!(dir, tmp.path().join("EditedOnlinePhotos"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_missing_source_directory_falls_back() {
        let tmp = TempDir::new().unwrap();
        let index = JsonPhotoIndex::in_memory();
        let reconciler = OutputReconciler::new(&index, &LocalFilesystem);
        let source = ImageIdentifier::from_path(tmp.path().join("nowhere/a.jpg"));

        let dir = reconciler
            .final_save_directory(&source, tmp.path(), "Crops")
            .unwrap();
        assert_eq!(dir, tmp.path().join("Crops"));
    }
}
