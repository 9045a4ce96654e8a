//! [`Filesystem`] backed by `std::fs`.

use std::fs;
use std::io;
use std::path::Path;

use super::Filesystem;

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn create_directories(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }
}
