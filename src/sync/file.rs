//! File operations for bags.
//!
//! - Atomic writes: write to temp file, sync to disk, then rename
//! - Ordered directory walks for import

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::sync::types::{SyncError, SyncResult};

/// Write content to a file atomically.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> SyncResult<()> {
    atomic_write_from(path, &mut &content[..]).map(|_| ())
}

/// Stream `reader` into a file atomically, returning the bytes written.
///
/// This function:
/// 1. Copies the reader into a temporary file next to the target
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// Parent directories are created as needed. If any step fails, the
/// original file (if any) remains untouched and the temp file is removed.
///
/// # Errors
///
/// Returns an error if reading or any file operation fails.
pub fn atomic_write_from(path: &Path, reader: &mut dyn Read) -> SyncResult<u64> {
    let mut temp_name = path.file_name().map(OsString::from).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = write_synced(&temp_path, reader).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })?;

    fs::rename(&temp_path, path)?;

    Ok(written)
}

fn write_synced(path: &Path, reader: &mut dyn Read) -> io::Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let written = io::copy(reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(written)
}

/// Every regular file below `dir`, depth-first with the entries of each
/// directory in file name order. Symbolic links are not followed.
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `dir` is not a directory, or an IO error
/// if a directory cannot be listed.
pub fn walk_files(dir: &Path) -> SyncResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SyncError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rest").join("foo.jsonld");

        atomic_write(&path, b"line 1\nline 2\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "line 1\nline 2\n");
        assert!(!temp_dir.path().join("rest").join("foo.jsonld.tmp").exists());
    }

    #[test]
    fn test_atomic_write_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("img.binary");

        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    /// Hands out its data a few bytes per read, like a network body.
    struct Trickle<'a> {
        data: &'a [u8],
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.data.len()).min(3);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Fails after the first read.
    struct Broken {
        served: bool,
    }

    impl Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("connection reset"));
            }
            self.served = true;
            buf[0] = b'x';
            Ok(1)
        }
    }

    #[test]
    fn test_atomic_write_from_reader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rest").join("img.binary");
        let data = vec![7u8; 100_000];

        let written = atomic_write_from(&path, &mut Trickle { data: &data }).unwrap();

        assert_eq!(written, 100_000);
        assert_eq!(fs::read(&path).unwrap(), data);
    }

    #[test]
    fn test_atomic_write_from_failed_read_keeps_original() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("img.binary");
        atomic_write(&path, b"old").unwrap();

        let result = atomic_write_from(&path, &mut Broken { served: false });

        assert!(matches!(result, Err(SyncError::Io(_))));
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(!temp_dir.path().join("img.binary.tmp").exists());
    }

    #[test]
    fn test_walk_files_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("rest/b/deep")).unwrap();
        fs::create_dir_all(root.join("rest/a")).unwrap();
        fs::write(root.join("rest/b/deep/z.jsonld"), "").unwrap();
        fs::write(root.join("rest/a/y.jsonld"), "").unwrap();
        fs::write(root.join("rest.jsonld"), "").unwrap();

        let files = walk_files(root).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("rest/a/y.jsonld"),
                PathBuf::from("rest/b/deep/z.jsonld"),
                PathBuf::from("rest.jsonld"),
            ]
        );
    }

    #[test]
    fn test_walk_files_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("rest/empty")).unwrap();
        assert!(walk_files(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_walk_files_missing_dir() {
        let result = walk_files(Path::new("/nonexistent/bag/data"));
        assert!(matches!(result, Err(SyncError::DirectoryNotFound(_))));
    }
}
