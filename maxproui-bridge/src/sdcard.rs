//! Printable file listing
//!
//! Mirrors what Klipper's virtual SD card shows: every G-code file under
//! the directory, recursively, as a path relative to it, sorted without
//! regard to case. Hidden files and directories are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use maxproui_core::traits::{FileEntry, FileListing};

/// Extensions Klipper accepts for printing
const GCODE_EXTENSIONS: [&str; 3] = ["gcode", "g", "gco"];

/// Cached listing of the G-code directory
#[derive(Debug)]
pub struct GcodeDirectory {
    root: PathBuf,
    max_age: Duration,
    files: Vec<FileEntry>,
    scanned_at: Option<Instant>,
}

impl GcodeDirectory {
    pub fn new(root: PathBuf, max_age: Duration) -> Self {
        Self {
            root,
            max_age,
            files: Vec::new(),
            scanned_at: None,
        }
    }

    /// Rescan the directory, returning the number of files found
    pub fn refresh(&mut self) -> io::Result<usize> {
        self.scanned_at = Some(Instant::now());
        let mut files = Vec::new();
        let result = scan(&self.root, &self.root, &mut files);
        files.sort_by_cached_key(|f| f.path.to_lowercase());
        self.files = files;
        result.map(|()| self.files.len())
    }

    /// Rescan if the last scan is older than the configured age
    pub fn refresh_if_stale(&mut self) {
        let fresh = self
            .scanned_at
            .is_some_and(|at| at.elapsed() < self.max_age);
        if fresh {
            return;
        }
        match self.refresh() {
            Ok(count) => debug!(count, "file list refreshed"),
            Err(e) => warn!(dir = %self.root.display(), "cannot list files: {}", e),
        }
    }
}

fn is_gcode(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GCODE_EXTENSIONS.iter().any(|g| ext.eq_ignore_ascii_case(g)))
}

fn scan(root: &Path, dir: &Path, out: &mut Vec<FileEntry>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let meta = fs::metadata(&path)?;
        if meta.is_dir() {
            scan(root, &path, out)?;
        } else if meta.is_file() && is_gcode(&path) {
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let rel: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            out.push(FileEntry {
                path: rel.join("/"),
                size: meta.len(),
            });
        }
    }
    Ok(())
}

impl FileListing for GcodeDirectory {
    fn file_count(&self) -> usize {
        self.files.len()
    }

    fn file_at(&self, index: usize) -> Option<FileEntry> {
        self.files.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, rel: &str, len: usize) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b';'; len]).unwrap();
    }

    fn paths(dir: &GcodeDirectory) -> Vec<String> {
        (0..dir.file_count())
            .filter_map(|i| dir.file_at(i))
            .map(|f| f.path)
            .collect()
    }

    #[test]
    fn test_lists_gcode_recursively_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "benchy.gcode", 10);
        touch(tmp.path(), "Adapter.GCO", 3);
        touch(tmp.path(), "parts/clip.g", 1);
        touch(tmp.path(), "notes.txt", 1);
        touch(tmp.path(), ".hidden.gcode", 1);
        touch(tmp.path(), ".thumbs/cube.gcode", 1);

        let mut dir = GcodeDirectory::new(tmp.path().to_path_buf(), Duration::from_secs(1));
        assert_eq!(dir.refresh().unwrap(), 3);
        assert_eq!(paths(&dir), ["Adapter.GCO", "benchy.gcode", "parts/clip.g"]);
        assert_eq!(dir.file_at(1).unwrap().size, 10);
        assert_eq!(dir.file_count(), 3);
        assert!(dir.file_at(3).is_none());
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut dir = GcodeDirectory::new(tmp.path().join("gone"), Duration::from_secs(1));
        assert!(dir.refresh().is_err());
        dir.refresh_if_stale();
        assert_eq!(dir.file_count(), 0);
    }

    #[test]
    fn test_refresh_only_when_stale() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.gcode", 1);
        let mut dir = GcodeDirectory::new(tmp.path().to_path_buf(), Duration::from_secs(3600));
        dir.refresh_if_stale();
        assert_eq!(dir.file_count(), 1);

        touch(tmp.path(), "b.gcode", 1);
        dir.refresh_if_stale();
        assert_eq!(dir.file_count(), 1);
        dir.refresh().unwrap();
        assert_eq!(dir.file_count(), 2);
    }

    #[test]
    fn test_zero_age_always_rescans() {
        let tmp = tempfile::tempdir().unwrap();
        let mut dir = GcodeDirectory::new(tmp.path().to_path_buf(), Duration::ZERO);
        dir.refresh_if_stale();
        touch(tmp.path(), "a.gcode", 1);
        dir.refresh_if_stale();
        assert_eq!(paths(&dir), ["a.gcode"]);
    }
}
