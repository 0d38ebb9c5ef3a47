//! Storage listing

use alloc::string::String;

/// One printable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the storage root
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

/// Ordered, indexable listing of printable files
///
/// Pages are built by index so the listing is never copied as a whole.
pub trait FileListing {
    fn file_count(&self) -> usize;

    fn file_at(&self, index: usize) -> Option<FileEntry>;
}

impl FileListing for [FileEntry] {
    fn file_count(&self) -> usize {
        self.len()
    }

    fn file_at(&self, index: usize) -> Option<FileEntry> {
        self.get(index).cloned()
    }
}
