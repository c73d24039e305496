//! Non-recursive directory listing used when capturing a snapshot.
//!
//! Entries whose name begins with `.` are never returned, so hidden files and
//! everything below hidden directories stay out of snapshots.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DirListError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Non-UTF-8 file name in {0}")]
    NonUtf8Name(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, sockets, fifos and devices. Not part of snapshots.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub kind: EntryKind,
}

fn io_error(path: &Path, e: std::io::Error) -> DirListError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        DirListError::PermissionDenied(path.to_path_buf())
    } else {
        DirListError::Io(e)
    }
}

/// List the visible immediate children of `dir`, sorted by name.
///
/// Symlinks are reported as `EntryKind::Other` and never followed.
pub fn list_directory(dir: &Path) -> Result<Vec<FsEntry>, DirListError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

    let mut entries = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(DirListError::Io)?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| DirListError::NonUtf8Name(dir.to_path_buf()))?;

        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| io_error(&entry.path(), e))?;
        let kind = if file_type.is_symlink() {
            EntryKind::Other
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        entries.push(FsEntry { name, kind });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}
