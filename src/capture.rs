use crate::checksum::{ChecksumError, checksum_file};
use crate::dir_list::{DirListError, EntryKind, list_directory};
use crate::snapshot::{Snapshot, TOOL_NAME};
use chrono::{SubsecRound, Utc};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Directory listing error: {0}")]
    DirList(#[from] DirListError),
    #[error("Checksum error: {0}")]
    Checksum(#[from] ChecksumError),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Root path is not valid UTF-8: {0}")]
    NonUtf8Root(PathBuf),
    #[error("IO error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Checksum every visible regular file below `root`.
///
/// Walks the tree depth first, one directory listing at a time. Hidden
/// entries (and everything below hidden directories) are skipped, as are
/// symlinks and special files. `root` itself may be hidden. Paths are
/// recorded relative to `root` in `./a/b` form and the capture time is the
/// current UTC time at second precision.
pub fn capture_snapshot(root: &Path) -> Result<Snapshot, CaptureError> {
    let captured_at = Utc::now().trunc_subsecs(0);

    let root = root.canonicalize().map_err(|e| {
        if e.kind() == ErrorKind::PermissionDenied {
            CaptureError::DirList(DirListError::PermissionDenied(root.to_path_buf()))
        } else {
            CaptureError::DirList(DirListError::Io(e))
        }
    })?;
    if !root.is_dir() {
        return Err(CaptureError::NotADirectory(root));
    }
    let root_display = root
        .to_str()
        .ok_or_else(|| CaptureError::NonUtf8Root(root.clone()))?
        .to_string();

    info!("Capturing {}", root.display());

    let mut entries = BTreeMap::new();
    walk_directory(&root, ".", &mut entries)?;

    Ok(Snapshot::new(TOOL_NAME, root_display, captured_at, entries))
}

fn walk_directory(
    dir: &Path,
    relative_dir: &str,
    entries: &mut BTreeMap<String, String>,
) -> Result<(), CaptureError> {
    for entry in list_directory(dir)? {
        let path = dir.join(&entry.name);
        let relative_path = format!("{}/{}", relative_dir, entry.name);

        match entry.kind {
            EntryKind::File => {
                let sha256 = checksum_file(&path)?;
                entries.insert(relative_path, sha256);
            }
            EntryKind::Dir => walk_directory(&path, &relative_path, entries)?,
            EntryKind::Other => debug!("Skipping non-regular file {}", path.display()),
        }
    }

    Ok(())
}

/// Save a snapshot atomically.
///
/// Writes to a temporary file, fsyncs it, then atomically renames it into place.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), CaptureError> {
    use std::io::Write;

    let write_error = |source: std::io::Error| CaptureError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
    temp_file
        .write_all(snapshot.to_snapshot_string().as_bytes())
        .map_err(write_error)?;
    temp_file.as_file().sync_all().map_err(write_error)?;
    temp_file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}
