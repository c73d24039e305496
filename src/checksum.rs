use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("File modified during checksumming: {0}")]
    ConcurrentModification(PathBuf),
}

fn io_error(path: &Path, e: std::io::Error) -> ChecksumError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ChecksumError::PermissionDenied(path.to_path_buf())
    } else {
        ChecksumError::Io(e)
    }
}

/// Computes the hex encoded SHA-256 of a file.
///
/// The modification time is sampled before and after reading; if it moved,
/// the digest describes no consistent version of the file and
/// `ChecksumError::ConcurrentModification` is returned instead. The absence of
/// this error is *not* a guarantee that the file was not modified.
pub fn checksum_file(path: &Path) -> Result<String, ChecksumError> {
    let mtime_before = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| io_error(path, e))?;

    let mut file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| io_error(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let mtime_after = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(ChecksumError::Io)?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    let sha256 = format!("{:x}", hasher.finalize());

    debug!("Checksum of {} is {}", path.display(), sha256);

    Ok(sha256)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_checksum_simple_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Hello, world!").unwrap();
        temp_file.flush().unwrap();

        assert_eq!(
            checksum_file(temp_file.path()).unwrap(),
            "315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3"
        );
    }

    #[test]
    fn test_checksum_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();

        assert_eq!(
            checksum_file(temp_file.path()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_checksum_spans_multiple_buffers() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&vec![b'A'; 1024 * 1024 + 7]).unwrap();
        temp_file.flush().unwrap();

        let result = checksum_file(temp_file.path()).unwrap();

        assert_eq!(result.len(), crate::snapshot::SHA256_HEX_LEN);
        assert!(result.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_checksum_nonexistent_file() {
        let result = checksum_file(Path::new("/nonexistent/file.txt"));

        match result {
            Err(ChecksumError::Io(_)) => {}
            _ => panic!("Expected IO error for nonexistent file"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_checksum_permission_denied() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        fs::set_permissions(temp_file.path(), fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores file permissions.
        if fs::File::open(temp_file.path()).is_ok() {
            return;
        }

        match checksum_file(temp_file.path()) {
            Err(ChecksumError::PermissionDenied(_)) => {}
            other => panic!("Expected PermissionDenied, got {other:?}"),
        }
    }

    #[test]
    fn test_checksum_concurrent_modification() {
        // Races a background thread bumping the mtime against the checksum.
        // Inherently timing dependent; a 5MB file and 100 attempts make a
        // miss extremely unlikely.
        use filetime::{FileTime, set_file_mtime};
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;
        use std::time::Duration;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&vec![b'X'; 5 * 1024 * 1024]).unwrap();
        temp_file.flush().unwrap();

        let path = temp_file.path().to_path_buf();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_clone = stop_flag.clone();

        let modifier_handle = thread::spawn(move || {
            let mut counter = 0u64;
            while !stop_flag_clone.load(Ordering::Relaxed) {
                counter = counter.wrapping_add(1);
                let mtime = FileTime::from_unix_time(1_000_000_000 + (counter as i64), 0);
                let _ = set_file_mtime(&path, mtime);
            }
        });

        let mut got_concurrent_modification = false;
        for _ in 0..100 {
            match checksum_file(temp_file.path()) {
                Err(ChecksumError::ConcurrentModification(_)) => {
                    got_concurrent_modification = true;
                    break;
                }
                Ok(_) => thread::sleep(Duration::from_millis(1)),
                Err(e) => panic!("Unexpected error: {}", e),
            }
        }

        stop_flag.store(true, Ordering::Relaxed);
        modifier_handle.join().unwrap();

        assert!(
            got_concurrent_modification,
            "Expected to detect concurrent modification at least once in 100 attempts"
        );
    }
}
