use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File access used by the processor.
pub trait FileSystem {
    fn read(&self, path: &Path) -> Result<String>;
    /// Replace the whole content of `path`. Implementations must never leave
    /// a partially written file behind.
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

/// Local filesystem implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let invalid = || Error::file_write_failed(path.to_string_lossy(), "Invalid path");
    let parent = path.parent().ok_or_else(invalid)?;
    let filename = path.file_name().ok_or_else(invalid)?;

    Ok(parent.join(format!(".{}.fixsweep.tmp", filename.to_string_lossy())))
}

impl FileSystem for LocalFs {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_read_failed(path.to_string_lossy(), "File not found")
            } else {
                Error::file_read_failed(path.to_string_lossy(), e.to_string())
            }
        })
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        // Atomic write: write to temp file, then rename
        let display = path.to_string_lossy().to_string();
        let permissions = fs::metadata(path)
            .map_err(|e| Error::file_write_failed(&display, e.to_string()))?
            .permissions();

        let tmp_path = temp_path(path)?;

        let staged = fs::write(&tmp_path, content)
            .and_then(|_| fs::set_permissions(&tmp_path, permissions))
            .and_then(|_| fs::rename(&tmp_path, path));

        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::file_write_failed(&display, e.to_string()));
        }

        Ok(())
    }
}

/// Convenience function to get local filesystem
pub fn local() -> LocalFs {
    LocalFs::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    #[test]
    fn test_local_fs_write_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ts");
        fs::write(&path, "old").unwrap();
        let fs = local();

        fs.write(&path, "hello world").unwrap();
        assert_eq!(fs.read(&path).unwrap(), "hello world");
        assert!(!temp_path(&path).unwrap().exists());
    }

    #[test]
    fn missing_file_is_a_read_failure() {
        let dir = tempdir().unwrap();
        let err = local().read(&dir.path().join("gone.ts")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileReadFailed);
        assert_eq!(err.cause(), "File not found");
    }

    #[test]
    fn non_utf8_is_a_read_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bin.ts");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = local().read(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileReadFailed);
    }

    #[test]
    fn write_to_vanished_file_fails_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.ts");

        let err = local().write(&path, "x").unwrap_err();
        assert_eq!(err.code, ErrorCode::FileWriteFailed);
        assert!(!path.exists());
        assert!(!temp_path(&path).unwrap().exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("run.ts");
        fs::write(&path, "a").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o754)).unwrap();

        local().write(&path, "b").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o754);
    }
}
