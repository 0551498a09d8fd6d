//! Atomic file replacement

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use promptly_core::Result;

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// Readers observe either the old file or the new one, never a partial write.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let guard = TempFile::create(path)?;
    {
        let mut file = &guard.file;
        file.write_all(contents)?;
        file.flush()?;
        file.sync_all()?;
    }

    guard.persist(path)
}

/// Temp file removed on drop unless persisted
struct TempFile {
    path: PathBuf,
    file: File,
    persisted: bool,
}

impl TempFile {
    fn create(final_path: &Path) -> Result<Self> {
        let mut temp = final_path.as_os_str().to_owned();
        temp.push(".tmp");
        let path = PathBuf::from(temp);
        let file = File::create(&path)?;
        Ok(Self {
            path,
            file,
            persisted: false,
        })
    }

    fn persist(mut self, final_path: &Path) -> Result<()> {
        fs::rename(&self.path, final_path)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_parent_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/storage.json");

        write_atomically(&path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!temp_dir.path().join("nested/storage.json.tmp").exists());
    }

    #[test]
    fn test_replaces_existing_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, b"old").unwrap();

        write_atomically(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
