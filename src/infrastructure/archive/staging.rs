//! Scratch directories for in-flight imports and exports

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A directory owned by exactly one operation.
///
/// The directory is removed when the value is dropped, so every exit path of
/// the owning operation (success, validation failure, I/O error, panic)
/// cleans up after itself.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    /// Create `<root>/<label>-<uuid>`
    pub fn create(root: &Path, label: &str) -> io::Result<Self> {
        let path = root.join(format!("{}-{}", label, Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        tracing::debug!(path = %path.display(), "Created staging area");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed staging area"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staging area"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = {
            let staging = StagingArea::create(temp.path(), "import").unwrap();
            fs::write(staging.path().join("level.dat"), b"l").unwrap();
            fs::create_dir_all(staging.path().join("region")).unwrap();
            staging.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_on_error_path() {
        fn failing(root: &Path) -> io::Result<PathBuf> {
            let staging = StagingArea::create(root, "import")?;
            fs::write(staging.path().join("partial"), b"x")?;
            let seen = staging.path().to_path_buf();
            Err(io::Error::new(io::ErrorKind::Other, seen.display().to_string()))
        }

        let temp = TempDir::new().unwrap();
        let err = failing(temp.path()).unwrap_err();
        assert!(!Path::new(&err.to_string()).exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_distinct_names() {
        let temp = TempDir::new().unwrap();
        let a = StagingArea::create(temp.path(), "export").unwrap();
        let b = StagingArea::create(temp.path(), "export").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().file_name().unwrap().to_string_lossy().starts_with("export-"));
    }
}
