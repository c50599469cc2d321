//! Filesystem helpers for world directories
//!
//! Directory walks go through `walkdir`, which keeps its own stack instead of
//! recursing, so deep or adversarial trees cannot exhaust the call stack.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Copy the contents of `source` into `target`, skipping paths (relative to
/// `source`) for which `ignore` returns true. Returns the number of files
/// copied.
pub fn copy_tree<F>(source: &Path, target: &Path, ignore: F) -> io::Result<u64>
where
    F: Fn(&Path) -> bool,
{
    fs::create_dir_all(target)?;
    let mut copied = 0;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(source) {
            Ok(rel) => !ignore(rel),
            Err(_) => false,
        });

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let destination = target.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
            copied += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "Skipping non-regular file");
        }
    }

    Ok(copied)
}

/// Remove a directory tree; a missing directory is not an error
pub fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// True when `path` is a directory with no entries
pub fn dir_is_empty(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Replace `path` with `bytes` so readers see either the old or new content
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("data");
    let tmp_name = format!(".{}.tmp-{}", file_name, std::process::id());
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

fn walk_error(err: walkdir::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_skips_ignored_paths() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        fs::create_dir_all(source.join("region")).unwrap();
        fs::create_dir_all(source.join(".git/objects")).unwrap();
        fs::write(source.join("level.dat"), b"level").unwrap();
        fs::write(source.join("region/r.0.0.mca"), b"chunk").unwrap();
        fs::write(source.join(".git/objects/x"), b"git").unwrap();
        fs::write(source.join("session.lock"), b"lock").unwrap();

        let target = temp.path().join("dst");
        let copied = copy_tree(&source, &target, |rel| {
            rel.starts_with(".git") || rel == Path::new("session.lock")
        })
        .unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read(target.join("region/r.0.0.mca")).unwrap(), b"chunk");
        assert!(target.join("level.dat").exists());
        assert!(!target.join(".git").exists());
        assert!(!target.join("session.lock").exists());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/spawn.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_remove_tree_tolerates_missing() {
        let temp = TempDir::new().unwrap();
        remove_tree(&temp.path().join("absent")).unwrap();

        let dir = temp.path().join("present");
        fs::create_dir_all(dir.join("a/b")).unwrap();
        assert!(!dir_is_empty(&dir).unwrap());
        remove_tree(&dir).unwrap();
        assert!(!dir.exists());
    }
}
