//! Zip packaging and extraction for world directories
//!
//! `unpack_*` never writes outside the destination: every entry is checked
//! lexically before anything is written, and each parent directory is
//! canonicalized and re-checked before its file is created.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::errors::WorldError;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive entry escapes the destination: {0}")]
    PathTraversal(String),

    #[error("Invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to walk {path}: {message}")]
    Walk { path: String, message: String },

    #[error("Source directory does not exist: {0}")]
    MissingSource(PathBuf),
}

impl From<ArchiveError> for WorldError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::PathTraversal(_) | ArchiveError::Zip(_) => {
                WorldError::ValidationFailure(err.to_string())
            }
            ArchiveError::MissingSource(path) => {
                WorldError::NotFound(path.display().to_string())
            }
            ArchiveError::Io(_) | ArchiveError::Walk { .. } => WorldError::Io(err.to_string()),
        }
    }
}

/// How archive entry paths map onto the destination directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackOptions {
    /// Drop the single wrapper directory that repository archives put
    /// around their content
    pub skip_root: bool,
    /// Keep only entries below this slash-separated path, and drop the
    /// path itself from what is written
    pub subtree: Option<String>,
}

impl UnpackOptions {
    /// Options for a repository archive whose content lives at `folder`
    pub fn repository_folder(folder: &str) -> Self {
        let folder = folder.trim_matches('/');
        Self {
            skip_root: true,
            subtree: (!folder.is_empty()).then(|| folder.to_string()),
        }
    }

    fn select(&self, segments: &[String]) -> Option<String> {
        let joined = segments.join("/");
        let skip = usize::from(self.skip_root);

        let Some(subtree) = self.subtree.as_deref() else {
            return strip_prefix_segments(&joined, skip);
        };

        let wanted: Vec<&str> = subtree.split('/').filter(|s| !s.is_empty()).collect();
        let inside = segments
            .iter()
            .skip(skip)
            .zip(wanted.iter())
            .filter(|(have, want)| have.as_str() == **want)
            .count();
        if inside != wanted.len() {
            return None;
        }
        strip_prefix_segments(&joined, skip + wanted.len())
    }
}

/// Pack `source` into a zip archive.
///
/// Entries are written in sorted order with a fixed timestamp, so packing the
/// same tree twice yields identical bytes. `ignore` receives paths relative
/// to `source`; an ignored directory is skipped with everything below it.
pub fn pack_directory<F>(source: &Path, ignore: F) -> Result<Vec<u8>, ArchiveError>
where
    F: Fn(&Path) -> bool,
{
    if !source.is_dir() {
        return Err(ArchiveError::MissingSource(source.to_path_buf()));
    }

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);

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
            let entry = entry.map_err(|e| ArchiveError::Walk {
                path: source.display().to_string(),
                message: e.to_string(),
            })?;
            let Ok(rel) = entry.path().strip_prefix(source) else {
                continue;
            };
            let name = rel.to_string_lossy().replace('\\', "/");

            if entry.file_type().is_dir() {
                writer.add_directory(format!("{}/", name), options)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options)?;
                let mut file = fs::File::open(entry.path())?;
                io::copy(&mut file, &mut writer)?;
            }
        }

        writer.finish()?;
    }

    Ok(cursor.into_inner())
}

/// Extract an archive into `dest`, keeping entry paths as they are
pub fn unpack_archive<F>(bytes: &[u8], dest: &Path, ignore: F) -> Result<u64, ArchiveError>
where
    F: Fn(&Path) -> bool,
{
    unpack_with(bytes, dest, &UnpackOptions::default(), ignore)
}

/// Extract an archive into `dest` and return the number of files written.
///
/// Any entry that would resolve outside `dest` fails the whole extraction
/// with [`ArchiveError::PathTraversal`] before a single file is written.
pub fn unpack_with<F>(
    bytes: &[u8],
    dest: &Path,
    options: &UnpackOptions,
    ignore: F,
) -> Result<u64, ArchiveError>
where
    F: Fn(&Path) -> bool,
{
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut plan = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        let segments = entry_segments(entry.name())?;
        if segments.is_empty() {
            continue;
        }
        let Some(rel) = options.select(&segments) else {
            continue;
        };
        let rel = PathBuf::from(rel);
        if ignore(&rel) {
            continue;
        }
        plan.push((index, rel, entry.is_dir()));
    }

    fs::create_dir_all(dest)?;
    let root = dest.canonicalize()?;
    let mut written = 0;

    for (index, rel, is_dir) in plan {
        let out_path = root.join(&rel);
        if is_dir {
            fs::create_dir_all(&out_path)?;
            ensure_within(&root, &out_path)?;
            continue;
        }

        let parent = out_path.parent().unwrap_or(root.as_path());
        fs::create_dir_all(parent)?;
        ensure_within(&root, parent)?;
        if out_path.is_symlink() {
            return Err(ArchiveError::PathTraversal(rel.display().to_string()));
        }

        let mut entry = archive.by_index(index)?;
        let mut file = fs::File::create(&out_path)?;
        io::copy(&mut entry, &mut file)?;
        file.flush()?;
        written += 1;
    }

    Ok(written)
}

/// Breadth-first search for the shallowest directory that directly contains
/// `marker`, looking at most `max_depth` levels below `dir`.
///
/// `Ok(None)` means no such directory exists within the bound; errors are
/// reserved for I/O failures.
pub fn find_content_root(
    dir: &Path,
    marker: &str,
    max_depth: usize,
) -> io::Result<Option<PathBuf>> {
    let mut queue = VecDeque::from([(dir.to_path_buf(), 0usize)]);

    while let Some((current, depth)) = queue.pop_front() {
        if current.join(marker).is_file() {
            return Ok(Some(current));
        }
        if depth == max_depth {
            continue;
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                children.push(entry.path());
            }
        }
        children.sort();
        queue.extend(children.into_iter().map(|child| (child, depth + 1)));
    }

    Ok(None)
}

/// Drop the first `n` segments of a slash-separated relative path.
///
/// Returns `None` when nothing would be left, so wrapper directories and
/// entries above the wanted subtree are skipped rather than written.
fn strip_prefix_segments(rel: &str, n: usize) -> Option<String> {
    let segments: Vec<&str> = rel.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() <= n {
        return None;
    }
    Some(segments[n..].join("/"))
}

fn entry_segments(name: &str) -> Result<Vec<String>, ArchiveError> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(ArchiveError::PathTraversal(name.to_string()));
    }

    let mut segments: Vec<String> = Vec::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ArchiveError::PathTraversal(name.to_string()));
                }
            }
            other if other.contains(':') => {
                return Err(ArchiveError::PathTraversal(name.to_string()));
            }
            other => segments.push(other.to_string()),
        }
    }
    Ok(segments)
}

fn ensure_within(root: &Path, path: &Path) -> Result<(), ArchiveError> {
    let resolved = path.canonicalize()?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        Err(ArchiveError::PathTraversal(path.display().to_string()))
    }
}
