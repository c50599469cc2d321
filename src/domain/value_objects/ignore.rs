//! Ignore list shared by packaging, unpacking and remote downloads

use std::path::{Component, Path};

/// Case-insensitive set of file-name suffixes excluded from world transfers.
///
/// A path is ignored when any of its components ends with one of the
/// patterns, so `.git` also hides everything below a `.git/` directory.
/// An exact name is just a suffix that happens to match the whole name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    patterns: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    /// Copy of this list with one more pattern
    pub fn with(mut self, pattern: &str) -> Self {
        let pattern = pattern.trim().to_lowercase();
        if !pattern.is_empty() && !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
        self
    }

    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.patterns.iter().any(|p| name.ends_with(p.as_str()))
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(part) => self.matches_name(&part.to_string_lossy()),
            _ => false,
        })
    }
}
