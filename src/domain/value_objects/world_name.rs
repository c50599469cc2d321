//! World names and the sanitization rule that produces them

use serde::{Deserialize, Serialize};

use crate::domain::errors::WorldError;

/// A sanitized world name: lowercase `[a-z0-9_]`, no leading, trailing or
/// repeated underscores. Doubles as the world's directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorldName(String);

impl WorldName {
    /// Sanitize arbitrary input into a world name.
    ///
    /// Fails with [`WorldError::InvalidName`] when nothing usable remains.
    pub fn parse(raw: &str) -> Result<Self, WorldError> {
        let sanitized = sanitize_world_name(raw);
        if sanitized.is_empty() {
            return Err(WorldError::InvalidName(raw.to_string()));
        }
        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorldName {
    type Error = WorldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WorldName> for String {
    fn from(name: WorldName) -> String {
        name.0
    }
}

/// Sanitize a display name into a directory-safe world name.
///
/// 1. lowercase
/// 2. a run of whitespace, hyphens and apostrophes becomes one underscore;
///    a run made only of apostrophes is dropped (`map's` -> `maps`)
/// 3. anything outside `[a-z0-9_]` is removed
/// 4. leading/trailing underscores are trimmed and repeats collapsed
pub fn sanitize_world_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut chars = lowered.chars().peekable();

    while let Some(ch) = chars.next() {
        if is_separator(ch) {
            let mut has_break = ch != '\'';
            while let Some(&next) = chars.peek() {
                if !is_separator(next) {
                    break;
                }
                has_break |= next != '\'';
                chars.next();
            }
            if has_break {
                out.push('_');
            }
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            out.push(ch);
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for ch in out.trim_matches('_').chars() {
        if ch == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(ch);
    }
    collapsed
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == '-' || ch == '\''
}

/// Keep the names that start with `prefix`, ignoring case
pub fn filter_by_prefix<I, S>(names: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = prefix.to_lowercase();
    names
        .into_iter()
        .filter(|name| name.as_ref().to_lowercase().starts_with(&prefix))
        .map(|name| name.as_ref().to_string())
        .collect()
}
