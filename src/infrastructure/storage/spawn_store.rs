//! Spawn record sidecar file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::errors::WorldError;
use crate::domain::value_objects::SpawnRecord;
use crate::infrastructure::fs_ops::write_atomic;

#[derive(Debug, thiserror::Error)]
pub enum SpawnStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed spawn record {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<SpawnStoreError> for WorldError {
    fn from(err: SpawnStoreError) -> Self {
        WorldError::Io(err.to_string())
    }
}

/// Reads and writes the JSON spawn record kept inside each world directory
#[derive(Debug, Clone)]
pub struct SpawnStore {
    file_name: String,
}

impl SpawnStore {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn path_in(&self, world_dir: &Path) -> PathBuf {
        world_dir.join(&self.file_name)
    }

    /// The stored record, or `None` when the world has none yet
    pub fn read(&self, world_dir: &Path) -> Result<Option<SpawnRecord>, SpawnStoreError> {
        let path = self.path_in(world_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SpawnStoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SpawnStoreError::Malformed {
                path: path.display().to_string(),
                source,
            })
    }

    /// Replace the stored record; readers never observe a half-written file
    pub fn write(&self, world_dir: &Path, record: &SpawnRecord) -> Result<(), SpawnStoreError> {
        let path = self.path_in(world_dir);
        let json = serde_json::to_vec_pretty(record).map_err(|source| {
            SpawnStoreError::Malformed {
                path: path.display().to_string(),
                source,
            }
        })?;
        write_atomic(&path, &json).map_err(|source| SpawnStoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
