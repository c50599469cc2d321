//! Build world life-cycle state

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::WorldName;

/// Life-cycle state of a build world.
///
/// A world is identified by its directory under the worlds root, so the
/// state is always derived from storage plus the host's loaded set:
///
/// ```text
///   NotExists --create/import--> Loaded <--load/unload--> Unloaded
///   Unloaded  --delete---------> NotExists
/// ```
///
/// There is no edge from `Loaded` straight to `NotExists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldState {
    NotExists,
    Unloaded,
    Loaded,
}

impl WorldState {
    pub fn exists(&self) -> bool {
        !matches!(self, WorldState::NotExists)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, WorldState::Loaded)
    }
}

impl std::fmt::Display for WorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WorldState::NotExists => "not_exists",
            WorldState::Unloaded => "unloaded",
            WorldState::Loaded => "loaded",
        };
        f.write_str(label)
    }
}

/// A world directory found under the worlds root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldSummary {
    pub name: WorldName,
    pub state: WorldState,
}
