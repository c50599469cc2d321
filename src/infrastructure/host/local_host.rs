//! Directory-backed world host
//!
//! Keeps the loaded worlds' level state in memory and persists it as
//! `level.json` inside the world directory. A session lock file marks a world
//! as held by this process while it is loaded.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{HostError, WorldHostPort};
use crate::domain::value_objects::{LevelSettings, SpawnRecord, WorldName, DEFAULT_DAY_TIME};
use crate::infrastructure::fs_ops::write_atomic;

const LEVEL_STATE_FILE: &str = "level.json";
const REGION_DIR: &str = "region";

/// Spawn block the engine uses for worlds that never set one
pub const DEFAULT_SPAWN: (i64, i64, i64) = (0, 64, 0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LevelState {
    spawn_x: i64,
    spawn_y: i64,
    spawn_z: i64,
    #[serde(default)]
    spawn_yaw: f32,
    time: i64,
    #[serde(default)]
    storm: bool,
    #[serde(default)]
    game_rules: BTreeMap<String, String>,
    #[serde(default = "default_auto_save")]
    auto_save: bool,
    #[serde(default)]
    last_saved: Option<DateTime<Utc>>,
}

fn default_auto_save() -> bool {
    true
}

impl Default for LevelState {
    fn default() -> Self {
        let (spawn_x, spawn_y, spawn_z) = DEFAULT_SPAWN;
        Self {
            spawn_x,
            spawn_y,
            spawn_z,
            spawn_yaw: 0.0,
            time: DEFAULT_DAY_TIME,
            storm: false,
            game_rules: BTreeMap::new(),
            auto_save: true,
            last_saved: None,
        }
    }
}

impl LevelState {
    fn read(dir: &Path) -> Result<Self, HostError> {
        let path = dir.join(LEVEL_STATE_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| HostError::Corrupt(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, dir: &Path) -> Result<(), HostError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| HostError::Corrupt(e.to_string()))?;
        write_atomic(&dir.join(LEVEL_STATE_FILE), &json)?;
        Ok(())
    }

    fn spawn_record(&self, name: &WorldName) -> SpawnRecord {
        SpawnRecord::new(
            name.as_str(),
            self.spawn_x as f64,
            self.spawn_y as f64,
            self.spawn_z as f64,
        )
        .with_rotation(self.spawn_yaw, 0.0)
    }
}

#[derive(Debug)]
struct LoadedWorld {
    dir: PathBuf,
    level: LevelState,
}

/// World host that treats each world directory as the save format
pub struct LocalWorldHost {
    marker_file: String,
    lock_file: String,
    loaded: HashMap<WorldName, LoadedWorld>,
}

impl LocalWorldHost {
    pub fn new(marker_file: impl Into<String>, lock_file: impl Into<String>) -> Self {
        Self {
            marker_file: marker_file.into(),
            lock_file: lock_file.into(),
            loaded: HashMap::new(),
        }
    }

    fn loaded_mut(&mut self, name: &WorldName) -> Result<&mut LoadedWorld, HostError> {
        self.loaded
            .get_mut(name)
            .ok_or_else(|| HostError::NotLoaded(name.to_string()))
    }

    fn write_lock(&self, dir: &Path) -> Result<(), HostError> {
        let stamp = format!("{} {}\n", std::process::id(), Utc::now().to_rfc3339());
        fs::write(dir.join(&self.lock_file), stamp)?;
        Ok(())
    }

    fn flush(world: &mut LoadedWorld) -> Result<(), HostError> {
        world.level.last_saved = Some(Utc::now());
        world.level.write(&world.dir)
    }
}

impl WorldHostPort for LocalWorldHost {
    fn generate(&mut self, name: &WorldName, dir: &Path) -> Result<(), HostError> {
        fs::create_dir_all(dir.join(REGION_DIR))?;
        fs::write(dir.join(&self.marker_file), name.as_str().as_bytes())?;

        let mut level = LevelState::default();
        level.last_saved = Some(Utc::now());
        level.write(dir)?;
        self.write_lock(dir)?;

        tracing::debug!(world = %name, "Generated void world");
        self.loaded.insert(
            name.clone(),
            LoadedWorld {
                dir: dir.to_path_buf(),
                level,
            },
        );
        Ok(())
    }

    fn load(&mut self, name: &WorldName, dir: &Path) -> Result<(), HostError> {
        if self.loaded.contains_key(name) {
            return Ok(());
        }
        if !dir.is_dir() {
            return Err(HostError::MissingDirectory(name.to_string()));
        }

        let level = LevelState::read(dir)?;
        self.write_lock(dir)?;
        self.loaded.insert(
            name.clone(),
            LoadedWorld {
                dir: dir.to_path_buf(),
                level,
            },
        );
        tracing::debug!(world = %name, "Loaded world");
        Ok(())
    }

    fn unload(&mut self, name: &WorldName, save: bool) -> Result<(), HostError> {
        let world = self.loaded_mut(name)?;
        if save {
            Self::flush(world)?;
        }
        let dir = world.dir.clone();

        match fs::remove_file(dir.join(&self.lock_file)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.loaded.remove(name);
        tracing::debug!(world = %name, saved = save, "Unloaded world");
        Ok(())
    }

    fn save(&mut self, name: &WorldName) -> Result<(), HostError> {
        let world = self.loaded_mut(name)?;
        Self::flush(world)
    }

    fn is_loaded(&self, name: &WorldName) -> bool {
        self.loaded.contains_key(name)
    }

    fn loaded_worlds(&self) -> Vec<WorldName> {
        let mut names: Vec<WorldName> = self.loaded.keys().cloned().collect();
        names.sort();
        names
    }

    fn spawn_point(&self, name: &WorldName, dir: &Path) -> Result<SpawnRecord, HostError> {
        if let Some(world) = self.loaded.get(name) {
            return Ok(world.level.spawn_record(name));
        }
        if !dir.is_dir() {
            return Err(HostError::MissingDirectory(name.to_string()));
        }
        Ok(LevelState::read(dir)?.spawn_record(name))
    }

    fn set_spawn_point(&mut self, name: &WorldName, spawn: &SpawnRecord) -> Result<(), HostError> {
        let world = self.loaded_mut(name)?;
        let (x, y, z) = spawn.block_position();
        world.level.spawn_x = x;
        world.level.spawn_y = y;
        world.level.spawn_z = z;
        world.level.spawn_yaw = spawn.yaw;
        Ok(())
    }

    fn apply_settings(&mut self, name: &WorldName, settings: &LevelSettings) -> Result<(), HostError> {
        let world = self.loaded_mut(name)?;
        world
            .level
            .game_rules
            .extend(settings.game_rules.iter().map(|(k, v)| (k.clone(), v.clone())));
        world.level.time = settings.time;
        if settings.clear_weather {
            world.level.storm = false;
        }
        world.level.auto_save = settings.auto_save;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(raw: &str) -> WorldName {
        WorldName::parse(raw).unwrap()
    }

    fn host() -> LocalWorldHost {
        LocalWorldHost::new("level.dat", "session.lock")
    }

    #[test]
    fn test_generate_writes_marker_and_loads() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("quintus");
        let mut host = host();

        host.generate(&name("quintus"), &dir).unwrap();

        assert!(dir.join("level.dat").is_file());
        assert!(dir.join("region").is_dir());
        assert!(dir.join("session.lock").is_file());
        assert!(host.is_loaded(&name("quintus")));
        let spawn = host.spawn_point(&name("quintus"), &dir).unwrap();
        assert_eq!(spawn.block_position(), DEFAULT_SPAWN);
    }

    #[test]
    fn test_unload_persists_spawn_and_settings() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("quintus");
        let world = name("quintus");
        let mut host = host();

        host.generate(&world, &dir).unwrap();
        host.set_spawn_point(&world, &SpawnRecord::new("quintus", 12.7, 80.0, -4.2))
            .unwrap();
        host.apply_settings(&world, &LevelSettings::imported()).unwrap();
        host.unload(&world, true).unwrap();

        assert!(!host.is_loaded(&world));
        assert!(!dir.join("session.lock").exists());
        let spawn = host.spawn_point(&world, &dir).unwrap();
        assert_eq!(spawn.block_position(), (12, 80, -5));

        let level = LevelState::read(&dir).unwrap();
        assert_eq!(level.game_rules.get("mobGriefing").map(String::as_str), Some("false"));
        assert!(level.last_saved.is_some());
    }

    #[test]
    fn test_unload_without_save_discards_changes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("quintus");
        let world = name("quintus");
        let mut host = host();

        host.generate(&world, &dir).unwrap();
        host.set_spawn_point(&world, &SpawnRecord::new("quintus", 5.0, 5.0, 5.0))
            .unwrap();
        host.unload(&world, false).unwrap();

        let spawn = host.spawn_point(&world, &dir).unwrap();
        assert_eq!(spawn.block_position(), DEFAULT_SPAWN);
    }

    #[test]
    fn test_load_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = host()
            .load(&name("ghost"), &temp.path().join("ghost"))
            .unwrap_err();
        assert!(matches!(err, HostError::MissingDirectory(_)));
    }

    #[test]
    fn test_load_foreign_world_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("imported");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("level.dat"), [0x0a, 0x00]).unwrap();

        let world = name("imported");
        let mut host = host();
        host.load(&world, &dir).unwrap();
        host.load(&world, &dir).unwrap();

        assert_eq!(host.loaded_worlds(), vec![world.clone()]);
        assert_eq!(
            host.spawn_point(&world, &dir).unwrap().block_position(),
            DEFAULT_SPAWN
        );
    }

    #[test]
    fn test_operations_on_unloaded_world() {
        let mut host = host();
        let world = name("idle");
        assert!(matches!(host.save(&world), Err(HostError::NotLoaded(_))));
        assert!(matches!(host.unload(&world, true), Err(HostError::NotLoaded(_))));
    }
}
