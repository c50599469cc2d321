//! World registry actor
//!
//! One thread owns the world host and applies every state-changing request in
//! arrival order. Callers talk to it through [`RegistryHandle`], which sends a
//! command over an mpsc channel and waits for the oneshot reply. Bulk copies
//! for imports happen on the caller's side before the commit request is sent,
//! so the serialized path only performs renames and host calls.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::ports::outbound::{WorldHostPort, WorldRegistryPort};
use crate::domain::entities::{WorldState, WorldSummary};
use crate::domain::errors::WorldError;
use crate::domain::value_objects::{LevelSettings, SpawnRecord, WorldName};
use crate::infrastructure::archive::StagingArea;
use crate::infrastructure::fs_ops::{copy_tree, dir_is_empty, remove_tree};
use crate::infrastructure::storage::SpawnStore;

const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, WorldError>>;

#[derive(Debug)]
pub enum RegistryCommand {
    State {
        name: WorldName,
        reply: Reply<WorldState>,
    },
    List {
        loaded_only: bool,
        reply: Reply<Vec<WorldSummary>>,
    },
    Create {
        name: WorldName,
        reply: Reply<()>,
    },
    Load {
        name: WorldName,
        reply: Reply<()>,
    },
    Unload {
        name: WorldName,
        reply: Reply<()>,
    },
    Delete {
        name: WorldName,
        reply: Reply<()>,
    },
    ImportCommit {
        name: WorldName,
        prepared: PathBuf,
        reply: Reply<()>,
    },
    Save {
        name: WorldName,
        reply: Reply<()>,
    },
    Spawn {
        name: WorldName,
        reply: Reply<SpawnRecord>,
    },
    SetSpawn {
        name: WorldName,
        spawn: SpawnRecord,
        reply: Reply<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Owner of the world host and the worlds root directory
pub struct WorldRegistry<H: WorldHostPort> {
    worlds_root: PathBuf,
    host: H,
    spawn_store: SpawnStore,
}

impl<H: WorldHostPort + 'static> WorldRegistry<H> {
    pub fn new(worlds_root: PathBuf, host: H, spawn_store: SpawnStore) -> Self {
        Self {
            worlds_root,
            host,
            spawn_store,
        }
    }

    /// Start the registry on its own blocking thread
    pub fn start(self) -> (RegistryHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = RegistryHandle {
            tx,
            worlds_root: self.worlds_root.clone(),
        };
        let task = tokio::task::spawn_blocking(move || self.run(rx));
        (handle, task)
    }

    fn run(mut self, mut rx: mpsc::Receiver<RegistryCommand>) {
        tracing::info!(root = %self.worlds_root.display(), "World registry started");

        while let Some(command) = rx.blocking_recv() {
            match command {
                RegistryCommand::State { name, reply } => {
                    let _ = reply.send(Ok(self.state(&name)));
                }
                RegistryCommand::List { loaded_only, reply } => {
                    let _ = reply.send(self.list(loaded_only));
                }
                RegistryCommand::Create { name, reply } => {
                    let _ = reply.send(self.create(&name));
                }
                RegistryCommand::Load { name, reply } => {
                    let _ = reply.send(self.load(&name));
                }
                RegistryCommand::Unload { name, reply } => {
                    let _ = reply.send(self.unload(&name));
                }
                RegistryCommand::Delete { name, reply } => {
                    let _ = reply.send(self.delete(&name));
                }
                RegistryCommand::ImportCommit {
                    name,
                    prepared,
                    reply,
                } => {
                    let _ = reply.send(self.import_commit(&name, &prepared));
                }
                RegistryCommand::Save { name, reply } => {
                    let _ = reply.send(self.save(&name));
                }
                RegistryCommand::Spawn { name, reply } => {
                    let _ = reply.send(self.spawn(&name));
                }
                RegistryCommand::SetSpawn { name, spawn, reply } => {
                    let _ = reply.send(self.set_spawn(&name, &spawn));
                }
                RegistryCommand::Shutdown { reply } => {
                    self.unload_all();
                    let _ = reply.send(());
                    return;
                }
            }
        }

        self.unload_all();
    }

    fn world_dir(&self, name: &WorldName) -> PathBuf {
        self.worlds_root.join(name.as_str())
    }

    fn state(&self, name: &WorldName) -> WorldState {
        if !self.world_dir(name).is_dir() {
            if self.host.is_loaded(name) {
                tracing::warn!(world = %name, "Loaded world has no directory");
            }
            return WorldState::NotExists;
        }
        if self.host.is_loaded(name) {
            WorldState::Loaded
        } else {
            WorldState::Unloaded
        }
    }

    fn list(&self, loaded_only: bool) -> Result<Vec<WorldSummary>, WorldError> {
        let entries = match fs::read_dir(&self.worlds_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut worlds = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let raw = entry.file_name().to_string_lossy().into_owned();
            if raw.starts_with('.') {
                continue;
            }
            let Ok(name) = WorldName::parse(&raw) else {
                continue;
            };
            if name.as_str() != raw {
                continue;
            }

            let state = self.state(&name);
            if loaded_only && !state.is_loaded() {
                continue;
            }
            worlds.push(WorldSummary { name, state });
        }

        worlds.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(worlds)
    }

    fn create(&mut self, name: &WorldName) -> Result<(), WorldError> {
        let dir = self.world_dir(name);
        if dir.exists() {
            return Err(WorldError::AlreadyExists(name.to_string()));
        }

        if let Err(e) = self.generate_void(name, &dir) {
            if self.host.is_loaded(name) {
                let _ = self.host.unload(name, false);
            }
            let _ = remove_tree(&dir);
            return Err(e);
        }

        tracing::info!(world = %name, "Created world");
        Ok(())
    }

    fn generate_void(&mut self, name: &WorldName, dir: &Path) -> Result<(), WorldError> {
        self.host.generate(name, dir)?;
        self.host.apply_settings(name, &LevelSettings::void_world())?;
        let spawn = self.host.spawn_point(name, dir)?;
        self.spawn_store.write(dir, &spawn)?;
        self.host.save(name)?;
        Ok(())
    }

    fn load(&mut self, name: &WorldName) -> Result<(), WorldError> {
        let dir = self.world_dir(name);
        if !dir.is_dir() {
            return Err(WorldError::NotFound(name.to_string()));
        }
        if self.host.is_loaded(name) {
            return Ok(());
        }
        self.host.load(name, &dir)?;
        tracing::info!(world = %name, "Loaded world");
        Ok(())
    }

    fn unload(&mut self, name: &WorldName) -> Result<(), WorldError> {
        match self.state(name) {
            WorldState::NotExists => Err(WorldError::NotFound(name.to_string())),
            WorldState::Unloaded => Ok(()),
            WorldState::Loaded => {
                self.host.unload(name, true)?;
                tracing::info!(world = %name, "Unloaded world");
                Ok(())
            }
        }
    }

    fn delete(&mut self, name: &WorldName) -> Result<(), WorldError> {
        match self.state(name) {
            WorldState::NotExists => Err(WorldError::NotFound(name.to_string())),
            WorldState::Loaded => Err(WorldError::invalid_state(
                name.as_str(),
                "is loaded, unload it before deleting",
            )),
            WorldState::Unloaded => {
                remove_tree(&self.world_dir(name))?;
                tracing::info!(world = %name, "Deleted world");
                Ok(())
            }
        }
    }

    fn import_commit(&mut self, name: &WorldName, prepared: &Path) -> Result<(), WorldError> {
        let dir = self.world_dir(name);
        if self.host.is_loaded(name) {
            return Err(WorldError::invalid_state(
                name.as_str(),
                "is loaded, unload it before importing over it",
            ));
        }
        if dir.exists() {
            if !dir.is_dir() || !dir_is_empty(&dir)? {
                return Err(WorldError::AlreadyExists(name.to_string()));
            }
            fs::remove_dir(&dir)?;
        }
        if !prepared.is_dir() {
            return Err(WorldError::Io(format!(
                "prepared import {} is missing",
                prepared.display()
            )));
        }

        fs::rename(prepared, &dir)?;
        if let Err(e) = self.activate_import(name, &dir) {
            if self.host.is_loaded(name) {
                let _ = self.host.unload(name, false);
            }
            let _ = remove_tree(&dir);
            tracing::warn!(world = %name, error = %e, "Rolled back imported world");
            return Err(e);
        }

        tracing::info!(world = %name, "Committed imported world");
        Ok(())
    }

    fn activate_import(&mut self, name: &WorldName, dir: &Path) -> Result<(), WorldError> {
        self.host.load(name, dir)?;
        if self.spawn_store.read(dir)?.is_none() {
            let spawn = self.host.spawn_point(name, dir)?;
            self.spawn_store.write(dir, &spawn)?;
        }
        self.host.apply_settings(name, &LevelSettings::imported())?;
        self.host.save(name)?;
        Ok(())
    }

    fn save(&mut self, name: &WorldName) -> Result<(), WorldError> {
        match self.state(name) {
            WorldState::NotExists => Err(WorldError::NotFound(name.to_string())),
            WorldState::Unloaded => Ok(()),
            WorldState::Loaded => Ok(self.host.save(name)?),
        }
    }

    fn spawn(&self, name: &WorldName) -> Result<SpawnRecord, WorldError> {
        let dir = self.world_dir(name);
        if !dir.is_dir() {
            return Err(WorldError::NotFound(name.to_string()));
        }
        match self.spawn_store.read(&dir)? {
            Some(record) => Ok(record),
            None => Ok(self.host.spawn_point(name, &dir)?),
        }
    }

    fn set_spawn(&mut self, name: &WorldName, spawn: &SpawnRecord) -> Result<(), WorldError> {
        let dir = self.world_dir(name);
        if !dir.is_dir() {
            return Err(WorldError::NotFound(name.to_string()));
        }
        if !self.host.is_loaded(name) {
            self.host.load(name, &dir)?;
        }

        let mut record = spawn.clone();
        record.world = name.to_string();
        self.spawn_store.write(&dir, &record)?;
        self.host.set_spawn_point(name, &record)?;
        self.host.save(name)?;

        tracing::info!(world = %name, x = record.x, y = record.y, z = record.z, "Set spawn");
        Ok(())
    }

    fn unload_all(&mut self) {
        for name in self.host.loaded_worlds() {
            if let Err(e) = self.host.unload(&name, true) {
                tracing::error!(world = %name, error = %e, "Failed to unload world on shutdown");
            }
        }
        tracing::info!("World registry stopped");
    }
}

/// Cloneable client for the registry thread
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<RegistryCommand>,
    worlds_root: PathBuf,
}

impl RegistryHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> RegistryCommand,
    ) -> Result<T, WorldError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| WorldError::RegistryUnavailable)?;
        rx.await.map_err(|_| WorldError::RegistryUnavailable)?
    }

    /// Unload every world with a final save and stop the registry thread
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(RegistryCommand::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }
}

#[async_trait]
impl WorldRegistryPort for RegistryHandle {
    fn world_dir(&self, name: &WorldName) -> PathBuf {
        self.worlds_root.join(name.as_str())
    }

    async fn state(&self, name: &WorldName) -> Result<WorldState, WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::State { name, reply })
            .await
    }

    async fn list(&self, loaded_only: bool) -> Result<Vec<WorldSummary>, WorldError> {
        self.request(|reply| RegistryCommand::List { loaded_only, reply })
            .await
    }

    async fn create(&self, name: &WorldName) -> Result<(), WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::Create { name, reply })
            .await
    }

    async fn load(&self, name: &WorldName) -> Result<(), WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::Load { name, reply })
            .await
    }

    async fn unload(&self, name: &WorldName) -> Result<(), WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::Unload { name, reply })
            .await
    }

    async fn delete(&self, name: &WorldName) -> Result<(), WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::Delete { name, reply })
            .await
    }

    async fn import_commit(&self, name: &WorldName, source: &Path) -> Result<(), WorldError> {
        if self.state(name).await?.is_loaded() {
            return Err(WorldError::invalid_state(
                name.as_str(),
                "is loaded, unload it before importing over it",
            ));
        }

        // Copy next to the target first so the commit itself is a rename
        let root = self.worlds_root.clone();
        let label = format!(".import-{}", name);
        let source = source.to_path_buf();
        let prepared = tokio::task::spawn_blocking(move || -> Result<StagingArea, WorldError> {
            let prepared = StagingArea::create(&root, &label)?;
            copy_tree(&source, prepared.path(), |_| false)?;
            Ok(prepared)
        })
        .await??;

        let name = name.clone();
        let path = prepared.path().to_path_buf();
        let result = self
            .request(|reply| RegistryCommand::ImportCommit {
                name,
                prepared: path,
                reply,
            })
            .await;
        drop(prepared);
        result
    }

    async fn save(&self, name: &WorldName) -> Result<(), WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::Save { name, reply })
            .await
    }

    async fn spawn(&self, name: &WorldName) -> Result<SpawnRecord, WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::Spawn { name, reply })
            .await
    }

    async fn set_spawn(&self, name: &WorldName, spawn: SpawnRecord) -> Result<(), WorldError> {
        let name = name.clone();
        self.request(|reply| RegistryCommand::SetSpawn { name, spawn, reply })
            .await
    }
}
