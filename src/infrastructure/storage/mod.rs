//! On-disk records stored alongside world data

mod spawn_store;

pub use spawn_store::SpawnStore;
