//! Value objects - Immutable objects defined by their attributes

mod ignore;
mod level;
mod spawn;
mod world_name;

pub use ignore::IgnoreList;
pub use level::{LevelSettings, DEFAULT_DAY_TIME};
pub use spawn::SpawnRecord;
pub use world_name::{filter_by_prefix, WorldName};
