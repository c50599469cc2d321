//! Application services - Use case implementations
//!
//! Services take their collaborators as port trait objects at construction
//! and return domain types or `WorldError`.

pub mod export_service;
pub mod import_service;
pub mod name_locks;
pub mod remote_fetcher;
pub mod suggestion_service;
pub mod world_lifecycle_service;

pub use export_service::{ExportPolicy, ExportService, ExportServiceImpl};
pub use import_service::{
    ImportOutcome, ImportPolicy, ImportService, ImportServiceImpl, ImportStrategy,
};
pub use name_locks::NameLocks;
pub use remote_fetcher::RemoteContentFetcher;
pub use suggestion_service::{MapSuggestionService, DEFAULT_SUGGESTION_TTL};
pub use world_lifecycle_service::{WorldLifecycleService, WorldLifecycleServiceImpl};
