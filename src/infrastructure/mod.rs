//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Archive: zip packing, safe unpacking and staging directories
//! - Host: the local world host that owns loaded worlds
//! - Registry: the serialized commit path for world state
//! - Remote: GitHub, GitLab and direct URL clients
//! - HTTP: admin API routes
//! - Config: Application configuration
//! - State: Shared application state

pub mod archive;
pub mod config;
pub mod fs_ops;
pub mod host;
pub mod http;
pub mod registry;
pub mod remote;
pub mod state;
pub mod storage;
