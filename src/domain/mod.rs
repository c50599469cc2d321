//! Domain layer - Core types for build worlds with no I/O
//!
//! This layer contains:
//! - Entities: world life-cycle state and summaries
//! - Value Objects: world names, spawn records, ignore lists, level settings
//! - Errors: the failure taxonomy shared by every world operation

pub mod entities;
pub mod errors;
pub mod value_objects;
