//! Domain entities - Core objects with identity

mod world;

pub use world::{WorldState, WorldSummary};
