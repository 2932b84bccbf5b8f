//! Handles and storage shared across the simulation.

pub mod arena;

pub use arena::{RegionId, VaccineId, VariantArena, VariantId};
