//! # Simulation Crate
//!
//! Core of a multi-region, multi-variant epidemic simulator. Each region
//! tracks one compartment set per variant, organised as cohort ledgers that
//! count down until their members move on. Regions exchange visitors along
//! a weighted travel graph, variants mutate through copy errors and
//! recombination, and vaccination campaigns and lockdowns alter the course
//! of the outbreak.

pub mod base;
pub mod errors;
pub mod evolution;
pub mod ledger;
pub mod pathogen;
pub mod prelude;
pub mod region;
pub mod simulation;

pub use base::{RegionId, VaccineId, VariantId};
