//! Multi-region simulation: the region graph, scenario configuration, the
//! builder and the clock that drives every region one step at a time.

pub mod builder;
pub mod configs;
pub mod engine;
pub mod graph;
pub mod report;

pub use builder::SimulationBuilder;
pub use configs::{
    Configuration, ExecutionConfig, FamilyConfig, Intervention, NeighborConfig, RegionConfig,
    ScheduledIntervention, SeedConfig, VaccineConfig, VariantConfig,
};
pub use engine::{Simulation, SpawnedVariant, StepOutcome};
pub use graph::RegionGraph;
pub use report::{SeriesReport, SimulationReport};
