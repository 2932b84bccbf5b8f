//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use contagio_sim::prelude::*;
//!
//! let config = Configuration::sample();
//! let sim = SimulationBuilder::from_configuration(config).build().unwrap();
//! assert_eq!(sim.regions().len(), 3);
//! ```

pub use crate::base::{RegionId, VaccineId, VariantArena, VariantId};
pub use crate::errors::{self, BuilderError, SimError, SimResult};
pub use crate::ledger::{CohortLedger, RegionStatistics};
pub use crate::pathogen::{Family, Variant, VariantKind, VariantParams};
pub use crate::region::{
    Confinement, CumulativeState, Region, RegionState, SeverityReductions, TransitionMode,
    Vaccine, VaccineKind,
};
pub use crate::simulation::{
    Configuration, Intervention, Simulation, SimulationBuilder, StepOutcome,
};
