//! Region engine, interventions and per-step snapshots.

pub mod engine;
pub mod lockdown;
pub mod pipeline;
pub mod state;
pub mod vaccination;

pub use engine::{Link, Region, RegionStepOutcome, Spawn, VariantSlot};
pub use lockdown::{Confinement, Lockdown};
pub use pipeline::{infection_probability, shedding_fraction, TransitionMode, Transitions};
pub use state::{CumulativeState, RegionState};
pub use vaccination::{
    Attenuation, SeverityReductions, VaccinationRecord, Vaccine, VaccineKind,
};
