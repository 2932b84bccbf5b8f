//! Pathogen model: families and their variants.

pub mod family;
pub mod variant;

pub use family::Family;
pub use variant::{Variant, VariantKind, VariantParams};

#[cfg(test)]
pub(crate) fn test_params() -> VariantParams {
    VariantParams {
        disease_probability: 0.3,
        incubation_time: 5,
        latency_time: 2,
        disease_duration: 7,
        infectious_duration: 4,
        immunity_duration: 30,
        mortality_rate: 0.01,
        contagion_rate: 0.4,
    }
}
