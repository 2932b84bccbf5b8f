//! Error types for the simulation core.

use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Every variant is raised synchronously by the call that detects it and is
/// never retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A negative count was handed to a ledger.
    #[error("Invalid quantity: {0} (counts must be non-negative)")]
    InvalidQuantity(i64),

    /// A percentage argument fell outside `[0, 100]`.
    #[error("Invalid percentage for {name}: {value} (must be between 0 and 100)")]
    InvalidPercentage { name: &'static str, value: f64 },

    /// A probability or rate fell outside `[0, 1]`.
    #[error("Invalid rate for {name}: {value} (must be between 0.0 and 1.0)")]
    InvalidRate { name: &'static str, value: f64 },

    /// A duration that must be positive was zero.
    #[error("Invalid duration for {0}: must be at least one step")]
    InvalidDuration(&'static str),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown vaccine: {0}")]
    UnknownVaccine(String),

    /// Recombination was requested between variants of different families.
    #[error("Family mismatch: {left} ({left_family}) and {right} ({right_family})")]
    FamilyMismatch {
        left: String,
        left_family: String,
        right: String,
        right_family: String,
    },

    /// A mutation operator was applied to a variant that does not mutate.
    #[error("Variant {0} does not mutate")]
    NotMutating(String),

    /// A closure or opening was requested without any target region.
    #[error("Closure requested with no target regions")]
    EmptyClosureTarget,

    /// A neighbor edge would connect a region to itself.
    #[error("Invalid neighbor edge on region {0}")]
    InvalidNeighbor(String),
}

/// Errors that can occur while assembling a simulation.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A required parameter is missing
    #[error("Missing required parameter: {0}")]
    MissingRequired(&'static str),

    /// An invalid parameter value was provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An entity failed its own validation
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Errors raised while reading or writing a scenario configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
