use super::Family;
use crate::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Epidemiological parameters shared by every variant kind.
///
/// Durations are expressed in simulation steps; rates are per-step
/// probabilities in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantParams {
    /// Probability that an incubating individual falls ill in a given step.
    pub disease_probability: f64,
    /// Steps an infected individual stays in the latent compartment.
    pub incubation_time: u32,
    /// Steps before a newly infected individual starts shedding.
    pub latency_time: u32,
    /// Steps a symptomatic individual stays ill.
    pub disease_duration: u32,
    /// Steps an individual stays infectious once shedding.
    pub infectious_duration: u32,
    /// Steps a recovered individual stays immune.
    pub immunity_duration: u32,
    /// Per-step probability that a symptomatic individual dies.
    pub mortality_rate: f64,
    /// Per-contact probability of transmission.
    pub contagion_rate: f64,
}

impl VariantParams {
    pub fn validate(&self) -> SimResult<()> {
        check_rate("disease probability", self.disease_probability)?;
        check_rate("mortality rate", self.mortality_rate)?;
        check_rate("contagion rate", self.contagion_rate)?;
        Ok(())
    }
}

/// Whether a variant can spawn successors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariantKind {
    /// Never mutates.
    Stable,
    /// Mutates through copy errors and recombination with co-circulating
    /// variants of the same family.
    Mutating {
        copy_error_probability: f64,
        recombination_probability: f64,
    },
}

/// One lineage of a pathogen.
///
/// Variants are immutable; mutation operators always return a new value.
/// Identity for bookkeeping is the pair (name, family reference).
#[derive(Debug, Clone)]
pub struct Variant {
    name: String,
    family: Arc<Family>,
    params: VariantParams,
    kind: VariantKind,
}

impl Variant {
    /// Create a variant after checking every rate lies in `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        family: Arc<Family>,
        params: VariantParams,
        kind: VariantKind,
    ) -> SimResult<Self> {
        params.validate()?;
        if let VariantKind::Mutating {
            copy_error_probability,
            recombination_probability,
        } = kind
        {
            check_rate("copy error probability", copy_error_probability)?;
            check_rate("recombination probability", recombination_probability)?;
        }
        Ok(Self {
            name: name.into(),
            family,
            params,
            kind,
        })
    }

    /// Convenience constructor for a non-mutating variant.
    pub fn stable(
        name: impl Into<String>,
        family: Arc<Family>,
        params: VariantParams,
    ) -> SimResult<Self> {
        Self::new(name, family, params, VariantKind::Stable)
    }

    /// Convenience constructor for a mutating variant.
    pub fn mutating(
        name: impl Into<String>,
        family: Arc<Family>,
        params: VariantParams,
        copy_error_probability: f64,
        recombination_probability: f64,
    ) -> SimResult<Self> {
        Self::new(
            name,
            family,
            params,
            VariantKind::Mutating {
                copy_error_probability,
                recombination_probability,
            },
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn family(&self) -> &Arc<Family> {
        &self.family
    }

    #[inline]
    pub fn params(&self) -> &VariantParams {
        &self.params
    }

    #[inline]
    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    #[inline]
    pub fn is_mutating(&self) -> bool {
        matches!(self.kind, VariantKind::Mutating { .. })
    }

    /// Copy-error probability, zero for stable variants.
    #[inline]
    pub fn copy_error_probability(&self) -> f64 {
        match self.kind {
            VariantKind::Mutating {
                copy_error_probability,
                ..
            } => copy_error_probability,
            VariantKind::Stable => 0.0,
        }
    }

    /// Recombination probability, zero for stable variants.
    #[inline]
    pub fn recombination_probability(&self) -> f64 {
        match self.kind {
            VariantKind::Mutating {
                recombination_probability,
                ..
            } => recombination_probability,
            VariantKind::Stable => 0.0,
        }
    }

    #[inline]
    pub fn disease_probability(&self) -> f64 {
        self.params.disease_probability
    }

    #[inline]
    pub fn incubation_time(&self) -> u32 {
        self.params.incubation_time
    }

    #[inline]
    pub fn latency_time(&self) -> u32 {
        self.params.latency_time
    }

    #[inline]
    pub fn disease_duration(&self) -> u32 {
        self.params.disease_duration
    }

    #[inline]
    pub fn infectious_duration(&self) -> u32 {
        self.params.infectious_duration
    }

    #[inline]
    pub fn immunity_duration(&self) -> u32 {
        self.params.immunity_duration
    }

    #[inline]
    pub fn mortality_rate(&self) -> f64 {
        self.params.mortality_rate
    }

    #[inline]
    pub fn contagion_rate(&self) -> f64 {
        self.params.contagion_rate
    }

    /// True when both variants belong to the very same family instance.
    #[inline]
    pub fn same_family(&self, other: &Variant) -> bool {
        Arc::ptr_eq(&self.family, &other.family)
    }

    /// True when `other` shares this variant's identity (name and family).
    #[inline]
    pub fn same_identity(&self, name: &str, family: &Arc<Family>) -> bool {
        self.name == name && Arc::ptr_eq(&self.family, family)
    }

    /// Same lineage with a different parameter snapshot.
    pub(crate) fn with_params(&self, params: VariantParams) -> Self {
        Self {
            name: self.name.clone(),
            family: Arc::clone(&self.family),
            params,
            kind: self.kind,
        }
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(&other.name, &other.family)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.family.name())
    }
}

fn check_rate(name: &'static str, value: f64) -> SimResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimError::InvalidRate { name, value });
    }
    Ok(())
}
