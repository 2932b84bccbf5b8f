use crate::base::VariantId;
use crate::errors::{SimError, SimResult};
use crate::pathogen::{Family, VariantParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Percentage reductions applied by an attenuating vaccine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityReductions {
    pub mortality_rate: f64,
    pub disease_duration: f64,
    pub disease_probability: f64,
    pub contagion_rate: f64,
}

impl SeverityReductions {
    pub fn validate(&self) -> SimResult<()> {
        check_percentage("mortality rate reduction", self.mortality_rate)?;
        check_percentage("disease duration reduction", self.disease_duration)?;
        check_percentage("disease probability reduction", self.disease_probability)?;
        check_percentage("contagion rate reduction", self.contagion_rate)?;
        Ok(())
    }
}

/// How a vaccine protects the people who receive it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaccineKind {
    /// Removes a share of the vaccinated from the susceptible pool.
    Inhibiting {
        /// Percentage of doses that confer protection.
        effectiveness: f64,
    },
    /// Lowers the severity of every tracked family member while active.
    Attenuating { reductions: SeverityReductions },
}

/// A vaccine targeting one variant and, through it, its whole family.
#[derive(Debug, Clone, PartialEq)]
pub struct Vaccine {
    name: String,
    kind: VaccineKind,
    target: VariantId,
    activation_time: u32,
    duration: u32,
}

impl Vaccine {
    pub fn new(
        name: impl Into<String>,
        kind: VaccineKind,
        target: VariantId,
        activation_time: u32,
        duration: u32,
    ) -> SimResult<Self> {
        match kind {
            VaccineKind::Inhibiting { effectiveness } => {
                check_percentage("vaccine effectiveness", effectiveness)?
            }
            VaccineKind::Attenuating { reductions } => reductions.validate()?,
        }
        Ok(Self {
            name: name.into(),
            kind,
            target,
            activation_time,
            duration,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> VaccineKind {
        self.kind
    }

    #[inline]
    pub fn target(&self) -> VariantId {
        self.target
    }

    /// Steps between administration and the start of protection.
    #[inline]
    pub fn activation_time(&self) -> u32 {
        self.activation_time
    }

    /// Steps protection lasts once active.
    #[inline]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Number of people actually protected out of `dosed`.
    pub fn protected_count(&self, dosed: u64) -> u64 {
        match self.kind {
            VaccineKind::Inhibiting { effectiveness } => {
                (dosed as f64 * effectiveness / 100.0).floor() as u64
            }
            VaccineKind::Attenuating { .. } => dosed,
        }
    }
}

/// One administration of a vaccine in a region.
///
/// The record first counts down `remaining_activation`; once that reaches
/// zero the vaccine is active and `remaining_duration` counts down instead.
#[derive(Debug, Clone)]
pub struct VaccinationRecord {
    pub id: u64,
    pub vaccine: Arc<Vaccine>,
    pub family: Arc<Family>,
    pub remaining_activation: u32,
    pub remaining_duration: u32,
    pub count_vaccinated: u64,
}

impl VaccinationRecord {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining_activation == 0
    }

    /// True when this record protects variants of `family`.
    #[inline]
    pub fn covers(&self, family: &Arc<Family>) -> bool {
        Arc::ptr_eq(&self.family, family)
    }

    /// Individuals this record removes from the susceptible pool.
    #[inline]
    pub fn shielded(&self) -> u64 {
        match self.vaccine.kind() {
            VaccineKind::Inhibiting { .. } if self.is_active() => self.count_vaccinated,
            _ => 0,
        }
    }
}

/// Severity reduction held by a variant slot on behalf of a vaccination record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub record: u64,
    pub reductions: SeverityReductions,
}

/// Apply every attenuation multiplicatively to `base`.
pub fn attenuate(base: &VariantParams, attenuations: &[Attenuation]) -> VariantParams {
    let factor = |pick: fn(&SeverityReductions) -> f64| {
        attenuations
            .iter()
            .map(|a| 1.0 - pick(&a.reductions) / 100.0)
            .product::<f64>()
    };
    VariantParams {
        mortality_rate: base.mortality_rate * factor(|r| r.mortality_rate),
        disease_probability: base.disease_probability * factor(|r| r.disease_probability),
        contagion_rate: base.contagion_rate * factor(|r| r.contagion_rate),
        disease_duration: (base.disease_duration as f64 * factor(|r| r.disease_duration)).floor()
            as u32,
        ..*base
    }
}

pub(crate) fn check_percentage(name: &'static str, value: f64) -> SimResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(SimError::InvalidPercentage { name, value });
    }
    Ok(())
}
