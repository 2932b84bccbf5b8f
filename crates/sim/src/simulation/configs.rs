//! Scenario configuration.
//!
//! A [`Configuration`] fully describes a scenario: families, variants,
//! regions and their travel edges, vaccines, initial seeding and a schedule
//! of interventions. It is plain serde data and round-trips through JSON.

use crate::errors::ConfigError;
use crate::pathogen::{VariantKind, VariantParams};
use crate::region::{SeverityReductions, TransitionMode, VaccineKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The master configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    pub families: Vec<FamilyConfig>,
    pub variants: Vec<VariantConfig>,
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub vaccines: Vec<VaccineConfig>,
    #[serde(default)]
    pub seeding: Vec<SeedConfig>,
    #[serde(default)]
    pub schedule: Vec<ScheduledIntervention>,
}

/// How the scenario is executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of steps `run()` performs
    pub total_steps: u64,
    /// Optional RNG seed for reproducibility
    pub seed: Option<u64>,
    /// Step regions on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub transitions: TransitionMode,
}

impl ExecutionConfig {
    pub fn new(total_steps: u64) -> Self {
        Self {
            total_steps,
            seed: None,
            parallel: false,
            transitions: TransitionMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub name: String,
    /// Maximum copy-error variation, in percent
    pub max_variation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    pub family: String,
    #[serde(flatten)]
    pub params: VariantParams,
    #[serde(flatten)]
    pub kind: VariantKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub population: u64,
    pub mobility: f64,
    #[serde(default)]
    pub neighbors: Vec<NeighborConfig>,
}

/// Directed travel edge from the enclosing region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborConfig {
    pub region: String,
    pub travel_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccineConfig {
    pub name: String,
    /// Name of the targeted variant
    pub target: String,
    pub activation_time: u32,
    pub duration: u32,
    #[serde(flatten)]
    pub kind: VaccineKind,
}

/// Initial symptomatic carriers, as a percentage of the region's population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub region: String,
    pub variant: String,
    pub percentage: f64,
}

/// An intervention applied right before the step with index `step` (0-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledIntervention {
    pub step: u64,
    #[serde(flatten)]
    pub action: Intervention,
}

/// Intervention requests addressed by entity name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intervention {
    Vaccinate {
        region: String,
        vaccine: String,
        percentage: f64,
    },
    Lockdown {
        region: String,
        mobility: f64,
        duration: u32,
    },
    ReleaseLockdown {
        region: String,
    },
    CloseFlow {
        from: String,
        to: String,
    },
    OpenFlow {
        from: String,
        to: String,
    },
}

impl Configuration {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// A small three-region scenario with two families, a mutating
    /// coronavirus and a stable influenza strain.
    pub fn sample() -> Self {
        let corona = VariantParams {
            disease_probability: 0.25,
            incubation_time: 5,
            latency_time: 2,
            disease_duration: 10,
            infectious_duration: 6,
            immunity_duration: 120,
            mortality_rate: 0.002,
            contagion_rate: 0.3,
        };
        let influenza = VariantParams {
            disease_probability: 0.4,
            incubation_time: 2,
            latency_time: 1,
            disease_duration: 5,
            infectious_duration: 4,
            immunity_duration: 200,
            mortality_rate: 0.0005,
            contagion_rate: 0.2,
        };
        let neighbor = |region: &str, travel_percentage: f64| NeighborConfig {
            region: region.to_string(),
            travel_percentage,
        };

        Self {
            execution: ExecutionConfig {
                total_steps: 120,
                seed: Some(42),
                parallel: false,
                transitions: TransitionMode::Deterministic,
            },
            families: vec![
                FamilyConfig {
                    name: "coronaviridae".into(),
                    max_variation: 10.0,
                },
                FamilyConfig {
                    name: "orthomyxoviridae".into(),
                    max_variation: 5.0,
                },
            ],
            variants: vec![
                VariantConfig {
                    name: "sars-cov".into(),
                    family: "coronaviridae".into(),
                    params: corona,
                    kind: VariantKind::Mutating {
                        copy_error_probability: 0.001,
                        recombination_probability: 0.0005,
                    },
                },
                VariantConfig {
                    name: "h1n1".into(),
                    family: "orthomyxoviridae".into(),
                    params: influenza,
                    kind: VariantKind::Stable,
                },
            ],
            regions: vec![
                RegionConfig {
                    name: "Flanders".into(),
                    population: 6_700_000,
                    mobility: 3.0,
                    neighbors: vec![neighbor("Brussels", 4.0), neighbor("Wallonia", 1.0)],
                },
                RegionConfig {
                    name: "Brussels".into(),
                    population: 1_200_000,
                    mobility: 4.0,
                    neighbors: vec![neighbor("Flanders", 2.0), neighbor("Wallonia", 2.0)],
                },
                RegionConfig {
                    name: "Wallonia".into(),
                    population: 3_600_000,
                    mobility: 2.5,
                    neighbors: vec![neighbor("Brussels", 3.0), neighbor("Flanders", 1.0)],
                },
            ],
            vaccines: vec![
                VaccineConfig {
                    name: "comirnaty".into(),
                    target: "sars-cov".into(),
                    activation_time: 14,
                    duration: 180,
                    kind: VaccineKind::Inhibiting { effectiveness: 95.0 },
                },
                VaccineConfig {
                    name: "fluad".into(),
                    target: "h1n1".into(),
                    activation_time: 7,
                    duration: 90,
                    kind: VaccineKind::Attenuating {
                        reductions: SeverityReductions {
                            mortality_rate: 60.0,
                            disease_duration: 30.0,
                            disease_probability: 40.0,
                            contagion_rate: 20.0,
                        },
                    },
                },
            ],
            seeding: vec![
                SeedConfig {
                    region: "Brussels".into(),
                    variant: "sars-cov".into(),
                    percentage: 0.05,
                },
                SeedConfig {
                    region: "Wallonia".into(),
                    variant: "h1n1".into(),
                    percentage: 0.1,
                },
            ],
            schedule: vec![
                ScheduledIntervention {
                    step: 20,
                    action: Intervention::Lockdown {
                        region: "Brussels".into(),
                        mobility: 1.0,
                        duration: 21,
                    },
                },
                ScheduledIntervention {
                    step: 30,
                    action: Intervention::Vaccinate {
                        region: "Flanders".into(),
                        vaccine: "comirnaty".into(),
                        percentage: 40.0,
                    },
                },
                ScheduledIntervention {
                    step: 30,
                    action: Intervention::Vaccinate {
                        region: "Wallonia".into(),
                        vaccine: "fluad".into(),
                        percentage: 25.0,
                    },
                },
            ],
        }
    }
}
