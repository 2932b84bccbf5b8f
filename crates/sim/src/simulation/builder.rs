//! Builder pattern for creating simulations.
//!
//! The builder accumulates a [`Configuration`] and resolves every name in it
//! when [`SimulationBuilder::build`] is called, so a scenario loaded from
//! JSON and one assembled in code go through the same validation.

pub use crate::errors::BuilderError;
use crate::base::VariantArena;
use crate::errors::SimError;
use crate::pathogen::{Family, Variant, VariantKind, VariantParams};
use crate::region::{SeverityReductions, TransitionMode, Vaccine, VaccineKind};
use crate::simulation::{
    Configuration, ExecutionConfig, FamilyConfig, Intervention, NeighborConfig, RegionConfig,
    RegionGraph, ScheduledIntervention, SeedConfig, Simulation, VaccineConfig, VariantConfig,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builder for constructing [`Simulation`] instances with a fluent API.
///
/// # Examples
///
/// ```
/// use contagio_sim::pathogen::VariantParams;
/// use contagio_sim::simulation::SimulationBuilder;
///
/// let params = VariantParams {
///     disease_probability: 0.3,
///     incubation_time: 5,
///     latency_time: 2,
///     disease_duration: 7,
///     infectious_duration: 4,
///     immunity_duration: 30,
///     mortality_rate: 0.01,
///     contagion_rate: 0.4,
/// };
///
/// let mut sim = SimulationBuilder::new()
///     .steps(10)
///     .family("corona", 10.0)
///     .stable_variant("cov", "corona", params)
///     .region("Ghent", 260_000, 3.0)
///     .seed_infection("Ghent", "cov", 0.1)
///     .seed(42)
///     .build()
///     .unwrap();
///
/// sim.run().unwrap();
/// assert_eq!(sim.step_index(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    total_steps: Option<u64>,
    seed: Option<u64>,
    parallel: bool,
    transitions: TransitionMode,

    families: Vec<FamilyConfig>,
    variants: Vec<VariantConfig>,
    regions: Vec<RegionConfig>,
    edges: Vec<(String, NeighborConfig)>,
    vaccines: Vec<VaccineConfig>,
    seeding: Vec<SeedConfig>,
    schedule: Vec<ScheduledIntervention>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete scenario description.
    pub fn from_configuration(config: Configuration) -> Self {
        Self {
            total_steps: Some(config.execution.total_steps),
            seed: config.execution.seed,
            parallel: config.execution.parallel,
            transitions: config.execution.transitions,
            families: config.families,
            variants: config.variants,
            regions: config.regions,
            edges: Vec::new(),
            vaccines: config.vaccines,
            seeding: config.seeding,
            schedule: config.schedule,
        }
    }

    /// Set the number of steps `run()` performs (required).
    pub fn steps(mut self, steps: u64) -> Self {
        self.total_steps = Some(steps);
        self
    }

    /// Set the random seed for reproducibility (default: None = random).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Step regions on the rayon thread pool (default: false).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn transitions(mut self, mode: TransitionMode) -> Self {
        self.transitions = mode;
        self
    }

    pub fn family(mut self, name: impl Into<String>, max_variation: f64) -> Self {
        self.families.push(FamilyConfig {
            name: name.into(),
            max_variation,
        });
        self
    }

    pub fn stable_variant(
        mut self,
        name: impl Into<String>,
        family: impl Into<String>,
        params: VariantParams,
    ) -> Self {
        self.variants.push(VariantConfig {
            name: name.into(),
            family: family.into(),
            params,
            kind: VariantKind::Stable,
        });
        self
    }

    pub fn mutating_variant(
        mut self,
        name: impl Into<String>,
        family: impl Into<String>,
        params: VariantParams,
        copy_error_probability: f64,
        recombination_probability: f64,
    ) -> Self {
        self.variants.push(VariantConfig {
            name: name.into(),
            family: family.into(),
            params,
            kind: VariantKind::Mutating {
                copy_error_probability,
                recombination_probability,
            },
        });
        self
    }

    pub fn region(mut self, name: impl Into<String>, population: u64, mobility: f64) -> Self {
        self.regions.push(RegionConfig {
            name: name.into(),
            population,
            mobility,
            neighbors: Vec::new(),
        });
        self
    }

    /// Add the directed travel edge `from -> to`.
    ///
    /// Both regions must be declared by the time `build()` runs.
    pub fn neighbor(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        travel_percentage: f64,
    ) -> Self {
        self.edges.push((
            from.into(),
            NeighborConfig {
                region: to.into(),
                travel_percentage,
            },
        ));
        self
    }

    pub fn inhibiting_vaccine(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        activation_time: u32,
        duration: u32,
        effectiveness: f64,
    ) -> Self {
        self.vaccines.push(VaccineConfig {
            name: name.into(),
            target: target.into(),
            activation_time,
            duration,
            kind: VaccineKind::Inhibiting { effectiveness },
        });
        self
    }

    pub fn attenuating_vaccine(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        activation_time: u32,
        duration: u32,
        reductions: SeverityReductions,
    ) -> Self {
        self.vaccines.push(VaccineConfig {
            name: name.into(),
            target: target.into(),
            activation_time,
            duration,
            kind: VaccineKind::Attenuating { reductions },
        });
        self
    }

    /// Seed `percentage` percent of `region` with symptomatic carriers.
    pub fn seed_infection(
        mut self,
        region: impl Into<String>,
        variant: impl Into<String>,
        percentage: f64,
    ) -> Self {
        self.seeding.push(SeedConfig {
            region: region.into(),
            variant: variant.into(),
            percentage,
        });
        self
    }

    /// Apply `action` right before the step with index `step`.
    pub fn schedule(mut self, step: u64, action: Intervention) -> Self {
        self.schedule.push(ScheduledIntervention { step, action });
        self
    }

    /// Build and validate the simulation.
    pub fn build(mut self) -> Result<Simulation, BuilderError> {
        let total_steps = self
            .total_steps
            .ok_or(BuilderError::MissingRequired("total_steps"))?;
        if self.regions.is_empty() {
            return Err(BuilderError::MissingRequired("regions"));
        }

        for (from, edge) in std::mem::take(&mut self.edges) {
            let region = self
                .regions
                .iter_mut()
                .find(|r| r.name == from)
                .ok_or(SimError::UnknownRegion(from))?;
            region.neighbors.push(edge);
        }

        unique_names("family", self.families.iter().map(|f| f.name.as_str()))?;
        unique_names("variant", self.variants.iter().map(|v| v.name.as_str()))?;
        unique_names("region", self.regions.iter().map(|r| r.name.as_str()))?;
        unique_names("vaccine", self.vaccines.iter().map(|v| v.name.as_str()))?;

        let mut families: HashMap<&str, Arc<Family>> = HashMap::new();
        for family in &self.families {
            families.insert(&family.name, Family::new(&family.name, family.max_variation)?);
        }

        let mut variants = VariantArena::new();
        for entry in &self.variants {
            let family = families.get(entry.family.as_str()).ok_or_else(|| {
                BuilderError::InvalidParameter(format!(
                    "variant {}: unknown family {}",
                    entry.name, entry.family
                ))
            })?;
            let variant = Variant::new(&entry.name, Arc::clone(family), entry.params, entry.kind)?;
            variants.intern(variant);
        }

        let mut graph = RegionGraph::new();
        for region in &self.regions {
            graph.add_region(&region.name, region.population, region.mobility)?;
        }
        for region in &self.regions {
            let from = graph
                .find(&region.name)
                .ok_or_else(|| SimError::UnknownRegion(region.name.clone()))?;
            for edge in &region.neighbors {
                let to = graph
                    .find(&edge.region)
                    .ok_or_else(|| SimError::UnknownRegion(edge.region.clone()))?;
                graph.connect(from, to, edge.travel_percentage)?;
            }
        }

        let mut vaccines = Vec::with_capacity(self.vaccines.len());
        for entry in &self.vaccines {
            let target = variants
                .find_by_name(&entry.target)
                .ok_or_else(|| SimError::UnknownVariant(entry.target.clone()))?;
            let vaccine = Vaccine::new(
                &entry.name,
                entry.kind,
                target,
                entry.activation_time,
                entry.duration,
            )?;
            vaccines.push(Arc::new(vaccine));
        }

        let config = Configuration {
            execution: ExecutionConfig {
                total_steps,
                seed: self.seed,
                parallel: self.parallel,
                transitions: self.transitions,
            },
            families: self.families,
            variants: self.variants,
            regions: self.regions,
            vaccines: self.vaccines,
            seeding: self.seeding,
            schedule: self.schedule,
        };

        let seeding = config.seeding.clone();
        let mut sim = Simulation::new(graph, variants, vaccines, config);
        for entry in &seeding {
            let region = sim.region_id(&entry.region)?;
            let variant = sim.variant_id(&entry.variant)?;
            sim.seed_infection(region, variant, entry.percentage)?;
        }
        for scheduled in &sim.configuration().schedule {
            sim.validate_intervention(&scheduled.action)?;
        }

        log::debug!(
            "built simulation: {} regions, {} variants, {} vaccines",
            sim.regions().len(),
            sim.variants().len(),
            sim.vaccines().len()
        );
        Ok(sim)
    }
}

fn unique_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), BuilderError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(BuilderError::InvalidParameter(format!(
                "duplicate {kind} name: {name}"
            )));
        }
    }
    Ok(())
}
