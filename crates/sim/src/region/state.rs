use serde::{Deserialize, Serialize};

/// Snapshot of one variant in one region at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionState {
    /// Number of steps the region had completed when the snapshot was taken.
    pub step: u64,
    pub population: u64,
    pub susceptible: u64,
    pub latent: u64,
    pub infectious: u64,
    pub symptomatic: u64,
    pub immune: u64,
    /// Individuals currently protected by an active vaccination of the family.
    pub vaccinated: u64,
    /// Cumulative deaths.
    pub deaths: u64,
    /// Cumulative recoveries.
    pub recovered: u64,
    /// Infections by transmission during the last step. Cohorts admitted
    /// with a freshly spawned variant are not included.
    pub new_infections: u64,
    /// New infections per shedding individual during the step.
    pub transmission_rate: f64,
    /// Cumulative deaths over cumulative infections.
    pub mortality_rate: f64,
    /// Whether an attenuating vaccine currently alters the variant's parameters.
    pub attenuated: bool,
}

impl RegionState {
    /// Individuals that currently carry the variant.
    #[inline]
    pub fn infected(&self) -> u64 {
        self.latent + self.infectious + self.symptomatic
    }

    /// Individuals currently transmitting the variant.
    #[inline]
    pub fn shedders(&self) -> u64 {
        self.infectious + self.symptomatic
    }
}

/// Running totals of one variant in one region since it first appeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeState {
    pub ever_infected: u64,
    pub ever_infectious: u64,
    pub ever_symptomatic: u64,
    pub ever_vaccinated: u64,
    pub deaths: u64,
    pub recovered: u64,
    /// Number of snapshots recorded so far.
    pub steps_recorded: u64,
}

impl CumulativeState {
    /// Fold another record into this one.
    pub fn accumulate(&mut self, other: &CumulativeState) {
        self.ever_infected += other.ever_infected;
        self.ever_infectious += other.ever_infectious;
        self.ever_symptomatic += other.ever_symptomatic;
        self.ever_vaccinated += other.ever_vaccinated;
        self.deaths += other.deaths;
        self.recovered += other.recovered;
        self.steps_recorded = self.steps_recorded.max(other.steps_recorded);
    }
}
