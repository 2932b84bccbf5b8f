use super::CohortLedger;
use crate::pathogen::Variant;
use serde::{Deserialize, Serialize};

/// Compartment ledgers and running counters for one variant in one region.
///
/// The latent, infectious, symptomatic and immune ledgers are disjoint: an
/// individual sits in at most one of them. The contagion ledger runs in
/// parallel with the latent one and only schedules when incubating
/// individuals start shedding; it never holds anyone on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionStatistics {
    pub latent: CohortLedger,
    pub contagion: CohortLedger,
    pub infectious: CohortLedger,
    pub symptomatic: CohortLedger,
    pub immune: CohortLedger,

    pub ever_infected: u64,
    pub ever_infectious: u64,
    pub ever_symptomatic: u64,
    pub ever_vaccinated: u64,
    pub deaths: u64,
    pub recovered: u64,
}

impl RegionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Individuals currently held by any disjoint compartment.
    #[inline]
    pub fn tracked_total(&self) -> u64 {
        self.latent.current_total()
            + self.infectious.current_total()
            + self.symptomatic.current_total()
            + self.immune.current_total()
    }

    /// Individuals currently transmitting the variant.
    #[inline]
    pub fn shedders(&self) -> u64 {
        self.infectious.current_total() + self.symptomatic.current_total()
    }

    /// Admit freshly infected individuals into the latent compartment and
    /// schedule the moment they start shedding.
    pub fn infect(&mut self, count: u64, variant: &Variant) {
        self.latent.admit_count(count, variant.incubation_time());
        self.contagion.admit_count(count, variant.latency_time());
        self.ever_infected += count;
    }

    /// Drop scheduled shedding for individuals that already left the latent
    /// compartment, oldest first.
    pub fn sync_contagion(&mut self) {
        let excess = self
            .contagion
            .current_total()
            .saturating_sub(self.latent.current_total());
        self.contagion.withdraw_oldest(excess);
    }

    /// Admit up to `count` individuals into the immune compartment without
    /// exceeding `population`. Returns how many were admitted.
    pub fn immunize(&mut self, count: u64, duration: u32, population: u64) -> u64 {
        let room = population.saturating_sub(self.tracked_total());
        let admitted = count.min(room);
        self.immune.admit_count(admitted, duration);
        admitted
    }

    /// Shrink compartments until the tracked total fits in `population`.
    ///
    /// Immune individuals go first, then incubating, infectious and finally
    /// symptomatic ones, newest cohorts first.
    pub fn fit_to_population(&mut self, population: u64) -> u64 {
        let mut excess = self.tracked_total().saturating_sub(population);
        let trimmed = excess;
        for ledger in [
            &mut self.immune,
            &mut self.latent,
            &mut self.infectious,
            &mut self.symptomatic,
        ] {
            if excess == 0 {
                break;
            }
            excess -= ledger.trim_newest(excess);
        }
        self.sync_contagion();
        trimmed
    }
}
