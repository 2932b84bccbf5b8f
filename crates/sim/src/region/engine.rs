//! Region engine.
//!
//! A region owns one [`RegionStatistics`] bundle per variant present in it
//! and advances all of them through a fixed nine-stage pipeline every step:
//!
//! 1. external exchange with neighbors
//! 2. latent maturation into the infectious compartment
//! 3. new infections (and mutation spawns), then infectious progression
//! 4. latent individuals falling ill
//! 5. deaths and recoveries among the symptomatic
//! 6. immunity waning
//! 7. vaccination programs
//! 8. lockdown countdown
//! 9. snapshots
//!
//! Each stage runs for every variant before the next one starts.

use super::lockdown::{Confinement, Lockdown};
use super::pipeline::{infection_probability, shedding_fraction, TransitionMode, Transitions};
use super::state::{CumulativeState, RegionState};
use super::vaccination::{
    attenuate, check_percentage, Attenuation, SeverityReductions, VaccinationRecord, Vaccine,
    VaccineKind,
};
use crate::base::{RegionId, VariantId};
use crate::errors::{SimError, SimResult};
use crate::evolution::{mutate_by_copy_error, mutate_by_recombination};
use crate::ledger::RegionStatistics;
use crate::pathogen::{Family, Variant};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Directed travel edge from a region to one of its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub region: RegionId,
    /// Share of this region's population travelling to the neighbor, in percent.
    pub travel_percentage: f64,
    pub closed: bool,
}

/// Bookkeeping for one variant inside one region.
///
/// `base` is the variant as registered; `active` is the parameter snapshot
/// currently in force, which differs from `base` only while attenuating
/// vaccines are active. The statistics bundle belongs to the slot and is
/// unaffected by swapping snapshots.
#[derive(Debug, Clone)]
pub struct VariantSlot {
    id: VariantId,
    base: Arc<Variant>,
    active: Arc<Variant>,
    attenuations: Vec<Attenuation>,
    stats: RegionStatistics,
    new_infections: u64,
    spread_shedders: u64,
    history: Vec<RegionState>,
}

impl VariantSlot {
    fn new(id: VariantId, variant: Arc<Variant>) -> Self {
        Self {
            id,
            active: Arc::clone(&variant),
            base: variant,
            attenuations: Vec::new(),
            stats: RegionStatistics::new(),
            new_infections: 0,
            spread_shedders: 0,
            history: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> VariantId {
        self.id
    }

    #[inline]
    pub fn base(&self) -> &Arc<Variant> {
        &self.base
    }

    /// Parameters currently in force.
    #[inline]
    pub fn active(&self) -> &Arc<Variant> {
        &self.active
    }

    #[inline]
    pub fn statistics(&self) -> &RegionStatistics {
        &self.stats
    }

    #[inline]
    pub fn history(&self) -> &[RegionState] {
        &self.history
    }

    #[inline]
    pub fn is_attenuated(&self) -> bool {
        !self.attenuations.is_empty()
    }

    fn attenuate(&mut self, record: u64, reductions: SeverityReductions) {
        self.attenuations.push(Attenuation { record, reductions });
        self.refresh();
    }

    fn lift(&mut self, record: u64) {
        let before = self.attenuations.len();
        self.attenuations.retain(|a| a.record != record);
        if self.attenuations.len() != before {
            self.refresh();
        }
    }

    fn refresh(&mut self) {
        self.active = if self.attenuations.is_empty() {
            Arc::clone(&self.base)
        } else {
            let params = attenuate(self.base.params(), &self.attenuations);
            Arc::new(self.base.with_params(params))
        };
    }
}

/// A variant born in a region during a step, together with the infections
/// it carries. Registered by the simulation once every region has stepped.
#[derive(Debug, Clone)]
pub struct Spawn {
    pub parent: VariantId,
    pub variant: Variant,
    pub count: u64,
}

/// What a region step hands back to the simulation.
#[derive(Debug, Default)]
pub struct RegionStepOutcome {
    pub spawned: Vec<Spawn>,
    /// Neighbors to reopen because the region's lockdown ran out.
    pub released: Option<Vec<RegionId>>,
}

#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    name: String,
    population: u64,
    mobility: f64,
    lockdown: Option<Lockdown>,
    neighbors: Vec<Link>,
    slots: Vec<VariantSlot>,
    vaccinations: Vec<VaccinationRecord>,
    next_record: u64,
    step: u64,
    visitors: u64,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, population: u64, mobility: f64) -> SimResult<Self> {
        if !mobility.is_finite() || mobility < 0.0 {
            return Err(SimError::InvalidRate {
                name: "region mobility",
                value: mobility,
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            population,
            mobility,
            lockdown: None,
            neighbors: Vec::new(),
            slots: Vec::new(),
            vaccinations: Vec::new(),
            next_record: 0,
            step: 0,
            visitors: 0,
        })
    }

    #[inline]
    pub fn id(&self) -> RegionId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn population(&self) -> u64 {
        self.population
    }

    /// Baseline contact opportunities per step.
    #[inline]
    pub fn mobility(&self) -> f64 {
        self.mobility
    }

    /// Mobility used by the transmission formula this step.
    pub fn effective_mobility(&self) -> f64 {
        match &self.lockdown {
            Some(lockdown) if lockdown.remaining > 0 => lockdown.mobility,
            _ => self.mobility,
        }
    }

    #[inline]
    pub fn lockdown(&self) -> Option<&Lockdown> {
        self.lockdown.as_ref()
    }

    /// Number of steps this region has completed.
    #[inline]
    pub fn steps_completed(&self) -> u64 {
        self.step
    }

    #[inline]
    pub fn neighbors(&self) -> &[Link] {
        &self.neighbors
    }

    pub fn neighbor_ids(&self) -> Vec<RegionId> {
        self.neighbors.iter().map(|l| l.region).collect()
    }

    pub fn link(&self, to: RegionId) -> Option<&Link> {
        self.neighbors.iter().find(|l| l.region == to)
    }

    #[inline]
    pub fn slots(&self) -> &[VariantSlot] {
        &self.slots
    }

    pub fn variant_ids(&self) -> impl Iterator<Item = VariantId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    #[inline]
    pub fn vaccinations(&self) -> &[VaccinationRecord] {
        &self.vaccinations
    }

    pub fn contains(&self, variant: VariantId) -> bool {
        self.slot_index(variant).is_some()
    }

    pub fn slot(&self, variant: VariantId) -> SimResult<&VariantSlot> {
        self.slot_index(variant)
            .map(|i| &self.slots[i])
            .ok_or_else(|| self.unknown_variant(variant))
    }

    pub fn statistics(&self, variant: VariantId) -> SimResult<&RegionStatistics> {
        self.slot(variant).map(|s| &s.stats)
    }

    pub fn history(&self, variant: VariantId) -> SimResult<&[RegionState]> {
        self.slot(variant).map(|s| s.history.as_slice())
    }

    /// Live snapshot of a variant in this region.
    pub fn current_state(&self, variant: VariantId) -> SimResult<RegionState> {
        let i = self
            .slot_index(variant)
            .ok_or_else(|| self.unknown_variant(variant))?;
        Ok(self.snapshot(i))
    }

    pub fn cumulative_state(&self, variant: VariantId) -> SimResult<CumulativeState> {
        let slot = self.slot(variant)?;
        let stats = &slot.stats;
        Ok(CumulativeState {
            ever_infected: stats.ever_infected,
            ever_infectious: stats.ever_infectious,
            ever_symptomatic: stats.ever_symptomatic,
            ever_vaccinated: stats.ever_vaccinated,
            deaths: stats.deaths,
            recovered: stats.recovered,
            steps_recorded: slot.history.len() as u64,
        })
    }

    /// Susceptible pool of a variant: population minus everyone it tracks
    /// and everyone an active inhibiting vaccine shields from its family.
    pub fn susceptible(&self, variant: VariantId) -> SimResult<u64> {
        let i = self
            .slot_index(variant)
            .ok_or_else(|| self.unknown_variant(variant))?;
        Ok(self.susceptible_at(i))
    }

    /// Add or update the directed edge towards `to`.
    pub fn connect(&mut self, to: RegionId, travel_percentage: f64) -> SimResult<()> {
        check_percentage("travel percentage", travel_percentage)?;
        if to == self.id {
            return Err(SimError::InvalidNeighbor(self.name.clone()));
        }
        match self.neighbors.iter_mut().find(|l| l.region == to) {
            Some(link) => link.travel_percentage = travel_percentage,
            None => self.neighbors.push(Link {
                region: to,
                travel_percentage,
                closed: false,
            }),
        }
        Ok(())
    }

    /// Set the closure flag of the edge towards `to`. Returns false when no
    /// such edge exists.
    pub(crate) fn set_link_closed(&mut self, to: RegionId, closed: bool) -> bool {
        match self.neighbors.iter_mut().find(|l| l.region == to) {
            Some(link) => {
                link.closed = closed;
                true
            }
            None => false,
        }
    }

    /// Make sure `variant` has a slot here, returning its index.
    pub(crate) fn register(&mut self, id: VariantId, variant: Arc<Variant>) -> usize {
        if let Some(i) = self.slot_index(id) {
            return i;
        }
        log::debug!("region {}: tracking variant {}", self.name, variant.name());
        self.slots.push(VariantSlot::new(id, variant));
        self.slots.len() - 1
    }

    /// Seed `percentage` percent of the population as symptomatic carriers.
    ///
    /// The amount is clamped to the variant's susceptible pool. Returns the
    /// number of individuals seeded.
    pub fn seed_infection(&mut self, id: VariantId, variant: Arc<Variant>, percentage: f64) -> SimResult<u64> {
        check_percentage("seed percentage", percentage)?;
        let i = self.register(id, variant);
        let wanted = (percentage / 100.0 * self.population as f64).round() as u64;
        let available = self.susceptible_at(i);
        if wanted > available {
            log::warn!(
                "region {}: seeding {} clamped to {} susceptible",
                self.name,
                wanted,
                available
            );
        }
        let count = wanted.min(available);

        let slot = &mut self.slots[i];
        slot.stats
            .symptomatic
            .admit_count(count, slot.active.disease_duration());
        slot.stats.ever_infected += count;
        slot.stats.ever_symptomatic += count;
        Ok(count)
    }

    /// Register a variant spawned during the previous step with the
    /// infections it carries, clamped to its susceptible pool.
    ///
    /// The cohort counts towards `ever_infected` but not towards the
    /// per-step `new_infections`, which only reflects transmission.
    pub(crate) fn admit_spawn(&mut self, id: VariantId, variant: Arc<Variant>, count: u64) -> u64 {
        let i = self.register(id, variant);
        let count = count.min(self.susceptible_at(i));
        let slot = &mut self.slots[i];
        slot.stats.infect(count, &slot.active);
        count
    }

    /// Administer `vaccine` to `percentage` percent of the population.
    ///
    /// Returns the number of people it protects once active.
    pub(crate) fn vaccinate(&mut self, vaccine: Arc<Vaccine>, family: Arc<Family>, percentage: f64) -> SimResult<u64> {
        check_percentage("vaccination coverage", percentage)?;
        let dosed = ((percentage / 100.0 * self.population as f64).round() as u64).min(self.population);
        let protected = vaccine.protected_count(dosed);

        let id = self.next_record;
        self.next_record += 1;
        for slot in self.slots.iter_mut().filter(|s| Arc::ptr_eq(s.base.family(), &family)) {
            slot.stats.ever_vaccinated += protected;
        }

        let record = VaccinationRecord {
            id,
            remaining_activation: vaccine.activation_time(),
            remaining_duration: vaccine.duration(),
            count_vaccinated: protected,
            vaccine,
            family,
        };
        let active_now = record.is_active();
        log::info!(
            "region {}: {} administered to {} ({} protected)",
            self.name,
            record.vaccine.name(),
            dosed,
            protected
        );
        self.vaccinations.push(record);
        if active_now {
            self.activate_vaccination(id);
        }
        Ok(protected)
    }

    /// Start a lockdown, returning any lockdown it replaces.
    pub(crate) fn begin_lockdown(&mut self, confinement: Confinement, closed: Vec<RegionId>) -> Option<Lockdown> {
        self.lockdown.replace(Lockdown::new(confinement, closed))
    }

    pub(crate) fn end_lockdown(&mut self) -> Option<Lockdown> {
        self.lockdown.take()
    }

    /// Run the nine-stage pipeline once.
    ///
    /// `inflow` is the number of visitors arriving from open neighbor edges,
    /// computed by the caller from the populations at the start of the step.
    pub(crate) fn step<R: Rng + ?Sized>(
        &mut self,
        inflow: u64,
        mode: TransitionMode,
        rng: &mut R,
    ) -> SimResult<RegionStepOutcome> {
        let mut transitions = Transitions::new(mode, rng);

        self.exchange(inflow);
        self.mature_latent();
        let spawned = self.spread(&mut transitions)?;
        self.fall_ill(&mut transitions);
        self.resolve_symptomatic(&mut transitions);
        self.wane_immunity();
        self.advance_vaccinations();
        let released = self.advance_lockdown();
        self.record_snapshots();

        Ok(RegionStepOutcome { spawned, released })
    }

    // Stage 1: visitors arrive on even steps and leave on odd steps.
    fn exchange(&mut self, inflow: u64) {
        if self.step % 2 == 0 {
            self.visitors = inflow;
            self.population += inflow;
        } else {
            self.population = self.population.saturating_sub(self.visitors);
            self.visitors = 0;
        }
        self.fit_all();
    }

    // Stage 2
    fn mature_latent(&mut self) {
        for slot in &mut self.slots {
            let stats = &mut slot.stats;
            let due = stats.contagion.tick();
            let shedding = stats.latent.withdraw_oldest(due);
            let incubated = stats.latent.tick();
            stats.sync_contagion();

            let entering = shedding + incubated;
            stats
                .infectious
                .admit_count(entering, slot.active.infectious_duration());
            stats.ever_infectious += entering;
        }
    }

    // Stage 3
    fn spread<R: Rng + ?Sized>(&mut self, t: &mut Transitions<'_, R>) -> SimResult<Vec<Spawn>> {
        let population = self.population;
        let mobility = self.effective_mobility();
        let fractions: Vec<f64> = self
            .slots
            .iter()
            .map(|s| shedding_fraction(s.stats.shedders(), population))
            .collect();
        let probabilities: Vec<f64> = self
            .slots
            .iter()
            .map(|s| {
                infection_probability(
                    s.stats.shedders(),
                    population,
                    s.active.contagion_rate(),
                    mobility,
                )
            })
            .collect();

        let mut spawned = Vec::new();
        for i in 0..self.slots.len() {
            let infected = t.portion(self.susceptible_at(i), probabilities[i]);
            let base = Arc::clone(&self.slots[i].base);
            let parent = self.slots[i].id;
            let transmissibility = fractions[i] * self.slots[i].active.contagion_rate();
            let mut remaining = infected;

            if base.is_mutating() && infected > 0 {
                let copies = t
                    .events(transmissibility * base.copy_error_probability())
                    .min(remaining);
                if copies > 0 {
                    let variant = mutate_by_copy_error(&base, t.rng())?;
                    log::debug!(
                        "region {}: copy error {} -> {} ({} infected)",
                        self.name,
                        base.name(),
                        variant.name(),
                        copies
                    );
                    spawned.push(Spawn { parent, variant, count: copies });
                    remaining -= copies;
                }

                for j in 0..self.slots.len() {
                    if j == i || remaining == 0 {
                        continue;
                    }
                    let partner = &self.slots[j];
                    if !partner.base.same_family(&base) || partner.stats.shedders() == 0 {
                        continue;
                    }
                    let both = fractions[i] * fractions[j];
                    let recombined = t
                        .events(transmissibility * both * base.recombination_probability())
                        .min(remaining);
                    if recombined > 0 {
                        let partner = Arc::clone(&partner.base);
                        let variant = mutate_by_recombination(&partner, &base, t.rng())?;
                        log::debug!(
                            "region {}: recombination {} x {} -> {} ({} infected)",
                            self.name,
                            base.name(),
                            partner.name(),
                            variant.name(),
                            recombined
                        );
                        spawned.push(Spawn { parent, variant, count: recombined });
                        remaining -= recombined;
                    }
                }
            }

            let slot = &mut self.slots[i];
            slot.spread_shedders = slot.stats.shedders();
            slot.stats.infect(remaining, &slot.active);
            slot.new_infections = remaining;
        }

        for i in 0..self.slots.len() {
            let ended = self.slots[i].stats.infectious.tick();
            self.immunize_family(i, ended);
        }
        Ok(spawned)
    }

    // Stage 4
    fn fall_ill<R: Rng + ?Sized>(&mut self, t: &mut Transitions<'_, R>) {
        for slot in &mut self.slots {
            let p = slot.active.disease_probability();
            let stats = &mut slot.stats;
            let ill = stats.latent.drain_with(|n| t.portion(n, p));
            stats
                .symptomatic
                .admit_count(ill, slot.active.disease_duration());
            stats.ever_symptomatic += ill;
            stats.sync_contagion();
        }
    }

    // Stage 5
    fn resolve_symptomatic<R: Rng + ?Sized>(&mut self, t: &mut Transitions<'_, R>) {
        let mut deaths = 0;
        for slot in &mut self.slots {
            let p = slot.active.mortality_rate();
            let died = slot.stats.symptomatic.drain_with(|n| t.portion(n, p));
            slot.stats.deaths += died;
            deaths += died;
        }
        self.population = self.population.saturating_sub(deaths);

        for i in 0..self.slots.len() {
            let recovered = self.slots[i].stats.symptomatic.tick();
            self.immunize_family(i, recovered);
        }
        self.fit_all();
    }

    // Stage 6
    fn wane_immunity(&mut self) {
        for slot in &mut self.slots {
            slot.stats.immune.tick();
        }
    }

    // Stage 7
    fn advance_vaccinations(&mut self) {
        let mut activated = Vec::new();
        let mut expired = Vec::new();
        for record in &mut self.vaccinations {
            if record.remaining_activation > 0 {
                record.remaining_activation -= 1;
                if record.remaining_activation == 0 {
                    activated.push(record.id);
                }
            } else {
                record.remaining_duration = record.remaining_duration.saturating_sub(1);
                if record.remaining_duration == 0 {
                    expired.push(record.id);
                }
            }
        }

        for id in activated {
            self.activate_vaccination(id);
        }
        for id in expired {
            for slot in &mut self.slots {
                slot.lift(id);
            }
            self.vaccinations.retain(|r| r.id != id);
        }
    }

    // Stage 8
    fn advance_lockdown(&mut self) -> Option<Vec<RegionId>> {
        let expired = self.lockdown.as_mut().is_some_and(|l| l.tick());
        if !expired {
            return None;
        }
        log::info!("region {}: lockdown expired", self.name);
        self.lockdown.take().map(|l| l.closed)
    }

    // Stage 9
    fn record_snapshots(&mut self) {
        self.step += 1;
        for i in 0..self.slots.len() {
            let state = self.snapshot(i);
            self.slots[i].history.push(state);
        }
    }

    fn activate_vaccination(&mut self, id: u64) {
        let Some(record) = self.vaccinations.iter().find(|r| r.id == id) else {
            return;
        };
        log::debug!("region {}: {} now active", self.name, record.vaccine.name());
        if let VaccineKind::Attenuating { reductions } = record.vaccine.kind() {
            let family = Arc::clone(&record.family);
            for slot in self
                .slots
                .iter_mut()
                .filter(|s| Arc::ptr_eq(s.base.family(), &family))
            {
                slot.attenuate(id, reductions);
            }
        }
    }

    /// Immunize `count` individuals leaving slot `source` against every
    /// tracked member of its family, each for its own immunity duration.
    fn immunize_family(&mut self, source: usize, count: u64) {
        if count == 0 {
            return;
        }
        let population = self.population;
        let family = Arc::clone(self.slots[source].base.family());
        for slot in self
            .slots
            .iter_mut()
            .filter(|s| Arc::ptr_eq(s.base.family(), &family))
        {
            let duration = slot.active.immunity_duration();
            slot.stats.immunize(count, duration, population);
        }
        self.slots[source].stats.recovered += count;
    }

    fn fit_all(&mut self) {
        let population = self.population;
        for slot in &mut self.slots {
            slot.stats.fit_to_population(population);
        }
    }

    fn shielded(&self, family: &Arc<Family>) -> u64 {
        self.vaccinations
            .iter()
            .filter(|r| r.covers(family))
            .map(|r| r.shielded())
            .sum()
    }

    fn vaccinated(&self, family: &Arc<Family>) -> u64 {
        self.vaccinations
            .iter()
            .filter(|r| r.is_active() && r.covers(family))
            .map(|r| r.count_vaccinated)
            .sum()
    }

    fn susceptible_at(&self, i: usize) -> u64 {
        let slot = &self.slots[i];
        self.population
            .saturating_sub(slot.stats.tracked_total())
            .saturating_sub(self.shielded(slot.base.family()))
    }

    fn snapshot(&self, i: usize) -> RegionState {
        let slot = &self.slots[i];
        let stats = &slot.stats;
        RegionState {
            step: self.step,
            population: self.population,
            susceptible: self.susceptible_at(i),
            latent: stats.latent.current_total(),
            infectious: stats.infectious.current_total(),
            symptomatic: stats.symptomatic.current_total(),
            immune: stats.immune.current_total(),
            vaccinated: self.vaccinated(slot.base.family()),
            deaths: stats.deaths,
            recovered: stats.recovered,
            new_infections: slot.new_infections,
            transmission_rate: ratio(slot.new_infections, slot.spread_shedders),
            mortality_rate: ratio(stats.deaths, stats.ever_infected),
            attenuated: slot.is_attenuated(),
        }
    }

    fn slot_index(&self, id: VariantId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    fn unknown_variant(&self, id: VariantId) -> SimError {
        SimError::UnknownVariant(format!("{id} in region {}", self.name))
    }
}

#[inline]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
