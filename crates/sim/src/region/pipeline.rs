//! How fractional transitions are turned into whole individuals.
//!
//! Every stage of the region step that moves "a fraction `p` of `n`
//! individuals" goes through [`Transitions::portion`]. In deterministic mode
//! that is `floor(n * p)`; in stochastic mode it is a binomial draw with the
//! same mean. Mutation spawns go through [`Transitions::events`], which
//! turns an expected event count into a whole one.

use rand::Rng;
use rand_distr::{Binomial, Distribution};
use serde::{Deserialize, Serialize};

/// Rule used to round fractional transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// `floor(n * p)`.
    #[default]
    Deterministic,
    /// `Binomial(n, p)`.
    Stochastic,
}

/// Per-step transition sampler bound to one region's random stream.
pub struct Transitions<'a, R: Rng + ?Sized> {
    mode: TransitionMode,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> Transitions<'a, R> {
    pub fn new(mode: TransitionMode, rng: &'a mut R) -> Self {
        Self { mode, rng }
    }

    /// Number of individuals out of `n` that make a transition of
    /// probability `p`. Never exceeds `n`.
    pub fn portion(&mut self, n: u64, p: f64) -> u64 {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        if n == 0 || p == 0.0 {
            return 0;
        }
        match self.mode {
            TransitionMode::Deterministic => ((n as f64 * p).floor() as u64).min(n),
            TransitionMode::Stochastic => match Binomial::new(n, p) {
                Ok(dist) => dist.sample(&mut *self.rng).min(n),
                Err(_) => 0,
            },
        }
    }

    /// Whole number of events out of an `expected` (possibly fractional)
    /// count. Deterministic mode floors; stochastic mode rounds up with
    /// probability equal to the fractional part, keeping the mean.
    pub fn events(&mut self, expected: f64) -> u64 {
        if !expected.is_finite() || expected <= 0.0 {
            return 0;
        }
        let whole = expected.floor();
        match self.mode {
            TransitionMode::Deterministic => whole as u64,
            TransitionMode::Stochastic => whole as u64 + u64::from(self.rng.random_bool(expected - whole)),
        }
    }

    /// Random source for mutation operators.
    #[inline]
    pub fn rng(&mut self) -> &mut R {
        &mut *self.rng
    }
}

/// Share of the population currently shedding a variant, in `[0, 1]`.
pub fn shedding_fraction(shedders: u64, population: u64) -> f64 {
    if population == 0 {
        return 0.0;
    }
    (shedders as f64 / population as f64).min(1.0)
}

/// Probability that a susceptible individual is infected during a step.
///
/// Each of `mobility` contact opportunities carries a risk of
/// `shedders / population * contagion_rate`.
pub fn infection_probability(shedders: u64, population: u64, contagion_rate: f64, mobility: f64) -> f64 {
    let fraction = shedding_fraction(shedders, population);
    if fraction == 0.0 {
        return 0.0;
    }
    let risk = (fraction * contagion_rate).clamp(0.0, 1.0);
    1.0 - (1.0 - risk).powf(mobility.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_deterministic_portion_floors() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut t = Transitions::new(TransitionMode::Deterministic, &mut rng);
        assert_eq!(t.portion(10, 0.25), 2);
        assert_eq!(t.portion(10, 1.0), 10);
        assert_eq!(t.portion(10, 0.0), 0);
        assert_eq!(t.portion(0, 0.5), 0);
        assert_eq!(t.portion(10, 7.0), 10);
    }

    #[test]
    fn test_stochastic_portion_bounded() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut t = Transitions::new(TransitionMode::Stochastic, &mut rng);
        let draws: Vec<u64> = (0..200).map(|_| t.portion(1000, 0.3)).collect();
        assert!(draws.iter().all(|&d| d <= 1000));
        let mean = draws.iter().sum::<u64>() as f64 / draws.len() as f64;
        assert!((mean - 300.0).abs() < 15.0);
        assert_eq!(t.portion(50, 1.0), 50);
    }

    #[test]
    fn test_events_floor_or_round_stochastically() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut t = Transitions::new(TransitionMode::Deterministic, &mut rng);
        assert_eq!(t.events(0.9), 0);
        assert_eq!(t.events(2.5), 2);
        assert_eq!(t.events(-1.0), 0);
        assert_eq!(t.events(f64::NAN), 0);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut t = Transitions::new(TransitionMode::Stochastic, &mut rng);
        let draws: Vec<u64> = (0..2000).map(|_| t.events(0.25)).collect();
        assert!(draws.iter().all(|&d| d <= 1));
        let hits = draws.iter().sum::<u64>();
        assert!((400..600).contains(&hits));
        assert_eq!(t.events(3.0), 3);
    }

    #[test]
    fn test_infection_probability() {
        assert_eq!(infection_probability(0, 1000, 0.5, 3.0), 0.0);
        assert_eq!(infection_probability(10, 0, 0.5, 3.0), 0.0);

        let p = infection_probability(1_000, 1_000_000, 0.5, 3.0);
        let expected = 1.0 - (1.0 - 0.0005f64).powf(3.0);
        assert!((p - expected).abs() < 1e-15);

        // zero mobility means no contacts
        assert_eq!(infection_probability(500, 1000, 0.9, 0.0), 0.0);
    }
}
