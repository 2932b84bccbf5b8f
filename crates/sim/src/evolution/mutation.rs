//! Copy-error mutation.
//!
//! A copy error derives a successor from a single mutating variant. The
//! successor keeps the parent's family and kind; every numeric parameter is
//! scaled by an independent factor drawn uniformly from the family's
//! variation bounds. Durations are floored after scaling and rates are
//! clamped back into `[0, 1]`, so the successor always satisfies the
//! variant constructor's preconditions.

use crate::errors::{SimError, SimResult};
use crate::pathogen::{Variant, VariantKind, VariantParams};
use rand::Rng;

/// Derive the successor name for a copy error.
///
/// A trailing run of digits is incremented (`cov9` becomes `cov10`);
/// otherwise `1` is appended.
pub fn successor_name(name: &str) -> String {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    match digits.parse::<u64>() {
        Ok(n) if !digits.is_empty() => match n.checked_add(1) {
            Some(next) => format!("{stem}{next}"),
            None => format!("{name}1"),
        },
        _ => format!("{name}1"),
    }
}

/// Produce a copy-error successor of `variant`.
///
/// # Errors
/// Returns [`SimError::NotMutating`] when `variant` is of the stable kind.
pub fn mutate_by_copy_error<R: Rng + ?Sized>(variant: &Variant, rng: &mut R) -> SimResult<Variant> {
    let VariantKind::Mutating {
        copy_error_probability,
        recombination_probability,
    } = variant.kind()
    else {
        return Err(SimError::NotMutating(variant.name().to_string()));
    };

    let (lo, hi) = variant.family().variation_bounds();
    let mut factor = || rng.random_range(lo..=hi);

    let p = variant.params();
    let params = VariantParams {
        disease_probability: scale_rate(p.disease_probability, factor()),
        incubation_time: scale_duration(p.incubation_time, factor()),
        latency_time: scale_duration(p.latency_time, factor()),
        disease_duration: scale_duration(p.disease_duration, factor()),
        infectious_duration: scale_duration(p.infectious_duration, factor()),
        immunity_duration: scale_duration(p.immunity_duration, factor()),
        mortality_rate: scale_rate(p.mortality_rate, factor()),
        contagion_rate: scale_rate(p.contagion_rate, factor()),
    };
    let kind = VariantKind::Mutating {
        copy_error_probability: scale_rate(copy_error_probability, factor()),
        recombination_probability: scale_rate(recombination_probability, factor()),
    };

    Variant::new(
        successor_name(variant.name()),
        variant.family().clone(),
        params,
        kind,
    )
}

#[inline]
fn scale_rate(value: f64, factor: f64) -> f64 {
    (value * factor).clamp(0.0, 1.0)
}

#[inline]
fn scale_duration(value: u32, factor: f64) -> u32 {
    (value as f64 * factor).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathogen::{test_params, Family};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_successor_name() {
        assert_eq!(successor_name("cov"), "cov1");
        assert_eq!(successor_name("cov1"), "cov2");
        assert_eq!(successor_name("cov9"), "cov10");
        assert_eq!(successor_name("a_b41"), "a_b42");
        assert_eq!(successor_name(""), "1");
    }

    #[test]
    fn test_copy_error_stays_within_bounds() {
        let family = Family::new("corona", 20.0).unwrap();
        let parent = Variant::mutating("cov", family, test_params(), 0.5, 0.5).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        for _ in 0..100 {
            let child = mutate_by_copy_error(&parent, &mut rng).unwrap();
            assert_eq!(child.name(), "cov1");
            assert!(child.same_family(&parent));
            assert!(child.is_mutating());

            let (c, p) = (child.params(), parent.params());
            assert!(c.contagion_rate >= p.contagion_rate * 0.8 - 1e-12);
            assert!(c.contagion_rate <= p.contagion_rate * 1.2 + 1e-12);
            assert!(c.immunity_duration >= 24 && c.immunity_duration <= 36);
            assert!(c.incubation_time <= 6);
        }
    }

    #[test]
    fn test_zero_variation_copies_parameters() {
        let family = Family::new("corona", 0.0).unwrap();
        let parent = Variant::mutating("cov7", family, test_params(), 0.1, 0.2).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);

        let child = mutate_by_copy_error(&parent, &mut rng).unwrap();
        assert_eq!(child.name(), "cov8");
        assert_eq!(child.params(), parent.params());
        assert_eq!(child.copy_error_probability(), 0.1);
    }

    #[test]
    fn test_rates_clamped_to_unit_interval() {
        let family = Family::new("corona", 100.0).unwrap();
        let mut params = test_params();
        params.contagion_rate = 1.0;
        let parent = Variant::mutating("cov", family, params, 1.0, 1.0).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

        for _ in 0..50 {
            let child = mutate_by_copy_error(&parent, &mut rng).unwrap();
            assert!((0.0..=1.0).contains(&child.contagion_rate()));
            assert!((0.0..=1.0).contains(&child.copy_error_probability()));
        }
    }

    #[test]
    fn test_stable_variant_cannot_mutate() {
        let family = Family::new("flu", 10.0).unwrap();
        let parent = Variant::stable("h1n1", family, test_params()).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        assert_eq!(
            mutate_by_copy_error(&parent, &mut rng).unwrap_err(),
            SimError::NotMutating("h1n1".into())
        );
    }
}
