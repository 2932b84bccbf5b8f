//! Recombination between co-circulating variants of one family.

use crate::errors::{SimError, SimResult};
use crate::pathogen::{Variant, VariantKind, VariantParams};
use rand::Rng;

/// Produce the recombinant of `variant_a` with `variant_b`.
///
/// The result is named `"{A}_{B}"`. Every numeric parameter is interpolated
/// as `p * A + (1 - p) * B` with an independent weight `p` drawn from
/// `[0, 1]`; durations are floored afterwards. The recombinant always
/// mutates, with a stable parent contributing zero mutation probabilities.
///
/// # Errors
/// Returns [`SimError::FamilyMismatch`] when the parents belong to different
/// families.
pub fn mutate_by_recombination<R: Rng + ?Sized>(
    variant_b: &Variant,
    variant_a: &Variant,
    rng: &mut R,
) -> SimResult<Variant> {
    if !variant_a.same_family(variant_b) {
        return Err(SimError::FamilyMismatch {
            left: variant_a.name().to_string(),
            left_family: variant_a.family().name().to_string(),
            right: variant_b.name().to_string(),
            right_family: variant_b.family().name().to_string(),
        });
    }

    let (a, b) = (variant_a.params(), variant_b.params());
    let mut rate = |x: f64, y: f64| {
        let p: f64 = rng.random();
        lerp(x, y, p).clamp(0.0, 1.0)
    };
    let disease_probability = rate(a.disease_probability, b.disease_probability);
    let mortality_rate = rate(a.mortality_rate, b.mortality_rate);
    let contagion_rate = rate(a.contagion_rate, b.contagion_rate);
    let kind = VariantKind::Mutating {
        copy_error_probability: rate(
            variant_a.copy_error_probability(),
            variant_b.copy_error_probability(),
        ),
        recombination_probability: rate(
            variant_a.recombination_probability(),
            variant_b.recombination_probability(),
        ),
    };

    let mut duration = |x: u32, y: u32| {
        let p: f64 = rng.random();
        lerp(x as f64, y as f64, p).floor() as u32
    };
    let params = VariantParams {
        disease_probability,
        incubation_time: duration(a.incubation_time, b.incubation_time),
        latency_time: duration(a.latency_time, b.latency_time),
        disease_duration: duration(a.disease_duration, b.disease_duration),
        infectious_duration: duration(a.infectious_duration, b.infectious_duration),
        immunity_duration: duration(a.immunity_duration, b.immunity_duration),
        mortality_rate,
        contagion_rate,
    };

    Variant::new(
        format!("{}_{}", variant_a.name(), variant_b.name()),
        variant_a.family().clone(),
        params,
        kind,
    )
}

/// `p * a + (1 - p) * b`, exact when `a == b`.
#[inline]
fn lerp(a: f64, b: f64, p: f64) -> f64 {
    b + p * (a - b)
}
