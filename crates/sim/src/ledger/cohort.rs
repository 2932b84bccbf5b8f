use crate::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// A group of individuals that entered a compartment together and will
/// leave it together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub count: u64,
    pub remaining: u32,
}

/// Ordered sequence of cohorts for one compartment of one variant.
///
/// Cohorts are kept in admission order (oldest first) and are never merged,
/// even when two of them share the same remaining time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortLedger {
    cohorts: Vec<Cohort>,
}

impl CohortLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cohort of `count` individuals staying `duration` steps.
    ///
    /// A zero count leaves the ledger untouched. A duration of zero matures
    /// on the next [`tick`](Self::tick).
    pub fn admit(&mut self, count: i64, duration: u32) -> SimResult<()> {
        if count < 0 {
            return Err(SimError::InvalidQuantity(count));
        }
        self.admit_count(count as u64, duration);
        Ok(())
    }

    /// Infallible form of [`admit`](Self::admit) for counts that are already
    /// known to be non-negative.
    pub(crate) fn admit_count(&mut self, count: u64, duration: u32) {
        if count > 0 {
            self.cohorts.push(Cohort {
                count,
                remaining: duration,
            });
        }
    }

    /// Advance every cohort by one step and remove those that matured.
    ///
    /// Returns the total number of individuals that left the ledger.
    pub fn tick(&mut self) -> u64 {
        let mut matured = 0;
        self.cohorts.retain_mut(|cohort| {
            cohort.remaining = cohort.remaining.saturating_sub(1);
            if cohort.remaining == 0 {
                matured += cohort.count;
                false
            } else {
                true
            }
        });
        matured
    }

    /// Total number of individuals still pending in this ledger.
    #[inline]
    pub fn current_total(&self) -> u64 {
        self.cohorts.iter().map(|c| c.count).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    #[inline]
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    /// Remove from every cohort the amount chosen by `take`, which receives
    /// the cohort size and must not return more than it. Empty cohorts are
    /// dropped. Returns the total removed.
    pub fn drain_with<F>(&mut self, mut take: F) -> u64
    where
        F: FnMut(u64) -> u64,
    {
        let mut removed = 0;
        self.cohorts.retain_mut(|cohort| {
            let n = take(cohort.count).min(cohort.count);
            cohort.count -= n;
            removed += n;
            cohort.count > 0
        });
        removed
    }

    /// Remove `floor(count * fraction)` from every cohort.
    pub fn drain_fraction(&mut self, fraction: f64) -> u64 {
        let fraction = fraction.clamp(0.0, 1.0);
        self.drain_with(|count| (count as f64 * fraction).floor() as u64)
    }

    /// Remove up to `amount` individuals starting from the oldest cohort.
    pub fn withdraw_oldest(&mut self, amount: u64) -> u64 {
        let mut left = amount;
        let mut removed = 0;
        for cohort in self.cohorts.iter_mut() {
            if left == 0 {
                break;
            }
            let n = cohort.count.min(left);
            cohort.count -= n;
            left -= n;
            removed += n;
        }
        self.cohorts.retain(|c| c.count > 0);
        removed
    }

    /// Remove up to `amount` individuals starting from the newest cohort.
    pub fn trim_newest(&mut self, amount: u64) -> u64 {
        let mut left = amount;
        let mut removed = 0;
        for cohort in self.cohorts.iter_mut().rev() {
            if left == 0 {
                break;
            }
            let n = cohort.count.min(left);
            cohort.count -= n;
            left -= n;
            removed += n;
        }
        self.cohorts.retain(|c| c.count > 0);
        removed
    }
}
