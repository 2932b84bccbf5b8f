//! Timed cohort bookkeeping.

pub mod cohort;
pub mod statistics;

pub use cohort::{Cohort, CohortLedger};
pub use statistics::RegionStatistics;
