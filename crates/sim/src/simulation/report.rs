//! Serializable summary of a run.

use super::Simulation;
use crate::errors::{ConfigError, SimResult};
use crate::region::{CumulativeState, RegionState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// History and totals of one variant in one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesReport {
    pub region: String,
    pub variant: String,
    pub family: String,
    pub totals: CumulativeState,
    pub history: Vec<RegionState>,
}

impl SeriesReport {
    /// Last recorded snapshot, if the variant has been stepped at all.
    pub fn latest(&self) -> Option<&RegionState> {
        self.history.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub steps: u64,
    pub variants: usize,
    pub series: Vec<SeriesReport>,
}

impl SimulationReport {
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

impl Simulation {
    /// Collect every (region, variant) series, regions in declaration order.
    pub fn report(&self) -> SimResult<SimulationReport> {
        let mut series = Vec::new();
        for (region_id, variant_id) in self.active_pairs() {
            let region = self.region(region_id)?;
            let variant = self.variant(variant_id)?;
            series.push(SeriesReport {
                region: region.name().to_string(),
                variant: variant.name().to_string(),
                family: variant.family().name().to_string(),
                totals: region.cumulative_state(variant_id)?,
                history: region.history(variant_id)?.to_vec(),
            });
        }
        Ok(SimulationReport {
            steps: self.step_index(),
            variants: self.variants().len(),
            series,
        })
    }
}
