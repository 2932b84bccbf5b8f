use crate::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A group of related variants.
///
/// Members of a family immunize against each other, and the family's
/// maximum variation bounds how far a copy-error mutation can drift from its
/// parent. Families are shared through `Arc` and compared by reference: two
/// families with identical fields are still distinct families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    name: String,
    /// Maximum relative perturbation, in percent, applied by copy errors.
    max_variation: f64,
}

impl Family {
    /// Create a new family wrapped for sharing between variants.
    pub fn new(name: impl Into<String>, max_variation: f64) -> SimResult<Arc<Self>> {
        if !(0.0..=100.0).contains(&max_variation) {
            return Err(SimError::InvalidPercentage {
                name: "family max variation",
                value: max_variation,
            });
        }
        Ok(Arc::new(Self {
            name: name.into(),
            max_variation,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn max_variation(&self) -> f64 {
        self.max_variation
    }

    /// Range of multiplicative factors a copy error may draw from.
    #[inline]
    pub fn variation_bounds(&self) -> (f64, f64) {
        let spread = self.max_variation / 100.0;
        (1.0 - spread, 1.0 + spread)
    }
}
