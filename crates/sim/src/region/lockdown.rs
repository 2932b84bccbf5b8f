use crate::base::RegionId;
use crate::errors::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// A lockdown request: the internal mobility to enforce and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confinement {
    /// Contact opportunities per step while the lockdown holds.
    pub mobility: f64,
    /// Steps the lockdown lasts.
    pub duration: u32,
}

impl Confinement {
    pub fn new(mobility: f64, duration: u32) -> SimResult<Self> {
        let confinement = Self { mobility, duration };
        confinement.validate()?;
        Ok(confinement)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.mobility.is_finite() || self.mobility < 0.0 {
            return Err(SimError::InvalidRate {
                name: "lockdown mobility",
                value: self.mobility,
            });
        }
        if self.duration == 0 {
            return Err(SimError::InvalidDuration("lockdown"));
        }
        Ok(())
    }
}

/// An active lockdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Lockdown {
    pub mobility: f64,
    pub remaining: u32,
    /// Neighbors closed when the lockdown started; released together.
    pub closed: Vec<RegionId>,
}

impl Lockdown {
    pub fn new(confinement: Confinement, closed: Vec<RegionId>) -> Self {
        Self {
            mobility: confinement.mobility,
            remaining: confinement.duration,
            closed,
        }
    }

    /// Count down one step. Returns true once the lockdown has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confinement_validation() {
        assert!(Confinement::new(1.0, 5).is_ok());
        assert_eq!(
            Confinement::new(1.0, 0),
            Err(SimError::InvalidDuration("lockdown"))
        );
        assert!(Confinement::new(-1.0, 3).is_err());
        assert!(Confinement::new(f64::NAN, 3).is_err());
    }

    #[test]
    fn test_lockdown_counts_down() {
        let mut lockdown = Lockdown::new(Confinement::new(0.5, 2).unwrap(), vec![RegionId(1)]);
        assert!(!lockdown.tick());
        assert!(lockdown.tick());
        assert_eq!(lockdown.closed, vec![RegionId(1)]);
    }
}
