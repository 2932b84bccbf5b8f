use crate::pathogen::{Family, Variant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable handle to a variant stored in a [`VariantArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantId(pub u32);

/// Stable handle to a region owned by the region graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Stable handle to a registered vaccine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VaccineId(pub u32);

impl VariantId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RegionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl VaccineId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Append-only storage for every variant the simulation has seen.
///
/// Variants are interned by identity (name plus family reference): adding a
/// variant whose identity is already present returns the existing handle and
/// discards the newcomer. Handles are never invalidated.
#[derive(Debug, Default, Clone)]
pub struct VariantArena {
    variants: Vec<Arc<Variant>>,
}

impl VariantArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `variant`, or return the handle of the variant that already
    /// carries its identity. The boolean is true when a new entry was made.
    pub fn intern(&mut self, variant: Variant) -> (VariantId, bool) {
        if let Some(id) = self.find(variant.name(), variant.family()) {
            return (id, false);
        }
        let id = VariantId(self.variants.len() as u32);
        self.variants.push(Arc::new(variant));
        (id, true)
    }

    /// Look up a variant by identity.
    pub fn find(&self, name: &str, family: &Arc<Family>) -> Option<VariantId> {
        self.variants
            .iter()
            .position(|v| v.same_identity(name, family))
            .map(|i| VariantId(i as u32))
    }

    /// Look up a variant by name alone, returning the oldest match.
    pub fn find_by_name(&self, name: &str) -> Option<VariantId> {
        self.variants
            .iter()
            .position(|v| v.name() == name)
            .map(|i| VariantId(i as u32))
    }

    #[inline]
    pub fn get(&self, id: VariantId) -> Option<&Arc<Variant>> {
        self.variants.get(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariantId, &Arc<Variant>)> {
        self.variants
            .iter()
            .enumerate()
            .map(|(i, v)| (VariantId(i as u32), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathogen::test_params;

    #[test]
    fn test_intern_deduplicates_by_identity() {
        let corona = Family::new("corona", 10.0).unwrap();
        let flu = Family::new("flu", 10.0).unwrap();
        let mut arena = VariantArena::new();

        let (a, fresh) = arena.intern(Variant::stable("x", corona.clone(), test_params()).unwrap());
        assert!(fresh);
        let (again, fresh) = arena.intern(Variant::stable("x", corona.clone(), test_params()).unwrap());
        assert!(!fresh);
        assert_eq!(a, again);

        let (other, fresh) = arena.intern(Variant::stable("x", flu, test_params()).unwrap());
        assert!(fresh);
        assert_ne!(a, other);
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.find("x", &corona), Some(a));
        assert_eq!(arena.find_by_name("x"), Some(a));
        assert_eq!(arena.get(other).map(|v| v.family().name()), Some("flu"));
    }
}
