use core::fmt;
use core::result::Result as CoreResult;
use core::slice::Iter;

use serde::Serialize;

use crate::error::{Error, Result};

/// Index of a resource type.
///
/// Stored 0-based; displayed 1-based to match the workload file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(usize);

impl ResourceId {
    /// Resource type from its 0-based position.
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Resource type from the 1-based number used in workload files.
    ///
    /// Returns `None` for 0.
    pub fn from_number(number: usize) -> Option<Self> {
        number.checked_sub(1).map(Self)
    }

    /// 0-based position in a [`ResourceVector`].
    pub const fn index(self) -> usize {
        self.0
    }

    /// 1-based number as written in workload files.
    pub const fn number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Units per resource type, indexed by [`ResourceId`].
///
/// Used for the pool's capacity and availability, each task's allocation
/// and claim, and the per-cycle release buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u32>);

impl ResourceVector {
    /// Vector of `len` resource types, all zero.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    /// Number of resource types.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no resource types at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `resource` indexes into this vector.
    pub fn contains(&self, resource: ResourceId) -> bool {
        resource.index() < self.0.len()
    }

    /// Units of `resource`, or 0 when out of range.
    pub fn get(&self, resource: ResourceId) -> u32 {
        self.0.get(resource.index()).copied().unwrap_or(0)
    }

    /// Overwrite the units of `resource`. Out-of-range ids are ignored.
    pub fn set(&mut self, resource: ResourceId, units: u32) {
        if let Some(slot) = self.0.get_mut(resource.index()) {
            *slot = units;
        }
    }

    /// Add `units` to `resource`. Out-of-range ids are ignored.
    pub fn add(&mut self, resource: ResourceId, units: u32) {
        if let Some(slot) = self.0.get_mut(resource.index()) {
            *slot = slot.saturating_add(units);
        }
    }

    /// Subtract `units` from `resource`.
    ///
    /// Returns the previous value as the error payload when the subtraction
    /// would go below zero; the vector is left untouched in that case.
    pub fn try_sub(&mut self, resource: ResourceId, units: u32) -> CoreResult<(), u32> {
        let current = self.get(resource);
        match (self.0.get_mut(resource.index()), current.checked_sub(units)) {
            (Some(slot), Some(remaining)) => {
                *slot = remaining;
                Ok(())
            }
            _ => Err(current),
        }
    }

    /// Draw `units` of `resource` from a pool.
    ///
    /// # Errors
    /// Returns [`Error::PoolUnderflow`] when fewer units are available.
    pub fn take(&mut self, resource: ResourceId, units: u32) -> Result<()> {
        self.try_sub(resource, units)
            .map_err(|available| Error::PoolUnderflow {
                resource,
                available,
                requested: units,
            })
    }

    /// Add every component of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (slot, units) in self.0.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_add(*units);
        }
    }

    /// Whether every component of `self` is at least the matching one in `need`.
    pub fn covers(&self, need: &Self) -> bool {
        self.0
            .iter()
            .zip(need.0.iter())
            .all(|(have, wanted)| have >= wanted)
    }

    /// Component-wise `self - other`, floored at zero.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(left, right)| left.saturating_sub(*right))
                .collect(),
        )
    }

    /// Reset every component to zero, keeping the length.
    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|slot| *slot = 0);
    }

    /// Sum over all resource types.
    pub fn total(&self) -> u64 {
        self.0.iter().map(|units| u64::from(*units)).sum()
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|units| *units == 0)
    }

    /// Iterate over `(resource, units)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(index, units)| (ResourceId(index), *units))
    }

    /// Raw units in resource order.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for ResourceVector {
    fn from(units: Vec<u32>) -> Self {
        Self(units)
    }
}

impl<'vector> IntoIterator for &'vector ResourceVector {
    type Item = &'vector u32;
    type IntoIter = Iter<'vector, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (position, units) in self.0.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{units}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test code is allowed to fail loudly"
)]
mod tests {
    use super::*;

    const FIRST: ResourceId = ResourceId::from_index(0);
    const SECOND: ResourceId = ResourceId::from_index(1);

    #[test]
    fn test_resource_id_numbering() {
        assert_eq!(ResourceId::from_number(1), Some(FIRST));
        assert_eq!(ResourceId::from_number(0), None);
        assert_eq!(SECOND.number(), 2);
        assert_eq!(SECOND.to_string(), "2");
    }

    #[test]
    fn test_take_and_add() {
        let mut pool = ResourceVector::from(vec![3, 1]);
        pool.take(FIRST, 2).expect("enough units");
        assert_eq!(pool.get(FIRST), 1);

        pool.add(FIRST, 4);
        assert_eq!(pool.as_slice(), &[5, 1]);
    }

    #[test]
    fn test_take_underflow_leaves_pool_unchanged() {
        let mut pool = ResourceVector::from(vec![3, 1]);
        let error = pool.take(SECOND, 2).unwrap_err();
        assert!(matches!(
            error,
            Error::PoolUnderflow {
                available: 1,
                requested: 2,
                ..
            }
        ));
        assert_eq!(pool.as_slice(), &[3, 1]);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut pool = ResourceVector::zeros(1);
        assert!(!pool.contains(SECOND));
        assert_eq!(pool.get(SECOND), 0);
        assert!(pool.take(SECOND, 1).is_err());
        assert_eq!(pool.try_sub(SECOND, 0), Err(0));
    }

    #[test]
    fn test_covers_and_merge() {
        let mut available = ResourceVector::from(vec![2, 0]);
        let need = ResourceVector::from(vec![1, 1]);
        assert!(!available.covers(&need));

        available.merge(&ResourceVector::from(vec![0, 1]));
        assert!(available.covers(&need));
        assert_eq!(available.total(), 3);
    }

    #[test]
    fn test_saturating_sub_and_clear() {
        let claim = ResourceVector::from(vec![4, 1]);
        let held = ResourceVector::from(vec![1, 2]);
        assert_eq!(claim.saturating_sub(&held).as_slice(), &[3, 0]);

        let mut released = ResourceVector::from(vec![5, 5]);
        released.clear();
        assert!(released.is_zero());
        assert_eq!(released.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResourceVector::from(vec![4, 0, 2]).to_string(), "[4, 0, 2]");
    }
}
