//! Property-based testing utilities using proptest.
//!
//! [`ops`] generates random sequences of writes; indices are resolved modulo
//! whatever exists when the operation runs, so every sequence is valid.
//! [`check_consistency`] verifies the capacity invariants over a snapshot.

use crate::storage::Tables;
use parkzone_core::capacity;
use parkzone_core::space::SpaceStatus;
use proptest::prelude::*;

/// A write against zones and spaces.
#[derive(Clone, Debug)]
pub enum Op {
    /// Create a space in the `zone`-th zone
    CreateSpace {
        /// Zone index
        zone: usize,
        /// Requested status
        status: SpaceStatus,
        /// Requested reservation flag
        reserved: bool,
    },
    /// Update the `space`-th space, possibly moving it
    UpdateSpace {
        /// Space index
        space: usize,
        /// Target zone index
        zone: usize,
        /// Requested status
        status: SpaceStatus,
        /// Requested reservation flag
        reserved: bool,
    },
    /// Re-submit the `space`-th space unchanged
    ResubmitSpace {
        /// Space index
        space: usize,
    },
    /// Delete the `space`-th space
    DeleteSpace {
        /// Space index
        space: usize,
    },
    /// Change the `zone`-th zone's capacity
    ResizeZone {
        /// Zone index
        zone: usize,
        /// New capacity, in bounds
        capacity: u32,
    },
}

/// Any space status.
pub fn status() -> impl Strategy<Value = SpaceStatus> {
    prop_oneof![
        Just(SpaceStatus::Available),
        Just(SpaceStatus::Occupied),
        Just(SpaceStatus::Maintenance),
    ]
}

/// A single random write.
pub fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<usize>(), status(), any::<bool>())
            .prop_map(|(zone, status, reserved)| Op::CreateSpace { zone, status, reserved }),
        4 => (any::<usize>(), any::<usize>(), status(), any::<bool>())
            .prop_map(|(space, zone, status, reserved)| Op::UpdateSpace { space, zone, status, reserved }),
        1 => any::<usize>().prop_map(|space| Op::ResubmitSpace { space }),
        2 => any::<usize>().prop_map(|space| Op::DeleteSpace { space }),
        1 => (any::<usize>(), 5u32..=25).prop_map(|(zone, capacity)| Op::ResizeZone { zone, capacity }),
    ]
}

/// Up to `max` random writes.
pub fn ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op(), 0..=max)
}

/// Verify that every zone's counter is in bounds and equals the recount over
/// its spaces, and that no occupied space is reserved.
///
/// # Errors
///
/// Returns a description of the first violation found.
pub fn check_consistency(tables: &Tables) -> Result<(), String> {
    for space in tables.spaces.values() {
        if space.status == SpaceStatus::Occupied && space.is_reserved {
            return Err(format!("space {} is occupied and reserved", space.code));
        }
    }
    for zone in tables.zones.values() {
        let available = zone.available();
        if available > zone.capacity {
            return Err(format!(
                "zone {} has {available} available over capacity {}",
                zone.name, zone.capacity
            ));
        }
        let expected = capacity::recount(
            zone.capacity,
            capacity::count_blocking(tables.spaces_in(zone.id)),
        );
        if available != expected {
            return Err(format!(
                "zone {} has {available} available, expected {expected}",
                zone.name
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn detects_drift() {
        let mut tables = Tables::default();
        let mut zone = fixtures::zone("A", 10);
        let occupied = fixtures::space("S", zone.id, SpaceStatus::Occupied, false);
        tables.spaces.insert(occupied.id, occupied);
        tables.zones.insert(zone.id, zone.clone());
        assert!(check_consistency(&tables).is_err());

        zone.available_capacity = Some(9);
        tables.zones.insert(zone.id, zone);
        assert!(check_consistency(&tables).is_ok());
    }
}
