//! Capacity engine.
//!
//! Keeps `Zone::available_capacity` equal to
//! `max(0, capacity - blocking spaces)` across every write.
//!
//! The functions here are pure: they decide *what* must happen to each zone's
//! counter. Applying the decision (locking rows, persisting) is the job of the
//! services, which lock exactly [`CapacityPlan::zones`] before calling
//! [`apply_delta`].
//!
//! # Rules
//!
//! - A space is *blocking* when it is reserved or occupied. `MAINTENANCE` does
//!   not block.
//! - `OCCUPIED` supersedes reserved: an occupied space is stored with
//!   `is_reserved = false` ([`normalize_reserved`]).
//! - Space writes move counters by ±1 ([`on_space_create`], [`on_space_update`],
//!   [`on_space_delete`]), saturating at `[0, capacity]`.
//! - A zone capacity change recomputes the counter from scratch ([`recount`]).

use crate::space::{Space, SpaceStatus};
use crate::zone::{Zone, ZoneId};
use serde::Serialize;
use smallvec::SmallVec;

/// `OCCUPIED` supersedes reserved.
#[must_use]
pub fn normalize_reserved(status: SpaceStatus, reserved: bool) -> bool {
    if status == SpaceStatus::Occupied {
        false
    } else {
        reserved
    }
}

/// Whether a space in this state consumes a unit of capacity.
#[must_use]
pub fn is_blocking(status: SpaceStatus, reserved: bool) -> bool {
    reserved || status == SpaceStatus::Occupied
}

/// A signed change to one zone's available capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjustment {
    /// Zone whose counter moves
    pub zone_id: ZoneId,
    /// Signed change (never zero inside a plan)
    pub delta: i32,
}

/// Counter changes required by a single space write.
///
/// Adjustments are kept sorted by ascending zone id with deltas on the same
/// zone merged and zero deltas dropped. Locking [`zones`](Self::zones) in
/// iteration order is therefore deadlock-free across concurrent writers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapacityPlan {
    adjustments: SmallVec<[Adjustment; 2]>,
}

impl CapacityPlan {
    /// A plan that changes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add `delta` to `zone_id`, merging with any existing entry.
    pub fn push(&mut self, zone_id: ZoneId, delta: i32) {
        if delta == 0 {
            return;
        }
        match self.adjustments.binary_search_by(|a| a.zone_id.cmp(&zone_id)) {
            Ok(idx) => {
                let merged = self.adjustments[idx].delta + delta;
                if merged == 0 {
                    self.adjustments.remove(idx);
                } else {
                    self.adjustments[idx].delta = merged;
                }
            },
            Err(idx) => self.adjustments.insert(idx, Adjustment { zone_id, delta }),
        }
    }

    /// Adjustments in ascending zone-id order.
    pub fn adjustments(&self) -> impl Iterator<Item = &Adjustment> {
        self.adjustments.iter()
    }

    /// Zone ids to lock, ascending.
    #[must_use]
    pub fn zones(&self) -> Vec<ZoneId> {
        self.adjustments.iter().map(|a| a.zone_id).collect()
    }

    /// Net delta planned for `zone_id` (0 when untouched).
    #[must_use]
    pub fn delta_for(&self, zone_id: ZoneId) -> i32 {
        self.adjustments
            .iter()
            .find(|a| a.zone_id == zone_id)
            .map_or(0, |a| a.delta)
    }

    /// Whether the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }
}

/// A newly created blocking space takes one unit from its zone.
#[must_use]
pub fn on_space_create(space: &Space) -> CapacityPlan {
    let mut plan = CapacityPlan::empty();
    if space.is_blocking() {
        plan.push(space.zone_id, -1);
    }
    plan
}

/// Counter moves for replacing `old` with `new`.
///
/// Handles zone reassignment: the old zone gets its unit back when the old
/// state was blocking, and the new zone gives one up when the new state is
/// blocking. Within a single zone the two entries merge, leaving ±1 only when
/// the blocking state actually flips.
#[must_use]
pub fn on_space_update(old: &Space, new: &Space) -> CapacityPlan {
    let mut plan = CapacityPlan::empty();
    if old.is_blocking() {
        plan.push(old.zone_id, 1);
    }
    if new.is_blocking() {
        plan.push(new.zone_id, -1);
    }
    plan
}

/// A deleted blocking space returns one unit to its zone.
#[must_use]
pub fn on_space_delete(space: &Space) -> CapacityPlan {
    let mut plan = CapacityPlan::empty();
    if space.is_blocking() {
        plan.push(space.zone_id, 1);
    }
    plan
}

/// Outcome of [`apply_delta`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjusted {
    /// New counter value, within `[0, capacity]`
    pub value: u32,
    /// Whether saturation kicked in (indicates drift)
    pub clamped: bool,
}

/// Saturating `clamp(current + delta, 0, capacity)`.
///
/// A missing counter (legacy row) counts as `capacity`.
#[must_use]
pub fn apply_delta(current: Option<u32>, capacity: u32, delta: i32) -> Adjusted {
    let current = i64::from(current.unwrap_or(capacity));
    let raw = current + i64::from(delta);
    let upper = i64::from(capacity);
    let bounded = raw.clamp(0, upper);
    Adjusted {
        value: u32::try_from(bounded).unwrap_or(0),
        clamped: bounded != raw,
    }
}

/// Exact counter for a zone with `blocking` blocking spaces.
#[must_use]
pub fn recount(capacity: u32, blocking: usize) -> u32 {
    let blocking = u32::try_from(blocking).unwrap_or(u32::MAX);
    capacity.saturating_sub(blocking)
}

/// Number of blocking spaces among `spaces`.
#[must_use]
pub fn count_blocking<'a>(spaces: impl IntoIterator<Item = &'a Space>) -> usize {
    spaces.into_iter().filter(|s| s.is_blocking()).count()
}

/// Breakdown of a zone's spaces by state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOccupancy {
    /// Zone
    pub zone_id: ZoneId,
    /// Zone name
    pub zone_name: String,
    /// Declared capacity
    pub capacity: u32,
    /// Materialized counter
    pub available_capacity: u32,
    /// Spaces in the zone
    pub total_spaces: usize,
    /// Spaces with status `AVAILABLE`
    pub available: usize,
    /// Spaces with status `OCCUPIED`
    pub occupied: usize,
    /// Spaces with status `MAINTENANCE`
    pub maintenance: usize,
    /// Spaces flagged reserved
    pub reserved: usize,
    /// Spaces consuming capacity
    pub blocking: usize,
}

impl ZoneOccupancy {
    /// Summarize `spaces` (expected to all belong to `zone`).
    #[must_use]
    pub fn from_spaces(zone: &Zone, spaces: &[Space]) -> Self {
        let by_status = |status: SpaceStatus| spaces.iter().filter(|s| s.status == status).count();
        Self {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            capacity: zone.capacity,
            available_capacity: zone.available(),
            total_spaces: spaces.len(),
            available: by_status(SpaceStatus::Available),
            occupied: by_status(SpaceStatus::Occupied),
            maintenance: by_status(SpaceStatus::Maintenance),
            reserved: spaces.iter().filter(|s| s.is_reserved).count(),
            blocking: count_blocking(spaces),
        }
    }
}
