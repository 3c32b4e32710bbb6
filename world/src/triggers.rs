//! Zone registry and the tile-trigger lifecycle reconciliation.
//!
//! Raw overlap samples arrive at any tick while a character interpolates
//! between cells; they are buffered in a [`ZoneTracker`] without side
//! effects. Lifecycle events are produced only by [`reconcile`], which the
//! world invokes at the moment a step settles on its destination cell.

use tilewalk_core::{
    CellCoord, CellRect, CharacterId, Event, PlacementError, TriggerTarget, ZoneId,
};

/// Trigger zone stored inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ZoneState {
    /// Identifier allocated by the world for the zone.
    pub(crate) id: ZoneId,
    /// Region of cells covered by the zone.
    pub(crate) region: CellRect,
    /// Lifecycle handler routed zone events, if one is attached.
    pub(crate) target: Option<TriggerTarget>,
    /// Set once the missing-target warning has been reported.
    warned: bool,
}

/// Registry that stores zones and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ZoneRegistry {
    entries: Vec<ZoneState>,
    next_zone_id: u32,
}

impl ZoneRegistry {
    /// Creates an empty zone registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_zone_id: 0,
        }
    }

    /// Drops every zone and resets identifier allocation.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_zone_id = 0;
    }

    /// Registers a zone covering the provided region.
    ///
    /// Regions may not overlap; overlap would make the single `current`
    /// occupancy slot ambiguous. Callers validate grid bounds beforehand.
    pub(crate) fn register(
        &mut self,
        region: CellRect,
        target: Option<TriggerTarget>,
    ) -> Result<ZoneId, PlacementError> {
        if self
            .entries
            .iter()
            .any(|zone| zone.region.intersects(&region))
        {
            return Err(PlacementError::Overlapping);
        }

        let id = ZoneId::new(self.next_zone_id);
        self.next_zone_id = self.next_zone_id.wrapping_add(1);
        self.entries.push(ZoneState {
            id,
            region,
            target,
            warned: false,
        });
        Ok(id)
    }

    /// Returns the zone covering the provided cell, if any.
    pub(crate) fn zone_at(&self, cell: CellCoord) -> Option<ZoneId> {
        self.entries
            .iter()
            .find(|zone| zone.region.contains(cell))
            .map(|zone| zone.id)
    }

    /// Iterator over the stored zones in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &ZoneState> {
        self.entries.iter()
    }

    /// Resolves the lifecycle target attached to a zone.
    ///
    /// A zone without a target reports a configuration warning the first
    /// time it is consulted and stays inert afterwards.
    fn resolve_target(&mut self, zone: ZoneId) -> Option<TriggerTarget> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == zone)?;
        if entry.target.is_none() && !entry.warned {
            entry.warned = true;
            tracing::warn!(
                zone = zone.get(),
                "zone has no trigger target attached; lifecycle events will be skipped"
            );
        }
        entry.target
    }
}

/// Buffered zone occupancy for a single character.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ZoneTracker {
    current: Option<ZoneId>,
    previous: Option<ZoneId>,
}

impl ZoneTracker {
    /// Creates a tracker primed with the zone under the spawn cell.
    ///
    /// `previous` starts empty so a character spawned inside a zone fires
    /// its enter event on the first settled step instead of a spurious exit
    /// when walking out untracked.
    pub(crate) fn starting_inside(current: Option<ZoneId>) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    /// Buffers a raw overlap sample without producing side effects.
    pub(crate) fn observe(&mut self, sample: Option<ZoneId>) {
        self.current = sample;
    }

    /// Zone currently overlapped according to the latest sample.
    #[cfg(test)]
    pub(crate) fn current(&self) -> Option<ZoneId> {
        self.current
    }
}

/// Runs the lifecycle reconciliation for a character that just settled.
///
/// Exactly one enter/exit pair or one stay event is produced per completed
/// step. The new zone's enter fires before the old zone's exit so an enter
/// handler can observe state the exit handler is about to tear down.
pub(crate) fn reconcile(
    tracker: &mut ZoneTracker,
    zones: &mut ZoneRegistry,
    character: CharacterId,
    out_events: &mut Vec<Event>,
) {
    if tracker.current != tracker.previous {
        if let Some(zone) = tracker.current {
            if let Some(target) = zones.resolve_target(zone) {
                out_events.push(Event::ZoneEntered {
                    character,
                    zone,
                    target,
                });
            }
        }
        if let Some(zone) = tracker.previous {
            if let Some(target) = zones.resolve_target(zone) {
                out_events.push(Event::ZoneExited {
                    character,
                    zone,
                    target,
                });
            }
        }
    } else if let Some(zone) = tracker.current {
        if let Some(target) = zones.resolve_target(zone) {
            out_events.push(Event::ZoneStayed {
                character,
                zone,
                target,
            });
        }
    }

    tracker.previous = tracker.current;
}
