//! Authoritative prop state management and interaction dispatch.

use tilewalk_core::{CellCoord, PropId, PropKind};

/// Prop stored inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PropState {
    /// Identifier allocated by the world for the prop.
    pub(crate) id: PropId,
    /// Kind of prop occupying the cell.
    pub(crate) kind: PropKind,
    /// Cell occupied by the prop.
    pub(crate) cell: CellCoord,
}

/// Registry that stores props and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct PropRegistry {
    entries: Vec<PropState>,
    next_prop_id: u32,
}

impl PropRegistry {
    /// Creates an empty prop registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_prop_id: 0,
        }
    }

    /// Drops every prop and resets identifier allocation.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_prop_id = 0;
    }

    /// Stores a new prop on the provided cell, allocating its identifier.
    ///
    /// Callers validate bounds and occupancy before registering.
    pub(crate) fn register(&mut self, kind: PropKind, cell: CellCoord) -> PropId {
        let id = PropId::new(self.next_prop_id);
        self.next_prop_id = self.next_prop_id.wrapping_add(1);
        self.entries.push(PropState { id, kind, cell });
        id
    }

    /// Returns the prop occupying the provided cell, if any.
    pub(crate) fn prop_at(&self, cell: CellCoord) -> Option<&PropState> {
        self.entries.iter().find(|prop| prop.cell == cell)
    }

    /// Resolves an interaction aimed at the provided cell.
    ///
    /// Yields the prop when it exposes interaction behavior; a solid but
    /// inert prop (or an empty cell) yields `None` so the caller leaves the
    /// interaction latched.
    pub(crate) fn dispatch_at(&self, cell: CellCoord) -> Option<(PropId, PropKind)> {
        self.prop_at(cell)
            .filter(|prop| prop.kind.is_interactive())
            .map(|prop| (prop.id, prop.kind))
    }

    /// Iterator over the stored props in placement order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &PropState> {
        self.entries.iter()
    }
}
