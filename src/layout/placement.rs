use crate::batch::settlement::Settlement;
use crate::foundation::core::ArtifactId;

/// Fixed per-page grid shape for the placement layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageShape {
    /// Slot rows per page.
    pub rows: u32,
    /// Slot columns per page.
    pub cols: u32,
}

impl Default for PageShape {
    fn default() -> Self {
        Self { rows: 3, cols: 2 }
    }
}

impl PageShape {
    /// Slots on one full page.
    pub fn slots_per_page(self) -> u32 {
        (self.rows * self.cols).max(1)
    }
}

/// What currently occupies a placement slot.
#[derive(Clone, Debug)]
pub enum SlotOccupant {
    /// Reserved for a job that has not settled yet.
    Placeholder,
    /// A settled job's output. A slot fills at most once and never reverts.
    Filled(Settlement),
}

/// One pre-allocated grid position.
#[derive(Clone, Debug)]
pub struct PlacementSlot {
    /// 0-based page index.
    pub page: u32,
    /// 0-based row within the page.
    pub row: u32,
    /// 0-based column within the row.
    pub col: u32,
    occupant: SlotOccupant,
}

impl PlacementSlot {
    /// Current occupant.
    pub fn occupant(&self) -> &SlotOccupant {
        &self.occupant
    }

    /// Whether the slot still holds a placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.occupant, SlotOccupant::Placeholder)
    }
}

/// Pre-allocated paginated grid of placeholder slots.
///
/// All slots for a batch exist before any job completes, in one stable
/// row-major enumeration order. Replacement is FIFO-by-slot: whichever job
/// settles first fills the first open slot, irrespective of which job it was.
/// A slow job does not reserve "its" position.
#[derive(Clone, Debug, Default)]
pub struct PlacementLayout {
    shape: PageShape,
    pages: u32,
    slots: Vec<PlacementSlot>,
}

impl PlacementLayout {
    /// Pre-create `ceil(batch_size / slots_per_page)` pages holding exactly
    /// `batch_size` placeholder slots. A partially filled final page leaves
    /// unused stretch space rather than phantom placeholders.
    pub fn allocate(batch_size: u32, shape: PageShape) -> Self {
        let per_page = shape.slots_per_page();
        let pages = batch_size.div_ceil(per_page);
        let mut slots = Vec::with_capacity(batch_size as usize);
        for i in 0..batch_size {
            let page = i / per_page;
            let index_in_page = i % per_page;
            slots.push(PlacementSlot {
                page,
                row: index_in_page / shape.cols,
                col: index_in_page % shape.cols,
                occupant: SlotOccupant::Placeholder,
            });
        }
        Self {
            shape,
            pages,
            slots,
        }
    }

    /// Page grid shape.
    pub fn shape(&self) -> PageShape {
        self.shape
    }

    /// Number of allocated pages.
    pub fn page_count(&self) -> u32 {
        self.pages
    }

    /// Total allocated slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slots in enumeration order.
    pub fn slots(&self) -> &[PlacementSlot] {
        &self.slots
    }

    /// Slots still holding placeholders.
    pub fn remaining_placeholders(&self) -> usize {
        self.slots.iter().filter(|s| s.is_placeholder()).count()
    }

    /// Slots already filled.
    pub fn occupied(&self) -> usize {
        self.slots.len() - self.remaining_placeholders()
    }

    /// Fill the first slot in enumeration order still holding a placeholder.
    /// Returns false when no placeholder remains.
    pub fn replace_next(&mut self, settlement: Settlement) -> bool {
        match self.slots.iter_mut().find(|s| s.is_placeholder()) {
            Some(slot) => {
                slot.occupant = SlotOccupant::Filled(settlement);
                true
            }
            None => false,
        }
    }

    /// Release every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.pages = 0;
    }

    /// Iterate settled outputs in slot order.
    pub fn settlements(&self) -> impl Iterator<Item = &Settlement> {
        self.slots.iter().filter_map(|s| match &s.occupant {
            SlotOccupant::Filled(settlement) => Some(settlement),
            SlotOccupant::Placeholder => None,
        })
    }

    pub(crate) fn artifact_mut(
        &mut self,
        id: ArtifactId,
    ) -> Option<&mut crate::notation::artifact::Artifact> {
        self.slots.iter_mut().find_map(|s| match &mut s.occupant {
            SlotOccupant::Filled(settlement) => {
                settlement.artifact_mut().filter(|a| a.id() == id)
            }
            SlotOccupant::Placeholder => None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/placement.rs"]
mod tests;
