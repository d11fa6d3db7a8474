use crate::foundation::core::ObjectId;
use crate::foundation::error::{SaccadeError, SaccadeResult};

/// One numbered group slot of the display list.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GroupSlot {
    /// Ordered top-level members of this slot.
    pub(crate) members: Vec<ObjectId>,
    /// Drawn this frame when set.
    pub visible: bool,
    /// Gates whether animations and scripts run for this slot even when it is
    /// not drawn.
    pub dynamic: bool,
}

impl GroupSlot {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            visible: true,
            dynamic: true,
        }
    }

    /// Ordered members of this slot.
    pub fn members(&self) -> &[ObjectId] {
        &self.members
    }
}

/// Numbered collection of top-level scene objects: the unit of "what gets
/// drawn this frame".
///
/// Object lifetime is independent of list membership; re-initializing the
/// list never destroys objects.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DisplayList {
    slots: Vec<GroupSlot>,
    current: usize,
}

impl DisplayList {
    /// Create a display list with `slot_count` empty group slots. Slots start
    /// visible and dynamic; the current-group cursor starts at 0.
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: (0..slot_count).map(|_| GroupSlot::new()).collect(),
            current: 0,
        }
    }

    /// Re-initialize: clear all group slots and reset the cursor. Does not
    /// destroy the objects the slots referenced.
    pub fn init(&mut self, slot_count: usize) {
        self.slots = (0..slot_count).map(|_| GroupSlot::new()).collect();
        self.current = 0;
    }

    /// Number of group slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Borrow a slot by index.
    pub fn slot(&self, index: usize) -> SaccadeResult<&GroupSlot> {
        self.slots
            .get(index)
            .ok_or_else(|| slot_out_of_range(index, self.slots.len()))
    }

    fn slot_mut(&mut self, index: usize) -> SaccadeResult<&mut GroupSlot> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or_else(|| slot_out_of_range(index, len))
    }

    /// Iterate over the group slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = &GroupSlot> {
        self.slots.iter()
    }

    /// Set the current-group cursor.
    pub fn set_current(&mut self, index: usize) -> SaccadeResult<()> {
        if index >= self.slots.len() {
            return Err(slot_out_of_range(index, self.slots.len()));
        }
        self.current = index;
        Ok(())
    }

    /// The current-group cursor.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Append an object to a slot. A no-op when the object is already a
    /// member of that slot.
    pub fn add(&mut self, index: usize, id: ObjectId) -> SaccadeResult<()> {
        let slot = self.slot_mut(index)?;
        if !slot.members.contains(&id) {
            slot.members.push(id);
        }
        Ok(())
    }

    /// Append an object to the current group slot.
    pub fn add_to_current(&mut self, id: ObjectId) -> SaccadeResult<()> {
        self.add(self.current, id)
    }

    /// Remove an object from every slot it appears in.
    pub fn remove(&mut self, id: ObjectId) {
        for slot in &mut self.slots {
            slot.members.retain(|m| *m != id);
        }
    }

    /// Toggle whether a slot is drawn.
    pub fn set_slot_visible(&mut self, index: usize, visible: bool) -> SaccadeResult<()> {
        self.slot_mut(index)?.visible = visible;
        Ok(())
    }

    /// Toggle whether a slot's hierarchy receives animation and script
    /// updates when not drawn.
    pub fn set_slot_dynamic(&mut self, index: usize, dynamic: bool) -> SaccadeResult<()> {
        self.slot_mut(index)?.dynamic = dynamic;
        Ok(())
    }
}

impl Default for DisplayList {
    /// A single-slot display list.
    fn default() -> Self {
        Self::new(1)
    }
}

fn slot_out_of_range(index: usize, len: usize) -> SaccadeError {
    SaccadeError::invalid_argument(format!(
        "group slot {index} out of range (display list has {len} slots)"
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/display/glist.rs"]
mod tests;
