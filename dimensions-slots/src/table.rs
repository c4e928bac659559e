use crate::slot::{SlotId, SubDimension};

/// The host's slot table. Entries can be added or overwritten but never removed.
///
/// Neither `append` nor `replace` touches the slot's own id field.
pub trait SlotTable {
    /// Add a slot at the end of the table and return its position.
    fn append(&mut self, slot: SubDimension) -> SlotId;

    /// Store `slot` at `id`, dropping whatever was registered there.
    fn replace(&mut self, id: SlotId, slot: SubDimension);

    fn get(&self, id: SlotId) -> Option<&SubDimension>;

    fn get_mut(&mut self, id: SlotId) -> Option<&mut SubDimension>;

    /// Number of table positions ever handed out. Never decreases.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every registered slot, in table order.
    fn loaded_ids(&self) -> Vec<SlotId>;
}

/// Vec-backed table. Positions registered out of order leave empty holes,
/// as happens when slots are re-registered after a restart.
#[derive(Debug, Default)]
pub struct MemorySlotTable {
    entries: Vec<Option<SubDimension>>,
}

impl MemorySlotTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotTable for MemorySlotTable {
    fn append(&mut self, slot: SubDimension) -> SlotId {
        let id = SlotId(self.entries.len() as u32);
        self.entries.push(Some(slot));
        id
    }

    fn replace(&mut self, id: SlotId, slot: SubDimension) {
        let index = id.0 as usize;
        if index >= self.entries.len() {
            self.entries.resize_with(index + 1, || None);
        }
        self.entries[index] = Some(slot);
    }

    fn get(&self, id: SlotId) -> Option<&SubDimension> {
        self.entries.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: SlotId) -> Option<&mut SubDimension> {
        self.entries.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn loaded_ids(&self) -> Vec<SlotId> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(index, _)| SlotId(index as u32))
            .collect()
    }
}
