//! Sub-dimension slots and their recycling.
//!
//! The host keeps slots in an append-only table indexed by integer id and
//! offers no way to remove an entry. [`SlotAllocator`] layers a persistent
//! FIFO free-list on top of that table so emptied slots get reused before the
//! table is grown.

pub mod allocator;
pub mod slot;
pub mod table;

pub use allocator::{SlotAllocator, FREE_DIMENSIONS_KEY};
pub use slot::{
    slot_center, SlotId, SubDimension, SLOT_CELL_HALF, SLOT_CELL_SIZE, SLOT_GRID_COLUMNS, SLOT_ID_LIMIT,
};
pub use table::{MemorySlotTable, SlotTable};
