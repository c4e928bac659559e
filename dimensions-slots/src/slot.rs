use std::collections::{BTreeSet, HashMap};
use std::fmt;

use dimensions_world::{BlockId, BlockPos, BlockSink};
use serde::{Deserialize, Serialize};

// Slot storage is laid out on a grid far away from the real world:
// 4096 columns along X, rows along Z, each cell 16384 blocks wide.
pub const SLOT_CELL_SIZE: i32 = 16384;
pub const SLOT_CELL_HALF: i32 = SLOT_CELL_SIZE / 2;
pub const SLOT_GRID_COLUMNS: u32 = 4096;

/// Ids at or above this would put a storage cell outside i32 coordinates.
pub const SLOT_ID_LIMIT: u32 = 1 << 29;

// Sub-regions are tracked in 32^3 cubes.
const REGION_SHIFT: i32 = 5;

/// Position of a slot in the host's slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    /// Decode a persisted id. Negative values are the "no slot" sentinel and
    /// ids past the grid are rejected.
    pub fn from_raw(raw: i32) -> Option<SlotId> {
        u32::try_from(raw).ok().filter(|id| *id < SLOT_ID_LIMIT).map(SlotId)
    }

    /// Ids handed out by the allocator or `from_raw` are below
    /// `SLOT_ID_LIMIT`, so they always fit.
    pub fn as_raw(self) -> i32 {
        debug_assert!(self.0 < SLOT_ID_LIMIT, "slot id {} past the grid", self.0);
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }

    pub fn column(self) -> u32 {
        self.0 % SLOT_GRID_COLUMNS
    }

    pub fn row(self) -> u32 {
        self.0 / SLOT_GRID_COLUMNS
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Centre of the grid cell that stores slot `id`'s blocks.
pub fn slot_center(id: SlotId) -> BlockPos {
    BlockPos::new(
        id.column() as i32 * SLOT_CELL_SIZE + SLOT_CELL_HALF,
        SLOT_CELL_HALF,
        id.row() as i32 * SLOT_CELL_SIZE + SLOT_CELL_HALF,
    )
}

/// Contents of one slot: an anchor in the real world plus the voxels written
/// into the slot's own storage cell.
#[derive(Debug, Clone, Default)]
pub struct SubDimension {
    sub_dimension_id: Option<SlotId>,
    anchor: BlockPos,
    // Keyed by slot-internal position (inside the storage cell)
    blocks: HashMap<BlockPos, BlockId>,
    regions: BTreeSet<(i32, i32, i32)>,
}

impl SubDimension {
    pub fn new(anchor: BlockPos) -> Self {
        Self { anchor, ..Default::default() }
    }

    /// Registering a slot in the table does not set this; the allocator does.
    pub fn sub_dimension_id(&self) -> Option<SlotId> {
        self.sub_dimension_id
    }

    pub fn set_sub_dimension_id(&mut self, id: SlotId) {
        self.sub_dimension_id = Some(id);
    }

    pub fn anchor(&self) -> BlockPos {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: BlockPos) {
        self.anchor = anchor;
    }

    /// Centre of this slot's storage cell, once it has an id.
    pub fn center(&self) -> Option<BlockPos> {
        self.sub_dimension_id.map(slot_center)
    }

    /// Translate a position relative to the slot origin into storage coordinates.
    pub fn adjust_pos(&self, pos: BlockPos) -> Option<BlockPos> {
        self.center().map(|center| center + pos)
    }

    pub fn block(&self, pos: BlockPos) -> Option<BlockId> {
        self.blocks.get(&pos).copied()
    }

    pub fn blocks(&self) -> impl Iterator<Item = (&BlockPos, &BlockId)> {
        self.blocks.iter()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear_chunks(&mut self) {
        self.blocks.clear();
    }

    /// Drop cached sub-regions that no longer hold any block.
    pub fn unload_unused_regions(&mut self) {
        let live: BTreeSet<_> = self.blocks.keys().map(|pos| region_of(*pos)).collect();
        self.regions.retain(|region| live.contains(region));
    }
}

impl BlockSink for SubDimension {
    fn set_block(&mut self, pos: BlockPos, block: BlockId) {
        self.regions.insert(region_of(pos));
        self.blocks.insert(pos, block);
    }
}

fn region_of(pos: BlockPos) -> (i32, i32, i32) {
    (pos.x >> REGION_SHIFT, pos.y >> REGION_SHIFT, pos.z >> REGION_SHIFT)
}
