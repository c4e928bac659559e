//! Host-side voxel surface consumed by the preview subsystem.
//!
//! The traits here are the only way the rest of the workspace touches the
//! world: reading a block, writing a block into some target, and asking the
//! block registry for every block whose code matches a pattern. `BlockTable`
//! and `FlatWorld` are small in-memory hosts used by the binary and tests.

pub mod block;
pub mod flat;
pub mod pattern;
pub mod registry;

pub use block::{Block, BlockCode, BlockId, BlockPos, DEFAULT_DOMAIN};
pub use flat::FlatWorld;
pub use pattern::BlockPattern;
pub use registry::BlockTable;

/// Read access to the live world.
pub trait BlockAccess {
    fn block_at(&self, pos: BlockPos) -> Block;
}

/// Write target for placed blocks (the live world or an isolated slot).
pub trait BlockSink {
    fn set_block(&mut self, pos: BlockPos, block: BlockId);
}

pub trait BlockRegistry {
    /// Every registered block matching `pattern`, in registry order.
    fn search_blocks(&self, pattern: &BlockPattern) -> Vec<Block>;
}
