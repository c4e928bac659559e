use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::block::{Block, BlockCode, BlockId, BlockPos};
use crate::registry::BlockTable;
use crate::{BlockAccess, BlockSink};

/// Sparse in-memory world: whole Y layers plus individual overrides.
pub struct FlatWorld {
    registry: Arc<BlockTable>,
    // Key: position, Value: block id
    custom_blocks: HashMap<BlockPos, BlockId>,
    // Key: y, Value: block id
    full_layers: HashMap<i32, BlockId>,
}

impl FlatWorld {
    pub fn new(registry: Arc<BlockTable>) -> Self {
        Self {
            registry,
            custom_blocks: HashMap::new(),
            full_layers: HashMap::new(),
        }
    }

    /// Bedrock floor, three dirt layers and a grass surface at y = 0.
    /// The registry must already know those three blocks.
    pub fn superflat(registry: Arc<BlockTable>) -> Result<Self> {
        let mut world = Self::new(registry);
        world.fill_layer(-4, "bedrock")?;
        for y in -3..0 {
            world.fill_layer(y, "dirt")?;
        }
        world.fill_layer(0, "grass_block")?;
        Ok(world)
    }

    pub fn registry(&self) -> &Arc<BlockTable> {
        &self.registry
    }

    /// Set a single block by code.
    pub fn place(&mut self, pos: BlockPos, code: &str) -> Result<()> {
        let id = self.resolve(code)?;
        self.set_block(pos, id);
        Ok(())
    }

    /// Fill an entire Y layer with a block.
    pub fn fill_layer(&mut self, y: i32, code: &str) -> Result<()> {
        let id = self.resolve(code)?;
        self.full_layers.insert(y, id);
        // Individual blocks at this Y are overwritten by the layer
        self.custom_blocks.retain(|pos, _| pos.y != y);
        Ok(())
    }

    fn resolve(&self, code: &str) -> Result<BlockId> {
        let parsed = BlockCode::parse(code)?;
        self.registry
            .id_of(&parsed)
            .with_context(|| format!("Block {} is not registered", parsed))
    }
}

impl BlockAccess for FlatWorld {
    fn block_at(&self, pos: BlockPos) -> Block {
        let id = self
            .custom_blocks
            .get(&pos)
            .or_else(|| self.full_layers.get(&pos.y))
            .copied()
            .unwrap_or(BlockId::AIR);

        self.registry.get(id).cloned().unwrap_or_else(Block::air)
    }
}

impl BlockSink for FlatWorld {
    fn set_block(&mut self, pos: BlockPos, block: BlockId) {
        self.custom_blocks.insert(pos, block);
    }
}
