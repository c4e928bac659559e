use std::collections::HashMap;

use anyhow::Result;

use crate::block::{Block, BlockCode, BlockId};
use crate::pattern::BlockPattern;
use crate::BlockRegistry;

/// In-memory block registry. Ids are assigned in registration order, air first.
#[derive(Debug, Clone)]
pub struct BlockTable {
    blocks: Vec<Block>,
    by_code: HashMap<BlockCode, BlockId>,
}

impl BlockTable {
    pub fn new() -> Self {
        let air = Block::air();
        let mut by_code = HashMap::new();
        by_code.insert(air.code.clone(), air.id);

        Self { blocks: vec![air], by_code }
    }

    /// Register `code`, returning the existing id if it is already known.
    pub fn register(&mut self, code: &str) -> Result<BlockId> {
        let code = BlockCode::parse(code)?;
        if let Some(id) = self.by_code.get(&code) {
            return Ok(*id);
        }

        let id = BlockId(self.blocks.len() as u32);
        self.by_code.insert(code.clone(), id);
        self.blocks.push(Block { id, code });
        Ok(id)
    }

    pub fn register_all<'a, I>(&mut self, codes: I) -> Result<Vec<BlockId>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        codes.into_iter().map(|code| self.register(code)).collect()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    pub fn id_of(&self, code: &BlockCode) -> Option<BlockId> {
        self.by_code.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for BlockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry for BlockTable {
    fn search_blocks(&self, pattern: &BlockPattern) -> Vec<Block> {
        self.blocks.iter().filter(|block| pattern.matches(&block.code)).cloned().collect()
    }
}
