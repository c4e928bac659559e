use std::collections::HashMap;

use anyhow::Result;

use crate::SaveGame;

/// Save game that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemorySaveGame {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySaveGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SaveGame for MemorySaveGame {
    fn store_raw(&mut self, key: &str, data: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_string(), data);
        Ok(())
    }

    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }
}
