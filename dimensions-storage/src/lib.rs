//! Save-game key/value persistence.
//!
//! The host stores opaque blobs under string keys; typed values go through
//! [`SaveGameExt`], which wraps them in a one-field NBT compound.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod file;
pub mod memory;

pub use file::FileSaveGame;
pub use memory::MemorySaveGame;

pub trait SaveGame {
    fn store_raw(&mut self, key: &str, data: Vec<u8>) -> Result<()>;
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

#[derive(Serialize)]
struct EntryRef<'a, T> {
    data: &'a T,
}

#[derive(Deserialize)]
struct Entry<T> {
    data: T,
}

pub trait SaveGameExt: SaveGame {
    fn store_data<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let bytes = fastnbt::to_bytes(&EntryRef { data: value })
            .with_context(|| format!("Failed to encode save entry {}", key))?;
        self.store_raw(key, bytes)
    }

    /// `Ok(None)` when the key was never stored.
    fn get_data<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.load_raw(key)? else {
            return Ok(None);
        };
        let entry: Entry<T> = fastnbt::from_bytes(&bytes)
            .with_context(|| format!("Failed to decode save entry {}", key))?;
        Ok(Some(entry.data))
    }
}

impl<S: SaveGame + ?Sized> SaveGameExt for S {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_round_trip() {
        let mut save = MemorySaveGame::new();
        save.store_data("ids", &vec![3i32, 7, 2]).expect("Should store");
        let ids: Option<Vec<i32>> = save.get_data("ids").expect("Should load");
        assert_eq!(ids, Some(vec![3, 7, 2]));
    }

    #[test]
    fn test_absent_key() {
        let save = MemorySaveGame::new();
        let ids: Option<Vec<i32>> = save.get_data("missing").expect("Should load");
        assert_eq!(ids, None);
    }

    #[test]
    fn test_garbage_is_error() {
        let mut save = MemorySaveGame::new();
        save.store_raw("ids", vec![0xde, 0xad]).expect("Should store");
        let result: Result<Option<Vec<i32>>> = save.get_data("ids");
        assert!(result.is_err());
    }

    #[test]
    fn test_works_through_dyn() {
        let mut save = MemorySaveGame::new();
        {
            let dyn_save: &mut dyn SaveGame = &mut save;
            dyn_save.store_data("n", &5i32).expect("Should store");
        }
        let dyn_save: &dyn SaveGame = &save;
        assert_eq!(dyn_save.get_data::<i32>("n").expect("Should load"), Some(5));
    }
}
